use anyhow::{Result, Context, anyhow};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::SourceError;

// @module: File and directory utilities

// @const: Caption file extensions accepted next to an iTT subtitle in folder mode
const CAPTION_EXTENSIONS: [&str; 3] = ["dfxp", "ttml", "xml"];

/// Kind of caption/subtitle source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Line 21 caption stream, needs an external decoder
    Scc,
    /// iTunes Timed Text subtitles
    Itt,
    /// DFXP/TTML timed text (decoded captions)
    Dfxp,
}

impl SourceFormat {
    // @returns: Format from the file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "scc" => Ok(Self::Scc),
            "itt" => Ok(Self::Itt),
            "dfxp" | "ttml" | "xml" => Ok(Self::Dfxp),
            _ => Err(SourceError::UnsupportedSourceFormat(
                path.file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.display().to_string()),
            )),
        }
    }

    /// Whether the file is timed-text markup this crate can read directly
    pub fn is_markup(&self) -> bool {
        matches!(self, Self::Itt | Self::Dfxp)
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scc => "SCC",
            Self::Itt => "iTT",
            Self::Dfxp => "DFXP",
        };
        write!(f, "{}", name)
    }
}

/// A caption file and the subtitle file it must be checked against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackPair {
    pub captions: PathBuf,
    pub subtitles: PathBuf,
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @generates: Report path for a source file, e.g. `results/show.itt_overlaps.txt`
    pub fn report_path<P1: AsRef<Path>, P2: AsRef<Path>>(source_file: P1, output_dir: P2) -> PathBuf {
        let name = source_file
            .as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "track".to_string());

        output_dir.as_ref().join(format!("{}_overlaps.txt", name))
    }

    // @generates: Output directory for `source_file` that mirrors its folder under `input_root`
    pub fn mirrored_dir<P1: AsRef<Path>, P2: AsRef<Path>, P3: AsRef<Path>>(
        source_file: P1,
        input_root: P2,
        output_dir: P3,
    ) -> PathBuf {
        let relative_parent = source_file
            .as_ref()
            .parent()
            .and_then(|parent| parent.strip_prefix(input_root.as_ref()).ok());

        match relative_parent {
            Some(relative) => output_dir.as_ref().join(relative),
            None => output_dir.as_ref().to_path_buf(),
        }
    }

    /// Find files with a specific extension in a directory
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        let normalized_ext = extension.trim_start_matches('.');

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext.to_string_lossy().eq_ignore_ascii_case(normalized_ext) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        result.sort();
        Ok(result)
    }

    /// Pair every iTT subtitle under `dir` with a caption file sharing its stem
    pub fn find_track_pairs<P: AsRef<Path>>(dir: P) -> Result<Vec<TrackPair>> {
        let dir = dir.as_ref();
        if !Self::dir_exists(dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", dir));
        }

        let mut pairs = Vec::new();
        for subtitles in Self::find_files(dir, "itt")? {
            let caption = CAPTION_EXTENSIONS
                .iter()
                .map(|ext| subtitles.with_extension(ext))
                .find(|candidate| Self::file_exists(candidate));

            if let Some(captions) = caption {
                pairs.push(TrackPair { captions, subtitles });
            }
        }

        Ok(pairs)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }
}

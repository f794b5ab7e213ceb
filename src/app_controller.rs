use anyhow::{anyhow, Context, Result};
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::app_config::Config;
use crate::errors::{AppError, SourceError};
use crate::file_utils::{FileManager, SourceFormat, TrackPair};
use crate::markup;
use crate::overlap::find_overlaps;
use crate::regions::RegionCatalog;
use crate::report::{self, OverlapReport, TimeLabel};
use crate::timed_text::{normalize_with, EventTrack, NormalizeOptions};

// @module: Application controller for caption/subtitle overlap checks

/// Result of one pair in folder mode
#[derive(Debug)]
pub struct BatchOutcome {
    pub pair: TrackPair,
    /// Overlap count, when the check succeeded
    pub overlaps: Option<usize>,
    pub error: Option<String>,
}

/// Totals of a folder run
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchSummary {
    pub fn checked(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_none()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_some()).count()
    }

    pub fn total_overlaps(&self) -> usize {
        self.outcomes.iter().filter_map(|o| o.overlaps).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

/// Main application controller
#[derive(Clone)]
pub struct Controller {
    // @field: App configuration
    config: Arc<Config>,

    // @field: Regions used to grade overlaps
    catalog: Arc<RegionCatalog>,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| AppError::Config(format!("{:#}", e)))?;
        let catalog = config.region_catalog();

        Ok(Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read a timed-text file and normalize it into a track
    pub fn load_track(&self, path: &Path, options: &NormalizeOptions) -> Result<EventTrack, AppError> {
        let format = SourceFormat::from_path(path)?;
        if !format.is_markup() {
            return Err(SourceError::SccRequiresConversion(path.to_path_buf()).into());
        }

        let content = FileManager::read_to_string(path).map_err(|e| AppError::File(format!("{:#}", e)))?;
        let records = markup::parse_document(&content)?;

        if records.is_empty() {
            warn!("No timed paragraphs found in {:?}", path);
        }

        let track = normalize_with(&records, options)?;

        debug!("Loaded {} {} event(s) from {:?}", track.len(), track.label(), path);

        Ok(track)
    }

    /// Check one caption file against one subtitle file
    pub fn check_pair(&self, captions: &Path, subtitles: &Path) -> Result<OverlapReport> {
        let caption_track = self
            .load_track(captions, &self.config.caption_options())
            .with_context(|| format!("Failed to load captions {:?}", captions))?;
        let subtitle_track = self
            .load_track(subtitles, &self.config.subtitle_options())
            .with_context(|| format!("Failed to load subtitles {:?}", subtitles))?;

        let pairs = find_overlaps(&caption_track, &subtitle_track).map_err(AppError::from)?;

        Ok(OverlapReport::new(
            captions,
            subtitles,
            caption_track.len(),
            subtitle_track.len(),
            &pairs,
            &self.catalog,
        ))
    }

    /// Write the configured report files for `report` into `output_dir`
    pub fn write_reports(&self, report: &OverlapReport, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let style = self.config.timecode_style;
        let caption_label = TimeLabel::new(style, self.config.captions.effective_frame_rate());
        let subtitle_label = TimeLabel::new(style, self.config.subtitles.effective_frame_rate());

        let mut written = report::write_tsv(report, output_dir, caption_label, subtitle_label)?;

        if self.config.write_json {
            let stem = report
                .caption_source
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "captions".to_string());
            let json_path = output_dir.join(format!("{}_overlaps.json", stem));
            report::write_json(report, &json_path)?;
            written.push(json_path);
        }

        Ok(written)
    }

    /// Run the check for one pair and write its reports
    pub fn run(&self, captions: &Path, subtitles: &Path, output_dir: &Path) -> Result<OverlapReport> {
        let start_time = Instant::now();

        for input in [captions, subtitles] {
            if !FileManager::file_exists(input) {
                return Err(anyhow!("Input file does not exist: {:?}", input));
            }
        }

        info!("Checking {:?} against {:?}", captions, subtitles);

        let report = self.check_pair(captions, subtitles)?;

        for row in &report.rows {
            debug!(
                "Overlap ({}): caption #{} {} | subtitle #{} {}",
                row.severity, row.caption_index, row.caption, row.subtitle_index, row.subtitle
            );
        }

        let written = self.write_reports(&report, output_dir)?;

        info!("{}", report.summary());
        info!(
            "Reports written to {} in {}",
            written
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            Self::format_duration(start_time.elapsed())
        );

        Ok(report)
    }

    /// Check every iTT/caption pair found under `input_dir`
    pub async fn run_folder(&self, input_dir: &Path, output_dir: &Path) -> Result<BatchSummary> {
        let start_time = Instant::now();

        let pairs = FileManager::find_track_pairs(input_dir)?;
        if pairs.is_empty() {
            warn!("No caption/subtitle pairs found in {:?}", input_dir);
            return Ok(BatchSummary::default());
        }

        info!("Found {} caption/subtitle pair(s) in {:?}", pairs.len(), input_dir);

        let progress_bar = ProgressBar::new(pairs.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pairs ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result);
        progress_bar.set_message("Checking");

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_jobs));

        let jobs = pairs.into_iter().map(|pair| {
            let controller = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let progress_bar = progress_bar.clone();
            // Same file names may appear in several delivery folders
            let output_dir = FileManager::mirrored_dir(&pair.subtitles, input_dir, output_dir);

            async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(permit) => {
                        let job_pair = pair.clone();
                        tokio::task::spawn_blocking(move || {
                            let _permit = permit;
                            controller.run(&job_pair.captions, &job_pair.subtitles, &output_dir)
                        })
                        .await
                        .map_err(|e| anyhow!("Check task failed: {}", e))
                        .and_then(|r| r)
                    }
                    Err(e) => Err(anyhow!("Job queue closed: {}", e)),
                };
                progress_bar.inc(1);
                (pair, result)
            }
        });

        let results = join_all(jobs).await;
        progress_bar.finish_and_clear();

        let mut summary = BatchSummary::default();
        for (pair, result) in results {
            match result {
                Ok(report) => summary.outcomes.push(BatchOutcome {
                    pair,
                    overlaps: Some(report.overlap_count()),
                    error: None,
                }),
                Err(e) => {
                    error!("Error checking {:?}: {:#}", pair.subtitles, e);
                    summary.outcomes.push(BatchOutcome {
                        pair,
                        overlaps: None,
                        error: Some(format!("{:#}", e)),
                    });
                }
            }
        }

        info!(
            "Finished {} pair(s) in {}: {} overlap(s), {} failure(s)",
            summary.outcomes.len(),
            Self::format_duration(start_time.elapsed()),
            summary.total_overlaps(),
            summary.failed()
        );

        Ok(summary)
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

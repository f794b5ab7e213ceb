/*!
 * Overlap reports.
 *
 * A report lists every colliding caption/subtitle pair with its on-screen
 * severity. It can be written as two tab-separated tables (one per source
 * file, one row per distinct event) or as a single JSON document.
 */

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::file_utils::FileManager;
use crate::overlap::OverlapPair;
use crate::regions::{OverlapSeverity, RegionCatalog};
use crate::timecode::{format_timecode, FrameRate, Timestamp};
use crate::timed_text::TimedEvent;

/// How times are written in the tab-separated tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimecodeStyle {
    /// `HH:MM:SS.mmm`
    #[default]
    Clock,
    /// `HH:MM:SS:FF` at the track's frame rate
    Frames,
}

/// Time formatting for one table
#[derive(Debug, Clone, Copy)]
pub struct TimeLabel {
    pub style: TimecodeStyle,
    pub frame_rate: FrameRate,
}

impl TimeLabel {
    pub fn new(style: TimecodeStyle, frame_rate: FrameRate) -> Self {
        Self { style, frame_rate }
    }

    pub fn clock() -> Self {
        Self::new(TimecodeStyle::Clock, FrameRate::FPS_30)
    }

    pub fn format(&self, time: Timestamp) -> String {
        match self.style {
            TimecodeStyle::Clock => time.to_string(),
            TimecodeStyle::Frames => format_timecode(time, self.frame_rate),
        }
    }
}

/// One graded overlap
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub severity: OverlapSeverity,
    /// Shared display time in milliseconds
    pub shared_ms: u64,
    pub caption_index: usize,
    pub subtitle_index: usize,
    pub caption: TimedEvent,
    pub subtitle: TimedEvent,
}

/// Pair counts per severity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub same_region: usize,
    pub intersecting_regions: usize,
    pub separate_regions: usize,
    pub unknown_region: usize,
}

impl SeverityCounts {
    fn record(&mut self, severity: OverlapSeverity) {
        match severity {
            OverlapSeverity::SameRegion => self.same_region += 1,
            OverlapSeverity::IntersectingRegions => self.intersecting_regions += 1,
            OverlapSeverity::SeparateRegions => self.separate_regions += 1,
            OverlapSeverity::UnknownRegion => self.unknown_region += 1,
        }
    }
}

/// Overlaps found between one caption file and one subtitle file
#[derive(Debug, Clone, Serialize)]
pub struct OverlapReport {
    pub caption_source: PathBuf,
    pub subtitle_source: PathBuf,
    pub caption_events: usize,
    pub subtitle_events: usize,
    pub generated_at: String,
    pub counts: SeverityCounts,
    pub rows: Vec<ReportRow>,
}

impl OverlapReport {
    /// Grade `pairs` (caption first) against `catalog`
    pub fn new(
        caption_source: impl Into<PathBuf>,
        subtitle_source: impl Into<PathBuf>,
        caption_events: usize,
        subtitle_events: usize,
        pairs: &[OverlapPair],
        catalog: &RegionCatalog,
    ) -> Self {
        let mut counts = SeverityCounts::default();
        let rows = pairs
            .iter()
            .map(|pair| {
                let severity = catalog.grade(pair);
                counts.record(severity);
                ReportRow {
                    severity,
                    shared_ms: pair.shared_micros() / 1_000,
                    caption_index: pair.a_index,
                    subtitle_index: pair.b_index,
                    caption: pair.a.clone(),
                    subtitle: pair.b.clone(),
                }
            })
            .collect();

        Self {
            caption_source: caption_source.into(),
            subtitle_source: subtitle_source.into(),
            caption_events,
            subtitle_events,
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            counts,
            rows,
        }
    }

    pub fn overlap_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_clean(&self) -> bool {
        self.rows.is_empty()
    }

    /// One-line summary for the log
    pub fn summary(&self) -> String {
        format!(
            "{} overlap(s) between {} caption(s) and {} subtitle(s): {} same region, {} intersecting, {} separate, {} unknown",
            self.rows.len(),
            self.caption_events,
            self.subtitle_events,
            self.counts.same_region,
            self.counts.intersecting_regions,
            self.counts.separate_regions,
            self.counts.unknown_region
        )
    }

    /// Table of the distinct caption events involved in overlaps
    pub fn caption_table(&self, label: TimeLabel) -> String {
        event_table(self.rows.iter().map(|r| &r.caption), label)
    }

    /// Table of the distinct subtitle events involved in overlaps
    pub fn subtitle_table(&self, label: TimeLabel) -> String {
        event_table(self.rows.iter().map(|r| &r.subtitle), label)
    }
}

/// Write `<source>_overlaps.txt` for both sources into `output_dir`
pub fn write_tsv(
    report: &OverlapReport,
    output_dir: &Path,
    caption_label: TimeLabel,
    subtitle_label: TimeLabel,
) -> Result<Vec<PathBuf>> {
    let caption_path = FileManager::report_path(&report.caption_source, output_dir);
    let subtitle_path = FileManager::report_path(&report.subtitle_source, output_dir);

    FileManager::write_to_file(&caption_path, &report.caption_table(caption_label))?;
    FileManager::write_to_file(&subtitle_path, &report.subtitle_table(subtitle_label))?;

    Ok(vec![caption_path, subtitle_path])
}

/// Write the whole report as pretty JSON
pub fn write_json(report: &OverlapReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize overlap report")?;
    FileManager::write_to_file(path, &json)
}

fn event_table<'a>(events: impl Iterator<Item = &'a TimedEvent>, label: TimeLabel) -> String {
    let mut seen: HashSet<&TimedEvent> = HashSet::new();
    let mut table = String::from("\tTimecode In\tTimecode Out\tRegion\tText\n");

    for event in events {
        if !seen.insert(event) {
            continue;
        }
        let _ = writeln!(
            table,
            "{}\t{}\t{}\t{}\t{}",
            seen.len() - 1,
            label.format(event.start()),
            label.format(event.stop()),
            escape_cell(event.region()),
            escape_cell(event.text())
        );
    }

    table
}

fn escape_cell(value: &str) -> String {
    value.replace('\t', " ").replace('\r', "").replace('\n', "\\n")
}

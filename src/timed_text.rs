/*!
 * Timed-text events and tracks on the canonical time base.
 *
 * A track is an ordered sequence of events in source order. Events are never
 * keyed by start time: two events may share a start (different regions,
 * stacked lines) and both must survive normalization.
 */

use std::fmt;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::errors::{TimecodeError, TrackError};
use crate::timecode::{convert_frame_rate, parse_timestamp, FrameRate, TimeValue, Timestamp};

/// Placement used when a source record carries no region
pub const DEFAULT_REGION: &str = "bottom";

static LINE_BREAK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>").unwrap()
});

// @const: Predefined XML entities and numeric character references
static ENTITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#[xX]([0-9A-Fa-f]{1,6})|#([0-9]{1,7})|(lt|gt|quot|apos|amp));").unwrap()
});

/// One caption or subtitle display interval
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimedEvent {
    start: Timestamp,
    stop: Timestamp,
    region: String,
    text: String,
}

impl TimedEvent {
    /// Create an event. Ordering of `start`/`stop` is checked by the overlap detector.
    pub fn new(start: Timestamp, stop: Timestamp, region: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            start,
            stop,
            region: region.into(),
            text: text.into(),
        }
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn stop(&self) -> Timestamp {
        self.stop
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the event stops at or after its start
    pub fn is_well_formed(&self) -> bool {
        self.stop >= self.start
    }

    /// Display duration in microseconds (0 for malformed events)
    pub fn duration_micros(&self) -> u64 {
        self.stop.as_micros().saturating_sub(self.start.as_micros())
    }
}

impl fmt::Display for TimedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} --> {} [{}] {}",
            self.start,
            self.stop,
            self.region,
            self.text.replace('\n', " / ")
        )
    }
}

/// Ordered collection of events from one source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTrack {
    /// Name used in logs and error messages ("captions", "subtitles", ...)
    label: String,

    events: Vec<TimedEvent>,
}

impl EventTrack {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            events: Vec::new(),
        }
    }

    pub fn from_events(label: impl Into<String>, events: Vec<TimedEvent>) -> Self {
        Self {
            label: label.into(),
            events,
        }
    }

    /// Rename the track, keeping its events
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn push(&mut self, event: TimedEvent) {
        self.events.push(event);
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    pub fn get(&self, index: usize) -> Option<&TimedEvent> {
        self.events.get(index)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimedEvent> {
        self.events.iter()
    }

    /// Reject the track if any event stops before it starts
    pub fn validate(&self) -> Result<(), TrackError> {
        match self.events.iter().position(|e| !e.is_well_formed()) {
            Some(index) => {
                let event = &self.events[index];
                Err(TrackError::MalformedTrack {
                    track: self.label.clone(),
                    index,
                    start: event.start.to_string(),
                    stop: event.stop.to_string(),
                })
            }
            None => Ok(()),
        }
    }
}

impl<'a> IntoIterator for &'a EventTrack {
    type Item = &'a TimedEvent;
    type IntoIter = std::slice::Iter<'a, TimedEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// A timed-text record as produced by a decoder or markup parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub begin: TimeValue,
    pub end: TimeValue,
    #[serde(default)]
    pub region: Option<String>,
    pub text: String,
}

impl RawRecord {
    pub fn new(
        begin: impl Into<TimeValue>,
        end: impl Into<TimeValue>,
        region: Option<&str>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            begin: begin.into(),
            end: end.into(),
            region: region.map(str::to_string),
            text: text.into(),
        }
    }
}

/// Settings for turning raw records into a track
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Rate the source timecodes were authored at
    pub frame_rate: FrameRate,
    /// Rate to re-time the frames onto, if the track must be conformed
    pub target_frame_rate: Option<FrameRate>,
    /// Region for records that carry none
    pub default_region: String,
    /// Track label
    pub label: String,
}

impl NormalizeOptions {
    pub fn new(frame_rate: FrameRate) -> Self {
        Self {
            frame_rate,
            target_frame_rate: None,
            default_region: DEFAULT_REGION.to_string(),
            label: String::new(),
        }
    }

    pub fn target(mut self, target_frame_rate: Option<FrameRate>) -> Self {
        self.target_frame_rate = target_frame_rate;
        self
    }

    pub fn default_region(mut self, region: impl Into<String>) -> Self {
        self.default_region = region.into();
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Convert raw records into a canonical track.
///
/// Timecodes are parsed at `frame_rate` and, when `target_frame_rate` is
/// given, moved onto the target rate frame by frame.
pub fn normalize(
    records: &[RawRecord],
    frame_rate: FrameRate,
    target_frame_rate: Option<FrameRate>,
) -> Result<EventTrack, TimecodeError> {
    normalize_with(records, &NormalizeOptions::new(frame_rate).target(target_frame_rate))
}

/// `normalize` with explicit options
pub fn normalize_with(records: &[RawRecord], options: &NormalizeOptions) -> Result<EventTrack, TimecodeError> {
    let mut track = EventTrack::new(options.label.clone());

    for (index, record) in records.iter().enumerate() {
        let start = normalize_time(&record.begin, index, "begin", options)?;
        let stop = normalize_time(&record.end, index, "end", options)?;

        let region = record
            .region
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(options.default_region.as_str());

        track.push(TimedEvent::new(start, stop, region, normalize_text(&record.text)));
    }

    debug!(
        "Normalized {} record(s) for track '{}' at {}{}",
        track.len(),
        track.label(),
        options.frame_rate,
        options
            .target_frame_rate
            .map(|t| format!(" -> {}", t))
            .unwrap_or_default()
    );

    Ok(track)
}

fn normalize_time(
    value: &TimeValue,
    index: usize,
    field: &str,
    options: &NormalizeOptions,
) -> Result<Timestamp, TimecodeError> {
    if value.is_unrecognized() {
        warn!(
            "Track '{}' record {}: unrecognized {} value {}, using 00:00:00.000",
            options.label, index, field, value
        );
    }

    let time = parse_timestamp(value, options.frame_rate)?;
    Ok(match options.target_frame_rate {
        Some(target) => convert_frame_rate(time, options.frame_rate, target),
        None => time,
    })
}

/// Decode the source escapes left in event text.
///
/// Line-break markup becomes `\n`. The five predefined XML entities and
/// numeric `&#N;`/`&#xH;` references become their characters. Decoding is a
/// single left-to-right pass, so `&amp;apos;` yields the literal `&apos;`.
/// References to invalid code points are kept as written.
pub fn normalize_text(raw: &str) -> String {
    let text = LINE_BREAK_REGEX.replace_all(raw, "\n");
    ENTITY_REGEX
        .replace_all(&text, |caps: &Captures| decode_entity(caps).unwrap_or_else(|| caps[0].to_string()))
        .into_owned()
}

fn decode_entity(caps: &Captures) -> Option<String> {
    let decoded = if let Some(hex) = caps.get(1) {
        char::from_u32(u32::from_str_radix(hex.as_str(), 16).ok()?)?
    } else if let Some(dec) = caps.get(2) {
        char::from_u32(dec.as_str().parse().ok()?)?
    } else {
        match &caps[3] {
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            _ => '&',
        }
    };
    Some(decoded.to_string())
}

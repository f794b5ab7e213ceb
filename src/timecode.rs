/*!
 * Timecode normalization.
 *
 * Converts the timecode shapes found in caption and subtitle sources into a
 * single canonical time base:
 * - `HH:MM:SS.fff` clock strings (decimal seconds)
 * - `HH:MM:SS:FF` frame strings, relative to the track's frame rate
 * - raw frame counts
 * - absolute seconds
 *
 * The canonical value is a `Timestamp`, a fixed-point count of microseconds.
 * Cross-rate conversion always goes through a whole frame count so repeated
 * conversions never drift.
 */

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::TimecodeError;

const MICROS_PER_SEC: u64 = 1_000_000;
const MICROS_PER_SEC_F64: f64 = 1_000_000.0;

/// Frames per second of a track, validated to be a usable divisor
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct FrameRate(f64);

impl FrameRate {
    /// 23.976 fps, NTSC film (iTT subtitles are usually authored at this rate)
    pub const FPS_23_976: FrameRate = FrameRate(23.976);
    /// 24 fps film
    pub const FPS_24: FrameRate = FrameRate(24.0);
    /// 25 fps PAL
    pub const FPS_25: FrameRate = FrameRate(25.0);
    /// 29.97 fps NTSC broadcast (line 21 captions)
    pub const FPS_29_97: FrameRate = FrameRate(29.97);
    /// 30 fps
    pub const FPS_30: FrameRate = FrameRate(30.0);

    /// Create a frame rate, rejecting zero, negative and non-finite values
    pub fn new(fps: f64) -> Result<Self, TimecodeError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(TimecodeError::InvalidFrameRate(fps));
        }
        Ok(Self(fps))
    }

    /// Frames per second as a float
    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// Integer frames per second used to count frame labels (24 for 23.976)
    pub fn nominal(self) -> u64 {
        (self.0.round() as u64).max(1)
    }
}

impl TryFrom<f64> for FrameRate {
    type Error = TimecodeError;

    fn try_from(fps: f64) -> Result<Self, Self::Error> {
        Self::new(fps)
    }
}

impl From<FrameRate> for f64 {
    fn from(rate: FrameRate) -> Self {
        rate.0
    }
}

impl FromStr for FrameRate {
    type Err = TimecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fps: f64 = s
            .trim()
            .parse()
            .map_err(|_| TimecodeError::malformed(s, "frame rate is not a number"))?;
        Self::new(fps)
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}fps", self.0)
    }
}

/// Canonical time value: elapsed microseconds since 00:00:00.000
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Start of the timeline, also the "could not normalize" sentinel
    pub const ZERO: Timestamp = Timestamp(0);

    pub fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    pub fn as_micros(self) -> u64 {
        self.0
    }

    /// Saturates at the end of the representable timeline
    pub fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000))
    }

    /// Convert seconds to a timestamp, rounding half-to-even to the microsecond
    pub fn from_secs_f64(secs: f64) -> Result<Self, TimecodeError> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(TimecodeError::malformed(
                secs.to_string(),
                "seconds must be a finite, non-negative value",
            ));
        }
        let micros = (secs * MICROS_PER_SEC_F64).round_ties_even();
        if micros >= u64::MAX as f64 {
            return Err(TimecodeError::malformed(secs.to_string(), "timecode out of range"));
        }
        Ok(Self(micros as u64))
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / MICROS_PER_SEC_F64
    }

    /// Time at which frame `frames` starts on a timeline running at `rate`
    pub fn from_frames(frames: u64, rate: FrameRate) -> Self {
        let micros = frames as f64 * MICROS_PER_SEC_F64 / rate.as_f64();
        Self(micros.round_ties_even() as u64)
    }
}

impl fmt::Display for Timestamp {
    /// Formats as `HH:MM:SS.mmm`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis_total = self.0 / 1_000;
        let hours = millis_total / 3_600_000;
        let minutes = (millis_total % 3_600_000) / 60_000;
        let seconds = (millis_total % 60_000) / 1_000;
        let millis = millis_total % 1_000;

        write!(f, "{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
    }
}

/// A raw time value as it appears in a decoded source record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeValue {
    /// Frame count at the track's frame rate
    Frames(u64),
    /// Absolute seconds
    Seconds(f64),
    /// `HH:MM:SS.fff` or `HH:MM:SS:FF`
    Text(String),
    /// Any shape the normalizer does not recognize
    Other(serde_json::Value),
}

impl TimeValue {
    /// Whether `parse_timestamp` will fall back to the zero sentinel for this value
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, TimeValue::Other(_))
    }
}

impl From<&str> for TimeValue {
    fn from(value: &str) -> Self {
        TimeValue::Text(value.to_string())
    }
}

impl From<String> for TimeValue {
    fn from(value: String) -> Self {
        TimeValue::Text(value)
    }
}

impl From<u64> for TimeValue {
    fn from(frames: u64) -> Self {
        TimeValue::Frames(frames)
    }
}

impl From<f64> for TimeValue {
    fn from(secs: f64) -> Self {
        TimeValue::Seconds(secs)
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeValue::Frames(frames) => write!(f, "{} frames", frames),
            TimeValue::Seconds(secs) => write!(f, "{}s", secs),
            TimeValue::Text(text) => write!(f, "{}", text),
            TimeValue::Other(value) => write!(f, "{}", value),
        }
    }
}

/// Normalize a raw time value to the canonical time base.
///
/// Strings use the track's `frame_rate` for their frame component, frame
/// counts are divided by it, and seconds are taken as they are.
/// Unrecognized shapes yield `Timestamp::ZERO` instead of an error; callers
/// are expected to log that case.
pub fn parse_timestamp(value: &TimeValue, frame_rate: FrameRate) -> Result<Timestamp, TimecodeError> {
    match value {
        TimeValue::Text(text) => parse_timecode_str(text, frame_rate),
        TimeValue::Frames(frames) => Ok(Timestamp::from_frames(*frames, frame_rate)),
        TimeValue::Seconds(secs) => Timestamp::from_secs_f64(*secs),
        TimeValue::Other(_) => Ok(Timestamp::ZERO),
    }
}

/// Move a time anchored on `source_rate` frames onto `target_rate` frames.
///
/// The time is first snapped to a whole frame count at the source rate
/// (one half-to-even rounding), and that same frame count is then laid out
/// on the target rate's timeline.
pub fn convert_frame_rate(time: Timestamp, source_rate: FrameRate, target_rate: FrameRate) -> Timestamp {
    let frames = frames_at(time, source_rate);
    Timestamp::from_frames(frames, target_rate)
}

/// Whole frame count reached at `time` on a timeline running at `rate`
pub fn frames_at(time: Timestamp, rate: FrameRate) -> u64 {
    (time.as_micros() as f64 * rate.as_f64() / MICROS_PER_SEC_F64).round_ties_even() as u64
}

/// Frame count of an `HH:MM:SS:FF` label counted at the rate's nominal fps.
///
/// `"00:00:01:12"` at 23.98 fps is 24 + 12 = 36 frames.
pub fn timecode_frames(label: &str, rate: FrameRate) -> Result<u64, TimecodeError> {
    let parts = split_components(label)?;
    let [hours, minutes, seconds, frames] = parts.as_slice() else {
        return Err(TimecodeError::malformed(label, "frame label needs HH:MM:SS:FF"));
    };

    let hours = parse_whole(hours, "hours", label)?;
    let minutes = parse_whole(minutes, "minutes", label)?;
    let seconds = parse_whole(seconds, "seconds", label)?;
    let frames = parse_whole(frames, "frames", label)?;

    clock_seconds(hours, minutes, seconds)
        .and_then(|secs| secs.checked_mul(rate.nominal()))
        .and_then(|count| count.checked_add(frames))
        .ok_or_else(|| TimecodeError::malformed(label, "timecode out of range"))
}

/// Format a timestamp as an `HH:MM:SS:FF` label at `rate`.
///
/// Inverse of the four-component form accepted by `parse_timestamp`: the
/// clock part is whole elapsed seconds and `FF` the frames into that second.
pub fn format_timecode(time: Timestamp, rate: FrameRate) -> String {
    let mut whole_secs = time.as_micros() / MICROS_PER_SEC;
    let remainder = Timestamp::from_micros(time.as_micros() % MICROS_PER_SEC);
    let mut frames = frames_at(remainder, rate);

    if frames >= rate.nominal() {
        whole_secs += 1;
        frames = 0;
    }

    let hours = whole_secs / 3600;
    let minutes = (whole_secs % 3600) / 60;
    let seconds = whole_secs % 60;

    format!("{:02}:{:02}:{:02}:{:02}", hours, minutes, seconds, frames)
}

fn parse_timecode_str(value: &str, frame_rate: FrameRate) -> Result<Timestamp, TimecodeError> {
    let parts = split_components(value)?;

    let (hours, minutes, seconds, frames) = match parts.as_slice() {
        [h, m, s] => (
            parse_whole(h, "hours", value)?,
            parse_whole(m, "minutes", value)?,
            parse_decimal(s, "seconds", value)?,
            None,
        ),
        [h, m, s, f] => (
            parse_whole(h, "hours", value)?,
            parse_whole(m, "minutes", value)?,
            parse_whole(s, "seconds", value)? as f64,
            Some(parse_whole(f, "frames", value)?),
        ),
        _ => {
            return Err(TimecodeError::malformed(
                value,
                format!("expected 3 or 4 components, found {}", parts.len()),
            ));
        }
    };

    let clock_micros = clock_seconds(hours, minutes, 0)
        .and_then(|secs| secs.checked_mul(MICROS_PER_SEC))
        .ok_or_else(|| TimecodeError::malformed(value, "timecode out of range"))?;

    let mut micros = clock_micros as f64 + seconds * MICROS_PER_SEC_F64;
    if let Some(frames) = frames {
        micros += frames as f64 * MICROS_PER_SEC_F64 / frame_rate.as_f64();
    }

    let micros = micros.round_ties_even();
    if !micros.is_finite() || micros >= u64::MAX as f64 {
        return Err(TimecodeError::malformed(value, "timecode out of range"));
    }

    Ok(Timestamp::from_micros(micros as u64))
}

/// `h*3600 + m*60 + s`, or `None` on overflow
fn clock_seconds(hours: u64, minutes: u64, seconds: u64) -> Option<u64> {
    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)
}

fn split_components(value: &str) -> Result<Vec<&str>, TimecodeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TimecodeError::malformed(value, "empty timecode"));
    }
    // ';' separates frames in drop-frame notation
    Ok(trimmed.split([':', ';']).collect())
}

fn parse_whole(component: &str, name: &str, value: &str) -> Result<u64, TimecodeError> {
    if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimecodeError::malformed(
            value,
            format!("{} component '{}' is not a whole number", name, component),
        ));
    }
    component
        .parse()
        .map_err(|_| TimecodeError::malformed(value, format!("{} component is out of range", name)))
}

fn parse_decimal(component: &str, name: &str, value: &str) -> Result<f64, TimecodeError> {
    let valid = !component.is_empty()
        && component.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && component.bytes().filter(|&b| b == b'.').count() <= 1
        && component.bytes().any(|b| b.is_ascii_digit());
    if !valid {
        return Err(TimecodeError::malformed(
            value,
            format!("{} component '{}' is not a decimal number", name, component),
        ));
    }
    component
        .parse()
        .map_err(|_| TimecodeError::malformed(value, format!("{} component is out of range", name)))
}

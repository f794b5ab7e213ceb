/*!
 * Error types for the cuecollide application.
 *
 * This module contains custom error types for the different layers of the
 * checker, using the thiserror crate for ergonomic error definitions.
 * The core (timecodes, overlap detection) returns these typed errors; the
 * application layer wraps them into `AppError` or `anyhow::Error`.
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while normalizing timecodes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimecodeError {
    /// A timestamp string does not match the `HH:MM:SS[.fff]` / `HH:MM:SS:FF` grammar
    #[error("Malformed timecode '{value}': {reason}")]
    MalformedTimecode {
        /// The offending input, as written in the source
        value: String,
        /// What was wrong with it
        reason: String,
    },

    /// A frame rate that is zero, negative or not finite
    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(f64),
}

impl TimecodeError {
    pub(crate) fn malformed(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedTimecode {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by the overlap detector before any comparison happens
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackError {
    /// An event in a track stops before it starts
    #[error("Malformed track '{track}': event {index} stops at {stop} before it starts at {start}")]
    MalformedTrack {
        /// Label of the offending track
        track: String,
        /// Position of the event in its track
        index: usize,
        /// Event start, formatted
        start: String,
        /// Event stop, formatted
        stop: String,
    },
}

/// Errors that can occur while reading caption and subtitle sources
#[derive(Error, Debug)]
pub enum SourceError {
    /// The file is none of the recognized caption/subtitle types
    #[error("Unsupported source format: {0} (expected .scc, .itt, .dfxp, .ttml or .xml)")]
    UnsupportedSourceFormat(String),

    /// SCC streams must go through an external decoder first
    #[error("SCC captions must be converted to DFXP before checking: {0:?}")]
    SccRequiresConversion(PathBuf),

    /// A timed-text element lacks a required attribute
    #[error("<{element}> element is missing the '{attribute}' attribute")]
    MissingAttribute {
        /// The missing attribute
        attribute: String,
        /// The element name
        element: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from timecode normalization
    #[error("Timecode error: {0}")]
    Timecode(#[from] TimecodeError),

    /// Error from overlap detection
    #[error("Track error: {0}")]
    Track(#[from] TrackError),

    /// Error from source reading
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/*!
 * Tests for error types and conversions
 */

use std::path::PathBuf;

use cuecollide::errors::{AppError, SourceError, TimecodeError, TrackError};
use cuecollide::timecode::{parse_timestamp, FrameRate};

#[test]
fn test_timecodeError_malformed_shouldDisplayValueAndReason() {
    let error = parse_timestamp(&"12:34".into(), FrameRate::FPS_25).unwrap_err();
    let display = format!("{}", error);
    assert!(display.contains("Malformed timecode"));
    assert!(display.contains("12:34"));
    assert!(display.contains("found 2"));
}

#[test]
fn test_timecodeError_invalidFrameRate_shouldDisplayRate() {
    let error = FrameRate::new(-1.0).unwrap_err();
    assert_eq!(error, TimecodeError::InvalidFrameRate(-1.0));
    assert!(error.to_string().contains("Invalid frame rate"));
}

#[test]
fn test_trackError_shouldDisplayTrackAndTimes() {
    let error = TrackError::MalformedTrack {
        track: "subtitles".to_string(),
        index: 3,
        start: "00:00:05.000".to_string(),
        stop: "00:00:04.000".to_string(),
    };
    let display = error.to_string();
    assert!(display.contains("subtitles"));
    assert!(display.contains("event 3"));
    assert!(display.contains("00:00:04.000"));
}

#[test]
fn test_sourceError_shouldDisplayCorrectly() {
    let unsupported = SourceError::UnsupportedSourceFormat("ep.srt".to_string());
    assert!(unsupported.to_string().contains("ep.srt"));

    let scc = SourceError::SccRequiresConversion(PathBuf::from("ep.scc"));
    assert!(scc.to_string().contains("converted to DFXP"));

    let missing = SourceError::MissingAttribute {
        attribute: "end".to_string(),
        element: "p".to_string(),
    };
    assert_eq!(missing.to_string(), "<p> element is missing the 'end' attribute");
}

#[test]
fn test_appError_fromLayerErrors_shouldWrapCorrectly() {
    let app_error: AppError = TimecodeError::InvalidFrameRate(0.0).into();
    assert!(matches!(app_error, AppError::Timecode(_)));
    assert!(app_error.to_string().starts_with("Timecode error"));

    let app_error: AppError = SourceError::UnsupportedSourceFormat("x".to_string()).into();
    assert!(matches!(app_error, AppError::Source(_)));

    let app_error = AppError::Config("max_concurrent_jobs must be at least 1".to_string());
    assert!(app_error.to_string().starts_with("Configuration error"));
}

#[test]
fn test_layerErrors_shouldConvertIntoAnyhow() {
    let error: anyhow::Error = TrackError::MalformedTrack {
        track: "a".to_string(),
        index: 0,
        start: "00:00:01.000".to_string(),
        stop: "00:00:00.000".to_string(),
    }
    .into();

    assert!(error.downcast_ref::<TrackError>().is_some());
}

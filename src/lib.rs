/*!
 * # cuecollide - caption/subtitle collision checker
 *
 * A Rust library that finds the moments where a closed-caption track and a
 * subtitle track are on screen at the same time.
 *
 * ## Features
 *
 * - Normalize frame-based and clock-based timecodes to one time base
 * - Conform a track authored at one frame rate onto another
 * - Detect every colliding caption/subtitle pair with a sort-and-sweep pass
 * - Grade collisions by screen region
 * - Read DFXP/TTML captions and iTT subtitles
 * - Write per-file tab-separated reports and an optional JSON report
 * - Check whole delivery folders concurrently
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `timecode`: Frame rates, canonical timestamps and timecode parsing
 * - `timed_text`: Timed events, tracks and record normalization
 * - `overlap`: Overlap detection between two tracks
 * - `regions`: Screen regions and overlap grading
 * - `markup`: TTML-family paragraph extraction
 * - `report`: Overlap reports and their writers
 * - `file_utils`: File system operations and source detection
 * - `app_config`: Configuration management
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod markup;
pub mod overlap;
pub mod regions;
pub mod report;
pub mod timecode;
pub mod timed_text;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{AppError, SourceError, TimecodeError, TrackError};
pub use overlap::{find_overlaps, find_overlaps_brute_force, overlaps, OverlapPair};
pub use timecode::{convert_frame_rate, parse_timestamp, FrameRate, TimeValue, Timestamp};
pub use timed_text::{normalize, normalize_with, EventTrack, RawRecord, TimedEvent};

/*!
 * Integration tests for checking one caption/subtitle pair
 */

use std::fs;

use anyhow::Result;

use cuecollide::app_config::Config;
use cuecollide::app_controller::Controller;
use cuecollide::errors::{AppError, SourceError};
use cuecollide::regions::OverlapSeverity;
use cuecollide::timecode::Timestamp;
use crate::common;

fn controller() -> Controller {
    Controller::with_config(Config::default()).unwrap()
}

/// Test the full check: read both files, detect, grade and write the reports
#[test]
fn test_run_withCollidingPair_shouldWriteReports() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let captions = common::create_test_file(temp_dir.path(), "ep01.dfxp", common::SAMPLE_DFXP)?;
    let subtitles = common::create_test_file(temp_dir.path(), "ep01.itt", common::SAMPLE_ITT)?;
    let out_dir = temp_dir.path().join("results");

    let report = controller().run(&captions, &subtitles, &out_dir)?;

    assert_eq!(report.overlap_count(), 1);
    assert_eq!(report.caption_events, 2);
    assert_eq!(report.subtitle_events, 2);

    let row = &report.rows[0];
    assert_eq!(row.severity, OverlapSeverity::SeparateRegions);
    assert_eq!(row.caption.text(), "Hello");
    assert_eq!(row.subtitle.text(), "World");
    assert_eq!(row.subtitle.start(), Timestamp::from_millis(11_000));
    assert_eq!(row.shared_ms, 1_000);

    let caption_table = fs::read_to_string(out_dir.join("ep01.dfxp_overlaps.txt"))?;
    let subtitle_table = fs::read_to_string(out_dir.join("ep01.itt_overlaps.txt"))?;
    assert_eq!(caption_table.lines().nth(1), Some("0\t00:00:10.000\t00:00:12.000\tbottom\tHello"));
    assert_eq!(subtitle_table.lines().nth(1), Some("0\t00:00:11.000\t00:00:13.000\ttop\tWorld"));
    assert!(!out_dir.join("ep01_overlaps.json").exists());
    Ok(())
}

#[test]
fn test_run_withJsonEnabled_shouldAlsoWriteJson() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let captions = common::create_test_file(temp_dir.path(), "ep01.dfxp", common::SAMPLE_DFXP)?;
    let subtitles = common::create_test_file(temp_dir.path(), "ep01.itt", common::SAMPLE_ITT)?;
    let out_dir = temp_dir.path().join("results");

    let mut config = Config::default();
    config.write_json = true;
    let controller = Controller::with_config(config)?;

    controller.run(&captions, &subtitles, &out_dir)?;

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out_dir.join("ep01_overlaps.json"))?)?;
    assert_eq!(json["counts"]["separate_regions"], 1);
    Ok(())
}

#[test]
fn test_checkPair_withCleanSubtitles_shouldFindNothing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let captions = common::create_test_file(temp_dir.path(), "ep02.dfxp", common::SAMPLE_DFXP)?;
    let subtitles = common::create_test_file(temp_dir.path(), "ep02.itt", common::CLEAN_ITT)?;

    let report = controller().check_pair(&captions, &subtitles)?;

    assert!(report.is_clean());
    assert_eq!(report.subtitle_events, 1);
    Ok(())
}

#[test]
fn test_checkPair_withSccCaptions_shouldAskForConversion() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let captions = common::create_test_file(temp_dir.path(), "ep01.scc", "Scenarist_SCC V1.0")?;
    let subtitles = common::create_test_file(temp_dir.path(), "ep01.itt", common::SAMPLE_ITT)?;

    let err = controller().check_pair(&captions, &subtitles).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Source(SourceError::SccRequiresConversion(_)))
    ));
    Ok(())
}

#[test]
fn test_checkPair_withUnsupportedFormat_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let captions = common::create_test_file(temp_dir.path(), "ep01.srt", "1\n00:00:01,000 --> 00:00:02,000\nHi\n")?;
    let subtitles = common::create_test_file(temp_dir.path(), "ep01.itt", common::SAMPLE_ITT)?;

    let err = controller().check_pair(&captions, &subtitles).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Source(SourceError::UnsupportedSourceFormat(_)))
    ));
    Ok(())
}

#[test]
fn test_checkPair_withInvertedEvent_shouldRejectTrack() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let captions = common::create_test_file(temp_dir.path(), "ep01.dfxp", common::SAMPLE_DFXP)?;
    let subtitles = common::create_test_file(
        temp_dir.path(),
        "ep01.itt",
        r#"<tt><body><div><p begin="00:00:05:00" end="00:00:04:00">Backwards</p></div></body></tt>"#,
    )?;

    let err = controller().check_pair(&captions, &subtitles).unwrap_err();

    assert!(matches!(err.downcast_ref::<AppError>(), Some(AppError::Track(_))));
    assert!(err.to_string().contains("Malformed track 'subtitles'"));
    Ok(())
}

#[test]
fn test_run_withMissingInput_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let subtitles = common::create_test_file(temp_dir.path(), "ep01.itt", common::SAMPLE_ITT)?;

    let result = controller().run(&temp_dir.path().join("ep01.dfxp"), &subtitles, temp_dir.path());

    assert!(result.is_err());
    Ok(())
}

#[test]
fn test_checkPair_withUnreadableFile_shouldReportFileError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let subtitles = common::create_test_file(temp_dir.path(), "ep01.itt", common::SAMPLE_ITT)?;

    let err = controller()
        .check_pair(&temp_dir.path().join("missing.dfxp"), &subtitles)
        .unwrap_err();

    assert!(matches!(err.downcast_ref::<AppError>(), Some(AppError::File(_))));
    assert!(format!("{:#}", err).contains("Failed to load captions"));
    Ok(())
}

#[test]
fn test_withConfig_withInvalidConfig_shouldFail() {
    let mut config = Config::default();
    config.max_concurrent_jobs = 0;

    let err = Controller::with_config(config).err().unwrap();
    assert!(matches!(err.downcast_ref::<AppError>(), Some(AppError::Config(msg)) if msg.contains("max_concurrent_jobs")));
}

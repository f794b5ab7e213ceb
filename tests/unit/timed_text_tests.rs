/*!
 * Tests for timed events, tracks and record normalization
 */

use cuecollide::errors::{TimecodeError, TrackError};
use cuecollide::timecode::{convert_frame_rate, FrameRate, TimeValue, Timestamp};
use cuecollide::timed_text::{
    normalize, normalize_text, normalize_with, EventTrack, NormalizeOptions, RawRecord,
};
use crate::common;

#[test]
fn test_normalize_withMixedShapes_shouldProduceCanonicalTimes() {
    let records = vec![
        RawRecord::new("00:00:01.000", "00:00:02:15", Some("top"), "clock and frames"),
        RawRecord::new(75u64, 4.5, None, "frames and seconds"),
    ];

    let track = normalize(&records, FrameRate::FPS_25, None).unwrap();

    assert_eq!(track.len(), 2);
    assert_eq!(track.events()[0].start(), Timestamp::from_millis(1_000));
    assert_eq!(track.events()[0].stop(), Timestamp::from_millis(2_600));
    assert_eq!(track.events()[1].start(), Timestamp::from_millis(3_000));
    assert_eq!(track.events()[1].stop(), Timestamp::from_millis(4_500));
    assert_eq!(track.events()[1].region(), "bottom");
}

#[test]
fn test_normalize_withTargetRate_shouldConformEachTime() {
    let records = vec![RawRecord::new("00:00:01:12", "00:00:02:00", None, "x")];
    let source = FrameRate::FPS_23_976;
    let target = FrameRate::FPS_29_97;

    let plain = normalize(&records, source, None).unwrap();
    let conformed = normalize(&records, source, Some(target)).unwrap();

    assert_eq!(
        conformed.events()[0].start(),
        convert_frame_rate(plain.events()[0].start(), source, target)
    );
    // 36 frames laid out at 29.97
    assert_eq!(conformed.events()[0].start(), Timestamp::from_frames(36, target));
    assert_eq!(conformed.events()[0].stop(), Timestamp::from_frames(48, target));
}

#[test]
fn test_normalize_shouldKeepOrderAndSameStartEvents() {
    let records = vec![
        RawRecord::new("00:00:05.000", "00:00:06.000", None, "later"),
        RawRecord::new("00:00:01.000", "00:00:02.000", None, "first"),
        RawRecord::new("00:00:01.000", "00:00:02.000", None, "first"),
    ];

    let track = normalize(&records, FrameRate::FPS_25, None).unwrap();

    let texts: Vec<&str> = track.iter().map(|e| e.text()).collect();
    assert_eq!(texts, vec!["later", "first", "first"]);
}

#[test]
fn test_normalize_withUnrecognizedValue_shouldUseZeroSentinel() {
    common::init_logging();
    let records = vec![RawRecord {
        begin: TimeValue::Other(serde_json::Value::Null),
        end: "00:00:01.000".into(),
        region: None,
        text: "x".to_string(),
    }];

    let track = normalize(&records, FrameRate::FPS_25, None).unwrap();

    assert_eq!(track.events()[0].start(), Timestamp::ZERO);
    assert_eq!(track.events()[0].stop(), Timestamp::from_millis(1_000));
}

#[test]
fn test_normalize_withMalformedTimecode_shouldFail() {
    let records = vec![RawRecord::new("00:00:01.000", "1:2", None, "x")];

    let err = normalize(&records, FrameRate::FPS_25, None).unwrap_err();

    assert!(matches!(err, TimecodeError::MalformedTimecode { ref value, .. } if value == "1:2"));
}

#[test]
fn test_normalize_shouldDecodeTextEscapes() {
    let records = vec![RawRecord::new(
        "00:00:01.000",
        "00:00:02.000",
        None,
        "Don&apos;t<br/>stop &amp; go&#39;",
    )];

    let track = normalize(&records, FrameRate::FPS_25, None).unwrap();

    assert_eq!(track.events()[0].text(), "Don't\nstop & go'");
}

#[test]
fn test_normalizeText_withPlainText_shouldBeUnchanged() {
    assert_eq!(normalize_text("Plain line"), "Plain line");
    assert_eq!(normalize_text(""), "");
}

#[test]
fn test_normalizeWith_shouldApplyLabelAndDefaultRegion() {
    let records = vec![
        RawRecord::new("00:00:01.000", "00:00:02.000", None, "a"),
        RawRecord::new("00:00:01.000", "00:00:02.000", Some("  "), "b"),
    ];
    let options = NormalizeOptions::new(FrameRate::FPS_25)
        .default_region("r3")
        .label("subtitles");

    let track = normalize_with(&records, &options).unwrap();

    assert_eq!(track.label(), "subtitles");
    assert!(track.iter().all(|e| e.region() == "r3"));
}

#[test]
fn test_rawRecord_deserialize_shouldAcceptDecoderJson() {
    let json = r#"[
        {"begin": "00:00:01:00", "end": 48, "region": "top", "text": "a"},
        {"begin": 2.5, "end": "00:00:03.000", "text": "b"}
    ]"#;

    let records: Vec<RawRecord> = serde_json::from_str(json).unwrap();
    let track = normalize(&records, FrameRate::FPS_24, None).unwrap();

    assert_eq!(records[1].region, None);
    assert_eq!(track.events()[0].stop(), Timestamp::from_millis(2_000));
    assert_eq!(track.events()[1].start(), Timestamp::from_millis(2_500));
}

#[test]
fn test_validate_withInvertedEvent_shouldReportPosition() {
    let track = common::track("captions", &[(0, 1_000), (5_000, 4_000)]);

    let err = track.validate().unwrap_err();

    let TrackError::MalformedTrack { track: label, index, start, stop } = err;
    assert_eq!(label, "captions");
    assert_eq!(index, 1);
    assert_eq!(start, "00:00:05.000");
    assert_eq!(stop, "00:00:04.000");
}

#[test]
fn test_validate_withZeroDurationEvent_shouldPass() {
    let track = common::track("captions", &[(1_000, 1_000)]);
    assert!(track.validate().is_ok());
    assert_eq!(track.events()[0].duration_micros(), 0);
}

#[test]
fn test_eventTrack_push_shouldAppendInOrder() {
    let mut track = EventTrack::new("captions");
    assert!(track.is_empty());

    track.push(common::event(0, 10, "bottom", "a"));
    track.push(common::event(5, 15, "top", "b"));

    assert_eq!(track.len(), 2);
    assert_eq!(track.get(1).map(|e| e.text()), Some("b"));
    assert_eq!((&track).into_iter().count(), 2);
}

#[test]
fn test_normalizeText_withEscapedEntity_shouldDecodeOnce() {
    assert_eq!(normalize_text("&amp;quot; &amp;#233;"), "&quot; &#233;");
    assert_eq!(normalize_text("&#x27;&#39;&apos;"), "'''");
}

//! Integration tests for binary frame extraction
//!
//! Exercises the full driver path over synthetic telemetry files:
//! fixed-length frames behind a 4-byte sync pattern, with corruption,
//! stray inter-frame bytes, and truncated tails.

use particle_ingest::app::models::{DecodeError, FieldValue};
use particle_ingest::config::{
    BinaryField, BinaryFieldKind, DecoderConfig, EpochBase, FrameLayout, FrameLength, FrameSpec,
    SyncPattern, TimestampSource,
};
use particle_ingest::driver::{CollectingReporter, IngestDriver};
use std::io::Write;

const SYNC: [u8; 4] = [0xa3, 0x9d, 0x7a, 0x02];
const FRAME_LEN: usize = 144;

/// A 144-byte fixed frame: sync, a seconds counter, attitude fields,
/// and a block of spectral channel counts.
fn adcp_config() -> DecoderConfig {
    DecoderConfig::BinaryFrames(FrameSpec {
        sync: SyncPattern::Literal {
            bytes: SYNC.to_vec(),
        },
        length: FrameLength::Fixed { bytes: FRAME_LEN },
        layout: FrameLayout::Single {
            record_type: "adcp_velocity".to_string(),
            fields: vec![
                BinaryField {
                    name: "ensemble_seconds".to_string(),
                    offset: 4,
                    kind: BinaryFieldKind::U32,
                },
                BinaryField {
                    name: "heading".to_string(),
                    offset: 8,
                    kind: BinaryFieldKind::U16,
                },
                BinaryField {
                    name: "pitch".to_string(),
                    offset: 10,
                    kind: BinaryFieldKind::I16,
                },
                BinaryField {
                    name: "speed_of_sound".to_string(),
                    offset: 12,
                    kind: BinaryFieldKind::F32,
                },
                BinaryField {
                    name: "channel_counts".to_string(),
                    offset: 16,
                    kind: BinaryFieldKind::U16Array { count: 64 },
                },
            ],
        },
        timestamp: TimestampSource::EpochField {
            field: "ensemble_seconds".to_string(),
            epoch: EpochBase::Ntp,
        },
    })
}

fn build_frame(seconds: u32, heading: u16) -> Vec<u8> {
    let mut frame = Vec::with_capacity(FRAME_LEN);
    frame.extend_from_slice(&SYNC);
    frame.extend_from_slice(&seconds.to_be_bytes());
    frame.extend_from_slice(&heading.to_be_bytes());
    frame.extend_from_slice(&(-3i16).to_be_bytes());
    frame.extend_from_slice(&1500.5f32.to_be_bytes());
    for channel in 0..64u16 {
        frame.extend_from_slice(&channel.to_be_bytes());
    }
    frame.resize(FRAME_LEN, 0);
    assert_eq!(frame.len(), FRAME_LEN);
    frame
}

fn write_temp(data: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn three_clean_frames_decode_in_file_order() {
    let mut data = Vec::new();
    for n in 0..3u32 {
        data.extend(build_frame(3_600_000_000 + n, 100 + n as u16));
    }
    let file = write_temp(&data);

    let driver = IngestDriver::new(adcp_config()).unwrap();
    let result = driver.process(file.path()).unwrap();

    assert!(!result.had_failures());
    let particles = result.particles.particles("adcp_velocity");
    assert_eq!(particles.len(), 3);
    for (n, particle) in particles.iter().enumerate() {
        assert_eq!(
            particle.get("heading"),
            Some(&FieldValue::Integer(100 + n as i64))
        );
        assert_eq!(
            particle.internal_timestamp(),
            Some(3_600_000_000.0 + n as f64)
        );
    }
    match particles[0].get("channel_counts") {
        Some(FieldValue::FloatArray(counts)) => {
            assert_eq!(counts.len(), 64);
            assert_eq!(counts[5], 5.0);
        }
        other => panic!("expected channel array, got {:?}", other),
    }
}

#[test]
fn truncated_file_yields_one_particle_and_one_truncated_frame() {
    // One full frame plus 6 stray bytes that begin with the sync pattern
    let mut data = build_frame(3_600_000_000, 100);
    let second = build_frame(3_600_000_001, 101);
    data.extend_from_slice(&second[..6]);
    assert_eq!(data.len(), 150);
    let file = write_temp(&data);

    let driver = IngestDriver::new(adcp_config()).unwrap();
    let mut reporter = CollectingReporter::default();
    let result = driver
        .process_with_reporter(file.path(), &mut reporter)
        .unwrap();

    assert!(result.had_failures());
    assert_eq!(result.particles.total_count(), 1);
    assert_eq!(reporter.reports.len(), 1);
    assert_eq!(
        reporter.reports[0],
        (
            144,
            DecodeError::TruncatedFrame {
                declared: 144,
                available: 6
            }
        )
    );
}

#[test]
fn stray_bytes_before_frame_resync_as_one_failure() {
    let stray = [0x00u8, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99];
    let mut data = stray.to_vec();
    data.extend(build_frame(3_600_000_000, 42));
    let file = write_temp(&data);

    let driver = IngestDriver::new(adcp_config()).unwrap();
    let mut reporter = CollectingReporter::default();
    let result = driver
        .process_with_reporter(file.path(), &mut reporter)
        .unwrap();

    assert_eq!(result.particles.total_count(), 1);
    assert_eq!(reporter.reports.len(), 1);
    assert_eq!(
        reporter.reports[0],
        (0, DecodeError::UnrecognizedData { skipped: 10 })
    );
    assert_eq!(
        result.particles.particles("adcp_velocity")[0].get("heading"),
        Some(&FieldValue::Integer(42))
    );
}

#[test]
fn one_corrupt_frame_between_valid_frames_is_isolated() {
    // Five frames, the third with its sync signature destroyed
    let mut data = Vec::new();
    for n in 0..5u32 {
        let mut frame = build_frame(3_600_000_000 + n, n as u16);
        if n == 2 {
            frame[0] = 0x00; // break the sync pattern
        }
        data.extend(frame);
    }
    let file = write_temp(&data);

    let driver = IngestDriver::new(adcp_config()).unwrap();
    let mut reporter = CollectingReporter::default();
    let result = driver
        .process_with_reporter(file.path(), &mut reporter)
        .unwrap();

    // Four particles survive; the corrupt frame costs exactly one failure
    assert_eq!(result.particles.total_count(), 4);
    assert_eq!(reporter.reports.len(), 1);
    assert_eq!(
        reporter.reports[0],
        (
            2 * FRAME_LEN as u64,
            DecodeError::UnrecognizedData {
                skipped: FRAME_LEN
            }
        )
    );

    // Stream order is preserved around the gap
    let headings: Vec<i64> = result
        .particles
        .particles("adcp_velocity")
        .iter()
        .map(|p| match p.get("heading") {
            Some(FieldValue::Integer(h)) => *h,
            other => panic!("expected heading, got {:?}", other),
        })
        .collect();
    assert_eq!(headings, vec![0, 1, 3, 4]);
}

#[test]
fn two_passes_over_same_file_are_identical() {
    let mut data = vec![0xde, 0xad]; // noise
    data.extend(build_frame(3_600_000_000, 7));
    data.extend_from_slice(&SYNC); // truncated tail
    let file = write_temp(&data);

    let driver = IngestDriver::new(adcp_config()).unwrap();
    let mut first_reporter = CollectingReporter::default();
    let first = driver
        .process_with_reporter(file.path(), &mut first_reporter)
        .unwrap();
    let mut second_reporter = CollectingReporter::default();
    let second = driver
        .process_with_reporter(file.path(), &mut second_reporter)
        .unwrap();

    assert_eq!(first_reporter.reports, second_reporter.reports);
    assert_eq!(
        first.particles.particles("adcp_velocity"),
        second.particles.particles("adcp_velocity")
    );
    assert_eq!(first.stats.errors, second.stats.errors);
}

#[test]
fn empty_file_is_a_clean_empty_pass() {
    let file = write_temp(&[]);
    let driver = IngestDriver::new(adcp_config()).unwrap();
    let result = driver.process(file.path()).unwrap();
    assert_eq!(result.particles.total_count(), 0);
    assert!(!result.had_failures());
}

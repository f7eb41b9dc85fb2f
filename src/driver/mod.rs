//! Driver orchestration for one extraction pass
//!
//! The driver defines the top-level contract every instrument
//! configuration relies on: open the source, run the extraction engine
//! to exhaustion, route particles to the sink and failures to the
//! reporter, and return the accumulated results with a sticky
//! `had_failures` flag. A pass with unreadable records is still a
//! successful pass; only open/configuration problems are fatal.

pub mod reporter;
pub mod stats;

pub use reporter::{CollectingReporter, FailureReporter, TracingReporter};
pub use stats::IngestStats;

use crate::app::models::{DecodeOutcome, ParticleSet, ParticleSink};
use crate::app::services::extraction_engine::ExtractionEngine;
use crate::config::DecoderConfig;
use crate::{Error, Result};
use std::path::Path;
use tracing::{debug, info};

/// Result of one driver pass over one source file
#[derive(Debug)]
pub struct IngestResult {
    /// Particles accumulated by record-type tag
    pub particles: ParticleSet,
    /// Outcome counts and failure descriptions
    pub stats: IngestStats,
}

impl IngestResult {
    /// Whether any record in the source was unreadable
    pub fn had_failures(&self) -> bool {
        self.particles.had_failures()
    }
}

/// Orchestrates extraction over source files for one configuration
#[derive(Debug)]
pub struct IngestDriver {
    config: DecoderConfig,
}

impl IngestDriver {
    /// Create a driver, validating the configuration up front
    pub fn new(config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The validated configuration this driver runs
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Process one source file with the default tracing reporter
    pub fn process(&self, path: &Path) -> Result<IngestResult> {
        let mut reporter = TracingReporter;
        self.process_with_reporter(path, &mut reporter)
    }

    /// Process one source file, routing failures to `reporter`
    ///
    /// Opening errors are fatal and returned without running the
    /// engine. The file handle is scoped to the read and released on
    /// every exit path.
    pub fn process_with_reporter(
        &self,
        path: &Path,
        reporter: &mut dyn FailureReporter,
    ) -> Result<IngestResult> {
        if !path.is_file() {
            return Err(Error::file_not_found(path.display().to_string()));
        }
        info!("Processing source file: {}", path.display());

        let data = std::fs::read(path)
            .map_err(|e| Error::io(format!("Failed to read {}", path.display()), e))?;

        self.process_bytes(data, reporter).map_err(|e| match e {
            // Name the offending file in the UTF-8 diagnostic
            Error::InvalidUtf8 { .. } => Error::invalid_utf8(path.display().to_string()),
            other => other,
        })
    }

    /// Run the engine to exhaustion over already-read source bytes
    pub fn process_bytes(
        &self,
        data: Vec<u8>,
        reporter: &mut dyn FailureReporter,
    ) -> Result<IngestResult> {
        let engine = ExtractionEngine::new(&self.config, data)?;
        let mut particles = ParticleSet::new();
        let mut stats = IngestStats::new();

        for outcome in engine {
            stats.outcomes_total += 1;
            match outcome {
                DecodeOutcome::Particle(particle) => {
                    stats.particles_decoded += 1;
                    let tag = particle.record_type().to_string();
                    particles.add_particle(&tag, particle);
                }
                DecodeOutcome::Failure(failure) => {
                    stats.failures += 1;
                    stats
                        .errors
                        .push(format!("offset {}: {}", failure.offset.index, failure.reason));
                    reporter.report(&failure);
                    particles.mark_failure();
                    // Raw payload dropped here; failures are not replayable
                }
            }
        }

        debug!(
            "Pass complete: {} particle(s), {} failure(s)",
            stats.particles_decoded, stats.failures
        );
        Ok(IngestResult { particles, stats })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::DecodeError;
    use crate::config::{
        FrameLayout, FrameLength, FrameSpec, SyncPattern, TextField, TextFieldKind, TextSpec,
        TimestampSource,
    };
    use crate::config::{BinaryField, BinaryFieldKind};
    use std::io::Write;

    fn frame_config() -> DecoderConfig {
        DecoderConfig::BinaryFrames(FrameSpec {
            sync: SyncPattern::Literal {
                bytes: vec![0xa3, 0x9d],
            },
            length: FrameLength::Fixed { bytes: 6 },
            layout: FrameLayout::Single {
                record_type: "velocity".to_string(),
                fields: vec![BinaryField {
                    name: "heading".to_string(),
                    offset: 2,
                    kind: BinaryFieldKind::U32,
                }],
            },
            timestamp: TimestampSource::None,
        })
    }

    fn frame(value: u32) -> Vec<u8> {
        let mut data = vec![0xa3, 0x9d];
        data.extend_from_slice(&value.to_be_bytes());
        data
    }

    #[test]
    fn test_process_missing_file_is_fatal() {
        let driver = IngestDriver::new(frame_config()).unwrap();
        let err = driver
            .process(Path::new("/nonexistent/source.dat"))
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_clean_file_has_no_failures() {
        let driver = IngestDriver::new(frame_config()).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&frame(1)).unwrap();
        file.write_all(&frame(2)).unwrap();
        file.flush().unwrap();

        let result = driver.process(file.path()).unwrap();
        assert_eq!(result.particles.total_count(), 2);
        assert!(!result.had_failures());
        assert!(result.stats.is_clean());
        assert_eq!(result.stats.success_rate(), 100.0);
    }

    #[test]
    fn test_corrupt_span_sets_sticky_flag_and_reports() {
        let driver = IngestDriver::new(frame_config()).unwrap();
        let mut data = frame(1);
        data.extend_from_slice(&[0x00, 0x11, 0x22]); // inter-frame noise
        data.extend(frame(2));

        let mut reporter = CollectingReporter::default();
        let result = driver.process_bytes(data, &mut reporter).unwrap();

        assert_eq!(result.particles.particles("velocity").len(), 2);
        assert!(result.had_failures());
        assert_eq!(result.stats.failures, 1);
        assert_eq!(reporter.reports.len(), 1);
        assert_eq!(
            reporter.reports[0],
            (6, DecodeError::UnrecognizedData { skipped: 3 })
        );
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let config = DecoderConfig::DelimitedText(TextSpec {
            record_type: String::new(),
            delimiter: ',',
            dcl_prefix: false,
            fields: vec![TextField {
                name: "x".to_string(),
                index: 0,
                kind: TextFieldKind::Float,
            }],
            timestamp: TimestampSource::None,
        });
        assert!(matches!(
            IngestDriver::new(config),
            Err(Error::Configuration { .. })
        ));
    }
}

//! Streaming extraction engine
//!
//! Drives a scanner and decoder over a cursor, producing a lazy, finite
//! sequence of decode outcomes. The failure-isolation invariant lives
//! here: a bad record consumes exactly its own span, is converted into
//! a `Failure` outcome, and never desynchronizes subsequent scanning.
//! The sequence is strictly in stream order and is not restartable; a
//! fresh engine over a fresh cursor is required to re-scan a source.

use crate::app::models::{DecodeFailure, DecodeOutcome, StreamPosition};
use crate::app::services::frame_scanner::{FrameScanner, Scan};
use crate::app::services::record_decoder::{
    BinaryFrameDecoder, CsvLineDecoder, DelimitedLineDecoder,
};
use crate::app::services::stream_cursor::{ByteCursor, LineCursor};
use crate::config::DecoderConfig;
use crate::{Error, Result};
use tracing::error;

/// Extraction engine over one byte source
#[derive(Debug)]
pub struct ExtractionEngine {
    inner: EngineKind,
}

#[derive(Debug)]
enum EngineKind {
    Binary {
        cursor: ByteCursor,
        scanner: FrameScanner,
        decoder: BinaryFrameDecoder,
    },
    Delimited {
        cursor: LineCursor,
        decoder: DelimitedLineDecoder,
    },
    Csv {
        cursor: LineCursor,
        decoder: CsvLineDecoder,
        header_pending: bool,
    },
}

impl ExtractionEngine {
    /// Build an engine over fully read source bytes
    ///
    /// Validates the configuration first; structural problems are fatal
    /// here and nothing is scanned. Text sources must be valid UTF-8.
    pub fn new(config: &DecoderConfig, data: Vec<u8>) -> Result<Self> {
        config.validate()?;
        let inner = match config {
            DecoderConfig::BinaryFrames(spec) => EngineKind::Binary {
                cursor: ByteCursor::new(data),
                scanner: FrameScanner::new(spec)?,
                decoder: BinaryFrameDecoder::new(spec),
            },
            DecoderConfig::DelimitedText(spec) => EngineKind::Delimited {
                cursor: LineCursor::new(&text_content(data)?),
                decoder: DelimitedLineDecoder::new(spec),
            },
            DecoderConfig::CsvTable(spec) => EngineKind::Csv {
                cursor: LineCursor::new(&text_content(data)?),
                decoder: CsvLineDecoder::new(spec),
                header_pending: spec.skip_header,
            },
        };
        Ok(Self { inner })
    }

    /// Current cursor position (byte offset or line number)
    pub fn position(&self) -> StreamPosition {
        match &self.inner {
            EngineKind::Binary { cursor, .. } => cursor.position(),
            EngineKind::Delimited { cursor, .. } => cursor.position(),
            EngineKind::Csv { cursor, .. } => cursor.position(),
        }
    }

    fn next_binary(&mut self) -> Option<DecodeOutcome> {
        let EngineKind::Binary {
            cursor,
            scanner,
            decoder,
        } = &mut self.inner
        else {
            unreachable!("binary step on non-binary engine");
        };

        match scanner.next_candidate(cursor) {
            Ok(Scan::Exhausted) => None,
            Ok(Scan::Corrupt(failure)) => Some(DecodeOutcome::Failure(failure)),
            Ok(Scan::Candidate { offset, raw }) => Some(match decoder.decode(&raw) {
                Ok(particle) => DecodeOutcome::Particle(particle),
                Err(reason) => DecodeOutcome::Failure(DecodeFailure {
                    reason,
                    offset,
                    raw,
                }),
            }),
            Err(e) => {
                // Cursor misuse is a bug, not a data condition
                error!("frame scan aborted: {}", e);
                None
            }
        }
    }

    fn next_line(&mut self) -> Option<DecodeOutcome> {
        loop {
            let (line, offset) = {
                let cursor = match &mut self.inner {
                    EngineKind::Delimited { cursor, .. } => cursor,
                    EngineKind::Csv { cursor, .. } => cursor,
                    EngineKind::Binary { .. } => {
                        unreachable!("line step on binary engine")
                    }
                };
                let offset = cursor.position();
                let line = cursor.peek_line()?.to_string();
                if cursor.advance_lines(1).is_err() {
                    return None;
                }
                (line, offset)
            };

            // Blank lines are consumed without producing an outcome
            if line.trim().is_empty() {
                continue;
            }

            match &mut self.inner {
                EngineKind::Csv {
                    decoder,
                    header_pending,
                    ..
                } => {
                    if *header_pending {
                        *header_pending = false;
                        continue;
                    }
                    return Some(match decoder.decode(&line) {
                        Ok(particle) => DecodeOutcome::Particle(particle),
                        Err(reason) => DecodeOutcome::Failure(DecodeFailure {
                            reason,
                            offset,
                            raw: line.into_bytes(),
                        }),
                    });
                }
                EngineKind::Delimited { decoder, .. } => {
                    return Some(match decoder.decode(&line) {
                        Ok(particle) => DecodeOutcome::Particle(particle),
                        Err(reason) => DecodeOutcome::Failure(DecodeFailure {
                            reason,
                            offset,
                            raw: line.into_bytes(),
                        }),
                    });
                }
                EngineKind::Binary { .. } => unreachable!(),
            }
        }
    }
}

impl Iterator for ExtractionEngine {
    type Item = DecodeOutcome;

    fn next(&mut self) -> Option<DecodeOutcome> {
        match &self.inner {
            EngineKind::Binary { .. } => self.next_binary(),
            EngineKind::Delimited { .. } | EngineKind::Csv { .. } => self.next_line(),
        }
    }
}

fn text_content(data: Vec<u8>) -> Result<String> {
    String::from_utf8(data).map_err(|_| Error::invalid_utf8("<byte source>"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::DecodeError;
    use crate::config::{
        BinaryField, BinaryFieldKind, FrameClass, FrameLayout, FrameLength, FrameSpec,
        SyncPattern, TextField, TextFieldKind, TextSpec, TimestampSource,
    };

    fn discriminated_config() -> DecoderConfig {
        DecoderConfig::BinaryFrames(FrameSpec {
            sync: SyncPattern::Literal { bytes: vec![0x7f] },
            length: FrameLength::Fixed { bytes: 4 },
            layout: FrameLayout::Discriminated {
                offset: 1,
                width: 1,
                classes: vec![FrameClass {
                    tag: vec![0x01],
                    record_type: "instrument".to_string(),
                    fields: vec![BinaryField {
                        name: "counts".to_string(),
                        offset: 2,
                        kind: BinaryFieldKind::U16,
                    }],
                }],
            },
            timestamp: TimestampSource::None,
        })
    }

    fn good_frame(counts: u16) -> Vec<u8> {
        let mut frame = vec![0x7f, 0x01];
        frame.extend_from_slice(&counts.to_be_bytes());
        frame
    }

    #[test]
    fn test_failure_isolation_around_bad_class() {
        // Two good frames with an unknown-class frame between them
        let mut data = good_frame(1);
        data.extend_from_slice(&[0x7f, 0x09, 0x00, 0x00]);
        data.extend(good_frame(2));

        let engine = ExtractionEngine::new(&discriminated_config(), data).unwrap();
        let outcomes: Vec<DecodeOutcome> = engine.collect();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_particle());
        match outcomes[1].as_failure() {
            Some(failure) => {
                assert!(matches!(
                    failure.reason,
                    DecodeError::UnknownRecordClass { .. }
                ));
                assert_eq!(failure.offset.index, 4);
                assert_eq!(failure.raw.len(), 4);
            }
            None => panic!("expected failure outcome"),
        }
        assert!(outcomes[2].is_particle());
    }

    #[test]
    fn test_determinism_across_passes() {
        let mut data = vec![0xee, 0xee]; // leading noise
        data.extend(good_frame(7));
        data.extend_from_slice(&[0x7f, 0x01]); // truncated tail

        let first: Vec<DecodeOutcome> =
            ExtractionEngine::new(&discriminated_config(), data.clone())
                .unwrap()
                .collect();
        let second: Vec<DecodeOutcome> = ExtractionEngine::new(&discriminated_config(), data)
            .unwrap()
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_span_coverage_no_gap_no_overlap() {
        let mut data = vec![0xee; 3];
        data.extend(good_frame(1));
        data.extend(good_frame(2));
        data.extend_from_slice(&[0x7f, 0x01, 0x00]); // truncated tail
        let total = data.len() as u64;

        let mut engine = ExtractionEngine::new(&discriminated_config(), data).unwrap();
        let mut last = engine.position().index;
        assert_eq!(last, 0);
        while let Some(_outcome) = engine.next() {
            let now = engine.position().index;
            assert!(now > last, "cursor must advance with every outcome");
            last = now;
        }
        assert_eq!(last, total, "consumed spans must cover the whole source");
    }

    fn delimited_config() -> DecoderConfig {
        DecoderConfig::DelimitedText(TextSpec {
            record_type: "phsen_sample".to_string(),
            delimiter: ',',
            dcl_prefix: false,
            fields: vec![TextField {
                name: "ph".to_string(),
                index: 1,
                kind: TextFieldKind::Float,
            }],
            timestamp: TimestampSource::None,
        })
    }

    #[test]
    fn test_text_blank_lines_consumed_without_outcome() {
        let data = b"A,7.9\n\n\nA,8.1\n".to_vec();
        let outcomes: Vec<DecodeOutcome> = ExtractionEngine::new(&delimited_config(), data)
            .unwrap()
            .collect();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(DecodeOutcome::is_particle));
    }

    #[test]
    fn test_text_failure_isolation() {
        let data = b"A,7.9\nA,bad\nA,8.1\n".to_vec();
        let outcomes: Vec<DecodeOutcome> = ExtractionEngine::new(&delimited_config(), data)
            .unwrap()
            .collect();
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_particle());
        let failure = outcomes[1].as_failure().expect("middle line fails");
        assert_eq!(failure.offset.index, 1);
        assert_eq!(failure.raw, b"A,bad".to_vec());
        assert!(outcomes[2].is_particle());
    }

    #[test]
    fn test_invalid_utf8_text_source_is_fatal() {
        let data = vec![0xff, 0xfe, 0x00];
        let result = ExtractionEngine::new(&delimited_config(), data);
        assert!(matches!(result, Err(Error::InvalidUtf8 { .. })));
    }
}

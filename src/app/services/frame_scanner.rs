//! Binary frame synchronization and scanning
//!
//! Locates candidate frames in a byte stream by testing a sync pattern
//! at the current offset. On mismatch the scanner slips one byte and
//! retries, so corruption between frames costs at most one
//! `UnrecognizedData` failure spanning the skipped bytes and never loses
//! the frames that follow. Telemetry files routinely end mid-frame;
//! a sync match whose declared length runs past end of stream is
//! reported as a single `TruncatedFrame` failure consuming the tail.
//!
//! Worst-case resynchronization cost is O(stream length). That is the
//! accepted policy for corrupt inputs.

use crate::app::models::{DecodeError, DecodeFailure, StreamPosition};
use crate::app::services::stream_cursor::ByteCursor;
use crate::config::{FrameLength, FrameSpec, SyncPattern};
use crate::{Error, Result};
use tracing::trace;

/// Result of one scan step
#[derive(Debug, Clone, PartialEq)]
pub enum Scan {
    /// A full candidate frame; the cursor has advanced past it
    Candidate {
        offset: StreamPosition,
        raw: Vec<u8>,
    },
    /// A corrupt span; the cursor has advanced past it
    Corrupt(DecodeFailure),
    /// End of stream, nothing left to scan
    Exhausted,
}

/// Compiled sync matcher, built once per pass
#[derive(Debug)]
enum SyncMatcher {
    Literal(Vec<u8>),
    Pattern(regex::bytes::Regex),
}

impl SyncMatcher {
    fn matches(&self, window: &[u8]) -> bool {
        match self {
            SyncMatcher::Literal(bytes) => window == bytes.as_slice(),
            SyncMatcher::Pattern(regex) => regex.is_match(window),
        }
    }
}

/// Scanner over binary telemetry frames
#[derive(Debug)]
pub struct FrameScanner {
    matcher: SyncMatcher,
    window: usize,
    length: FrameLength,
}

impl FrameScanner {
    /// Build a scanner from a validated frame specification
    pub fn new(spec: &FrameSpec) -> Result<Self> {
        let window = spec.sync.nominal_len();
        let matcher = match &spec.sync {
            SyncPattern::Literal { bytes } => SyncMatcher::Literal(bytes.clone()),
            SyncPattern::Pattern { regex, .. } => {
                let anchored = format!(r"\A(?:{})", regex);
                let compiled = regex::bytes::RegexBuilder::new(&anchored)
                    .unicode(false)
                    .build()
                    .map_err(|e| Error::configuration(format!("Invalid sync regex: {}", e)))?;
                SyncMatcher::Pattern(compiled)
            }
        };
        Ok(Self {
            matcher,
            window,
            length: spec.length.clone(),
        })
    }

    /// Scan for the next candidate frame
    ///
    /// Exactly one of: a candidate frame, a corrupt span, or exhaustion.
    /// The cursor is always advanced past whatever was consumed, so a
    /// following call picks up at the next unconsumed byte.
    pub fn next_candidate(&self, cursor: &mut ByteCursor) -> Result<Scan> {
        let skip_start = cursor.position();
        let mut skipped: Vec<u8> = Vec::new();

        loop {
            if cursor.at_end() {
                if skipped.is_empty() {
                    return Ok(Scan::Exhausted);
                }
                trace!("unrecognized span of {} byte(s) at end of stream", skipped.len());
                return Ok(Scan::Corrupt(DecodeFailure {
                    reason: DecodeError::UnrecognizedData {
                        skipped: skipped.len(),
                    },
                    offset: skip_start,
                    raw: skipped,
                }));
            }

            let window = cursor.peek(self.window);
            if window.len() == self.window && self.matcher.matches(window) {
                if !skipped.is_empty() {
                    // Report the skipped span first; the frame itself is
                    // untouched and becomes the next scan's candidate.
                    return Ok(Scan::Corrupt(DecodeFailure {
                        reason: DecodeError::UnrecognizedData {
                            skipped: skipped.len(),
                        },
                        offset: skip_start,
                        raw: skipped,
                    }));
                }
                return self.take_frame(cursor);
            }

            // Slip one byte and retry
            skipped.push(cursor.peek(1)[0]);
            cursor.advance(1)?;
        }
    }

    /// Consume a frame whose sync pattern matched at the cursor
    fn take_frame(&self, cursor: &mut ByteCursor) -> Result<Scan> {
        let offset = cursor.position();

        let declared = match self.resolve_length(cursor)? {
            Ok(declared) => declared,
            Err(scan) => return Ok(scan),
        };

        if declared > cursor.remaining() {
            let available = cursor.remaining();
            let raw = cursor.peek(available).to_vec();
            cursor.advance(available)?;
            return Ok(Scan::Corrupt(DecodeFailure {
                reason: DecodeError::TruncatedFrame {
                    declared,
                    available,
                },
                offset,
                raw,
            }));
        }

        let raw = cursor.peek(declared).to_vec();
        cursor.advance(declared)?;
        Ok(Scan::Candidate { offset, raw })
    }

    /// Resolve the declared frame length at the cursor position
    ///
    /// Returns the length, or a corrupt-span scan when the length field
    /// itself is truncated or yields an unusable value.
    fn resolve_length(
        &self,
        cursor: &mut ByteCursor,
    ) -> Result<std::result::Result<usize, Scan>> {
        let (field_offset, width, adjustment) = match self.length {
            FrameLength::Fixed { bytes } => return Ok(Ok(bytes)),
            FrameLength::FromField {
                offset,
                width,
                adjustment,
            } => (offset, width, adjustment),
        };

        let offset = cursor.position();
        if field_offset + width > cursor.remaining() {
            // Header cut off before the length field: truncated tail
            let available = cursor.remaining();
            let raw = cursor.peek(available).to_vec();
            cursor.advance(available)?;
            return Ok(Err(Scan::Corrupt(DecodeFailure {
                reason: DecodeError::TruncatedFrame {
                    declared: field_offset + width,
                    available,
                },
                offset,
                raw,
            })));
        }

        let raw_field = cursor.peek_at(field_offset, width);
        let mut value: u64 = 0;
        for byte in raw_field {
            value = (value << 8) | u64::from(*byte);
        }
        let declared = value as i64 + i64::from(adjustment);

        if declared < self.window as i64 {
            // Length field decodes to less than the sync pattern itself.
            // Consume the sync window so scanning resumes past it.
            let raw = cursor.peek(self.window).to_vec();
            cursor.advance(self.window)?;
            return Ok(Err(Scan::Corrupt(DecodeFailure {
                reason: DecodeError::FieldDecode {
                    field: "frame_length".to_string(),
                    raw: value.to_string(),
                },
                offset,
                raw,
            })));
        }

        Ok(Ok(declared as usize))
    }
}

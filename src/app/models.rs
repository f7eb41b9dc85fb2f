//! Data models for particle extraction
//!
//! This module contains the core data structures shared by every source
//! format: typed field values, decoded particles, decode outcomes with
//! their failure taxonomy, and the particle sink that accumulates results
//! for a single driver pass.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

// =============================================================================
// Field Values
// =============================================================================

/// A single typed field value inside a particle
///
/// Float fields whose raw value is empty or an absent marker ("NaN")
/// decode to `Absent`, never to zero. `Absent` serializes to JSON `null`
/// so re-encoding a particle cannot invent a numeric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Explicitly missing numeric value (raw "NaN" or empty)
    Absent,
    /// Signed integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// Text value
    Text(String),
    /// Fixed-size array of floats (e.g. spectral channel counts)
    FloatArray(Vec<f64>),
}

impl FieldValue {
    /// True when the value is the explicit absent marker
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    /// Numeric view of the value, when it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

// =============================================================================
// Particle Record
// =============================================================================

/// One decoded data point extracted from a source file
///
/// A particle is created only by a successful decode and is immutable
/// afterwards: fields are private and exposed through accessors. The
/// record-type tag names the field table that produced it, and the
/// timestamp (when derived) is seconds since the NTP epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    record_type: String,
    internal_timestamp: Option<f64>,
    fields: Vec<(String, FieldValue)>,
}

impl Particle {
    /// Create a particle from a completed decode
    pub fn new(
        record_type: impl Into<String>,
        internal_timestamp: Option<f64>,
        fields: Vec<(String, FieldValue)>,
    ) -> Self {
        Self {
            record_type: record_type.into(),
            internal_timestamp,
            fields,
        }
    }

    /// Record-type tag of the field table that produced this particle
    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    /// Canonical timestamp in seconds since the NTP epoch, if derived
    pub fn internal_timestamp(&self) -> Option<f64> {
        self.internal_timestamp
    }

    /// Decoded fields in declaration order
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    /// Look up a field value by name
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Number of decoded fields
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

impl Serialize for Particle {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        // Fields serialize as a name -> value map
        let mut state = serializer.serialize_struct("Particle", 3)?;
        state.serialize_field("record_type", &self.record_type)?;
        state.serialize_field("internal_timestamp", &self.internal_timestamp)?;
        let field_map: BTreeMap<&str, &FieldValue> = self
            .fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
            .collect();
        state.serialize_field("fields", &field_map)?;
        state.end()
    }
}

// =============================================================================
// Decode Outcomes and Failure Taxonomy
// =============================================================================

/// Per-record recoverable decode errors
///
/// These are caught at the extraction-engine boundary, converted into
/// [`DecodeOutcome::Failure`], reported, and never abort a pass.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// No sync match at the current offset; a span of bytes was skipped
    #[error("unrecognized data: {skipped} byte(s) skipped before next sync match")]
    UnrecognizedData { skipped: usize },

    /// A sync match whose declared frame length runs past end of stream
    #[error("truncated frame: declared {declared} byte(s), only {available} available")]
    TruncatedFrame { declared: usize, available: usize },

    /// A field failed type conversion; the whole record is rejected
    #[error("field '{field}' failed to decode from raw value '{raw}'")]
    FieldDecode { field: String, raw: String },

    /// Header discriminator matched no configured record class
    #[error("unknown record class discriminator: {discriminator}")]
    UnknownRecordClass { discriminator: String },

    /// Timestamp string matched no accepted format or was out of range
    #[error("timestamp '{raw}' does not match an accepted format")]
    TimestampFormat { raw: String },
}

/// Stream cursor position at the time an outcome was produced
///
/// The index is a byte offset for binary sources and a line number for
/// text sources. `ingested` means every byte/line before the index has
/// been consumed by the engine, successfully or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamPosition {
    pub index: u64,
    pub ingested: bool,
}

impl StreamPosition {
    pub fn new(index: u64, ingested: bool) -> Self {
        Self { index, ingested }
    }
}

/// A single isolated decode failure
///
/// Carries the raw span for diagnostics; the payload is dropped after
/// reporting and never retained for replay.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeFailure {
    /// Why the span failed to decode
    pub reason: DecodeError,
    /// Position of the start of the failed span
    pub offset: StreamPosition,
    /// The raw bytes (or line contents) of the failed span
    pub raw: Vec<u8>,
}

/// The result of exactly one scan attempt
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    /// A successfully decoded particle
    Particle(Particle),
    /// An isolated failure covering exactly its own span
    Failure(DecodeFailure),
}

impl DecodeOutcome {
    /// True when this outcome is a decoded particle
    pub fn is_particle(&self) -> bool {
        matches!(self, DecodeOutcome::Particle(_))
    }

    /// Borrow the particle, if this outcome is one
    pub fn as_particle(&self) -> Option<&Particle> {
        match self {
            DecodeOutcome::Particle(particle) => Some(particle),
            DecodeOutcome::Failure(_) => None,
        }
    }

    /// Borrow the failure, if this outcome is one
    pub fn as_failure(&self) -> Option<&DecodeFailure> {
        match self {
            DecodeOutcome::Failure(failure) => Some(failure),
            DecodeOutcome::Particle(_) => None,
        }
    }
}

// =============================================================================
// Particle Sink
// =============================================================================

/// Collector interface the driver routes outcomes through
///
/// The engine calls these and never inspects sink internals.
pub trait ParticleSink {
    /// Append a successfully decoded particle under its type tag
    fn add_particle(&mut self, type_tag: &str, particle: Particle);

    /// Record that at least one span in this pass was unreadable
    fn mark_failure(&mut self);
}

/// Default in-memory particle accumulator for one driver pass
///
/// Particles are keyed by record-type tag because a single pass can
/// legitimately produce more than one record shape (e.g. metadata and
/// instrument frames interleaved in one file). The failure flag is
/// sticky: once set it stays set for the remainder of the pass.
#[derive(Debug, Default, Clone)]
pub struct ParticleSet {
    particles: BTreeMap<String, Vec<Particle>>,
    had_failures: bool,
}

impl ParticleSet {
    /// Create an empty particle set
    pub fn new() -> Self {
        Self::default()
    }

    /// Particles accumulated under a given record-type tag
    pub fn particles(&self, type_tag: &str) -> &[Particle] {
        self.particles
            .get(type_tag)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Record-type tags seen in this pass, in sorted order
    pub fn type_tags(&self) -> impl Iterator<Item = &str> {
        self.particles.keys().map(String::as_str)
    }

    /// Total particle count across all record types
    pub fn total_count(&self) -> usize {
        self.particles.values().map(Vec::len).sum()
    }

    /// Whether any span in this pass failed to decode
    pub fn had_failures(&self) -> bool {
        self.had_failures
    }

    /// Iterate all particles in type-tag order, then stream order
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.values().flatten()
    }
}

impl ParticleSink for ParticleSet {
    fn add_particle(&mut self, type_tag: &str, particle: Particle) {
        self.particles
            .entry(type_tag.to_string())
            .or_default()
            .push(particle);
    }

    fn mark_failure(&mut self) {
        self.had_failures = true;
    }
}

//! Decoder configuration and validation
//!
//! Configuration structures describing how to locate and decode records
//! for one instrument/format pair: binary frame layouts with sync
//! patterns and unpack templates, delimited text layouts, and CSV
//! layouts. Structural problems are rejected here, at construction,
//! as fatal configuration errors; nothing in this module is checked
//! mid-stream.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Closed set of decoder variants, selected by configuration
///
/// One variant per source encoding. Instrument-specific field tables
/// plug in as data; there is no open-ended decoder lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum DecoderConfig {
    /// Fixed or length-prefixed binary telemetry frames
    BinaryFrames(FrameSpec),
    /// Delimiter-separated text records, optionally DCL-logged
    DelimitedText(TextSpec),
    /// CSV exports (quoting-aware), optionally with a header row
    CsvTable(CsvSpec),
}

impl DecoderConfig {
    /// Load a decoder configuration from a JSON file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("Failed to read config {}", path.display()), e))?;
        let config: DecoderConfig = serde_json::from_str(&content).map_err(|e| {
            Error::configuration(format!("Failed to parse config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants, rejecting bad configuration
    /// before any data is scanned
    pub fn validate(&self) -> Result<()> {
        match self {
            DecoderConfig::BinaryFrames(spec) => spec.validate(),
            DecoderConfig::DelimitedText(spec) => spec.validate(),
            DecoderConfig::CsvTable(spec) => spec.validate(),
        }
    }

    /// True when the source is read as bytes rather than lines
    pub fn is_binary(&self) -> bool {
        matches!(self, DecoderConfig::BinaryFrames(_))
    }

    /// Human-readable one-line description for CLI summaries
    pub fn describe(&self) -> String {
        match self {
            DecoderConfig::BinaryFrames(spec) => format!(
                "binary frames, sync {} byte(s), {}",
                spec.sync.nominal_len(),
                match &spec.length {
                    FrameLength::Fixed { bytes } => format!("fixed length {} bytes", bytes),
                    FrameLength::FromField { offset, width, .. } =>
                        format!("length field at offset {} ({} bytes)", offset, width),
                }
            ),
            DecoderConfig::DelimitedText(spec) => format!(
                "delimited text '{}' ({} field(s){})",
                spec.record_type,
                spec.fields.len(),
                if spec.dcl_prefix { ", DCL prefix" } else { "" }
            ),
            DecoderConfig::CsvTable(spec) => format!(
                "csv table '{}' ({} field(s){})",
                spec.record_type,
                spec.fields.len(),
                if spec.skip_header { ", header row" } else { "" }
            ),
        }
    }
}

// =============================================================================
// Binary Frame Specification
// =============================================================================

/// Layout of one binary frame format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSpec {
    /// Synchronization pattern marking a candidate frame start
    pub sync: SyncPattern,
    /// Declared frame length, fixed or read from a header field
    pub length: FrameLength,
    /// Field table(s) mapping byte offsets to typed fields
    pub layout: FrameLayout,
    /// Where the particle timestamp comes from
    #[serde(default)]
    pub timestamp: TimestampSource,
}

/// Frame-start synchronization pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPattern {
    /// Fixed byte signature compared directly
    Literal { bytes: Vec<u8> },
    /// Regular pattern tested over a small header window
    Pattern { regex: String, window: usize },
}

impl SyncPattern {
    /// Number of header bytes the pattern occupies
    pub fn nominal_len(&self) -> usize {
        match self {
            SyncPattern::Literal { bytes } => bytes.len(),
            SyncPattern::Pattern { window, .. } => *window,
        }
    }
}

/// Declared frame length
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameLength {
    /// Every frame is exactly this many bytes
    Fixed { bytes: usize },
    /// Total length is a big-endian unsigned header field plus a signed
    /// adjustment (for formats whose length field excludes the header)
    FromField {
        offset: usize,
        width: usize,
        adjustment: i32,
    },
}

/// Field table arrangement inside a frame
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameLayout {
    /// One record shape for every frame
    Single {
        record_type: String,
        fields: Vec<BinaryField>,
    },
    /// Record shape selected by a header discriminator
    Discriminated {
        offset: usize,
        width: usize,
        classes: Vec<FrameClass>,
    },
}

impl FrameLayout {
    /// All field tables in this layout
    pub fn field_tables(&self) -> Vec<&[BinaryField]> {
        match self {
            FrameLayout::Single { fields, .. } => vec![fields.as_slice()],
            FrameLayout::Discriminated { classes, .. } => {
                classes.iter().map(|c| c.fields.as_slice()).collect()
            }
        }
    }
}

/// One record class of a discriminated frame format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameClass {
    /// Discriminator bytes selecting this class
    pub tag: Vec<u8>,
    /// Record-type tag for particles of this class
    pub record_type: String,
    /// Unpack template for this class
    pub fields: Vec<BinaryField>,
}

/// One entry of a binary unpack template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinaryField {
    pub name: String,
    /// Byte offset from the start of the frame
    pub offset: usize,
    pub kind: BinaryFieldKind,
}

/// Typed binary field encodings (multi-byte values are big-endian)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryFieldKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
    /// Fixed-length ASCII text
    Ascii { len: usize },
    /// Fixed-size array of big-endian f32 values
    F32Array { count: usize },
    /// Fixed-size array of big-endian u16 counts (spectral channels)
    U16Array { count: usize },
}

impl BinaryFieldKind {
    /// Width of the encoded field in bytes
    pub fn width(&self) -> usize {
        match self {
            BinaryFieldKind::U8 | BinaryFieldKind::I8 => 1,
            BinaryFieldKind::U16 | BinaryFieldKind::I16 => 2,
            BinaryFieldKind::U32 | BinaryFieldKind::I32 | BinaryFieldKind::F32 => 4,
            BinaryFieldKind::F64 => 8,
            BinaryFieldKind::Ascii { len } => *len,
            BinaryFieldKind::F32Array { count } => 4 * count,
            BinaryFieldKind::U16Array { count } => 2 * count,
        }
    }
}

impl FrameSpec {
    /// Validate the frame specification
    pub fn validate(&self) -> Result<()> {
        let sync_len = self.sync.nominal_len();
        if sync_len == 0 {
            return Err(Error::configuration("Sync pattern cannot be empty"));
        }
        if let SyncPattern::Pattern { regex, .. } = &self.sync {
            // Compile check only; the scanner builds its own anchored matcher
            regex::bytes::RegexBuilder::new(regex)
                .unicode(false)
                .build()
                .map_err(|e| Error::configuration(format!("Invalid sync regex: {}", e)))?;
        }

        match &self.length {
            FrameLength::Fixed { bytes } => {
                if *bytes < sync_len {
                    return Err(Error::configuration(format!(
                        "Frame length {} is shorter than sync pattern length {}",
                        bytes, sync_len
                    )));
                }
                for table in self.layout.field_tables() {
                    for field in table {
                        if field.offset + field.kind.width() > *bytes {
                            return Err(Error::configuration(format!(
                                "Field '{}' at offset {} (width {}) exceeds frame length {}",
                                field.name,
                                field.offset,
                                field.kind.width(),
                                bytes
                            )));
                        }
                    }
                }
                if let FrameLayout::Discriminated { offset, width, .. } = &self.layout {
                    if offset + width > *bytes {
                        return Err(Error::configuration(format!(
                            "Discriminator at offset {} (width {}) exceeds frame length {}",
                            offset, width, bytes
                        )));
                    }
                }
            }
            FrameLength::FromField { width, .. } => {
                if ![1, 2, 4].contains(width) {
                    return Err(Error::configuration(format!(
                        "Length field width must be 1, 2 or 4 bytes, got {}",
                        width
                    )));
                }
            }
        }

        match &self.layout {
            FrameLayout::Single { record_type, .. } => {
                if record_type.trim().is_empty() {
                    return Err(Error::configuration("Record type cannot be empty"));
                }
            }
            FrameLayout::Discriminated { width, classes, .. } => {
                if classes.is_empty() {
                    return Err(Error::configuration(
                        "Discriminated layout requires at least one record class",
                    ));
                }
                for class in classes {
                    if class.record_type.trim().is_empty() {
                        return Err(Error::configuration("Record type cannot be empty"));
                    }
                    if class.tag.len() != *width {
                        return Err(Error::configuration(format!(
                            "Class '{}' tag length {} does not match discriminator width {}",
                            class.record_type,
                            class.tag.len(),
                            width
                        )));
                    }
                }
            }
        }

        // Names are unique within a field table; classes may reuse names
        for table in self.layout.field_tables() {
            let names: Vec<&str> = table.iter().map(|f| f.name.as_str()).collect();
            validate_field_names(&names)?;
            // A derived timestamp must be available for every record class
            self.timestamp.validate_for_fields(&names, false)?;
        }
        Ok(())
    }
}

// =============================================================================
// Text and CSV Specifications
// =============================================================================

/// Layout of delimiter-separated text records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSpec {
    /// Record-type tag for particles of this format
    pub record_type: String,
    /// Field delimiter (e.g. ',' or '\t' or ' ')
    pub delimiter: char,
    /// Lines begin with a DCL port timestamp before the payload
    #[serde(default)]
    pub dcl_prefix: bool,
    /// Field table indexed into the split payload
    pub fields: Vec<TextField>,
    /// Where the particle timestamp comes from
    #[serde(default)]
    pub timestamp: TimestampSource,
}

impl TextSpec {
    /// Validate the text specification
    pub fn validate(&self) -> Result<()> {
        validate_text_common(&self.record_type, &self.fields)?;
        if matches!(self.timestamp, TimestampSource::DclPrefix) && !self.dcl_prefix {
            return Err(Error::configuration(
                "Timestamp source is the DCL prefix but dcl_prefix is not enabled",
            ));
        }
        let names: Vec<&str> = self.fields.iter().map(|f| f.name.as_str()).collect();
        self.timestamp.validate_for_fields(&names, self.dcl_prefix)
    }
}

/// Layout of CSV export records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvSpec {
    /// Record-type tag for particles of this format
    pub record_type: String,
    /// Consume one header row before the first record
    #[serde(default)]
    pub skip_header: bool,
    /// Field table indexed into the parsed CSV columns
    pub fields: Vec<TextField>,
    /// Where the particle timestamp comes from
    #[serde(default)]
    pub timestamp: TimestampSource,
}

impl CsvSpec {
    /// Validate the CSV specification
    pub fn validate(&self) -> Result<()> {
        validate_text_common(&self.record_type, &self.fields)?;
        if matches!(self.timestamp, TimestampSource::DclPrefix) {
            return Err(Error::configuration(
                "CSV sources have no DCL prefix to take a timestamp from",
            ));
        }
        let names: Vec<&str> = self.fields.iter().map(|f| f.name.as_str()).collect();
        self.timestamp.validate_for_fields(&names, false)
    }
}

/// One entry of a text/CSV field table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextField {
    pub name: String,
    /// Zero-based column index into the split payload
    pub index: usize,
    pub kind: TextFieldKind,
}

/// Typed text field encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFieldKind {
    Text,
    Integer,
    Float,
    /// Array of floats spanning this many consecutive columns
    FloatArray { len: usize },
}

fn validate_text_common(record_type: &str, fields: &[TextField]) -> Result<()> {
    if record_type.trim().is_empty() {
        return Err(Error::configuration("Record type cannot be empty"));
    }
    if fields.is_empty() {
        return Err(Error::configuration("Field table cannot be empty"));
    }
    for field in fields {
        if matches!(field.kind, TextFieldKind::FloatArray { len: 0 }) {
            return Err(Error::configuration(format!(
                "Float array field '{}' cannot have zero length",
                field.name
            )));
        }
    }
    validate_field_names(&fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>())
}

fn validate_field_names(names: &[&str]) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(Error::configuration("Field name cannot be empty"));
        }
        if !seen.insert(*name) {
            return Err(Error::configuration(format!(
                "Duplicate field name '{}' in field table",
                name
            )));
        }
    }
    Ok(())
}

// =============================================================================
// Timestamp Source
// =============================================================================

/// Where a particle's canonical timestamp is derived from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum TimestampSource {
    /// No timestamp is derived
    #[default]
    None,
    /// An ISO-8601 date string field
    IsoField { field: String },
    /// The DCL port timestamp prefixed to each log line
    DclPrefix,
    /// A numeric field holding seconds since an epoch
    EpochField { field: String, epoch: EpochBase },
}

/// Epoch conventions for numeric timestamp fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpochBase {
    /// Seconds since 1970-01-01T00:00:00Z
    Unix,
    /// Seconds since 1900-01-01T00:00:00Z (instrument native)
    Ntp,
}

impl TimestampSource {
    fn validate_for_fields(&self, field_names: &[&str], dcl_allowed: bool) -> Result<()> {
        match self {
            TimestampSource::None => Ok(()),
            TimestampSource::DclPrefix => {
                if dcl_allowed {
                    Ok(())
                } else {
                    Err(Error::configuration(
                        "DCL prefix timestamp requires a DCL-logged text source",
                    ))
                }
            }
            TimestampSource::IsoField { field } | TimestampSource::EpochField { field, .. } => {
                if field_names.contains(&field.as_str()) {
                    Ok(())
                } else {
                    Err(Error::configuration(format!(
                        "Timestamp field '{}' is not in the field table",
                        field
                    )))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_frame_spec() -> FrameSpec {
        FrameSpec {
            sync: SyncPattern::Literal {
                bytes: vec![0xa3, 0x9d, 0x7a, 0x02],
            },
            length: FrameLength::Fixed { bytes: 16 },
            layout: FrameLayout::Single {
                record_type: "velocity".to_string(),
                fields: vec![
                    BinaryField {
                        name: "heading".to_string(),
                        offset: 4,
                        kind: BinaryFieldKind::U16,
                    },
                    BinaryField {
                        name: "pitch".to_string(),
                        offset: 6,
                        kind: BinaryFieldKind::I16,
                    },
                ],
            },
            timestamp: TimestampSource::None,
        }
    }

    #[test]
    fn test_valid_fixed_frame_spec() {
        assert!(fixed_frame_spec().validate().is_ok());
    }

    #[test]
    fn test_frame_shorter_than_sync_rejected() {
        let mut spec = fixed_frame_spec();
        spec.length = FrameLength::Fixed { bytes: 2 };
        // Field offsets now also exceed the frame, but the sync check fires first
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_field_past_frame_end_rejected() {
        let mut spec = fixed_frame_spec();
        if let FrameLayout::Single { fields, .. } = &mut spec.layout {
            fields.push(BinaryField {
                name: "tail".to_string(),
                offset: 12,
                kind: BinaryFieldKind::F64,
            });
        }
        let err = spec.validate().unwrap_err();
        assert!(err.to_string().contains("tail"));
    }

    #[test]
    fn test_duplicate_field_names_rejected() {
        let mut spec = fixed_frame_spec();
        if let FrameLayout::Single { fields, .. } = &mut spec.layout {
            fields.push(BinaryField {
                name: "heading".to_string(),
                offset: 8,
                kind: BinaryFieldKind::U16,
            });
        }
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_bad_sync_regex_rejected() {
        let mut spec = fixed_frame_spec();
        spec.sync = SyncPattern::Pattern {
            regex: "([".to_string(),
            window: 4,
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_discriminator_tag_width_mismatch_rejected() {
        let mut spec = fixed_frame_spec();
        spec.layout = FrameLayout::Discriminated {
            offset: 4,
            width: 1,
            classes: vec![FrameClass {
                tag: vec![0x01, 0x02],
                record_type: "metadata".to_string(),
                fields: vec![],
            }],
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_timestamp_field_must_exist() {
        let mut spec = fixed_frame_spec();
        spec.timestamp = TimestampSource::EpochField {
            field: "no_such_field".to_string(),
            epoch: EpochBase::Ntp,
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_csv_spec_rejects_dcl_prefix_timestamp() {
        let spec = CsvSpec {
            record_type: "nutnr_export".to_string(),
            skip_header: true,
            fields: vec![TextField {
                name: "nitrate".to_string(),
                index: 0,
                kind: TextFieldKind::Float,
            }],
            timestamp: TimestampSource::DclPrefix,
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = DecoderConfig::BinaryFrames(fixed_frame_spec());
        let json = serde_json::to_string(&config).unwrap();
        let back: DecoderConfig = serde_json::from_str(&json).unwrap();
        assert!(back.validate().is_ok());
        assert!(back.is_binary());
    }
}

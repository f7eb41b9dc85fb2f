//! Typed field conversion for candidate records
//!
//! Conversion policy: a float field whose raw value is empty or an
//! absent marker ("NaN") becomes [`FieldValue::Absent`] and is never
//! coerced to zero. Every other conversion failure rejects the whole
//! record with a `FieldDecode` error naming the field and raw value.

use crate::app::models::{DecodeError, FieldValue};
use crate::config::{BinaryField, BinaryFieldKind, TextField, TextFieldKind};
use crate::constants::ABSENT_MARKERS;

/// Decode one text field from the split payload tokens
pub fn decode_text_field(
    tokens: &[&str],
    field: &TextField,
) -> Result<FieldValue, DecodeError> {
    match field.kind {
        TextFieldKind::Text => Ok(FieldValue::Text(required_token(tokens, field)?.to_string())),
        TextFieldKind::Integer => {
            let raw = required_token(tokens, field)?;
            raw.parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| field_error(field, raw))
        }
        TextFieldKind::Float => parse_float(required_token(tokens, field)?, &field.name),
        TextFieldKind::FloatArray { len } => {
            let mut values = Vec::with_capacity(len);
            for slot in 0..len {
                let index = field.index + slot;
                let raw = tokens.get(index).map(|t| t.trim()).ok_or_else(|| {
                    DecodeError::FieldDecode {
                        field: format!("{}[{}]", field.name, slot),
                        raw: "<missing>".to_string(),
                    }
                })?;
                match parse_float(raw, &field.name)? {
                    FieldValue::Float(value) => values.push(value),
                    // Arrays carry NaN in place so channel indices stay aligned
                    FieldValue::Absent => values.push(f64::NAN),
                    _ => unreachable!("parse_float yields Float or Absent"),
                }
            }
            Ok(FieldValue::FloatArray(values))
        }
    }
}

/// Parse a float token, mapping empty and "NaN" to the absent value
pub fn parse_float(raw: &str, field_name: &str) -> Result<FieldValue, DecodeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || ABSENT_MARKERS.contains(&trimmed) {
        return Ok(FieldValue::Absent);
    }
    trimmed
        .parse::<f64>()
        .map(FieldValue::Float)
        .map_err(|_| DecodeError::FieldDecode {
            field: field_name.to_string(),
            raw: trimmed.to_string(),
        })
}

fn required_token<'a>(tokens: &[&'a str], field: &TextField) -> Result<&'a str, DecodeError> {
    tokens
        .get(field.index)
        .map(|t| t.trim())
        .ok_or_else(|| DecodeError::FieldDecode {
            field: field.name.clone(),
            raw: "<missing>".to_string(),
        })
}

fn field_error(field: &TextField, raw: &str) -> DecodeError {
    DecodeError::FieldDecode {
        field: field.name.clone(),
        raw: raw.to_string(),
    }
}

/// Decode one binary field from a frame using its unpack template entry
///
/// Multi-byte values are big-endian. Float fields whose encoded value is
/// NaN decode to the absent value, mirroring the textual policy.
pub fn decode_binary_field(
    frame: &[u8],
    field: &BinaryField,
) -> Result<FieldValue, DecodeError> {
    let width = field.kind.width();
    let slice = frame
        .get(field.offset..field.offset + width)
        .ok_or_else(|| DecodeError::FieldDecode {
            field: field.name.clone(),
            raw: format!("<frame too short for offset {}+{}>", field.offset, width),
        })?;

    let value = match field.kind {
        BinaryFieldKind::U8 => FieldValue::Integer(i64::from(slice[0])),
        BinaryFieldKind::I8 => FieldValue::Integer(i64::from(slice[0] as i8)),
        BinaryFieldKind::U16 => {
            FieldValue::Integer(i64::from(u16::from_be_bytes([slice[0], slice[1]])))
        }
        BinaryFieldKind::I16 => {
            FieldValue::Integer(i64::from(i16::from_be_bytes([slice[0], slice[1]])))
        }
        BinaryFieldKind::U32 => FieldValue::Integer(i64::from(u32::from_be_bytes([
            slice[0], slice[1], slice[2], slice[3],
        ]))),
        BinaryFieldKind::I32 => FieldValue::Integer(i64::from(i32::from_be_bytes([
            slice[0], slice[1], slice[2], slice[3],
        ]))),
        BinaryFieldKind::F32 => {
            let value = f32::from_be_bytes([slice[0], slice[1], slice[2], slice[3]]);
            if value.is_nan() {
                FieldValue::Absent
            } else {
                FieldValue::Float(f64::from(value))
            }
        }
        BinaryFieldKind::F64 => {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(slice);
            let value = f64::from_be_bytes(bytes);
            if value.is_nan() {
                FieldValue::Absent
            } else {
                FieldValue::Float(value)
            }
        }
        BinaryFieldKind::Ascii { .. } => {
            let text = std::str::from_utf8(slice).map_err(|_| DecodeError::FieldDecode {
                field: field.name.clone(),
                raw: format!("{:02x?}", slice),
            })?;
            FieldValue::Text(text.trim_end_matches(['\0', ' ']).to_string())
        }
        BinaryFieldKind::F32Array { count } => {
            let mut values = Vec::with_capacity(count);
            for chunk in slice.chunks_exact(4).take(count) {
                values.push(f64::from(f32::from_be_bytes([
                    chunk[0], chunk[1], chunk[2], chunk[3],
                ])));
            }
            FieldValue::FloatArray(values)
        }
        BinaryFieldKind::U16Array { count } => {
            let mut values = Vec::with_capacity(count);
            for chunk in slice.chunks_exact(2).take(count) {
                values.push(f64::from(u16::from_be_bytes([chunk[0], chunk[1]])));
            }
            FieldValue::FloatArray(values)
        }
    };
    Ok(value)
}

//! Canonical timestamp conversion
//!
//! All particle timestamps share one time base: seconds since the NTP
//! epoch (1900-01-01T00:00:00Z), carried as `f64` to keep fractional
//! seconds. Conversion is total for well-formed input; anything else is
//! a `TimestampFormat` error and never a silently wrong time.

use crate::app::models::{DecodeError, FieldValue};
use crate::config::{EpochBase, TimestampSource};
use crate::constants::{timestamp_formats, DCL_PREFIX_LEN, NTP_EPOCH_DELTA_SECONDS};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Convert an ISO-8601 date string to NTP-epoch seconds
///
/// Accepts `YYYY-MM-DDTHH:MM:SS[.fff]` with or without a trailing `Z`,
/// and the space-separated variant some exports use.
pub fn iso_to_ntp_seconds(raw: &str) -> Result<f64, DecodeError> {
    let trimmed = raw.trim();
    let formats = [
        timestamp_formats::ISO_8601_Z,
        timestamp_formats::ISO_8601,
        "%Y-%m-%d %H:%M:%S%.f",
    ];
    for format in formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(to_ntp_seconds(naive));
        }
    }
    Err(DecodeError::TimestampFormat {
        raw: trimmed.to_string(),
    })
}

/// Parse the DCL port timestamp prefixing a log line
///
/// Returns the timestamp in NTP-epoch seconds and the payload after the
/// prefix. The prefix is exactly `YYYY/MM/DD HH:MM:SS.mmm ` including
/// the separating space.
pub fn split_dcl_prefix(line: &str) -> Result<(f64, &str), DecodeError> {
    if line.len() < DCL_PREFIX_LEN || !line.is_char_boundary(DCL_PREFIX_LEN) {
        return Err(DecodeError::TimestampFormat {
            raw: line.to_string(),
        });
    }
    let (prefix, payload) = line.split_at(DCL_PREFIX_LEN);
    let naive = NaiveDateTime::parse_from_str(prefix.trim_end(), timestamp_formats::DCL_PREFIX)
        .map_err(|_| DecodeError::TimestampFormat {
            raw: prefix.trim_end().to_string(),
        })?;
    Ok((to_ntp_seconds(naive), payload))
}

/// Derive the particle timestamp from decoded fields per configuration
///
/// `dcl_timestamp` carries the already-parsed port timestamp for
/// DCL-logged sources; other sources pass `None`.
pub fn derive(
    source: &TimestampSource,
    fields: &[(String, FieldValue)],
    dcl_timestamp: Option<f64>,
) -> Result<Option<f64>, DecodeError> {
    match source {
        TimestampSource::None => Ok(None),
        TimestampSource::DclPrefix => {
            dcl_timestamp
                .map(Some)
                .ok_or_else(|| DecodeError::TimestampFormat {
                    raw: "<missing DCL prefix>".to_string(),
                })
        }
        TimestampSource::IsoField { field } => match lookup(fields, field)? {
            FieldValue::Text(raw) => iso_to_ntp_seconds(raw).map(Some),
            other => Err(DecodeError::TimestampFormat {
                raw: format!("{:?}", other),
            }),
        },
        TimestampSource::EpochField { field, epoch } => {
            let value = lookup(fields, field)?;
            let seconds = value.as_f64().ok_or_else(|| DecodeError::TimestampFormat {
                raw: format!("{:?}", value),
            })?;
            Ok(Some(match epoch {
                EpochBase::Ntp => seconds,
                EpochBase::Unix => seconds + NTP_EPOCH_DELTA_SECONDS,
            }))
        }
    }
}

fn lookup<'a>(
    fields: &'a [(String, FieldValue)],
    name: &str,
) -> Result<&'a FieldValue, DecodeError> {
    fields
        .iter()
        .find(|(field, _)| field == name)
        .map(|(_, value)| value)
        .ok_or_else(|| DecodeError::TimestampFormat {
            raw: format!("<field '{}' not decoded>", name),
        })
}

fn to_ntp_seconds(naive: NaiveDateTime) -> f64 {
    let utc: DateTime<Utc> = DateTime::from_naive_utc_and_offset(naive, Utc);
    utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_nanos()) * 1e-9
        + NTP_EPOCH_DELTA_SECONDS
}

//! Constants for particle ingest processing
//!
//! Canonical time-base constants, accepted timestamp formats, and the
//! raw markers that decode to an absent value.

/// Seconds between the NTP epoch (1900-01-01T00:00:00Z) and the Unix
/// epoch (1970-01-01T00:00:00Z). Instrument internal timestamps use the
/// NTP epoch; host-side fields usually use Unix.
pub const NTP_EPOCH_DELTA_SECONDS: f64 = 2_208_988_800.0;

/// Raw textual values that decode to [`FieldValue::Absent`] in float
/// fields rather than failing the record.
///
/// [`FieldValue::Absent`]: crate::app::models::FieldValue::Absent
pub const ABSENT_MARKERS: [&str; 2] = ["NaN", "nan"];

/// Accepted timestamp string formats
pub mod timestamp_formats {
    /// ISO-8601 date-time without timezone, e.g. `2014-08-17T00:57:10`
    pub const ISO_8601: &str = "%Y-%m-%dT%H:%M:%S%.f";

    /// ISO-8601 date-time with a trailing `Z`
    pub const ISO_8601_Z: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

    /// DCL log-line port timestamp, e.g. `2014/08/17 00:57:10.132`
    pub const DCL_PREFIX: &str = "%Y/%m/%d %H:%M:%S%.3f";
}

/// Length of the DCL port-timestamp prefix in characters, including the
/// trailing space that separates it from the instrument payload.
pub const DCL_PREFIX_LEN: usize = 24;

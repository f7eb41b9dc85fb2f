//! Delimited text and CSV line decoding
//!
//! Both decoders turn one candidate line into a particle through the
//! shared typed field parsers. The delimited decoder optionally strips
//! and uses a DCL port-timestamp prefix; the CSV decoder parses the
//! line quoting-aware before indexing columns.

use crate::app::models::{DecodeError, FieldValue, Particle};
use crate::app::services::record_decoder::{field_parsers, timestamp};
use crate::config::{CsvSpec, TextSpec};

/// Decoder for delimiter-separated instrument lines (DCL logs)
#[derive(Debug)]
pub struct DelimitedLineDecoder {
    spec: TextSpec,
}

impl DelimitedLineDecoder {
    /// Build a decoder from a validated text specification
    pub fn new(spec: &TextSpec) -> Self {
        Self { spec: spec.clone() }
    }

    /// Decode one line into a particle
    pub fn decode(&self, line: &str) -> Result<Particle, DecodeError> {
        let (dcl_timestamp, payload) = if self.spec.dcl_prefix {
            let (seconds, payload) = timestamp::split_dcl_prefix(line)?;
            (Some(seconds), payload)
        } else {
            (None, line)
        };

        let tokens: Vec<&str> = payload.split(self.spec.delimiter).collect();
        let mut fields: Vec<(String, FieldValue)> = Vec::with_capacity(self.spec.fields.len());
        for field in &self.spec.fields {
            let value = field_parsers::decode_text_field(&tokens, field)?;
            fields.push((field.name.clone(), value));
        }

        let derived = timestamp::derive(&self.spec.timestamp, &fields, dcl_timestamp)?;
        Ok(Particle::new(self.spec.record_type.clone(), derived, fields))
    }
}

/// Decoder for CSV export lines
#[derive(Debug)]
pub struct CsvLineDecoder {
    spec: CsvSpec,
}

impl CsvLineDecoder {
    /// Build a decoder from a validated CSV specification
    pub fn new(spec: &CsvSpec) -> Self {
        Self { spec: spec.clone() }
    }

    /// Decode one CSV line into a particle
    pub fn decode(&self, line: &str) -> Result<Particle, DecodeError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_bytes());

        let mut record = csv::StringRecord::new();
        let read = reader
            .read_record(&mut record)
            .map_err(|_| DecodeError::FieldDecode {
                field: "record".to_string(),
                raw: line.to_string(),
            })?;
        if !read {
            return Err(DecodeError::FieldDecode {
                field: "record".to_string(),
                raw: line.to_string(),
            });
        }

        let tokens: Vec<&str> = record.iter().collect();
        let mut fields: Vec<(String, FieldValue)> = Vec::with_capacity(self.spec.fields.len());
        for field in &self.spec.fields {
            let value = field_parsers::decode_text_field(&tokens, field)?;
            fields.push((field.name.clone(), value));
        }

        let derived = timestamp::derive(&self.spec.timestamp, &fields, None)?;
        Ok(Particle::new(self.spec.record_type.clone(), derived, fields))
    }
}

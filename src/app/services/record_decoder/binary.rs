//! Binary frame decoding
//!
//! Applies an unpack template to one candidate frame. Discriminated
//! formats classify the frame by a header discriminator first and
//! dispatch to the matching per-class field table; an unrecognized
//! discriminator is a decode failure, never a panic.

use crate::app::models::{DecodeError, FieldValue, Particle};
use crate::app::services::record_decoder::{field_parsers, timestamp};
use crate::config::{BinaryField, FrameLayout, FrameSpec, TimestampSource};

/// Decoder for one binary frame format
#[derive(Debug)]
pub struct BinaryFrameDecoder {
    layout: FrameLayout,
    timestamp: TimestampSource,
}

impl BinaryFrameDecoder {
    /// Build a decoder from a validated frame specification
    pub fn new(spec: &FrameSpec) -> Self {
        Self {
            layout: spec.layout.clone(),
            timestamp: spec.timestamp.clone(),
        }
    }

    /// Decode one candidate frame into a particle
    ///
    /// Pure: the frame bytes are the only input. The record-type tag of
    /// the particle comes from the (possibly class-selected) field
    /// table.
    pub fn decode(&self, frame: &[u8]) -> Result<Particle, DecodeError> {
        let (record_type, table) = self.classify(frame)?;

        let mut fields: Vec<(String, FieldValue)> = Vec::with_capacity(table.len());
        for field in table {
            let value = field_parsers::decode_binary_field(frame, field)?;
            fields.push((field.name.clone(), value));
        }

        let derived = timestamp::derive(&self.timestamp, &fields, None)?;
        Ok(Particle::new(record_type, derived, fields))
    }

    /// Select the field table for this frame
    fn classify<'a>(&'a self, frame: &[u8]) -> Result<(&'a str, &'a [BinaryField]), DecodeError> {
        match &self.layout {
            FrameLayout::Single {
                record_type,
                fields,
            } => Ok((record_type, fields)),
            FrameLayout::Discriminated {
                offset,
                width,
                classes,
            } => {
                let tag = frame.get(*offset..*offset + *width).ok_or_else(|| {
                    DecodeError::UnknownRecordClass {
                        discriminator: format!("<frame too short for offset {}>", offset),
                    }
                })?;
                classes
                    .iter()
                    .find(|class| class.tag == tag)
                    .map(|class| (class.record_type.as_str(), class.fields.as_slice()))
                    .ok_or_else(|| DecodeError::UnknownRecordClass {
                        discriminator: format!("{:02x?}", tag),
                    })
            }
        }
    }
}

//! Record decoders for binary frames, delimited text, and CSV sources
//!
//! A decoder is a pure function from one candidate span (a frame or a
//! line) to a particle. Decoders never perform I/O and never partially
//! populate a record: any field conversion failure other than an
//! explicit absent value rejects the whole candidate with a typed
//! [`DecodeError`](crate::app::models::DecodeError).

pub mod binary;
pub mod field_parsers;
pub mod text;
pub mod timestamp;

pub use binary::BinaryFrameDecoder;
pub use text::{CsvLineDecoder, DelimitedLineDecoder};

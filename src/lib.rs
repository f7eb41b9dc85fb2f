//! Particle Ingest Library
//!
//! A Rust library for converting raw oceanographic instrument files
//! (binary telemetry frames, DCL-formatted text logs, CSV chemistry
//! exports) into a uniform stream of typed, timestamped particle records.
//!
//! This library provides tools for:
//! - Locating well-formed records inside byte and line streams
//! - Binary frame synchronization with one-byte slip recovery
//! - Typed field decoding with explicit absent-value handling
//! - Failure isolation so one corrupt record never aborts a pass
//! - Driver orchestration with per-run statistics and failure reporting

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod extraction_engine;
        pub mod frame_scanner;
        pub mod record_decoder;
        pub mod stream_cursor;
    }
}

// Orchestration
pub mod driver;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{DecodeError, DecodeOutcome, FieldValue, Particle, ParticleSet};
pub use config::DecoderConfig;
pub use driver::{IngestDriver, IngestResult};

/// Result type alias for particle ingest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal error types for particle ingest operations
///
/// These abort a run immediately. Per-record decode problems are not
/// represented here; they are carried as [`DecodeError`] inside failure
/// outcomes and never terminate a pass.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Source file not found
    #[error("Source file not found: {path}")]
    FileNotFound { path: String },

    /// Decoder configuration is structurally invalid
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Cursor advanced past the end of the stream
    #[error("Cursor advance out of range: requested {requested}, remaining {remaining}")]
    OutOfRange { requested: usize, remaining: usize },

    /// Text source contains invalid UTF-8
    #[error("Invalid UTF-8 in text source: {path}")]
    InvalidUtf8 { path: String },

    /// Directory traversal error
    #[error("Directory traversal error: {message}")]
    DirectoryTraversal {
        message: String,
        #[source]
        source: walkdir::Error,
    },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an out-of-range cursor error
    pub fn out_of_range(requested: usize, remaining: usize) -> Self {
        Self::OutOfRange {
            requested,
            remaining,
        }
    }

    /// Create an invalid UTF-8 error
    pub fn invalid_utf8(path: impl Into<String>) -> Self {
        Self::InvalidUtf8 { path: path.into() }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(error: walkdir::Error) -> Self {
        Self::DirectoryTraversal {
            message: "Directory traversal failed".to_string(),
            source: error,
        }
    }
}

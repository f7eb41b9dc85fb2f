//! Command-line argument definitions for the particle ingest tool
//!
//! This module defines the CLI interface using the clap derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the particle ingest tool
///
/// Converts raw oceanographic instrument files (binary telemetry
/// frames, DCL text logs, CSV exports) into typed, timestamped particle
/// records.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "particle-ingest",
    version,
    about = "Convert raw oceanographic instrument files into typed particle records",
    long_about = "Extracts typed, timestamped particle records from raw instrument files. \
                  Each instrument/format pair is described by a decoder configuration file; \
                  the extraction engine locates records, isolates corrupt spans, and reports \
                  whatever valid data the file still holds."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands for the particle ingest tool
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Extract particles from a source file or directory
    Extract(ExtractArgs),
    /// Validate and summarize a decoder configuration
    Inspect(InspectArgs),
}

/// Arguments for the extract command (main processing)
#[derive(Debug, Clone, Parser)]
pub struct ExtractArgs {
    /// Decoder configuration file (JSON)
    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        help = "Decoder configuration file describing the instrument format"
    )]
    pub config_path: PathBuf,

    /// Source file, or a directory to walk for source files
    #[arg(value_name = "INPUT", help = "Source file or directory")]
    pub input: PathBuf,

    /// Write extracted particles as JSON lines to this file
    ///
    /// Absent float values serialize as null, never as a number.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        help = "Write extracted particles as JSON lines"
    )]
    pub output: Option<PathBuf>,

    /// Enable verbose (debug-level) logging
    #[arg(short = 'v', long = "verbose", help = "Enable verbose logging")]
    pub verbose: bool,
}

/// Arguments for the inspect command
#[derive(Debug, Clone, Parser)]
pub struct InspectArgs {
    /// Decoder configuration file (JSON)
    #[arg(value_name = "CONFIG", help = "Decoder configuration file to validate")]
    pub config_path: PathBuf,
}

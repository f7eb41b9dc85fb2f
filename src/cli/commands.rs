//! Command implementations for the particle ingest CLI
//!
//! Dispatches subcommands, configures logging, walks input directories,
//! and renders per-file and total extraction summaries.

use crate::cli::args::{Args, Commands, ExtractArgs, InspectArgs};
use crate::config::DecoderConfig;
use crate::driver::IngestDriver;
use crate::{Error, Result};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

/// Main command runner for the particle ingest CLI
pub fn run(args: Args) -> Result<()> {
    match args.command {
        Some(Commands::Extract(extract_args)) => {
            init_logging(extract_args.verbose);
            run_extract(extract_args)
        }
        Some(Commands::Inspect(inspect_args)) => {
            init_logging(false);
            run_inspect(inspect_args)
        }
        None => Ok(()),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    // A second init (e.g. in tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Run the extract command over a file or directory
fn run_extract(args: ExtractArgs) -> Result<()> {
    let config = DecoderConfig::load(&args.config_path)?;
    info!("Loaded decoder config: {}", config.describe());
    let driver = IngestDriver::new(config)?;

    let sources = collect_sources(&args.input)?;
    if sources.is_empty() {
        return Err(Error::file_not_found(args.input.display().to_string()));
    }

    let mut output = match &args.output {
        Some(path) => Some(BufWriter::new(File::create(path).map_err(|e| {
            Error::io(format!("Failed to create output {}", path.display()), e)
        })?)),
        None => None,
    };

    let mut total_particles = 0usize;
    let mut total_failures = 0usize;

    for source in &sources {
        let result = driver.process(source)?;
        total_particles += result.stats.particles_decoded;
        total_failures += result.stats.failures;

        let status = if result.had_failures() {
            format!("{} failure(s)", result.stats.failures).yellow()
        } else {
            "clean".green()
        };
        println!(
            "{}: {} particle(s), {}",
            source.display(),
            result.stats.particles_decoded,
            status
        );

        if let Some(writer) = output.as_mut() {
            for particle in result.particles.iter() {
                let line = serde_json::to_string(particle).map_err(|e| {
                    Error::configuration(format!("Failed to serialize particle: {}", e))
                })?;
                writeln!(writer, "{}", line)
                    .map_err(|e| Error::io("Failed to write output", e))?;
            }
        }
    }

    if let Some(mut writer) = output {
        writer
            .flush()
            .map_err(|e| Error::io("Failed to flush output", e))?;
    }

    println!();
    println!(
        "{} {} file(s), {} particle(s), {}",
        "Done:".bold(),
        sources.len(),
        total_particles,
        if total_failures == 0 {
            "no failures".green().to_string()
        } else {
            format!("{} failure(s)", total_failures).yellow().to_string()
        }
    );

    // Unreadable records are not a process failure; the caller decides
    // policy from the printed summary and exit code 0.
    Ok(())
}

/// Run the inspect command: validate and summarize a configuration
fn run_inspect(args: InspectArgs) -> Result<()> {
    let config = DecoderConfig::load(&args.config_path)?;
    println!("{} {}", "Valid:".green().bold(), config.describe());
    Ok(())
}

/// Resolve the input path to a deterministic, sorted list of files
fn collect_sources(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(Error::file_not_found(input.display().to_string()));
    }

    let mut sources = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            sources.push(entry.path().to_path_buf());
        }
    }
    Ok(sources)
}

use clap::Parser;
use particle_ingest::cli::{args::Args, commands};
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    match commands::run(args) {
        Ok(()) => {
            // Success - summaries have already been printed by the command
            process::exit(0);
        }
        Err(error) => {
            // Error occurred - print to stderr and exit with error code
            eprintln!("Error: {}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Particle Ingest - Oceanographic Instrument File Converter");
    println!("=========================================================");
    println!();
    println!("Extract typed, timestamped particle records from raw instrument");
    println!("files: binary telemetry frames, DCL text logs, and CSV exports.");
    println!();
    println!("USAGE:");
    println!("    particle-ingest <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    extract     Extract particles from a source file or directory");
    println!("    inspect     Validate and summarize a decoder configuration");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("EXAMPLES:");
    println!("    # Extract a single telemetry file to JSON lines:");
    println!("    particle-ingest extract --config adcp_frames.json telemetry.dat -o particles.jsonl");
    println!();
    println!("    # Extract every log under a deployment directory:");
    println!("    particle-ingest extract --config flort_dcl.json /data/deployment_0042/");
    println!();
    println!("    # Check a configuration without touching data:");
    println!("    particle-ingest inspect adcp_frames.json");
    println!();
    println!("For detailed help on any command, use:");
    println!("    particle-ingest <COMMAND> --help");
}

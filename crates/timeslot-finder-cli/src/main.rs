//! `timeslots` CLI: search bookable slots and validate configurations from
//! the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Search slots for a request (stdin → stdout)
//! cat request.json | timeslots find
//!
//! # Pin "now" so the output is reproducible, pretty-print to a file
//! timeslots find -i request.json -o slots.json --now 2020-10-14T15:00:00Z --pretty
//!
//! # Reject an invalid configuration before searching
//! timeslots find -i request.json --validate
//!
//! # Check a configuration on its own
//! timeslots validate -i config.json
//!
//! # Debug logging (otherwise RUST_LOG is honored)
//! timeslots -v find -i request.json
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::io::{self, Read};
use timeslot_finder::{validate_configuration, Configuration, SearchRequest};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "timeslots", version, about = "Bookable time slot finder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the bookable slots of a search request
    Find {
        /// Request file with `configuration`, `from` and `to` (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Instant to search from, RFC 3339 (defaults to the system clock)
        #[arg(long)]
        now: Option<DateTime<Utc>>,
        /// Validate the configuration before searching
        #[arg(long)]
        validate: bool,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Validate a configuration
    Validate {
        /// Configuration file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so stdout stays valid JSON.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Find {
            input,
            output,
            now,
            validate,
            pretty,
        } => {
            let json = read_input(input.as_deref())?;
            let request = SearchRequest::from_json(&json).context("Failed to parse search request")?;

            if validate {
                validate_configuration(&request.configuration).context("Invalid configuration")?;
            }

            let now = now.unwrap_or_else(Utc::now);
            tracing::debug!(%now, "searching time slots");
            let result = request.search(now).context("Failed to search time slots")?;
            if result.discarded_periods > 0 {
                tracing::info!(
                    discarded = result.discarded_periods,
                    "some unavailable periods were ignored"
                );
            }

            let rendered = if pretty {
                serde_json::to_string_pretty(&result.slots)?
            } else {
                serde_json::to_string(&result.slots)?
            };
            write_output(output.as_deref(), &rendered)?;
        }
        Commands::Validate { input } => {
            let json = read_input(input.as_deref())?;
            let config: Configuration =
                serde_json::from_str(&json).context("Failed to parse configuration")?;
            validate_configuration(&config).context("Invalid configuration")?;
            println!("valid");
        }
    }

    Ok(())
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

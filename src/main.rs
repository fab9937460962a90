//! Rulesmith CLI
//!
//! Generates gateway access rules from the sources listed in the configuration.

use clap::{Parser, Subcommand, ValueEnum};
use rulesmith::{config::load_config, generate, output::write_rules};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Rulesmith - gateway access rules from OpenAPI and TOML sources
#[derive(Parser, Debug)]
#[command(name = "rulesmith")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "RULESMITH_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "RULESMITH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, env = "RULESMITH_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate rules and write them as a JSON array
    Generate {
        /// Output file (defaults to the configured path, else stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Resolve every source without writing any output
    Validate,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the generated rules
    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init(),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.log_format);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting rulesmith");

    let mut config = load_config(args.config.as_deref())
        .inspect_err(|e| error!(error = %e, "Failed to load configuration"))?;

    let output = generate(&config).inspect_err(|e| error!(error = %e, "Failed to generate rules"))?;

    match args.command {
        Command::Generate { output: path, pretty } => {
            if path.is_some() {
                config.output.path = path;
            }
            config.output.pretty |= pretty;

            write_rules(&output.rules, &config.output)
                .inspect_err(|e| error!(error = %e, "Failed to write rules"))?;
        }
        Command::Validate => {
            if !output.skipped.is_empty() {
                anyhow::bail!("{} source(s) failed", output.skipped.len());
            }
            info!(rules = output.rules.len(), "All sources resolved");
        }
    }

    Ok(())
}

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, info_span};

use herald::config::Settings;
use herald::logging::configure_logging;
use herald::types::{validate_dedupe_threshold, AnalyzeRequest, AnalyzeResponse, NewsBatch};
use herald::util::correlation_id;

#[derive(Parser)]
#[clap(name = "herald", about = "Dedupe and cluster news items")]
struct Cli {
    /// Correlation id attached to every log line of this run
    #[clap(long, global = true)]
    correlation_id: Option<String>,

    /// Pretty-print the JSON output
    #[clap(long, global = true)]
    pretty: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drop near-duplicates from a {"items": [...]} batch
    Dedupe {
        /// Input file (stdin when omitted)
        #[clap(short, long)]
        input: Option<PathBuf>,

        /// Title similarity at which a record counts as a duplicate (0.0-1.0)
        #[clap(short, long)]
        threshold: Option<f64>,
    },

    /// Group a batch into scored story clusters
    Cluster {
        /// Input file (stdin when omitted)
        #[clap(short, long)]
        input: Option<PathBuf>,

        /// Confirm window in minutes (15-720)
        #[clap(short, long)]
        window: Option<i64>,

        /// Title similarity needed to join a cluster (0.5-1.0)
        #[clap(short, long)]
        threshold: Option<f64>,
    },

    /// Dedupe, then cluster what survives
    Analyze {
        /// Input file (stdin when omitted)
        #[clap(short, long)]
        input: Option<PathBuf>,

        /// Confirm window in minutes (15-720)
        #[clap(short, long)]
        window: Option<i64>,

        /// Title similarity needed to join a cluster (0.5-1.0)
        #[clap(short, long)]
        threshold: Option<f64>,

        /// Title similarity at which a record counts as a duplicate (0.0-1.0)
        #[clap(short, long)]
        dedupe_threshold: Option<f64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env().context("Failed to load configuration")?;
    let _guard = configure_logging(&settings.log_dir)?;

    let span = info_span!(
        "herald",
        correlation_id = %correlation_id(cli.correlation_id.as_deref())
    );
    let _enter = span.enter();
    settings.log();

    let engine = settings.engine_builder().build();

    match cli.command {
        Commands::Dedupe { input, threshold } => {
            let batch: NewsBatch = read_json(input.as_deref())?;
            let threshold = threshold.unwrap_or(settings.dedupe_threshold);
            validate_dedupe_threshold(threshold)?;

            let kept = engine.dedupe(&batch.items, threshold);
            let output = NewsBatch {
                items: kept.into_iter().cloned().collect(),
            };
            write_json(&output, cli.pretty)
        }
        Commands::Cluster {
            input,
            window,
            threshold,
        } => {
            let request = read_request(input.as_deref(), window, threshold)?;
            let params = request.resolve(settings.cluster_params())?;

            let clusters = engine.cluster(
                &request.items,
                params.confirm_window_minutes,
                params.similarity_threshold,
            );
            write_json(&AnalyzeResponse { clusters }, cli.pretty)
        }
        Commands::Analyze {
            input,
            window,
            threshold,
            dedupe_threshold,
        } => {
            let request = read_request(input.as_deref(), window, threshold)?;
            let params = request.resolve(settings.cluster_params())?;
            let dedupe_threshold = dedupe_threshold.unwrap_or(settings.dedupe_threshold);
            validate_dedupe_threshold(dedupe_threshold)?;

            let clusters = engine.analyze(
                &request.items,
                dedupe_threshold,
                params.confirm_window_minutes,
                params.similarity_threshold,
            );
            write_json(&AnalyzeResponse { clusters }, cli.pretty)
        }
    }
}

/// Reads a request and lets command-line flags override its parameters.
fn read_request(
    input: Option<&Path>,
    window: Option<i64>,
    threshold: Option<f64>,
) -> Result<AnalyzeRequest> {
    let mut request: AnalyzeRequest = read_json(input)?;
    if window.is_some() {
        request.confirm_window_minutes = window;
    }
    if threshold.is_some() {
        request.similarity_threshold = threshold;
    }
    info!("Read {} items", request.items.len());
    Ok(request)
}

fn read_json<T: serde::de::DeserializeOwned>(input: Option<&Path>) -> Result<T> {
    let raw = match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read stdin")?;
            raw
        }
    };
    serde_json::from_str(&raw).context("Failed to parse input JSON")
}

fn write_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if pretty {
        serde_json::to_writer_pretty(&mut out, value)?;
    } else {
        serde_json::to_writer(&mut out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

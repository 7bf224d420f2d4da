//! `check-ingest`: feed newline-delimited worker batches into the pipeline.
//!
//! # Flow
//! ```text
//! stdin / --input (one WorkerBatch JSON per line)
//!     → WriteData (account, region, raw size)
//!     → Ingestor → writer pools → stores / bookkeeping / app-metrics cache
//! ```
//!
//! EOF or SIGINT/SIGTERM stops reading; queued writes are drained before exit.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use check_ingest::config::load_config;
use check_ingest::lifecycle::{build_ingestor, signals, Shutdown};
use check_ingest::model::{WorkerBatch, WriteData};
use check_ingest::observability::{logging, metrics, IngestMetrics};

#[derive(Parser)]
#[command(name = "check-ingest", about = "Check result ingestion pipeline")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Account the batches belong to.
    #[arg(long)]
    account: String,

    /// Region the batches come from.
    #[arg(long)]
    region: String,

    /// Read batches from this file instead of stdin.
    #[arg(short, long)]
    input: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init_logging(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = config.store.backend.name(),
        "check-ingest starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let ingest_metrics = Arc::new(IngestMetrics::new());
    let ingestor = build_ingestor(&config, ingest_metrics.clone())?;

    let shutdown = Arc::new(Shutdown::new());
    let mut stop = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown.clone());

    let input: Box<dyn AsyncRead + Unpin + Send> = match &cli.input {
        Some(path) => Box::new(tokio::fs::File::open(path).await?),
        None => Box::new(tokio::io::stdin()),
    };
    let mut lines = BufReader::new(input).lines();
    let mut batches = 0_u64;

    loop {
        let line = tokio::select! {
            _ = stop.recv() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            tracing::info!("End of input");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let batch = match WorkerBatch::parse_lenient(&line) {
            Ok(parsed) => {
                for e in &parsed.rejected {
                    ingest_metrics.record_parse_error();
                    tracing::warn!(error = %e, "Skipping malformed check result");
                }
                Some(parsed.batch)
            }
            Err(e) => {
                ingest_metrics.record_parse_error();
                tracing::warn!(error = %e, "Unparseable worker batch");
                None
            }
        };
        let data = WriteData {
            batch,
            account_id: cli.account.clone(),
            region: cli.region.clone(),
            payload_bytes: line.len(),
        };
        ingestor.ingest(data).await;
        batches += 1;
    }

    tracing::info!(batches, "Draining writer pools");
    ingestor.shutdown().await;

    let snapshot = ingest_metrics.snapshot();
    tracing::info!(
        data_points = snapshot.data_points,
        parse_errors = snapshot.parse_errors,
        write_errors = snapshot.write_errors,
        host_errors = snapshot.host_errors,
        "Shutdown complete"
    );
    Ok(())
}

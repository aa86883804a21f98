use std::io::{self, Write};
use std::path::Path;

use clap::Parser;
use error::AppError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use ts_demux::{Demux, DemuxConfig, RunOutcome, SyncMode, open_packet_source};

mod cli;
mod error;
mod output;

use cli::{CliArgs, Command, SourceArgs};

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        // Log the full error for debugging
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

fn bootstrap() -> Result<(), AppError> {
    // Parse command-line arguments
    let args = CliArgs::parse();

    // Setup logging, RUST_LOG takes precedence over --verbose
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Initialization(e.to_string()))?;

    // Ctrl-C stops the scan between two packet reads
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel())
            .map_err(|e| AppError::Initialization(e.to_string()))?;
    }

    match args.command {
        Command::Headers { source, packets } => show_headers(&source, packets, &cancel),
        Command::Summary {
            source,
            packets,
            verify_crc,
        } => {
            let config = DemuxConfig::builder()
                .sync_mode(sync_mode(&source))
                .verify_crc(verify_crc)
                .packet_limit(packets)
                .build();
            show_summary(&source.input, config, &cancel)
        }
    }
}

fn sync_mode(source: &SourceArgs) -> SyncMode {
    if source.strict_sync {
        SyncMode::Strict
    } else {
        SyncMode::Lenient
    }
}

fn show_headers(
    source: &SourceArgs,
    packets: u64,
    cancel: &CancellationToken,
) -> Result<(), AppError> {
    let mut reader = open_packet_source(&source.input)?.with_sync_mode(sync_mode(source));
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for index in 0..packets {
        if cancel.is_cancelled() {
            info!(index, "Interrupted");
            break;
        }
        let Some(packet) = reader.read_packet()? else {
            info!(index, "End of stream");
            break;
        };
        output::write_header_line(&mut out, index, &packet.header())?;
    }
    out.flush()?;
    Ok(())
}

fn show_summary(
    input: &Path,
    config: DemuxConfig,
    cancel: &CancellationToken,
) -> Result<(), AppError> {
    info!(input = %input.display(), "Scanning transport stream");
    let mut reader = open_packet_source(input)?.with_sync_mode(config.sync_mode);
    let mut demux = Demux::new(config);
    let result = demux.run(&mut reader, cancel);

    // Whatever was gathered is printed even when the scan ended early
    let stdout = io::stdout();
    let mut out = stdout.lock();
    output::write_summary(&mut out, &demux)?;
    out.flush()?;

    match result? {
        RunOutcome::Cancelled => warn!("Scan interrupted, summary is partial"),
        RunOutcome::LimitReached | RunOutcome::EndOfStream => {}
    }
    Ok(())
}

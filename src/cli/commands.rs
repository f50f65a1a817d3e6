//! Command implementations for the sensor combiner CLI
//!
//! Logging setup, the export/serve/datasets commands, and run reports.

use crate::cli::args::{Args, Commands, DatasetsArgs, ExportArgs, OutputFormat, ServeArgs};
use crate::config::CombinerConfig;
use crate::models::PipelineStats;
use crate::pipeline::CombinePipeline;
use crate::server;
use anyhow::Context;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Main command runner
pub async fn run(args: Args) -> anyhow::Result<()> {
    setup_logging(&args);
    debug!("Command line arguments: {:?}", args);

    match &args.command {
        Some(Commands::Export(export_args)) => export(export_args, args.show_progress()).await,
        Some(Commands::Serve(serve_args)) => serve(serve_args).await,
        Some(Commands::Datasets(datasets_args)) => datasets(datasets_args),
        None => Ok(()),
    }
}

/// Run a command until it finishes or `shutdown` resolves
///
/// An interrupted run is an error, so the process exits non-zero.
pub async fn run_until<F>(args: Args, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    tokio::select! {
        biased;
        _ = shutdown => {
            eprintln!("\nReceived CTRL+C, shutting down...");
            Err(anyhow::anyhow!("Interrupted by user"))
        }
        result = run(args) => result,
    }
}

/// Set up structured logging on stderr
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sensor_combiner={}", log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if args.quiet {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if result.is_ok() {
        debug!("Logging initialized at level: {}", log_level);
    }
}

async fn export(args: &ExportArgs, show_progress: bool) -> anyhow::Result<()> {
    let config = args.sources.to_config()?;
    let pipeline = CombinePipeline::from_config(config)?;

    let progress_bar = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .context("Invalid progress template")?,
        );
        pb.set_message("Fetching and combining datasets...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let result = pipeline.run().await;
    if let Some(pb) = &progress_bar {
        pb.finish_and_clear();
    }
    let (bytes, stats) = result?;

    if args.stdout {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(&bytes).await?;
        stdout.flush().await?;
    } else {
        let output = args.output.clone();
        tokio::task::spawn_blocking(move || write_atomically(&output, &bytes)).await??;
        info!("Wrote {}", args.output.display());
    }

    // the CSV owns stdout when --stdout is given
    let report = match args.output_format {
        OutputFormat::Human => human_report(&stats, args),
        OutputFormat::Json => serde_json::to_string_pretty(&stats)?,
    };
    if args.stdout {
        eprintln!("{}", report);
    } else {
        println!("{}", report);
    }

    Ok(())
}

async fn serve(args: &ServeArgs) -> anyhow::Result<()> {
    let config = args.to_config()?;
    let addr = args.socket_addr()?;
    let pipeline = CombinePipeline::from_config(config)?;

    println!(
        "{} {}",
        "Serving combined CSV at".bright_green(),
        format!("http://{}", addr).bright_cyan().bold()
    );
    server::serve(pipeline, addr).await
}

fn datasets(args: &DatasetsArgs) -> anyhow::Result<()> {
    let mut config = args.sources.to_config()?;
    if let Some(kind) = args.dataset {
        config.sources.retain(|source_kind, _| *source_kind == kind);
    }

    match args.output_format {
        OutputFormat::Human => println!("{}", sources_report(&config)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
    }
    Ok(())
}

/// Write `bytes` to `path` through a temporary file in the same directory
///
/// Readers of `path` see either the previous file or the complete new one.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    file.write_all(bytes)
        .with_context(|| format!("Failed to write {}", file.path().display()))?;
    file.as_file().sync_all()?;
    file.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn human_report(stats: &PipelineStats, args: &ExportArgs) -> String {
    let destination = if args.stdout {
        "stdout".to_string()
    } else {
        args.output.display().to_string()
    };

    let mut lines = vec![
        format!("{}", "Combined CSV ready".bright_green().bold()),
        format!(
            "   • Rows: {} hours x {} columns",
            stats.combined_rows, stats.combined_columns
        ),
        format!(
            "   • Output: {} ({})",
            destination.bright_cyan(),
            format_size(stats.output_bytes as u64)
        ),
        format!("   • Processing time: {} ms", stats.processing_time_ms),
    ];

    for dataset in &stats.datasets {
        lines.push(format!(
            "   • {}: {} rows -> {} hours, {} columns",
            dataset.dataset.to_string().bright_yellow(),
            dataset.parsed_rows,
            dataset.hourly_rows,
            dataset.data_columns
        ));
        if dataset.dropped_rows > 0 {
            lines.push(format!(
                "     {}",
                format!("{} rows dropped", dataset.dropped_rows).yellow()
            ));
        }
    }

    lines.join("\n")
}

fn sources_report(config: &CombinerConfig) -> String {
    let mut lines = vec![format!("{}", "Dataset sources:".bright_green().bold())];
    for source in config.sources.values() {
        lines.push(format!(
            "   • {} {} {}",
            source.kind.name().bright_yellow().bold(),
            source.location.bright_cyan(),
            format!("(skip {} rows)", source.parse_hints().skip_rows).bright_black()
        ));
    }
    lines.push(format!(
        "   timeout {}s, gap filling {}, strict timestamps {}",
        config.request_timeout_secs, config.fill_hourly_gaps, config.strict_timestamps
    ));
    lines.join("\n")
}

/// Format a byte count in human-readable units
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

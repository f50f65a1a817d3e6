//! Command-line argument definitions for the sensor combiner
//!
//! Every subcommand starts from the default configuration (the published
//! dataset locations) and layers its flags on top.

use crate::config::CombinerConfig;
use crate::constants::{DEFAULT_ATTACHMENT_NAME, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT};
use crate::error::{CombinerError, Result};
use crate::models::DatasetKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

/// CLI arguments for the sensor combiner
///
/// Joins the Bancroft mown-plot weather station, solar radiation,
/// precipitation and treatment-plot readings into one hourly CSV.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sensor-combiner",
    version,
    about = "Combine four environmental sensor CSV datasets into one hourly table",
    long_about = "Fetches the Bancroft mown-plot station export, solar radiation, precipitation \
                  and treatment-plot soil readings, aligns all of them on an hourly timeline and \
                  writes the outer join as a single CSV. The same table can be served over HTTP \
                  behind a one-button download page."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Logging verbosity
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Produce the combined CSV once and write it to a file or stdout
    Export(ExportArgs),
    /// Serve the download page and the combined CSV over HTTP
    Serve(ServeArgs),
    /// Show the dataset sources a run would read
    Datasets(DatasetsArgs),
}

/// Source overrides and pipeline switches shared by every subcommand
#[derive(Debug, Clone, Default, Parser)]
pub struct SourceArgs {
    /// Location of the Bancroft mown-plot station export (URL or path)
    #[arg(long = "bancroft", value_name = "LOCATION")]
    pub bancroft: Option<String>,

    /// Location of the solar radiation dataset (URL or path)
    #[arg(long = "solar", value_name = "LOCATION")]
    pub solar: Option<String>,

    /// Location of the precipitation dataset (URL or path)
    #[arg(long = "precip", value_name = "LOCATION")]
    pub precip: Option<String>,

    /// Location of the treatment-plot dataset (URL or path)
    #[arg(long = "treatment", value_name = "LOCATION")]
    pub treatment: Option<String>,

    /// Preamble lines ahead of the Bancroft header row
    #[arg(long = "bancroft-skip-rows", value_name = "N")]
    pub bancroft_skip_rows: Option<usize>,

    /// Per-request timeout for remote sources, in seconds
    #[arg(long = "timeout", value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Emit empty rows for hours a dataset skipped inside its own range
    #[arg(long = "fill-gaps")]
    pub fill_gaps: bool,

    /// Fail on the first unparsable timestamp instead of dropping the row
    #[arg(long = "strict-timestamps")]
    pub strict_timestamps: bool,
}

/// Arguments for the export command
#[derive(Debug, Clone, Parser)]
pub struct ExportArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Output path for the combined CSV
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        default_value = DEFAULT_ATTACHMENT_NAME
    )]
    pub output: PathBuf,

    /// Write the CSV to stdout instead of a file
    #[arg(long = "stdout", conflicts_with = "output")]
    pub stdout: bool,

    /// Format of the run summary
    #[arg(
        short = 'f',
        long = "format",
        value_enum,
        default_value = "human"
    )]
    pub output_format: OutputFormat,
}

/// Arguments for the serve command
#[derive(Debug, Clone, Parser)]
pub struct ServeArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Interface to bind
    #[arg(long = "host", default_value = DEFAULT_SERVER_HOST)]
    pub host: String,

    /// Port to bind
    #[arg(short = 'p', long = "port", default_value_t = DEFAULT_SERVER_PORT)]
    pub port: u16,

    /// File name offered with the download
    #[arg(long = "attachment-name", value_name = "NAME")]
    pub attachment_name: Option<String>,
}

/// Arguments for the datasets command
#[derive(Debug, Clone, Parser)]
pub struct DatasetsArgs {
    /// Show only this dataset (e.g. bancroft_mown, m_srad, precip, treatment)
    #[arg(value_name = "DATASET")]
    pub dataset: Option<DatasetKind>,

    #[command(flatten)]
    pub sources: SourceArgs,

    /// Output format
    #[arg(
        short = 'f',
        long = "format",
        value_enum,
        default_value = "human"
    )]
    pub output_format: OutputFormat,
}

/// Output format options for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

impl Args {
    /// Log level derived from the verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Spinners are hidden in quiet mode
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

impl SourceArgs {
    /// Default configuration with these overrides applied
    pub fn to_config(&self) -> Result<CombinerConfig> {
        let mut config = CombinerConfig::default();

        let locations = [
            (DatasetKind::BancroftMown, &self.bancroft),
            (DatasetKind::SolarRadiation, &self.solar),
            (DatasetKind::Precipitation, &self.precip),
            (DatasetKind::Treatment, &self.treatment),
        ];
        for (kind, location) in locations {
            if let Some(location) = location {
                config = config.with_source_location(kind, location.as_str());
            }
        }

        if let Some(skip_rows) = self.bancroft_skip_rows {
            config = config.with_bancroft_skip_rows(skip_rows);
        }
        if let Some(timeout) = self.timeout {
            config = config.with_request_timeout_secs(timeout);
        }
        if self.fill_gaps {
            config = config.with_gap_filling();
        }
        if self.strict_timestamps {
            config = config.with_strict_timestamps();
        }

        config.validate()?;
        Ok(config)
    }
}

impl ServeArgs {
    /// Configuration for the server, including the attachment name
    pub fn to_config(&self) -> Result<CombinerConfig> {
        let mut config = self.sources.to_config()?;
        if let Some(name) = &self.attachment_name {
            config = config.with_attachment_name(name.as_str());
            config.validate()?;
        }
        Ok(config)
    }

    /// Socket address to bind
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                CombinerError::configuration(format!(
                    "Invalid bind address {}:{}: {}",
                    self.host, self.port, e
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{BANCROFT_MOWN_URL, DEFAULT_BANCROFT_SKIP_ROWS};

    #[test]
    fn test_no_subcommand() {
        let args = Args::try_parse_from(["sensor-combiner"]).unwrap();
        assert!(args.command.is_none());
        assert_eq!(args.get_log_level(), "warn");
    }

    #[test]
    fn test_log_levels() {
        let args = Args::try_parse_from(["sensor-combiner", "-vv", "datasets"]).unwrap();
        assert_eq!(args.get_log_level(), "debug");

        let args = Args::try_parse_from(["sensor-combiner", "datasets", "--quiet"]).unwrap();
        assert_eq!(args.get_log_level(), "error");
        assert!(!args.show_progress());

        assert!(Args::try_parse_from(["sensor-combiner", "-v", "-q", "datasets"]).is_err());
    }

    #[test]
    fn test_export_defaults() {
        let args = Args::try_parse_from(["sensor-combiner", "export"]).unwrap();
        let Some(Commands::Export(export)) = args.command else {
            panic!("expected export command");
        };
        assert_eq!(export.output, PathBuf::from("combined_data.csv"));
        assert!(!export.stdout);
        assert_eq!(export.output_format, OutputFormat::Human);

        let config = export.sources.to_config().unwrap();
        let bancroft = config.source(DatasetKind::BancroftMown).unwrap();
        assert_eq!(bancroft.location, BANCROFT_MOWN_URL);
        assert_eq!(bancroft.parse_hints().skip_rows, DEFAULT_BANCROFT_SKIP_ROWS);
    }

    #[test]
    fn test_stdout_conflicts_with_output() {
        let result = Args::try_parse_from([
            "sensor-combiner",
            "export",
            "--stdout",
            "--output",
            "out.csv",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_source_overrides() {
        let args = Args::try_parse_from([
            "sensor-combiner",
            "export",
            "--precip",
            "/data/precip.csv",
            "--bancroft-skip-rows",
            "3",
            "--timeout",
            "5",
            "--fill-gaps",
            "--strict-timestamps",
        ])
        .unwrap();
        let Some(Commands::Export(export)) = args.command else {
            panic!("expected export command");
        };
        let config = export.sources.to_config().unwrap();

        assert_eq!(
            config.source(DatasetKind::Precipitation).unwrap().location,
            "/data/precip.csv"
        );
        assert_eq!(
            config
                .source(DatasetKind::BancroftMown)
                .unwrap()
                .parse_hints()
                .skip_rows,
            3
        );
        assert_eq!(config.request_timeout_secs, 5);
        assert!(config.fill_hourly_gaps);
        assert!(config.strict_timestamps);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let sources = SourceArgs {
            timeout: Some(0),
            ..Default::default()
        };
        assert!(sources.to_config().is_err());
    }

    #[test]
    fn test_datasets_filter() {
        let args = Args::try_parse_from(["sensor-combiner", "datasets", "srad"]).unwrap();
        let Some(Commands::Datasets(datasets)) = args.command else {
            panic!("expected datasets command");
        };
        assert_eq!(datasets.dataset, Some(DatasetKind::SolarRadiation));

        assert!(Args::try_parse_from(["sensor-combiner", "datasets", "wind"]).is_err());
    }

    #[test]
    fn test_serve_address() {
        let args = Args::try_parse_from(["sensor-combiner", "serve", "--port", "9000"]).unwrap();
        let Some(Commands::Serve(serve)) = args.command else {
            panic!("expected serve command");
        };
        assert_eq!(
            serve.socket_addr().unwrap(),
            "127.0.0.1:9000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(serve.to_config().unwrap().attachment_name, "combined_data.csv");

        let bad = ServeArgs {
            host: "not a host".into(),
            ..serve
        };
        assert!(bad.socket_addr().is_err());
    }
}

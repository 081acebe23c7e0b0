//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// ModeShare - commute mode-share reports from CTPP census tables
///
/// Fetches means-of-transportation estimates for one city, computes each
/// mode's share by minority status and household income, and writes a
/// Markdown report with charts and a comparison table.
///
/// Examples:
///   modeshare --residence "Boston city, Massachusetts" --state Massachusetts
///   modeshare --snapshot-dir ./data --output boston.md
///   modeshare --format json --output boston.json
///   modeshare --dry-run
///   modeshare --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Exact residence geography to report on
    ///
    /// Must match the geography name returned by the data service,
    /// e.g. "Boston city, Massachusetts".
    #[arg(short, long, value_name = "NAME")]
    pub residence: Option<String>,

    /// State containing the residence geography
    #[arg(short, long, value_name = "STATE")]
    pub state: Option<String>,

    /// Dataset vintage (e.g. 2016 for the 2012-2016 ACS tabulation)
    #[arg(long, value_name = "YEAR")]
    pub vintage: Option<String>,

    /// Geography level to request (e.g. place, county)
    #[arg(long, value_name = "LEVEL")]
    pub geo_level: Option<String>,

    /// Table identifier for minority status by means of transportation
    #[arg(long, value_name = "ID")]
    pub minority_table: Option<String>,

    /// Table identifier for household income by means of transportation
    #[arg(long, value_name = "ID")]
    pub income_table: Option<String>,

    /// Base URL of the CTPP data service
    #[arg(long, env = "CTPP_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// API key for the CTPP data service
    #[arg(long, env = "CTPP_API_KEY", value_name = "KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Read `<table>.json` snapshots from this directory instead of the service
    #[arg(long, value_name = "DIR")]
    pub snapshot_dir: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Charts are written to a `charts/` directory next to it.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .modeshare.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Dry run: fetch and normalize the tables without writing a report
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .modeshare.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format with SVG charts (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref residence) = self.residence {
            if residence.trim().is_empty() {
                return Err("Residence must not be empty".to_string());
            }
        }

        if let Some(ref vintage) = self.vintage {
            if vintage.len() != 4 || !vintage.chars().all(|c| c.is_ascii_digit()) {
                return Err(format!("Vintage must be a four-digit year: {}", vintage));
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref dir) = self.snapshot_dir {
            if !dir.is_dir() {
                return Err(format!(
                    "Snapshot directory does not exist: {}",
                    dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `--quiet` wins; otherwise `--verbose` or `verbose = true` in the
    /// config file selects DEBUG.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            residence: Some("Boston city, Massachusetts".to_string()),
            state: Some("Massachusetts".to_string()),
            vintage: Some("2016".to_string()),
            geo_level: None,
            minority_table: None,
            income_table: None,
            api_url: None,
            api_key: None,
            snapshot_dir: None,
            output: None,
            format: OutputFormat::Markdown,
            config: None,
            verbose: false,
            quiet: false,
            timeout: None,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_api_url() {
        let mut args = make_args();
        args.api_url = Some("ctppdata.transportation.org".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_vintage() {
        let mut args = make_args();
        args.vintage = Some("16".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_snapshot_dir() {
        let mut args = make_args();
        args.snapshot_dir = Some(PathBuf::from("/definitely/not/here"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }

    #[test]
    fn test_merge_into_config() {
        let mut args = make_args();
        args.minority_table = Some("B102201".to_string());
        args.timeout = Some(5);

        let mut config = crate::config::Config::default();
        config.merge_with_args(&args);

        assert_eq!(config.tables.minority, "B102201");
        assert_eq!(config.source.timeout_seconds, 5);
        assert_eq!(config.source.residence, "Boston city, Massachusetts");
        assert_eq!(config.general.output, "modeshare_report.md");
    }
}

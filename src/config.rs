//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.modeshare.toml` files.

use crate::analysis::ColumnNames;
use crate::source::OutputLabels;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".modeshare.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Data service settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Table identifiers.
    #[serde(default)]
    pub tables: TablesConfig,

    /// Source column names.
    #[serde(default)]
    pub columns: ColumnsConfig,

    /// Mode bucket overrides.
    #[serde(default)]
    pub modes: ModesConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "modeshare_report.md".to_string()
}

/// CTPP data service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the data service.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Optional API key, sent as `x-api-key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Dataset vintage (final year of the 5-year ACS period).
    #[serde(default = "default_vintage")]
    pub vintage: String,

    /// Geography level to request.
    #[serde(default = "default_geography_level")]
    pub geography_level: String,

    /// State name.
    #[serde(default = "default_state")]
    pub state: String,

    /// Exact residence geography string to keep.
    #[serde(default = "default_residence")]
    pub residence: String,

    /// Category label mode requested from the service (`name` or `code`).
    #[serde(default)]
    pub output_labels: OutputLabels,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Read `{table}.json` from this directory instead of calling the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_dir: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            vintage: default_vintage(),
            geography_level: default_geography_level(),
            state: default_state(),
            residence: default_residence(),
            output_labels: OutputLabels::default(),
            timeout_seconds: default_timeout(),
            snapshot_dir: None,
        }
    }
}

fn default_api_url() -> String {
    "https://ctppdata.transportation.org/api".to_string()
}

fn default_vintage() -> String {
    "2016".to_string()
}

fn default_geography_level() -> String {
    "place".to_string()
}

fn default_state() -> String {
    "Massachusetts".to_string()
}

fn default_residence() -> String {
    "Boston city, Massachusetts".to_string()
}

fn default_timeout() -> u64 {
    60
}

/// Table identifiers for the two analyses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesConfig {
    /// Minority status by means of transportation.
    #[serde(default = "default_minority_table")]
    pub minority: String,

    /// Household income by means of transportation.
    #[serde(default = "default_income_table")]
    pub income: String,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            minority: default_minority_table(),
            income: default_income_table(),
        }
    }
}

fn default_minority_table() -> String {
    "A102106".to_string()
}

fn default_income_table() -> String {
    "A102107".to_string()
}

/// Source column names as returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnsConfig {
    #[serde(default = "default_residence_column")]
    pub residence: String,

    /// Group column of the minority-status table.
    #[serde(default = "default_minority_column")]
    pub minority_group: String,

    /// Group column of the income table.
    #[serde(default = "default_income_column")]
    pub income_group: String,

    #[serde(default = "default_mode_column")]
    pub mode: String,

    #[serde(default = "default_estimate_column")]
    pub estimate: String,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            residence: default_residence_column(),
            minority_group: default_minority_column(),
            income_group: default_income_column(),
            mode: default_mode_column(),
            estimate: default_estimate_column(),
        }
    }
}

fn default_residence_column() -> String {
    "RESIDENCE".to_string()
}

fn default_minority_column() -> String {
    "MINORITY".to_string()
}

fn default_income_column() -> String {
    "HHINC".to_string()
}

fn default_mode_column() -> String {
    "MEANS".to_string()
}

fn default_estimate_column() -> String {
    "EST".to_string()
}

impl ColumnsConfig {
    /// Column names for the minority-status table.
    pub fn minority(&self) -> ColumnNames {
        ColumnNames {
            residence: self.residence.clone(),
            group: self.minority_group.clone(),
            mode: self.mode.clone(),
            estimate: self.estimate.clone(),
        }
    }

    /// Column names for the income table.
    pub fn income(&self) -> ColumnNames {
        ColumnNames {
            residence: self.residence.clone(),
            group: self.income_group.clone(),
            mode: self.mode.clone(),
            estimate: self.estimate.clone(),
        }
    }
}

/// Extra raw-label → bucket entries, applied on top of the built-in mapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModesConfig {
    #[serde(default)]
    pub buckets: BTreeMap<String, String>,
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Group whose share is the minuend of the difference column.
    #[serde(default = "default_reference_group")]
    pub reference_group: String,

    /// Group compared against the reference.
    #[serde(default = "default_comparison_group")]
    pub comparison_group: String,

    /// Chart width in pixels.
    #[serde(default = "default_chart_width")]
    pub chart_width: u32,

    /// Chart height in pixels.
    #[serde(default = "default_chart_height")]
    pub chart_height: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            reference_group: default_reference_group(),
            comparison_group: default_comparison_group(),
            chart_width: default_chart_width(),
            chart_height: default_chart_height(),
        }
    }
}

fn default_title() -> String {
    "How Residents Get to Work".to_string()
}

fn default_reference_group() -> String {
    crate::models::NON_HISPANIC_WHITE.to_string()
}

fn default_comparison_group() -> String {
    crate::models::MINORITY.to_string()
}

fn default_chart_width() -> u32 {
    720
}

fn default_chart_height() -> u32 {
    420
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_default_in(Path::new("."))
    }

    /// Look for `.modeshare.toml` in `dir`.
    pub fn load_default_in(dir: &Path) -> Result<Option<Self>> {
        let default_path = dir.join(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(&default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicitly provided values override the config.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref residence) = args.residence {
            self.source.residence = residence.clone();
        }
        if let Some(ref state) = args.state {
            self.source.state = state.clone();
        }
        if let Some(ref vintage) = args.vintage {
            self.source.vintage = vintage.clone();
        }
        if let Some(ref level) = args.geo_level {
            self.source.geography_level = level.clone();
        }
        if let Some(ref url) = args.api_url {
            self.source.api_url = url.clone();
        }
        if let Some(ref key) = args.api_key {
            self.source.api_key = Some(key.clone());
        }
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = timeout;
        }
        if let Some(ref dir) = args.snapshot_dir {
            self.source.snapshot_dir = Some(dir.display().to_string());
        }

        if let Some(ref table) = args.minority_table {
            self.tables.minority = table.clone();
        }
        if let Some(ref table) = args.income_table {
            self.tables.income = table.clone();
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

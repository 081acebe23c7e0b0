//! ModeShare - commute mode-share reports from CTPP census tables
//!
//! A CLI tool that fetches means-of-transportation estimates for one city,
//! computes mode shares by minority status and household income, and
//! renders a Markdown report with charts and a comparison table.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any failure (fetch, schema change, missing geography, I/O)

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod pipeline;
mod report;
mod source;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use report::ChartStyle;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(args.log_level(config.general.verbose));

    info!("ModeShare v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args, config).await {
        error!("Report build failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .modeshare.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to choose the city, tables, column names, and mode buckets.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete build: fetch, analyze, write.
async fn run(args: Args, mut config: Config) -> Result<()> {
    config.merge_with_args(&args);

    let source = pipeline::data_source(&config, !args.quiet)?;

    println!("📥 Loading CTPP tables for {}", config.source.residence);
    println!("   Source: {}", source.describe());
    println!(
        "   Tables: {} (minority status), {} (household income)",
        config.tables.minority, config.tables.income
    );

    if args.dry_run {
        return handle_dry_run(&source, &config).await;
    }

    println!("\n🔬 Computing mode shares...");
    let report = pipeline::build_report(&config, &source).await?;

    println!("\n📝 Writing report...");
    let output = PathBuf::from(&config.general.output);
    let style = ChartStyle {
        width: config.report.chart_width,
        height: config.report.chart_height,
    };

    match args.format {
        OutputFormat::Json => report::write_json_report(&report, &output)?,
        OutputFormat::Markdown => {
            let written = report::write_markdown_bundle(&report, &output, &style)?;
            debug!("Wrote {} files", written.len());
        }
    }

    // Print summary
    println!("\n📊 Summary:");
    if let Some(gap) = report.minority.comparison.largest_gap() {
        println!(
            "   Largest gap: {} ({:+.1} pts, {} vs {})",
            gap.mode,
            gap.difference,
            report.minority.comparison.reference_group,
            report.minority.comparison.comparison_group
        );
    }
    println!("   Income brackets: {}", count_groups(&report.income.shares));
    println!("   Duration: {:.1}s", report.metadata.duration_seconds);
    println!("\n✅ Report saved to: {}", output.display());

    Ok(())
}

/// Handle --dry-run: fetch and normalize, print what was found, exit.
async fn handle_dry_run(source: &source::DataSource, config: &Config) -> Result<()> {
    println!("\n🔍 Dry run: fetching and normalizing (no report written)...\n");

    let (minority_raw, income_raw) = pipeline::fetch_tables(source, config).await?;
    let minority = pipeline::minority_rows(&minority_raw, config)?;
    let income = pipeline::income_rows(&income_raw, config)?;

    for line in pipeline::describe_rows(&config.tables.minority, &minority)
        .into_iter()
        .chain(pipeline::describe_rows(&config.tables.income, &income))
    {
        println!("   {}", line);
    }

    println!("\n✅ Dry run complete. No report was written.");
    Ok(())
}

fn count_groups(shares: &[models::ModeShare]) -> usize {
    let mut groups: Vec<&str> = shares.iter().map(|s| s.group.as_str()).collect();
    groups.dedup();
    groups.len()
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location; a file that exists but fails to parse is fatal
    let config = Config::load_default()
        .with_context(|| format!("Failed to load {}", CONFIG_FILE_NAME))?;
    Ok(config.unwrap_or_default())
}

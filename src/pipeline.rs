//! The report build: fetch, normalize, aggregate, assemble.
//!
//! Each analysis runs to completion or fails the whole build.

use crate::analysis::aggregator::{income_shares, minority_shares};
use crate::analysis::buckets::stacking_order;
use crate::analysis::{normalize, ModeBuckets};
use crate::config::Config;
use crate::models::{
    ComparisonTable, IncomeAnalysis, MinorityAnalysis, ModeShare, Observation, Report,
    ReportMetadata,
};
use crate::report::narrative::{income_narrative, minority_narrative};
use crate::source::{ClientConfig, CtppClient, DataSource, OutputLabels, RawTable, TableRequest};
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// Build the data source the config asks for.
pub fn data_source(config: &Config, show_progress: bool) -> Result<DataSource> {
    if let Some(ref dir) = config.source.snapshot_dir {
        info!("Reading tables from snapshot directory {}", dir);
        return Ok(DataSource::Snapshot(PathBuf::from(dir)));
    }

    let client = CtppClient::new(ClientConfig {
        api_url: config.source.api_url.clone(),
        api_key: config.source.api_key.clone(),
        timeout_seconds: config.source.timeout_seconds,
        show_progress,
    })
    .context("Failed to create HTTP client")?;

    Ok(DataSource::Service(client))
}

/// Request for one of the configured tables.
pub fn table_request(config: &Config, table: &str) -> TableRequest {
    TableRequest {
        table: table.to_string(),
        vintage: config.source.vintage.clone(),
        geography_level: config.source.geography_level.clone(),
        state: config.source.state.clone(),
        labels: config.source.output_labels,
    }
}

/// Fetch both tables, one after the other.
pub async fn fetch_tables(source: &DataSource, config: &Config) -> Result<(RawTable, RawTable)> {
    let minority = source
        .fetch(&table_request(config, &config.tables.minority))
        .await
        .with_context(|| format!("Failed to fetch table {}", config.tables.minority))?;

    let income = source
        .fetch(&table_request(config, &config.tables.income))
        .await
        .with_context(|| format!("Failed to fetch table {}", config.tables.income))?;

    Ok((minority, income))
}

/// Normalized rows of the minority-status table.
pub fn minority_rows(raw: &RawTable, config: &Config) -> Result<Vec<Observation>> {
    normalize(raw, &config.columns.minority(), &config.source.residence)
        .with_context(|| format!("Failed to normalize table {}", config.tables.minority))
}

/// Normalized rows of the income table.
pub fn income_rows(raw: &RawTable, config: &Config) -> Result<Vec<Observation>> {
    normalize(raw, &config.columns.income(), &config.source.residence)
        .with_context(|| format!("Failed to normalize table {}", config.tables.income))
}

/// Minority-status shares and the group comparison table.
pub fn analyze_minority(
    raw: &RawTable,
    config: &Config,
    buckets: &ModeBuckets,
) -> Result<MinorityAnalysis> {
    let rows = minority_rows(raw, config)?;
    let shares = minority_shares(rows, buckets).context("Failed to compute minority shares")?;
    let comparison = ComparisonTable::build(
        &shares,
        &config.report.reference_group,
        &config.report.comparison_group,
    )
    .context("Failed to build comparison table")?;

    debug!("Comparison table has {} rows", comparison.rows.len());
    Ok(MinorityAnalysis { shares, comparison })
}

/// Income shares and the stacking order for the bar chart.
pub fn analyze_income(
    raw: &RawTable,
    config: &Config,
    buckets: &ModeBuckets,
) -> Result<IncomeAnalysis> {
    let rows = income_rows(raw, config)?;
    let shares = income_shares(rows, buckets).context("Failed to compute income shares")?;
    let mode_order = stacking_order(&modes_by_volume(&shares));

    Ok(IncomeAnalysis { shares, mode_order })
}

/// Modes ordered by descending total estimate across all groups.
pub fn modes_by_volume(shares: &[ModeShare]) -> Vec<String> {
    let mut volumes: Vec<(String, f64)> = Vec::new();
    for share in shares {
        match volumes.iter_mut().find(|(m, _)| *m == share.mode) {
            Some((_, v)) => *v += share.estimate,
            None => volumes.push((share.mode.clone(), share.estimate)),
        }
    }
    volumes.sort_by(|a, b| b.1.total_cmp(&a.1));
    volumes.into_iter().map(|(m, _)| m).collect()
}

/// Run the full build against a data source.
pub async fn build_report(config: &Config, source: &DataSource) -> Result<Report> {
    let start_time = Instant::now();
    let buckets = ModeBuckets::with_overrides(&config.modes.buckets);

    let (minority_raw, income_raw) = fetch_tables(source, config).await?;

    info!("Running minority-status analysis");
    let minority = analyze_minority(&minority_raw, config, &buckets)?;

    info!("Running household-income analysis");
    let income = analyze_income(&income_raw, config, &buckets)?;

    let residence = &config.source.residence;
    let mut narrative = minority_narrative(residence, &minority.comparison);
    narrative.extend(income_narrative(residence, &income.shares));

    let metadata = ReportMetadata {
        title: config.report.title.clone(),
        residence: residence.clone(),
        state: config.source.state.clone(),
        vintage: config.source.vintage.clone(),
        geography_level: config.source.geography_level.clone(),
        minority_table: config.tables.minority.clone(),
        income_table: config.tables.income.clone(),
        data_source: source.describe(),
        generated_at: Utc::now(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    Ok(Report {
        metadata,
        narrative,
        minority,
        income,
    })
}

/// One-line summaries of normalized rows, for dry runs.
pub fn describe_rows(table: &str, rows: &[Observation]) -> Vec<String> {
    let mut groups: Vec<&str> = Vec::new();
    let mut modes: Vec<&str> = Vec::new();
    for row in rows {
        if !groups.contains(&row.group.as_str()) {
            groups.push(&row.group);
        }
        if !modes.contains(&row.mode.as_str()) {
            modes.push(&row.mode);
        }
    }

    vec![
        format!("Table {}: {} rows", table, rows.len()),
        format!("  Groups ({}): {}", groups.len(), groups.join(" | ")),
        format!("  Modes ({}): {}", modes.len(), modes.join(" | ")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IncomeBracket, MINORITY, NON_HISPANIC_WHITE};

    fn fixture_config() -> Config {
        let mut config = Config::default();
        config.source.snapshot_dir = Some(format!("{}/fixtures", env!("CARGO_MANIFEST_DIR")));
        config
    }

    #[test]
    fn test_table_request() {
        let config = Config::default();
        let req = table_request(&config, "A102107");
        assert_eq!(req.table, "A102107");
        assert_eq!(req.state, "Massachusetts");
        assert_eq!(req.labels, OutputLabels::Name);

        let mut config = Config::default();
        config.source.output_labels = OutputLabels::Code;
        assert_eq!(table_request(&config, "A102107").labels, OutputLabels::Code);
    }

    #[test]
    fn test_data_source_selection() {
        let source = data_source(&fixture_config(), false).unwrap();
        assert!(matches!(source, DataSource::Snapshot(_)));

        let source = data_source(&Config::default(), false).unwrap();
        assert!(matches!(source, DataSource::Service(_)));
    }

    #[test]
    fn test_build_report_from_fixtures() {
        let config = fixture_config();
        let source = data_source(&config, false).unwrap();
        let report = tokio_test::block_on(build_report(&config, &source)).unwrap();

        assert_eq!(report.metadata.residence, "Boston city, Massachusetts");
        assert!(report.metadata.data_source.starts_with("snapshot: "));

        let table = &report.minority.comparison;
        assert_eq!(table.reference_group, NON_HISPANIC_WHITE);
        assert_eq!(table.comparison_group, MINORITY);
        for row in &table.rows {
            assert!((row.difference - (row.reference_pct - row.comparison_pct)).abs() < 1e-9);
        }
        // nHW drive alone 60000/125000, minority (20000+15000)/92000
        let drove = table.rows.iter().find(|r| r.mode == "Drove alone").unwrap();
        assert!((drove.reference_pct - 48.0).abs() < 1e-9);
        assert!((drove.comparison_pct - 3_500_000.0 / 92_000.0).abs() < 1e-9);

        let order = &report.income.mode_order;
        let da = order.iter().position(|m| m == "Drove alone").unwrap();
        assert_eq!(order[da + 1], "Carpooled");

        let first = &report.income.shares[0].group;
        assert_eq!(first, IncomeBracket::Under15k.label());

        assert!(report.narrative.len() >= 3);
    }

    #[test]
    fn test_wrong_residence_aborts() {
        let mut config = fixture_config();
        config.source.residence = "Springfield city, Massachusetts".to_string();
        let source = data_source(&config, false).unwrap();
        let err = tokio_test::block_on(build_report(&config, &source)).unwrap_err();
        assert!(format!("{:#}", err).contains("Geography not found"));
    }

    #[test]
    fn test_misspelled_reference_group_aborts() {
        let mut config = fixture_config();
        config.report.reference_group = "Non-Hispanic White".to_string();
        let source = data_source(&config, false).unwrap();
        let err = tokio_test::block_on(build_report(&config, &source)).unwrap_err();
        assert!(format!("{:#}", err).contains("Group not present in table: Non-Hispanic White"));
    }

    #[test]
    fn test_schema_change_aborts() {
        let mut config = fixture_config();
        config.columns.mode = "MEANS_OF_TRANSPORTATION".to_string();
        let source = data_source(&config, false).unwrap();
        let err = tokio_test::block_on(build_report(&config, &source)).unwrap_err();
        assert!(format!("{:#}", err).contains("Column not found"));
    }

    #[test]
    fn test_modes_by_volume() {
        let shares = vec![
            ModeShare {
                group: "a".into(),
                mode: "Walked".into(),
                estimate: 10.0,
                total: 40.0,
                share: 0.25,
            },
            ModeShare {
                group: "a".into(),
                mode: "Drove alone".into(),
                estimate: 30.0,
                total: 40.0,
                share: 0.75,
            },
        ];
        assert_eq!(modes_by_volume(&shares), vec!["Drove alone", "Walked"]);
    }

    #[test]
    fn test_describe_rows() {
        let rows = vec![Observation {
            residence: "B".into(),
            group: "g".into(),
            mode: "Walked".into(),
            estimate: 1.0,
        }];
        let lines = describe_rows("A102106", &rows);
        assert_eq!(lines[0], "Table A102106: 1 rows");
        assert!(lines[2].contains("Walked"));
    }
}

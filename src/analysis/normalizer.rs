//! Column renaming, geography filtering, and group relabeling.
//!
//! Turns a [`RawTable`] with service-specific column names into
//! [`Observation`] records with stable semantic fields.

use crate::error::{ReportError, Result};
use crate::models::{Observation, MINORITY, NON_HISPANIC_WHITE};
use crate::source::RawTable;
use tracing::{debug, info};

/// Source column names for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub residence: String,
    pub group: String,
    pub mode: String,
    pub estimate: String,
}

/// Pick the configured columns and parse estimates.
///
/// Fails if any configured column is missing, which is how an upstream
/// schema change surfaces.
pub fn rename_columns(raw: &RawTable, columns: &ColumnNames) -> Result<Vec<Observation>> {
    let index = |name: &str| {
        raw.column_index(name)
            .ok_or_else(|| ReportError::MissingColumn(name.to_string()))
    };

    let residence_idx = index(&columns.residence)?;
    let group_idx = index(&columns.group)?;
    let mode_idx = index(&columns.mode)?;
    let estimate_idx = index(&columns.estimate)?;

    raw.rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Ok(Observation {
                residence: row[residence_idx].trim().to_string(),
                group: row[group_idx].trim().to_string(),
                mode: row[mode_idx].trim().to_string(),
                estimate: parse_estimate(&row[estimate_idx], i + 1)?,
            })
        })
        .collect()
}

/// Parse a count such as `"12,345"`.
pub fn parse_estimate(value: &str, row: usize) -> Result<f64> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    let invalid = || ReportError::InvalidEstimate {
        value: value.to_string(),
        row,
    };

    let estimate: f64 = cleaned.parse().map_err(|_| invalid())?;
    if !estimate.is_finite() || estimate < 0.0 {
        return Err(invalid());
    }
    Ok(estimate)
}

/// Keep rows for the exact target geography.
pub fn filter_geography(rows: Vec<Observation>, target: &str) -> Result<Vec<Observation>> {
    let before = rows.len();
    let kept: Vec<Observation> = rows.into_iter().filter(|r| r.residence == target).collect();

    debug!("Geography filter kept {} of {} rows", kept.len(), before);

    if kept.is_empty() {
        return Err(ReportError::GeographyNotFound(target.to_string()));
    }
    Ok(kept)
}

/// Returns true for aggregate group labels like `"Total, household income"`.
pub fn is_aggregate_group(label: &str) -> bool {
    label.trim().to_lowercase().starts_with("total")
}

/// Remove rows whose group is an aggregate over all groups.
pub fn drop_group_totals(rows: Vec<Observation>) -> Vec<Observation> {
    rows.into_iter()
        .filter(|r| !is_aggregate_group(&r.group))
        .collect()
}

/// Rename, filter to the residence, and drop aggregate groups.
pub fn normalize(raw: &RawTable, columns: &ColumnNames, residence: &str) -> Result<Vec<Observation>> {
    let rows = rename_columns(raw, columns)?;
    let rows = filter_geography(rows, residence)?;
    let rows = drop_group_totals(rows);

    info!("Normalized {} rows for {}", rows.len(), residence);
    Ok(rows)
}

/// Display label on the minority-status axis.
///
/// Non-Hispanic White (in any of the service's spellings) maps to the
/// reference label; every other value falls into the minority label.
pub fn minority_label(raw: &str) -> &'static str {
    let canonical = raw
        .to_lowercase()
        .replace("hispanic or latino", "hispanic/latino")
        .replace(',', " ");
    let canonical = canonical.split_whitespace().collect::<Vec<_>>().join(" ");

    match canonical.as_str() {
        "white alone not hispanic/latino" | "not hispanic/latino white alone" => NON_HISPANIC_WHITE,
        _ => MINORITY,
    }
}

/// Relabel groups onto the two-valued minority-status axis.
pub fn remap_minority(rows: Vec<Observation>) -> Vec<Observation> {
    rows.into_iter()
        .map(|r| Observation {
            group: minority_label(&r.group).to_string(),
            ..r
        })
        .collect()
}

//! Share aggregation.
//!
//! This module collapses categories, sums estimates per (group, mode),
//! and divides by each group's total to produce mode shares.

use crate::analysis::buckets::ModeBuckets;
use crate::analysis::normalizer::remap_minority;
use crate::error::{ReportError, Result};
use crate::models::{IncomeBracket, ModeShare, Observation, TOTAL_MODE};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Tolerance for the per-group share sum check.
pub const SHARE_SUM_TOLERANCE: f64 = 0.001;

/// Replace each raw mode label with its bucket.
pub fn bucket_modes(rows: Vec<Observation>, buckets: &ModeBuckets) -> Vec<Observation> {
    rows.into_iter()
        .map(|r| Observation {
            mode: buckets.bucket(&r.mode).to_string(),
            ..r
        })
        .collect()
}

/// Replace each raw income-range label with its bracket label.
pub fn collapse_income(rows: Vec<Observation>) -> Result<Vec<Observation>> {
    rows.into_iter()
        .map(|r| {
            let bracket = IncomeBracket::from_raw_label(&r.group)
                .ok_or_else(|| ReportError::UnknownIncomeRange(r.group.clone()))?;
            Ok(Observation {
                group: bracket.label().to_string(),
                ..r
            })
        })
        .collect()
}

/// Sum estimates per (group, mode), keeping first-seen order.
pub fn sum_estimates(rows: &[Observation]) -> Vec<Observation> {
    let mut summed: Vec<Observation> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for row in rows {
        let key = (row.group.clone(), row.mode.clone());
        match index.get(&key) {
            Some(&i) => summed[i].estimate += row.estimate,
            None => {
                index.insert(key, summed.len());
                summed.push(row.clone());
            }
        }
    }

    debug!("Summed {} rows into {}", rows.len(), summed.len());
    summed
}

/// Total estimate per group, taken from the `"Total"` mode rows.
pub fn group_totals(rows: &[Observation]) -> HashMap<String, f64> {
    let mut totals: HashMap<String, f64> = HashMap::new();

    for row in rows.iter().filter(|r| r.is_total()) {
        *totals.entry(row.group.clone()).or_default() += row.estimate;
    }

    totals
}

/// Join group totals onto every non-total row and compute shares.
///
/// A zero total yields NaN shares. A group without a total row fails.
pub fn compute_shares(rows: &[Observation]) -> Result<Vec<ModeShare>> {
    let totals = group_totals(rows);

    rows.iter()
        .filter(|r| !r.is_total())
        .map(|r| {
            let total = *totals
                .get(&r.group)
                .ok_or_else(|| ReportError::MissingTotal(r.group.clone()))?;
            Ok(ModeShare {
                group: r.group.clone(),
                mode: r.mode.clone(),
                estimate: r.estimate,
                total,
                share: r.estimate / total,
            })
        })
        .collect()
}

/// Sum of shares per group, in first-seen group order.
pub fn share_sums(shares: &[ModeShare]) -> Vec<(String, f64)> {
    let mut sums: Vec<(String, f64)> = Vec::new();

    for share in shares {
        match sums.iter_mut().find(|(g, _)| *g == share.group) {
            Some((_, sum)) => *sum += share.share,
            None => sums.push((share.group.clone(), share.share)),
        }
    }

    sums
}

/// Log a warning for each group whose shares do not sum to 1.
///
/// Returns the offending groups.
pub fn check_share_sums(shares: &[ModeShare]) -> Vec<String> {
    share_sums(shares)
        .into_iter()
        .filter(|(group, sum)| {
            let off = (sum - 1.0).abs() > SHARE_SUM_TOLERANCE;
            if off {
                warn!(
                    "Mode shares for '{}' sum to {:.4}; components do not add up to the total",
                    group, sum
                );
            }
            off
        })
        .map(|(group, _)| group)
        .collect()
}

/// Distinct modes in first-seen order.
pub fn distinct_modes(shares: &[ModeShare]) -> Vec<String> {
    let mut modes: Vec<String> = Vec::new();
    for share in shares {
        if !modes.contains(&share.mode) {
            modes.push(share.mode.clone());
        }
    }
    modes
}

/// Share for one (group, mode) pair.
pub fn share_of(shares: &[ModeShare], group: &str, mode: &str) -> Option<f64> {
    shares
        .iter()
        .find(|s| s.group == group && s.mode == mode)
        .map(|s| s.share)
}

/// Minority-status pipeline: relabel groups, bucket modes, sum, share.
pub fn minority_shares(rows: Vec<Observation>, buckets: &ModeBuckets) -> Result<Vec<ModeShare>> {
    let rows = bucket_modes(remap_minority(rows), buckets);
    let shares = compute_shares(&sum_estimates(&rows))?;
    check_share_sums(&shares);
    Ok(shares)
}

/// Income pipeline: collapse brackets, bucket modes, sum, share.
///
/// The result is ordered by bracket regardless of input row order.
pub fn income_shares(rows: Vec<Observation>, buckets: &ModeBuckets) -> Result<Vec<ModeShare>> {
    let rows = bucket_modes(collapse_income(rows)?, buckets);
    let mut shares = compute_shares(&sum_estimates(&rows))?;
    shares.sort_by_key(|s| IncomeBracket::from_label(&s.group).map(|b| b.rank()));
    check_share_sums(&shares);
    Ok(shares)
}

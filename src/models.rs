//! Data models for the mode-share report.
//!
//! This module contains the core data structures used throughout
//! the pipeline for representing observations, shares, and reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mode label of the synthetic row that carries a group's total.
pub const TOTAL_MODE: &str = "Total";

/// Display label for the reference side of the minority-status axis.
pub const NON_HISPANIC_WHITE: &str = "non-Hispanic White";

/// Display label for everyone else on the minority-status axis.
pub const MINORITY: &str = "Racial/ethnic minority";

/// A single tabulated estimate after column renaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Place of residence (geography name as returned by the service).
    pub residence: String,
    /// Group category: minority status or income range/bracket.
    pub group: String,
    /// Means of transportation to work.
    pub mode: String,
    /// Estimated number of workers.
    pub estimate: f64,
}

impl Observation {
    /// Returns true if this is the group-total row.
    pub fn is_total(&self) -> bool {
        self.mode == TOTAL_MODE
    }
}

/// Share of a group's commuters using one mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeShare {
    pub group: String,
    pub mode: String,
    pub estimate: f64,
    pub total: f64,
    /// `estimate / total`, in `[0, 1]` for well-formed data.
    pub share: f64,
}

impl ModeShare {
    /// Share expressed as a percentage.
    pub fn percent(&self) -> f64 {
        self.share * 100.0
    }
}

/// Household income brackets, in axis order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IncomeBracket {
    Under15k,
    From15kTo25k,
    From25kTo35k,
    From35kTo50k,
    From50kTo75k,
    From75kTo100k,
    From100kTo150k,
    Over150k,
}

impl fmt::Display for IncomeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl IncomeBracket {
    /// All brackets in declared order.
    pub const ALL: [IncomeBracket; 8] = [
        IncomeBracket::Under15k,
        IncomeBracket::From15kTo25k,
        IncomeBracket::From25kTo35k,
        IncomeBracket::From35kTo50k,
        IncomeBracket::From50kTo75k,
        IncomeBracket::From75kTo100k,
        IncomeBracket::From100kTo150k,
        IncomeBracket::Over150k,
    ];

    /// Returns the display label of the bracket.
    pub fn label(&self) -> &'static str {
        match self {
            IncomeBracket::Under15k => "Less than $15k",
            IncomeBracket::From15kTo25k => "$15k-$25k",
            IncomeBracket::From25kTo35k => "$25k-$35k",
            IncomeBracket::From35kTo50k => "$35k-$50k",
            IncomeBracket::From50kTo75k => "$50k-$75k",
            IncomeBracket::From75kTo100k => "$75k-$100k",
            IncomeBracket::From100kTo150k => "$100k-$150k",
            IncomeBracket::Over150k => "$150k or more",
        }
    }

    /// Bracket containing the given lower dollar bound.
    pub fn from_lower_bound(dollars: u64) -> Self {
        match dollars {
            0..=14_999 => IncomeBracket::Under15k,
            15_000..=24_999 => IncomeBracket::From15kTo25k,
            25_000..=34_999 => IncomeBracket::From25kTo35k,
            35_000..=49_999 => IncomeBracket::From35kTo50k,
            50_000..=74_999 => IncomeBracket::From50kTo75k,
            75_000..=99_999 => IncomeBracket::From75kTo100k,
            100_000..=149_999 => IncomeBracket::From100kTo150k,
            _ => IncomeBracket::Over150k,
        }
    }

    /// Classify a raw income-range label such as `"$10,000-$14,999"`.
    ///
    /// The lower dollar bound decides the bracket, so any fine range nests
    /// into exactly one bracket. Returns `None` when no bound can be read.
    pub fn from_raw_label(label: &str) -> Option<Self> {
        income_lower_bound(label).map(Self::from_lower_bound)
    }

    /// Position of the bracket on the chart axis.
    pub fn rank(&self) -> usize {
        *self as usize
    }

    /// Look up a bracket by its display label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.label() == label)
    }
}

/// Lower dollar bound of an income-range label.
fn income_lower_bound(label: &str) -> Option<u64> {
    let lowered = label.trim().to_lowercase();
    if lowered.starts_with("less than") || lowered.starts_with("under") {
        return Some(0);
    }

    let start = lowered.find('$')? + 1;
    let rest = &lowered[start..];
    let digits: String = rest
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .filter(|c| c.is_ascii_digit())
        .collect();
    let value: u64 = digits.parse().ok()?;

    // "$15k" style labels
    let suffix = rest.chars().find(|c| !c.is_ascii_digit() && *c != ',');
    if suffix == Some('k') {
        value.checked_mul(1_000)
    } else {
        Some(value)
    }
}

/// One row of the side-by-side group comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub mode: String,
    /// Share of the reference group, as a percentage.
    pub reference_pct: f64,
    /// Share of the comparison group, as a percentage.
    pub comparison_pct: f64,
    /// `reference_pct - comparison_pct`.
    pub difference: f64,
}

/// Share pivoted by group, sorted by descending absolute difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub reference_group: String,
    pub comparison_group: String,
    pub rows: Vec<ComparisonRow>,
}

/// Results of the minority-status analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinorityAnalysis {
    pub shares: Vec<ModeShare>,
    pub comparison: ComparisonTable,
}

/// Results of the household-income analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeAnalysis {
    /// Shares keyed by bracket label, brackets in axis order.
    pub shares: Vec<ModeShare>,
    /// Stacking order of modes in the bar chart.
    pub mode_order: Vec<String>,
}

/// Metadata about the report build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Report title.
    pub title: String,
    /// Target geography string.
    pub residence: String,
    /// State queried.
    pub state: String,
    /// Dataset vintage.
    pub vintage: String,
    /// Geography level queried.
    pub geography_level: String,
    /// Table used for the minority-status analysis.
    pub minority_table: String,
    /// Table used for the income analysis.
    pub income_table: String,
    /// Where the data came from (service URL or snapshot directory).
    pub data_source: String,
    /// Date and time of the build.
    pub generated_at: DateTime<Utc>,
    /// Duration of the build in seconds.
    pub duration_seconds: f64,
}

/// The complete mode-share report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    /// Narrative paragraphs derived from the data.
    pub narrative: Vec<String>,
    pub minority: MinorityAnalysis,
    pub income: IncomeAnalysis,
}

//! Comparison and income tables.

use crate::analysis::{distinct_modes, share_of};
use crate::error::{ReportError, Result};
use crate::models::{ComparisonRow, ComparisonTable, IncomeBracket, ModeShare};

/// Format a percentage to one decimal place.
pub fn format_pct(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Format a percentage-point difference to one decimal place, with sign.
pub fn format_diff(value: f64) -> String {
    format!("{:+.1}", value)
}

impl ComparisonTable {
    /// Pivot shares by group into side-by-side columns.
    ///
    /// A mode present for only one group counts as a zero share for the
    /// other. Rows are sorted by descending absolute difference. Fails if
    /// either group has no shares at all.
    pub fn build(shares: &[ModeShare], reference: &str, comparison: &str) -> Result<Self> {
        for group in [reference, comparison] {
            if !shares.iter().any(|s| s.group == group) {
                return Err(ReportError::UnknownGroup(group.to_string()));
            }
        }

        let relevant: Vec<ModeShare> = shares
            .iter()
            .filter(|s| s.group == reference || s.group == comparison)
            .cloned()
            .collect();

        let mut rows: Vec<ComparisonRow> = distinct_modes(&relevant)
            .into_iter()
            .map(|mode| {
                let reference_pct = share_of(&relevant, reference, &mode).unwrap_or(0.0) * 100.0;
                let comparison_pct = share_of(&relevant, comparison, &mode).unwrap_or(0.0) * 100.0;
                ComparisonRow {
                    mode,
                    reference_pct,
                    comparison_pct,
                    difference: reference_pct - comparison_pct,
                }
            })
            .collect();

        rows.sort_by(|a, b| gap_key(b).total_cmp(&gap_key(a)));

        Ok(Self {
            reference_group: reference.to_string(),
            comparison_group: comparison.to_string(),
            rows,
        })
    }

    /// Row with the largest finite absolute difference.
    pub fn largest_gap(&self) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.difference.is_finite())
    }

    /// Render as a Markdown table.
    pub fn to_markdown(&self) -> String {
        let mut table = String::new();

        table.push_str(&format!(
            "| Mode | {} | {} | Difference (pts) |\n",
            self.reference_group, self.comparison_group
        ));
        table.push_str("|:---|---:|---:|---:|\n");

        for row in &self.rows {
            table.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                row.mode,
                format_pct(row.reference_pct),
                format_pct(row.comparison_pct),
                format_diff(row.difference)
            ));
        }

        table
    }
}

/// Sort key: absolute difference, with NaN below every real value.
fn gap_key(row: &ComparisonRow) -> f64 {
    if row.difference.is_nan() {
        f64::NEG_INFINITY
    } else {
        row.difference.abs()
    }
}

/// Markdown table of mode shares with one row per income bracket.
pub fn income_table_markdown(shares: &[ModeShare], modes: &[String]) -> String {
    let mut table = String::new();

    table.push_str("| Household income |");
    for mode in modes {
        table.push_str(&format!(" {} |", mode));
    }
    table.push('\n');

    table.push_str("|:---|");
    for _ in modes {
        table.push_str("---:|");
    }
    table.push('\n');

    for bracket in IncomeBracket::ALL {
        let label = bracket.label();
        if !shares.iter().any(|s| s.group == label) {
            continue;
        }

        table.push_str(&format!("| {} |", label));
        for mode in modes {
            let pct = share_of(shares, label, mode).unwrap_or(0.0) * 100.0;
            table.push_str(&format!(" {} |", format_pct(pct)));
        }
        table.push('\n');
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MINORITY, NON_HISPANIC_WHITE};

    fn share(group: &str, mode: &str, share: f64) -> ModeShare {
        ModeShare {
            group: group.to_string(),
            mode: mode.to_string(),
            estimate: share * 1000.0,
            total: 1000.0,
            share,
        }
    }

    fn sample() -> Vec<ModeShare> {
        vec![
            share(NON_HISPANIC_WHITE, "Drove alone", 0.50),
            share(NON_HISPANIC_WHITE, "Public transit", 0.20),
            share(NON_HISPANIC_WHITE, "Walked", 0.30),
            share(MINORITY, "Drove alone", 0.40),
            share(MINORITY, "Public transit", 0.45),
            share(MINORITY, "Walked", 0.15),
        ]
    }

    #[test]
    fn test_difference_example() {
        let shares = vec![
            share(NON_HISPANIC_WHITE, "Drove alone", 0.50),
            share(MINORITY, "Drove alone", 0.40),
        ];
        let table = ComparisonTable::build(&shares, NON_HISPANIC_WHITE, MINORITY).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert!((table.rows[0].difference - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_difference_and_sort_order() {
        let table = ComparisonTable::build(&sample(), NON_HISPANIC_WHITE, MINORITY).unwrap();

        for row in &table.rows {
            assert!((row.difference - (row.reference_pct - row.comparison_pct)).abs() < 1e-9);
        }
        let gaps: Vec<f64> = table.rows.iter().map(|r| r.difference.abs()).collect();
        assert!(gaps.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(table.largest_gap().unwrap().mode, "Public transit");
    }

    #[test]
    fn test_missing_mode_counts_as_zero() {
        let mut shares = sample();
        shares.push(share(MINORITY, "Bicycle", 0.02));
        let table = ComparisonTable::build(&shares, NON_HISPANIC_WHITE, MINORITY).unwrap();
        let bicycle = table.rows.iter().find(|r| r.mode == "Bicycle").unwrap();
        assert_eq!(bicycle.reference_pct, 0.0);
        assert!((bicycle.difference + 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_group_fails() {
        let err = ComparisonTable::build(&sample(), "Non-Hispanic White", MINORITY).unwrap_err();
        assert!(matches!(err, ReportError::UnknownGroup(g) if g == "Non-Hispanic White"));

        let err = ComparisonTable::build(&sample(), NON_HISPANIC_WHITE, "Minority").unwrap_err();
        assert!(matches!(err, ReportError::UnknownGroup(g) if g == "Minority"));
    }

    #[test]
    fn test_nan_differences_sort_last() {
        let mut shares = sample();
        shares.push(share(NON_HISPANIC_WHITE, "Bicycle", f64::NAN));
        let table = ComparisonTable::build(&shares, NON_HISPANIC_WHITE, MINORITY).unwrap();

        assert_eq!(table.rows.last().unwrap().mode, "Bicycle");
        let n = table.rows.len();
        let gaps: Vec<f64> = table.rows[..n - 1].iter().map(|r| r.difference.abs()).collect();
        assert!(gaps.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(table.largest_gap().unwrap().mode, "Public transit");
    }

    #[test]
    fn test_markdown_one_decimal() {
        let table = ComparisonTable::build(&sample(), NON_HISPANIC_WHITE, MINORITY).unwrap();
        let md = table.to_markdown();
        assert!(md.contains("| Mode | non-Hispanic White | Racial/ethnic minority |"));
        assert!(md.contains("| Public transit | 20.0% | 45.0% | -25.0 |"));
        assert!(md.contains("| Drove alone | 50.0% | 40.0% | +10.0 |"));
    }

    #[test]
    fn test_income_table_bracket_order() {
        let low = IncomeBracket::Under15k.label();
        let high = IncomeBracket::Over150k.label();
        let shares = vec![
            share(high, "Drove alone", 0.7),
            share(high, "Walked", 0.3),
            share(low, "Drove alone", 0.2),
            share(low, "Walked", 0.8),
        ];
        let modes = vec!["Drove alone".to_string(), "Walked".to_string()];
        let md = income_table_markdown(&shares, &modes);

        let low_pos = md.find(low).unwrap();
        let high_pos = md.find(high).unwrap();
        assert!(low_pos < high_pos);
        assert!(md.contains("| Less than $15k | 20.0% | 80.0% |"));
    }
}

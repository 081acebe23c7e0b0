//! Narrative prose derived from the computed shares.

use crate::analysis::buckets::{DROVE_ALONE, PUBLIC_TRANSIT};
use crate::analysis::share_of;
use crate::models::{ComparisonTable, IncomeBracket, ModeShare};
use crate::report::tables::format_pct;

/// Paragraphs describing the minority-status comparison.
pub fn minority_narrative(residence: &str, table: &ComparisonTable) -> Vec<String> {
    let mut paragraphs = Vec::new();

    if let Some(row) = table
        .rows
        .iter()
        .find(|r| r.mode == DROVE_ALONE && r.difference.is_finite())
    {
        paragraphs.push(format!(
            "Among workers living in {}, {} of {} commuters drove alone to work, compared with {} of {} commuters.",
            residence,
            format_pct(row.reference_pct),
            table.reference_group,
            format_pct(row.comparison_pct),
            table.comparison_group.to_lowercase(),
        ));
    }

    if let Some(gap) = table.largest_gap() {
        paragraphs.push(format!(
            "The widest gap between the two groups is in the \"{}\" category: {} versus {}, a difference of {:.1} percentage points.",
            gap.mode,
            format_pct(gap.reference_pct),
            format_pct(gap.comparison_pct),
            gap.difference.abs(),
        ));
    }

    paragraphs
}

/// Paragraphs describing how mode shares vary with household income.
pub fn income_narrative(residence: &str, shares: &[ModeShare]) -> Vec<String> {
    let mut paragraphs = Vec::new();

    let present: Vec<IncomeBracket> = IncomeBracket::ALL
        .into_iter()
        .filter(|b| shares.iter().any(|s| s.group == b.label()))
        .collect();

    let (lowest, highest) = match (present.first(), present.last()) {
        (Some(lo), Some(hi)) if lo != hi => (*lo, *hi),
        _ => return paragraphs,
    };

    if let (Some(low_da), Some(high_da)) = (
        share_of(shares, lowest.label(), DROVE_ALONE).filter(|v| v.is_finite()),
        share_of(shares, highest.label(), DROVE_ALONE).filter(|v| v.is_finite()),
    ) {
        let direction = if high_da > low_da {
            "rises"
        } else if high_da < low_da {
            "falls"
        } else {
            "holds steady"
        };
        paragraphs.push(format!(
            "In {}, the share of workers who drive alone {} with household income: {} in households earning {}, against {} in households earning {}.",
            residence,
            direction,
            format_pct(low_da * 100.0),
            lowest.label(),
            format_pct(high_da * 100.0),
            highest.label(),
        ));
    }

    let transit_peak = shares
        .iter()
        .filter(|s| s.mode == PUBLIC_TRANSIT && s.share.is_finite())
        .max_by(|a, b| a.share.total_cmp(&b.share));
    if let Some(peak) = transit_peak {
        paragraphs.push(format!(
            "Public transit is most common in the {} bracket, where it carries {} of commuters.",
            peak.group,
            format_pct(peak.percent()),
        ));
    }

    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MINORITY, NON_HISPANIC_WHITE};

    fn share(group: &str, mode: &str, share: f64) -> ModeShare {
        ModeShare {
            group: group.to_string(),
            mode: mode.to_string(),
            estimate: share * 100.0,
            total: 100.0,
            share,
        }
    }

    #[test]
    fn test_minority_narrative() {
        let shares = vec![
            share(NON_HISPANIC_WHITE, DROVE_ALONE, 0.50),
            share(NON_HISPANIC_WHITE, PUBLIC_TRANSIT, 0.20),
            share(MINORITY, DROVE_ALONE, 0.40),
            share(MINORITY, PUBLIC_TRANSIT, 0.45),
        ];
        let table = ComparisonTable::build(&shares, NON_HISPANIC_WHITE, MINORITY).unwrap();
        let text = minority_narrative("Boston city, Massachusetts", &table);

        assert_eq!(text.len(), 2);
        assert!(text[0].contains("50.0% of non-Hispanic White commuters drove alone"));
        assert!(text[0].contains("40.0% of racial/ethnic minority commuters"));
        assert!(text[1].contains("\"Public transit\""));
        assert!(text[1].contains("25.0 percentage points"));
    }

    #[test]
    fn test_minority_narrative_skips_nan() {
        let shares = vec![
            share(NON_HISPANIC_WHITE, DROVE_ALONE, f64::NAN),
            share(NON_HISPANIC_WHITE, PUBLIC_TRANSIT, 0.20),
            share(MINORITY, DROVE_ALONE, 0.40),
            share(MINORITY, PUBLIC_TRANSIT, 0.45),
        ];
        let table = ComparisonTable::build(&shares, NON_HISPANIC_WHITE, MINORITY).unwrap();
        let text = minority_narrative("Boston city, Massachusetts", &table);

        assert_eq!(text.len(), 1);
        assert!(text.iter().all(|p| !p.contains("NaN")));
        assert!(text[0].contains("\"Public transit\""));
    }

    #[test]
    fn test_income_narrative_skips_nan() {
        let shares = vec![
            share(IncomeBracket::Under15k.label(), DROVE_ALONE, f64::NAN),
            share(IncomeBracket::Over150k.label(), DROVE_ALONE, 0.55),
        ];
        let text = income_narrative("X", &shares);
        assert!(text.iter().all(|p| !p.contains("NaN")));
    }

    #[test]
    fn test_income_narrative() {
        let low = IncomeBracket::Under15k.label();
        let high = IncomeBracket::Over150k.label();
        let shares = vec![
            share(low, DROVE_ALONE, 0.25),
            share(low, PUBLIC_TRANSIT, 0.40),
            share(high, DROVE_ALONE, 0.55),
            share(high, PUBLIC_TRANSIT, 0.10),
        ];
        let text = income_narrative("Boston city, Massachusetts", &shares);

        assert_eq!(text.len(), 2);
        assert!(text[0].contains("drive alone rises with household income"));
        assert!(text[0].contains("25.0% in households earning Less than $15k"));
        assert!(text[1].contains("Less than $15k bracket"));
        assert!(text[1].contains("40.0%"));
    }

    #[test]
    fn test_income_narrative_single_bracket() {
        let shares = vec![share(IncomeBracket::Under15k.label(), DROVE_ALONE, 0.25)];
        assert!(income_narrative("X", &shares).is_empty());
    }
}

//! Markdown report generation.
//!
//! This module generates the Markdown report, its SVG charts, and the
//! JSON variant from the analysis results.

use crate::models::{Report, ReportMetadata};
use crate::report::charts::{ranked_dot_chart, stacked_bar_chart, ChartStyle};
use crate::report::tables::income_table_markdown;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Directory, next to the report file, holding the chart files.
pub const CHARTS_DIR: &str = "charts";

/// File name of the minority-status chart.
pub const MINORITY_CHART_FILE: &str = "minority_mode_share.svg";

/// File name of the income chart.
pub const INCOME_CHART_FILE: &str = "income_mode_share.svg";

/// Generate a complete Markdown report.
///
/// Charts are referenced as relative image links under [`CHARTS_DIR`].
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!("# {}\n\n", report.metadata.title));

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents());
    output.push_str(&generate_findings_section(&report.narrative));
    output.push_str(&generate_minority_section(report));
    output.push_str(&generate_income_section(report));
    output.push_str(&generate_methodology_section(&report.metadata));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Residence:** {}\n", metadata.residence));
    section.push_str(&format!("- **State:** {}\n", metadata.state));
    section.push_str(&format!(
        "- **Dataset:** CTPP {} ({} level)\n",
        metadata.vintage, metadata.geography_level
    ));
    section.push_str(&format!(
        "- **Tables:** `{}` (minority status), `{}` (household income)\n",
        metadata.minority_table, metadata.income_table
    ));
    section.push_str(&format!("- **Data Source:** {}\n", metadata.data_source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Build Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents() -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Key Findings](#key-findings)\n");
    toc.push_str("- [Mode Share by Minority Status](#mode-share-by-minority-status)\n");
    toc.push_str("- [Mode Share by Household Income](#mode-share-by-household-income)\n");
    toc.push_str("- [Methodology](#methodology)\n");
    toc.push('\n');

    toc
}

/// Generate the key findings section.
fn generate_findings_section(narrative: &[String]) -> String {
    let mut section = String::new();

    section.push_str("## Key Findings\n\n");

    if narrative.is_empty() {
        section.push_str("No findings could be derived from the data.\n\n");
        return section;
    }

    for paragraph in narrative {
        section.push_str(paragraph);
        section.push_str("\n\n");
    }

    section
}

/// Generate the minority-status section.
fn generate_minority_section(report: &Report) -> String {
    let mut section = String::new();
    let table = &report.minority.comparison;

    section.push_str("## Mode Share by Minority Status\n\n");
    section.push_str(&format!(
        "Each dot is the share of one group's commuters using a mode. Modes are ranked by their share among {} commuters.\n\n",
        table.reference_group
    ));
    section.push_str(&format!(
        "![Commute mode share by minority status]({}/{})\n\n",
        CHARTS_DIR, MINORITY_CHART_FILE
    ));

    section.push_str(&format!(
        "The table below lists each mode's share for both groups. The difference column is {} minus {}, in percentage points, sorted by the size of the gap.\n\n",
        table.reference_group,
        table.comparison_group.to_lowercase()
    ));
    section.push_str(&table.to_markdown());
    section.push('\n');

    section
}

/// Generate the household-income section.
fn generate_income_section(report: &Report) -> String {
    let mut section = String::new();

    section.push_str("## Mode Share by Household Income\n\n");
    section.push_str(
        "Each bar splits one income bracket's commuters across modes; brackets run from lowest to highest income.\n\n",
    );
    section.push_str(&format!(
        "![Commute mode share by household income]({}/{})\n\n",
        CHARTS_DIR, INCOME_CHART_FILE
    ));
    section.push_str(&income_table_markdown(
        &report.income.shares,
        &report.income.mode_order,
    ));
    section.push('\n');

    section
}

/// Generate the methodology section.
fn generate_methodology_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Methodology\n\n");
    section.push_str(&format!(
        "Estimates come from the Census Transportation Planning Products tabulation of the {} American Community Survey 5-year data, filtered to {}. ",
        metadata.vintage, metadata.residence
    ));
    section.push_str(
        "Fine transportation categories are grouped into broader modes (carpools of any size count as \"Carpooled\"; bus, subway, and rail count as \"Public transit\"), and income ranges are grouped into eight brackets. ",
    );
    section.push_str(
        "Each share is the mode's estimate divided by the group's total number of workers. Estimates carry sampling error, which this report does not show.\n\n",
    );

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by ModeShare*\n");

    footer
}

/// Render both charts as `(file name, svg)` pairs.
pub fn render_charts(report: &Report, style: &ChartStyle) -> Vec<(&'static str, String)> {
    let table = &report.minority.comparison;
    let groups = [
        table.reference_group.as_str(),
        table.comparison_group.as_str(),
    ];

    vec![
        (
            MINORITY_CHART_FILE,
            ranked_dot_chart(
                &report.minority.shares,
                &groups,
                &format!("Commute mode by minority status, {}", report.metadata.residence),
                style,
            ),
        ),
        (
            INCOME_CHART_FILE,
            stacked_bar_chart(
                &report.income.shares,
                &report.income.mode_order,
                &format!("Commute mode by household income, {}", report.metadata.residence),
                style,
            ),
        ),
    ]
}

/// Write the Markdown report and its charts.
///
/// Returns the paths of every file written.
pub fn write_markdown_bundle(report: &Report, path: &Path, style: &ChartStyle) -> Result<Vec<PathBuf>> {
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let charts_dir = base.join(CHARTS_DIR);
    std::fs::create_dir_all(&charts_dir)
        .with_context(|| format!("Failed to create {}", charts_dir.display()))?;

    let mut written = Vec::new();

    for (file_name, svg) in render_charts(report, style) {
        let chart_path = charts_dir.join(file_name);
        std::fs::write(&chart_path, svg)
            .with_context(|| format!("Failed to write chart to {}", chart_path.display()))?;
        info!("Wrote chart {}", chart_path.display());
        written.push(chart_path);
    }

    std::fs::write(path, generate_markdown_report(report))
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    written.push(path.to_path_buf());

    Ok(written)
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write a JSON report to a file.
pub fn write_json_report(report: &Report, path: &Path) -> Result<()> {
    let content = generate_json_report(report)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(())
}

//! Report rendering: charts, tables, narrative, and output files.

pub mod charts;
pub mod generator;
pub mod narrative;
pub mod tables;

pub use charts::ChartStyle;
pub use generator::{write_json_report, write_markdown_bundle};

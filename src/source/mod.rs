//! Data retrieval from the CTPP service or local snapshots.

pub mod fetcher;
pub mod states;

pub use fetcher::{ClientConfig, CtppClient, DataSource, OutputLabels, RawTable, TableRequest};

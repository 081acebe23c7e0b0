//! CTPP table retrieval.
//!
//! Tables come either from the CTPP data service over HTTP or from a
//! directory of JSON snapshots in the same response format.

use crate::error::{ReportError, Result};
use crate::source::states::state_fips;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// How the service labels categories in its output.
///
/// Group and mode mappings match on names; `Code` is only useful with
/// `--dry-run` to inspect the raw category codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLabels {
    /// Human-readable category names.
    #[default]
    Name,
    /// Numeric category codes.
    Code,
}

impl fmt::Display for OutputLabels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputLabels::Name => write!(f, "Name"),
            OutputLabels::Code => write!(f, "Code"),
        }
    }
}

/// A request for one tabulated table.
#[derive(Debug, Clone)]
pub struct TableRequest {
    /// Table identifier, e.g. `A102106`.
    pub table: String,
    /// Dataset vintage.
    pub vintage: String,
    /// Geography level, e.g. `place`.
    pub geography_level: String,
    /// State name.
    pub state: String,
    /// Label mode for categories.
    pub labels: OutputLabels,
}

/// A table as returned by the service: header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Index of a named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Parse a response body.
    ///
    /// Accepts a bare 2-D array whose first row is the header, or an object
    /// with the same array under `data`.
    pub fn from_json(table: &str, body: &str) -> Result<Self> {
        let response: TableResponse = serde_json::from_str(body)?;
        let mut grid = match response {
            TableResponse::Wrapped { data } => data,
            TableResponse::Bare(data) => data,
        };

        if grid.is_empty() {
            return Err(ReportError::EmptyResponse(table.to_string()));
        }

        let columns: Vec<String> = grid.remove(0).iter().map(cell_to_string).collect();
        let mut rows = Vec::with_capacity(grid.len());

        for (i, row) in grid.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(ReportError::MalformedResponse(format!(
                    "row {} of table {} has {} cells, header has {}",
                    i + 1,
                    table,
                    row.len(),
                    columns.len()
                )));
            }
            rows.push(row.iter().map(cell_to_string).collect());
        }

        if rows.is_empty() {
            return Err(ReportError::EmptyResponse(table.to_string()));
        }

        Ok(Self { columns, rows })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TableResponse {
    Wrapped { data: Vec<Vec<Value>> },
    Bare(Vec<Vec<Value>>),
}

fn cell_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Settings for the HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
    pub show_progress: bool,
}

/// Client for the CTPP data service.
pub struct CtppClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl CtppClient {
    /// Create a client with the configured timeout.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Endpoint for a dataset vintage.
    pub fn endpoint(&self, vintage: &str) -> String {
        format!("{}/data/{}", self.config.api_url.trim_end_matches('/'), vintage)
    }

    /// Fetch one table. Any failure aborts; there are no retries.
    pub async fn fetch_table(&self, request: &TableRequest) -> Result<RawTable> {
        let fips = state_fips(&request.state)
            .ok_or_else(|| ReportError::UnknownState(request.state.clone()))?;
        let url = self.endpoint(&request.vintage);
        let params = query_params(request, fips);

        info!("Fetching table {} from {}", request.table, url);
        debug!("Query parameters: {:?}", params);

        let spinner = self.spinner(&request.table);

        let mut builder = self.http_client.get(&url).query(&params);
        if let Some(ref key) = self.config.api_key {
            builder = builder.header("x-api-key", key);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        if !status.is_success() {
            return Err(ReportError::Api {
                table: request.table.clone(),
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let table = RawTable::from_json(&request.table, &body)?;
        info!("Fetched {} rows for table {}", table.len(), request.table);
        Ok(table)
    }

    fn spinner(&self, table: &str) -> Option<ProgressBar> {
        if !self.config.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Fetching table {}", table));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }
}

/// Query string for a table request.
pub fn query_params(request: &TableRequest, fips: &str) -> Vec<(&'static str, String)> {
    vec![
        ("get", format!("group({})", request.table)),
        ("for", format!("{}:*", request.geography_level)),
        ("in", format!("state:{}", fips)),
        ("output", request.labels.to_string()),
    ]
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

/// Path of the snapshot file for a table.
pub fn snapshot_path(dir: &Path, table: &str) -> PathBuf {
    dir.join(format!("{}.json", table))
}

/// Load a table from `{dir}/{table}.json`.
pub async fn load_snapshot(dir: &Path, table: &str) -> Result<RawTable> {
    let path = snapshot_path(dir, table);
    info!("Loading table {} from {}", table, path.display());

    let body = tokio::fs::read_to_string(&path).await?;
    let raw = RawTable::from_json(table, &body)?;
    debug!("Loaded {} rows from snapshot", raw.len());
    Ok(raw)
}

/// Where tables are read from.
pub enum DataSource {
    Service(CtppClient),
    Snapshot(PathBuf),
}

impl DataSource {
    /// Fetch a table from whichever source is configured.
    pub async fn fetch(&self, request: &TableRequest) -> Result<RawTable> {
        match self {
            DataSource::Service(client) => client.fetch_table(request).await,
            DataSource::Snapshot(dir) => load_snapshot(dir, &request.table).await,
        }
    }

    /// Human-readable description for report metadata.
    pub fn describe(&self) -> String {
        match self {
            DataSource::Service(client) => client.config.api_url.clone(),
            DataSource::Snapshot(dir) => format!("snapshot: {}", dir.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> TableRequest {
        TableRequest {
            table: "A102106".to_string(),
            vintage: "2016".to_string(),
            geography_level: "place".to_string(),
            state: "Massachusetts".to_string(),
            labels: OutputLabels::Name,
        }
    }

    #[test]
    fn test_parse_bare_array() {
        let body = r#"[["RESIDENCE","MEANS","EST"],["Boston city, Massachusetts","Walked",1234]]"#;
        let table = RawTable::from_json("A102106", body).unwrap();
        assert_eq!(table.columns, vec!["RESIDENCE", "MEANS", "EST"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0][2], "1234");
        assert_eq!(table.column_index("MEANS"), Some(1));
    }

    #[test]
    fn test_parse_wrapped_object() {
        let body = r#"{"data":[["RESIDENCE","EST"],["Boston city, Massachusetts","1,234"],["Cambridge city, Massachusetts",null]]}"#;
        let table = RawTable::from_json("A102106", body).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][1], "1,234");
        assert_eq!(table.rows[1][1], "");
    }

    #[test]
    fn test_parse_header_only_is_empty() {
        let body = r#"[["RESIDENCE","EST"]]"#;
        let err = RawTable::from_json("A102106", body).unwrap_err();
        assert!(matches!(err, ReportError::EmptyResponse(_)));
    }

    #[test]
    fn test_parse_ragged_row() {
        let body = r#"[["RESIDENCE","EST"],["Boston city, Massachusetts"]]"#;
        let err = RawTable::from_json("A102106", body).unwrap_err();
        assert!(matches!(err, ReportError::MalformedResponse(_)));
    }

    #[test]
    fn test_query_params() {
        let params = query_params(&request(), "25");
        assert_eq!(params[0], ("get", "group(A102106)".to_string()));
        assert_eq!(params[1], ("for", "place:*".to_string()));
        assert_eq!(params[2], ("in", "state:25".to_string()));
        assert_eq!(params[3], ("output", "Name".to_string()));

        let mut req = request();
        req.labels = OutputLabels::Code;
        assert_eq!(query_params(&req, "25")[3], ("output", "Code".to_string()));
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let client = CtppClient::new(ClientConfig {
            api_url: "https://example.org/api/".to_string(),
            api_key: None,
            timeout_seconds: 5,
            show_progress: false,
        })
        .unwrap();
        assert_eq!(client.endpoint("2016"), "https://example.org/api/data/2016");
    }

    #[test]
    fn test_unknown_state_fails_before_request() {
        let client = CtppClient::new(ClientConfig {
            api_url: "http://127.0.0.1:9".to_string(),
            api_key: None,
            timeout_seconds: 1,
            show_progress: false,
        })
        .unwrap();
        let mut req = request();
        req.state = "Atlantis".to_string();

        let err = tokio_test::block_on(client.fetch_table(&req)).unwrap_err();
        assert!(matches!(err, ReportError::UnknownState(_)));
    }

    #[test]
    fn test_load_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            snapshot_path(dir.path(), "A102106"),
            include_str!("../../fixtures/A102106.json"),
        )
        .unwrap();

        let source = DataSource::Snapshot(dir.path().to_path_buf());
        let table = tokio_test::block_on(source.fetch(&request())).unwrap();
        assert!(table.column_index("MINORITY").is_some());
        assert!(!table.rows.is_empty());
        assert!(source.describe().starts_with("snapshot: "));
    }

    #[test]
    fn test_missing_snapshot_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = tokio_test::block_on(load_snapshot(dir.path(), "A999999")).unwrap_err();
        assert!(matches!(err, ReportError::Io(_)));
    }
}

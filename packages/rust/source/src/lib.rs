//! Spreadsheet record source.
//!
//! Fetches one rectangular cell range from a Google-Sheets-shaped values API
//! and exposes it as a [`RowTable`] (header row + data rows). Authentication
//! is an opaque bearer token; obtaining and refreshing it is someone else's
//! problem.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use contactpipe_shared::{ContactPipeError, Result, RowTable, SourceConfig, require_env};

/// User-Agent string for source requests.
const USER_AGENT: &str = concat!("contactpipe/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// Response body of the values endpoint. Only `values` matters to us;
/// the endpoint omits it entirely for an empty range.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

// ---------------------------------------------------------------------------
// SheetsClient
// ---------------------------------------------------------------------------

/// HTTP client for the spreadsheet values endpoint.
pub struct SheetsClient {
    client: Client,
    base_url: Url,
    sheet_id: String,
    range: String,
}

impl SheetsClient {
    /// Create a client against an explicit endpoint with an explicit token.
    pub fn new(base_url: &str, sheet_id: &str, range: &str, token: &str, timeout_secs: u64) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ContactPipeError::config(format!("invalid source base URL: {e}")))?;

        let mut headers = reqwest::header::HeaderMap::new();
        let mut auth = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| ContactPipeError::config(format!("invalid source token: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ContactPipeError::Source(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            sheet_id: sheet_id.to_string(),
            range: range.to_string(),
        })
    }

    /// Create a client from config, reading the bearer token from the
    /// configured env var.
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let token = require_env(&config.token_env, "spreadsheet API token")?;
        Self::new(
            &config.base_url,
            &config.sheet_id,
            &config.range(),
            &token,
            config.timeout_secs,
        )
    }

    /// Fetch the configured range as an ordered row table.
    ///
    /// A fetch that succeeds but returns no cells is a normal outcome and
    /// yields an empty table; any HTTP or transport failure is a
    /// [`ContactPipeError::Source`] that the caller must propagate.
    #[instrument(skip_all, fields(sheet_id = %self.sheet_id, range = %self.range))]
    pub async fn fetch_rows(&self) -> Result<RowTable> {
        let url = self.values_url()?;
        debug!(%url, "fetching spreadsheet range");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| ContactPipeError::Source(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContactPipeError::Source(format!("{url}: HTTP {status}")));
        }

        let body: ValueRange = response
            .json()
            .await
            .map_err(|e| ContactPipeError::Source(format!("{url}: invalid response body: {e}")))?;

        let table = RowTable::from_values(body.values);
        info!(
            rows = table.row_count(),
            headers = table.headers().len(),
            "spreadsheet range fetched"
        );

        Ok(table)
    }

    /// Build `{base}/v4/spreadsheets/{sheet_id}/values/{range}`.
    fn values_url(&self) -> Result<Url> {
        self.base_url
            .join(&format!(
                "v4/spreadsheets/{}/values/{}",
                self.sheet_id, self.range
            ))
            .map_err(|e| ContactPipeError::config(format!("invalid values URL: {e}")))
    }
}

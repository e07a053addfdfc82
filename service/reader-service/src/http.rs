//! HTTP executor: POSTs SQL to the remote query endpoint.
//!
//! The endpoint accepts form-encoded `query` and `queryMode` fields and
//! answers with JSON: `array` mode yields rows as string arrays,
//! `dictionary` mode yields rows as column-keyed maps.

use std::collections::BTreeMap;
use std::time::Duration;

use analytics_model::AnalyticsRow;
use analytics_query::{ExecutorError, QueryExecutor};
use tracing::{debug, warn};

const QUERY_KEY: &str = "query";
const MODE_KEY: &str = "queryMode";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpExecutor {
    endpoint: reqwest::Url,
    client: reqwest::blocking::Client,
}

impl HttpExecutor {
    pub fn new(endpoint: &str) -> Result<Self, ExecutorError> {
        let endpoint = reqwest::Url::parse(endpoint.trim())
            .map_err(|e| ExecutorError::BadEndpoint(format!("{endpoint}: {e}")))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ExecutorError::Transport(e.to_string()))?;
        Ok(Self { endpoint, client })
    }

    fn post(&self, sql: &str, mode: &str) -> Result<String, ExecutorError> {
        debug!(%mode, %sql, "posting query");
        let response = self
            .client
            .post(self.endpoint.clone())
            .form(&[(QUERY_KEY, sql), (MODE_KEY, mode)])
            .send()
            .map_err(|e| ExecutorError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "endpoint returned failure status");
            return Err(ExecutorError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .map_err(|e| ExecutorError::Transport(e.to_string()))?;
        if body.trim().is_empty() {
            return Err(ExecutorError::EmptyBody);
        }
        Ok(body)
    }
}

fn decode_error(err: &serde_json::Error, body: &str) -> ExecutorError {
    // Keep enough of the raw body to diagnose, not the whole payload.
    let snippet: String = body.chars().take(200).collect();
    ExecutorError::Decode(format!("{err}; body starts: {snippet}"))
}

impl QueryExecutor for HttpExecutor {
    fn fetch_rows(&self, sql: &str) -> Result<Vec<AnalyticsRow>, ExecutorError> {
        let body = self.post(sql, "dictionary")?;
        let maps: Vec<BTreeMap<String, Option<String>>> =
            serde_json::from_str(&body).map_err(|e| decode_error(&e, &body))?;
        Ok(maps.into_iter().map(AnalyticsRow::from_columns).collect())
    }

    fn fetch_scalars(&self, sql: &str) -> Result<Vec<Vec<String>>, ExecutorError> {
        let body = self.post(sql, "array")?;
        serde_json::from_str(&body).map_err(|e| decode_error(&e, &body))
    }
}

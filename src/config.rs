use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Runtime configuration for the pipeline. Loaded from JSON supplied by the
/// embedding layer; every field has a usable default except the identifiers
/// that are inherently deployment-specific.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the approval system, e.g. `https://example.org/app`.
    pub approval_base_url: String,
    /// Spreadsheet carrying the task queue.
    pub spreadsheet_id: String,
    /// Bearer access token for the Sheets API, minted by the external
    /// credential store.
    pub sheet_access_token: String,
    /// Assignee whose pending rows form the queue.
    pub assignee: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Whether the tracking-number body scan matches case-insensitively.
    #[serde(default = "default_true")]
    pub tracking_case_insensitive: bool,
    /// Verification date written back on submit (`YYYY-MM-DD`). Defaults to
    /// today when absent.
    #[serde(default)]
    pub verification_date: Option<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn from_json(text: &str) -> Result<Config> {
        serde_json::from_str(text)
            .map_err(|err| Error::SourceUnavailable(format!("parse config: {err}")))
    }
}

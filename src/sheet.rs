//! Tabular-source transport.
//!
//! The task queue and the write-back target live in one spreadsheet reached
//! over the Sheets v4 values surface. The trait seam keeps `tasks` and
//! `writeback` testable without a network.

use crate::approval::build_agent;
use crate::error::{Error, Result};
use serde::Deserialize;
use ureq::Agent;

/// Column span the queue occupies; row filtering indexes into this range.
pub const TASK_RANGE: &str = "A:V";

/// One cell write, addressed as `<column letter(s)><1-based row>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub cell: String,
    pub value: String,
}

pub trait SheetApi {
    /// Fetch the rectangular range as ordered rows of strings. Short rows
    /// are returned as-is; callers treat missing cells as empty.
    fn fetch_rows(&self, range: &str) -> Result<Vec<Vec<String>>>;

    /// Apply a batch of cell writes with user-entered value semantics and
    /// return the number of cells sent.
    fn batch_update(&self, updates: &[CellUpdate]) -> Result<usize>;
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

pub struct HttpSheetApi {
    agent: Agent,
    base_url: String,
    spreadsheet_id: String,
    access_token: String,
}

impl HttpSheetApi {
    pub fn new(spreadsheet_id: &str, access_token: &str, timeout_secs: u64) -> HttpSheetApi {
        HttpSheetApi {
            agent: build_agent(timeout_secs),
            base_url: "https://sheets.googleapis.com/v4/spreadsheets".to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            access_token: access_token.to_string(),
        }
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl SheetApi for HttpSheetApi {
    fn fetch_rows(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let url = format!("{}/{}/values/{range}", self.base_url, self.spreadsheet_id);
        let mut res = self
            .agent
            .get(&url)
            .header("Authorization", &self.bearer())
            .call()?;
        if !res.status().is_success() {
            return Err(Error::SourceUnavailable(format!(
                "range fetch returned status {}",
                res.status()
            )));
        }
        let range: ValueRange = res
            .body_mut()
            .read_json()
            .map_err(|err| Error::SourceUnavailable(format!("parse range response: {err}")))?;
        Ok(range.values)
    }

    fn batch_update(&self, updates: &[CellUpdate]) -> Result<usize> {
        if updates.is_empty() {
            return Ok(0);
        }
        let url = format!(
            "{}/{}/values:batchUpdate",
            self.base_url, self.spreadsheet_id
        );
        let data: Vec<serde_json::Value> = updates
            .iter()
            .map(|update| {
                serde_json::json!({
                    "range": update.cell,
                    "values": [[update.value]],
                })
            })
            .collect();
        let body = serde_json::json!({
            "valueInputOption": "USER_ENTERED",
            "data": data,
        });
        let res = self
            .agent
            .post(&url)
            .header("Authorization", &self.bearer())
            .send_json(&body)?;
        if !res.status().is_success() {
            return Err(Error::Transient(format!(
                "batch update returned status {}",
                res.status()
            )));
        }
        tracing::info!(cells = updates.len(), "applied cell updates");
        Ok(updates.len())
    }
}

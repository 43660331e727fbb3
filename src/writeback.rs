//! Write-back of evaluation results to the tabular source.

use crate::error::Result;
use crate::sheet::{CellUpdate, SheetApi};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Column the verification date is always written to.
pub const DATE_COLUMN: &str = "U";

pub trait WriteBack {
    /// Apply the given column → value map to one physical row, plus the
    /// verification date in the fixed date column. Returns the number of
    /// caller-supplied cells applied; invalid column keys are dropped, and
    /// an all-invalid (or empty) map is a successful zero-update operation.
    fn apply_updates(&self, row: u32, values: &BTreeMap<String, String>) -> Result<usize>;
}

pub struct WriteBackClient<S> {
    api: S,
    verification_date: String,
}

impl<S: SheetApi> WriteBackClient<S> {
    /// `verification_date` defaults to today (`YYYY-MM-DD`) when absent.
    pub fn new(api: S, verification_date: Option<String>) -> WriteBackClient<S> {
        let verification_date = verification_date
            .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());
        WriteBackClient {
            api,
            verification_date,
        }
    }
}

/// Column keys must be plain uppercase letter sequences. The filter guards
/// against accidental malformed keys, so offenders are dropped, not erred.
fn valid_column(key: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^[A-Z]+$").expect("column key regex"));
    re.is_match(key)
}

impl<S: SheetApi> WriteBack for WriteBackClient<S> {
    fn apply_updates(&self, row: u32, values: &BTreeMap<String, String>) -> Result<usize> {
        let mut updates: Vec<CellUpdate> = Vec::new();
        for (column, value) in values {
            if !valid_column(column) {
                tracing::warn!(column = %column, "dropping malformed column key");
                continue;
            }
            if column.as_str() == DATE_COLUMN {
                // The injected date owns this column.
                continue;
            }
            updates.push(CellUpdate {
                cell: format!("{column}{row}"),
                value: value.clone(),
            });
        }
        let applied = updates.len();
        updates.push(CellUpdate {
            cell: format!("{DATE_COLUMN}{row}"),
            value: self.verification_date.clone(),
        });
        self.api.batch_update(&updates)?;
        tracing::info!(row, applied, "write-back complete");
        Ok(applied)
    }
}

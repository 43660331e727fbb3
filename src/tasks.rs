//! Task queue derived from the tabular source.
//!
//! A row is pending for an assignee when its assignee column matches and its
//! status column is still empty. Row coordinates are 1-based positions in
//! the *unfiltered* sheet so later write-backs land on the physical row.

use crate::error::{Error, Result};
use crate::sheet::{SheetApi, TASK_RANGE};

pub const ASSIGNEE_COLUMN: usize = 1; // B
pub const NPSN_COLUMN: usize = 2; // C
pub const SCHOOL_NAME_COLUMN: usize = 5; // F
pub const SERIAL_NUMBER_COLUMN: usize = 12; // M
pub const STATUS_COLUMN: usize = 21; // V

/// One pending review item, bound to a physical sheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// 1-based position in the unfiltered row list, header included.
    pub row: u32,
    pub npsn: String,
    pub school_name: String,
    pub serial_number: String,
    pub assignee: String,
}

pub trait TaskFeed {
    fn list_pending(&self, assignee: &str) -> Result<Vec<Task>>;
}

pub struct TaskSource<S> {
    api: S,
}

impl<S: SheetApi> TaskSource<S> {
    pub fn new(api: S) -> TaskSource<S> {
        TaskSource { api }
    }
}

impl<S: SheetApi> TaskFeed for TaskSource<S> {
    fn list_pending(&self, assignee: &str) -> Result<Vec<Task>> {
        let rows = self.api.fetch_rows(TASK_RANGE)?;
        if rows.is_empty() {
            return Err(Error::SourceUnavailable(
                "source returned no rows".to_string(),
            ));
        }

        let mut tasks = Vec::new();
        for (index, row) in rows.iter().enumerate() {
            if index == 0 {
                // Header row.
                continue;
            }
            let row_assignee = cell(row, ASSIGNEE_COLUMN).trim();
            let row_status = cell(row, STATUS_COLUMN).trim();
            if row_assignee != assignee || !row_status.is_empty() {
                continue;
            }
            tasks.push(Task {
                row: (index + 1) as u32,
                npsn: cell(row, NPSN_COLUMN).to_string(),
                school_name: cell(row, SCHOOL_NAME_COLUMN).to_string(),
                serial_number: cell(row, SERIAL_NUMBER_COLUMN).to_string(),
                assignee: row_assignee.to_string(),
            });
        }
        tracing::info!(
            total = rows.len(),
            pending = tasks.len(),
            assignee,
            "task list loaded"
        );
        Ok(tasks)
    }
}

/// Missing cells in short rows read as empty.
fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

//! Sequential pipeline over one assignee's task queue.
//!
//! The orchestrator owns the session store and is the only component that
//! persists token rotations: collaborators report rotations in their return
//! values, and the orchestrator writes each one back before the next call
//! goes out. Tasks advance strictly in list order; there is no parallelism
//! and no automatic retry.

use crate::decision::DecisionApi;
use crate::detail::DetailApi;
use crate::error::{Error, Result};
use crate::evaluation::{self, decide, Decision, EvaluationForm};
use crate::extract::{extract_with, ExtractOptions, ExtractedRecord};
use crate::session::{AuthApi, SessionStore};
use crate::tasks::{Task, TaskFeed};
use crate::writeback::WriteBack;
use std::collections::BTreeMap;

/// Pipeline stage. `Exhausted` is terminal until the caller starts a new
/// listing cycle with [`Orchestrator::load_tasks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ListLoaded,
    TaskSelected,
    DetailLoaded,
    DecisionPending,
    Exhausted,
}

/// Outcome of one accepted submission.
///
/// Write-back failure does not undo the submission, so it is reported here
/// instead of as an `Err`: the decision stands and the queue advances.
#[derive(Debug)]
pub struct SubmitReport {
    pub raw_body: String,
    /// Cells applied by write-back, or `None` when write-back failed.
    pub cells_applied: Option<usize>,
    pub write_back_error: Option<Error>,
}

pub struct Orchestrator<T, D, C, W, A> {
    feed: T,
    detail: D,
    decisions: C,
    writeback: W,
    auth: A,
    session: SessionStore,
    assignee: String,
    extract_options: ExtractOptions,
    stage: Stage,
    tasks: Vec<Task>,
    index: usize,
    /// Physical row of the current task, captured at selection time so later
    /// sheet edits cannot shift the write-back target.
    current_row: u32,
    record: Option<ExtractedRecord>,
    form: Option<EvaluationForm>,
    pending: Option<Decision>,
}

impl<T, D, C, W, A> Orchestrator<T, D, C, W, A>
where
    T: TaskFeed,
    D: DetailApi,
    C: DecisionApi,
    W: WriteBack,
    A: AuthApi,
{
    pub fn new(
        feed: T,
        detail: D,
        decisions: C,
        writeback: W,
        auth: A,
        session: SessionStore,
        assignee: &str,
        extract_options: ExtractOptions,
    ) -> Orchestrator<T, D, C, W, A> {
        Orchestrator {
            feed,
            detail,
            decisions,
            writeback,
            auth,
            session,
            assignee: assignee.to_string(),
            extract_options,
            stage: Stage::Idle,
            tasks: Vec::new(),
            index: 0,
            current_row: 0,
            record: None,
            form: None,
            pending: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn current_task(&self) -> Option<&Task> {
        match self.stage {
            Stage::TaskSelected | Stage::DetailLoaded | Stage::DecisionPending => {
                self.tasks.get(self.index)
            }
            _ => None,
        }
    }

    pub fn current_record(&self) -> Option<&ExtractedRecord> {
        self.record.as_ref()
    }

    /// Tasks not yet submitted or skipped, including the current one.
    pub fn remaining(&self) -> usize {
        self.tasks.len().saturating_sub(self.index)
    }

    /// Fetch the pending task list for the configured assignee.
    ///
    /// When credentials are on hand a silent renewal runs first; its failure
    /// is logged and swallowed, since the stored token may still be live.
    /// Any prior in-flight task state is discarded.
    pub fn load_tasks(&mut self) -> Result<usize> {
        if let Some(credentials) = self.session.credentials().cloned() {
            if let Err(err) = self.session.renew(&self.auth, &credentials) {
                tracing::warn!(%err, "silent renewal failed, continuing with stored token");
            }
        }
        let tasks = self.feed.list_pending(&self.assignee)?;
        tracing::info!(count = tasks.len(), assignee = %self.assignee, "queue refreshed");
        self.tasks = tasks;
        self.index = 0;
        self.clear_task_state();
        self.stage = Stage::ListLoaded;
        Ok(self.tasks.len())
    }

    /// Select the first task of a freshly loaded list. Advancing past a task
    /// happens through `submit` or `skip`, not here.
    pub fn select_next(&mut self) -> Option<&Task> {
        if self.stage == Stage::ListLoaded {
            self.select_current();
        }
        self.current_task()
    }

    /// Resolve the current task's identifier, fetch its detail document and
    /// extract a record from it.
    ///
    /// `Ok(None)` means the remote had no identifier for the task's business
    /// keys, or returned an empty document. The task stays selected so the
    /// operator can skip it; nothing advances automatically.
    pub fn open_current(&mut self) -> Result<Option<&ExtractedRecord>> {
        if self.stage != Stage::TaskSelected && self.stage != Stage::DetailLoaded {
            return Err(Error::InvalidStage("open_current"));
        }
        let task = match self.tasks.get(self.index) {
            Some(task) => task.clone(),
            None => return Ok(None),
        };
        let token = self.session.get()?.to_string();
        let lookup = self.detail.resolve_identifier(&task, &token)?;
        self.persist_rotation(lookup.rotated_token);
        let id = match lookup.id {
            Some(id) => id,
            None => {
                tracing::warn!(row = task.row, serial_number = %task.serial_number,
                    "no identifier for task, leaving it selected");
                return Ok(None);
            }
        };
        let token = self.session.get()?.to_string();
        let doc = self.detail.fetch_detail(&id, &token)?;
        self.persist_rotation(doc.rotated_token);
        if doc.html.trim().is_empty() {
            tracing::warn!(row = task.row, status = %doc.status,
                "empty detail document, leaving task selected");
            return Ok(None);
        }
        let record = extract_with(&doc.html, &id, &self.extract_options);
        self.record = Some(record);
        self.stage = Stage::DetailLoaded;
        Ok(self.record.as_ref())
    }

    /// Derive the decision from a filled form and stage it for submission.
    ///
    /// Re-reviewing with a changed form replaces the pending decision.
    pub fn review(&mut self, form: EvaluationForm) -> Result<&Decision> {
        if self.stage != Stage::DetailLoaded && self.stage != Stage::DecisionPending {
            return Err(Error::InvalidStage("review"));
        }
        let decision = decide(&form);
        tracing::info!(code = decision.code.wire_value(), "decision staged");
        self.form = Some(form);
        self.stage = Stage::DecisionPending;
        Ok(self.pending.insert(decision))
    }

    /// Submit the pending decision, then write the evaluation back to the
    /// tabular source and advance to the next task.
    ///
    /// A rejected submission returns `RemoteRejected` and the task stays in
    /// `DecisionPending` with nothing written back. A write-back failure
    /// after an accepted submission does not roll anything back: it is
    /// reported in the [`SubmitReport`] and the queue still advances.
    pub fn submit(&mut self) -> Result<SubmitReport> {
        if self.stage != Stage::DecisionPending {
            return Err(Error::InvalidStage("submit"));
        }
        let task = self
            .tasks
            .get(self.index)
            .cloned()
            .ok_or(Error::InvalidStage("submit"))?;
        let (record, decision) = match (self.record.clone(), self.pending.clone()) {
            (Some(record), Some(decision)) => (record, decision),
            _ => return Err(Error::InvalidStage("submit")),
        };
        let token = self.session.get()?.to_string();
        let outcome = self.decisions.submit(&task, &record, &decision, &token)?;
        self.persist_rotation(outcome.rotated_token);
        if !outcome.accepted {
            return Err(Error::RemoteRejected {
                status: outcome.status,
                body: outcome.raw_body,
            });
        }
        let updates = self.non_default_updates();
        let row = self.current_row;
        let (cells_applied, write_back_error) = match self.writeback.apply_updates(row, &updates) {
            Ok(applied) => (Some(applied), None),
            Err(err) => {
                tracing::warn!(%err, row, "write-back failed after accepted submission");
                (None, Some(err))
            }
        };
        self.advance();
        Ok(SubmitReport {
            raw_body: outcome.raw_body,
            cells_applied,
            write_back_error,
        })
    }

    /// Drop the current task without submitting and move to the next one.
    pub fn skip(&mut self) {
        match self.stage {
            Stage::TaskSelected | Stage::DetailLoaded | Stage::DecisionPending => self.advance(),
            Stage::ListLoaded => {
                self.select_current();
                self.advance();
            }
            Stage::Idle | Stage::Exhausted => {}
        }
    }

    fn advance(&mut self) {
        self.index += 1;
        self.select_current();
    }

    fn select_current(&mut self) {
        self.clear_task_state();
        match self.tasks.get(self.index) {
            Some(task) => {
                self.current_row = task.row;
                tracing::info!(row = task.row, serial_number = %task.serial_number, "task selected");
                self.stage = Stage::TaskSelected;
            }
            None => {
                tracing::info!("task queue exhausted");
                self.stage = Stage::Exhausted;
            }
        }
    }

    fn clear_task_state(&mut self) {
        self.record = None;
        self.form = None;
        self.pending = None;
    }

    fn persist_rotation(&mut self, rotated: Option<String>) {
        if let Some(token) = rotated {
            tracing::debug!("session token rotated");
            self.session.set(token);
        }
    }

    /// Evaluation columns whose selected option differs from the compliant
    /// default. An accepted-as-is form yields an empty map, so write-back
    /// touches only the date column.
    fn non_default_updates(&self) -> BTreeMap<String, String> {
        let mut updates = BTreeMap::new();
        if let Some(form) = &self.form {
            for field in evaluation::FIELDS {
                if let Some(selected) = form.get(field.column) {
                    if selected.as_str() != field.options[0] {
                        updates.insert(field.column.to_string(), selected.clone());
                    }
                }
            }
        }
        updates
    }
}

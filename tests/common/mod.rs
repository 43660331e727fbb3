//! Shared fakes for pipeline integration tests.
//!
//! Each fake records what it was called with through an `Rc` handle the test
//! keeps a clone of, since the orchestrator takes ownership of its
//! collaborators.

use dac_verify::decision::{DecisionApi, DecisionOutcome};
use dac_verify::detail::{DetailApi, DetailDocument, IdLookup};
use dac_verify::error::{Error, Result};
use dac_verify::evaluation::Decision;
use dac_verify::extract::ExtractedRecord;
use dac_verify::session::{AuthApi, Credentials};
use dac_verify::tasks::{Task, TaskFeed};
use dac_verify::writeback::WriteBack;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

/// `(call, token-the-call-was-made-with)` pairs, in call order.
pub type TokenLog = Rc<RefCell<Vec<(&'static str, String)>>>;

pub fn new_token_log() -> TokenLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn task(row: u32, serial: &str) -> Task {
    Task {
        row,
        npsn: "10101234".to_string(),
        school_name: "SDN 1 Contoh".to_string(),
        serial_number: serial.to_string(),
        assignee: "budi".to_string(),
    }
}

/// A detail document small enough to inline but real enough to extract from.
pub fn detail_html(serial: &str) -> String {
    format!(
        concat!(
            r#"<label>NPSN</label><input value="10101234">"#,
            r#"<label>Nama Sekolah</label><input value="SDN 1 Contoh">"#,
            r#"<label>Serial Number</label><input value="{serial}">"#,
            r#"<label>No. Resi</label><input value="JX123">"#,
        ),
        serial = serial
    )
}

pub struct FixedFeed {
    pub tasks: Vec<Task>,
}

impl TaskFeed for FixedFeed {
    fn list_pending(&self, _assignee: &str) -> Result<Vec<Task>> {
        Ok(self.tasks.clone())
    }
}

pub struct ScriptedDetail {
    pub log: TokenLog,
    /// Identifier the lookup resolves to; `None` scripts an unknown task.
    pub id: Option<String>,
    pub html: String,
    pub rotate_on_lookup: Option<String>,
    pub rotate_on_detail: Option<String>,
}

impl ScriptedDetail {
    pub fn new(log: TokenLog, id: &str, html: String) -> ScriptedDetail {
        ScriptedDetail {
            log,
            id: Some(id.to_string()),
            html,
            rotate_on_lookup: None,
            rotate_on_detail: None,
        }
    }
}

impl DetailApi for ScriptedDetail {
    fn resolve_identifier(&self, _task: &Task, token: &str) -> Result<IdLookup> {
        self.log.borrow_mut().push(("lookup", token.to_string()));
        Ok(IdLookup {
            id: self.id.clone(),
            rotated_token: self.rotate_on_lookup.clone(),
        })
    }

    fn fetch_detail(&self, _id: &str, token: &str) -> Result<DetailDocument> {
        self.log.borrow_mut().push(("detail", token.to_string()));
        Ok(DetailDocument {
            status: "diterima".to_string(),
            html: self.html.clone(),
            rotated_token: self.rotate_on_detail.clone(),
        })
    }
}

pub struct ScriptedDecision {
    pub log: TokenLog,
    /// Flippable mid-test to script a rejection followed by a success.
    pub accepted: Rc<Cell<bool>>,
    pub rotate_on_submit: Option<String>,
    pub submitted: Rc<RefCell<Vec<Decision>>>,
}

impl ScriptedDecision {
    pub fn new(log: TokenLog) -> ScriptedDecision {
        ScriptedDecision {
            log,
            accepted: Rc::new(Cell::new(true)),
            rotate_on_submit: None,
            submitted: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl DecisionApi for ScriptedDecision {
    fn submit(
        &self,
        _task: &Task,
        _record: &ExtractedRecord,
        decision: &Decision,
        token: &str,
    ) -> Result<DecisionOutcome> {
        self.log.borrow_mut().push(("submit", token.to_string()));
        self.submitted.borrow_mut().push(decision.clone());
        let accepted = self.accepted.get();
        Ok(DecisionOutcome {
            accepted,
            status: if accepted { 200 } else { 422 },
            raw_body: if accepted {
                r#"{"success": true}"#.to_string()
            } else {
                r#"{"success": false}"#.to_string()
            },
            rotated_token: self.rotate_on_submit.clone(),
        })
    }
}

pub struct ScriptedAuth {
    /// `Some(cookie)` logs in successfully; `None` rejects the exchange.
    pub cookie: Option<String>,
}

impl AuthApi for ScriptedAuth {
    fn login(&self, _credentials: &Credentials) -> Result<String> {
        match &self.cookie {
            Some(cookie) => Ok(cookie.clone()),
            None => Err(Error::AuthFailed("login rejected".to_string())),
        }
    }
}

#[derive(Default)]
pub struct RecordingWriteBack {
    pub calls: Rc<RefCell<Vec<(u32, BTreeMap<String, String>)>>>,
    pub fail: bool,
}

impl WriteBack for RecordingWriteBack {
    fn apply_updates(&self, row: u32, values: &BTreeMap<String, String>) -> Result<usize> {
        if self.fail {
            return Err(Error::Transient("sheet write failed".to_string()));
        }
        self.calls.borrow_mut().push((row, values.clone()));
        Ok(values.len())
    }
}

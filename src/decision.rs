//! Decision submission to the approval system.

use crate::approval::{build_agent, cookie_header, rotated_token, ApprovalEndpoints, USER_AGENT};
use crate::error::Result;
use crate::evaluation::Decision;
use crate::extract::ExtractedRecord;
use crate::tasks::Task;
use serde::Deserialize;
use ureq::Agent;

#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    pub accepted: bool,
    /// HTTP status of the submit response.
    pub status: u16,
    /// Response body, raw. The remote sometimes answers with plain text
    /// instead of JSON; that is passed through, not treated as a failure.
    pub raw_body: String,
    pub rotated_token: Option<String>,
}

pub trait DecisionApi {
    fn submit(
        &self,
        task: &Task,
        record: &ExtractedRecord,
        decision: &Decision,
        token: &str,
    ) -> Result<DecisionOutcome>;
}

pub struct HttpDecisionClient {
    agent: Agent,
    endpoints: ApprovalEndpoints,
}

impl HttpDecisionClient {
    pub fn new(endpoints: ApprovalEndpoints, timeout_secs: u64) -> HttpDecisionClient {
        HttpDecisionClient {
            agent: build_agent(timeout_secs),
            endpoints,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubmitBody {
    success: Option<bool>,
}

impl DecisionApi for HttpDecisionClient {
    fn submit(
        &self,
        task: &Task,
        record: &ExtractedRecord,
        decision: &Decision,
        token: &str,
    ) -> Result<DecisionOutcome> {
        // The document is the source of truth at submission time; the task's
        // own npsn only fills in when extraction came up empty.
        let npsn = if record.school.npsn.is_empty() {
            task.npsn.as_str()
        } else {
            record.school.npsn.as_str()
        };
        let status = decision.code.wire_value().to_string();
        let mut res = self
            .agent
            .post(&self.endpoints.submit)
            .header("Cookie", &cookie_header(token))
            .header("User-Agent", USER_AGENT)
            .send_form([
                ("status", status.as_str()),
                ("id", record.external_id.as_str()),
                ("npsn", npsn),
                ("resi", record.tracking_number.as_str()),
                ("note", decision.note.as_str()),
            ])?;
        let rotated = rotated_token(res.headers(), token);
        let http_status = res.status().as_u16();
        let http_ok = res.status().is_success();
        let body = res.body_mut().read_to_string()?;
        let body_ok = serde_json::from_str::<SubmitBody>(&body)
            .ok()
            .and_then(|parsed| parsed.success)
            .unwrap_or(true);
        tracing::info!(
            status = %res.status(),
            accepted = http_ok && body_ok,
            id = %record.external_id,
            "decision submitted"
        );
        Ok(DecisionOutcome {
            accepted: http_ok && body_ok,
            status: http_status,
            raw_body: body,
            rotated_token: rotated,
        })
    }
}

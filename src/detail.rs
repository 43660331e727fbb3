//! Detail lookup against the approval system.
//!
//! Two calls per task: resolve the system's internal identifier from the
//! task's business keys, then fetch the detail document for that identifier.
//! Identifiers are not stable across sessions, so they are re-resolved per
//! task and never cached. Either call may rotate the session; rotation is
//! reported to the caller, never persisted here.

use crate::approval::{build_agent, cookie_header, rotated_token, ApprovalEndpoints, USER_AGENT};
use crate::error::Result;
use crate::tasks::Task;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use ureq::Agent;

#[derive(Debug, Clone, Default)]
pub struct IdLookup {
    /// `None` when the system knows no identifier for the business keys.
    pub id: Option<String>,
    pub rotated_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DetailDocument {
    pub status: String,
    pub html: String,
    pub rotated_token: Option<String>,
}

pub trait DetailApi {
    fn resolve_identifier(&self, task: &Task, token: &str) -> Result<IdLookup>;
    fn fetch_detail(&self, id: &str, token: &str) -> Result<DetailDocument>;
}

pub struct HttpDetailClient {
    agent: Agent,
    endpoints: ApprovalEndpoints,
}

impl HttpDetailClient {
    pub fn new(endpoints: ApprovalEndpoints, timeout_secs: u64) -> HttpDetailClient {
        HttpDetailClient {
            agent: build_agent(timeout_secs),
            endpoints,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LookupBody {
    #[serde(rename = "extractedId")]
    extracted_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailBody {
    status: Option<String>,
    html: Option<String>,
}

impl DetailApi for HttpDetailClient {
    fn resolve_identifier(&self, task: &Task, token: &str) -> Result<IdLookup> {
        let mut res = self
            .agent
            .post(&self.endpoints.lookup)
            .header("Cookie", &cookie_header(token))
            .header("User-Agent", USER_AGENT)
            .send_form([
                ("npsn", task.npsn.as_str()),
                ("nama_sekolah", task.school_name.as_str()),
                ("sn", task.serial_number.as_str()),
            ])?;
        let rotated = rotated_token(res.headers(), token);
        let body = res.body_mut().read_to_string()?;
        let id = identifier_from_body(&body);
        if id.is_none() {
            tracing::warn!(serial_number = %task.serial_number, "no identifier found for task");
        }
        Ok(IdLookup {
            id,
            rotated_token: rotated,
        })
    }

    fn fetch_detail(&self, id: &str, token: &str) -> Result<DetailDocument> {
        let mut res = self
            .agent
            .post(&self.endpoints.detail)
            .header("Cookie", &cookie_header(token))
            .header("User-Agent", USER_AGENT)
            .send_form([("id", id)])?;
        let rotated = rotated_token(res.headers(), token);
        let body = res.body_mut().read_to_string()?;
        // Expected shape is { status, html }; anything else passes through
        // as an "unknown" document for the caller to judge.
        let (status, html) = match serde_json::from_str::<DetailBody>(&body) {
            Ok(parsed) => (
                parsed.status.unwrap_or_else(|| "unknown".to_string()),
                parsed.html.unwrap_or_default(),
            ),
            Err(_) => ("unknown".to_string(), body),
        };
        Ok(DetailDocument {
            status,
            html,
            rotated_token: rotated,
        })
    }
}

/// Identifier from a JSON `extractedId` field, with a `data-id` attribute
/// scan as fallback for HTML-shaped bodies.
fn identifier_from_body(body: &str) -> Option<String> {
    if let Ok(parsed) = serde_json::from_str::<LookupBody>(body) {
        if let Some(id) = parsed.extracted_id.filter(|id| !id.is_empty()) {
            return Some(id);
        }
    }
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r#"(?i)data-id\s*=\s*"([^"]+)""#).expect("data-id regex")
    });
    re.captures(body).map(|caps| caps[1].to_string())
}

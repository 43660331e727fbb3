//! Shared HTTP plumbing for the approval system.
//!
//! Every approval-system call is a form-encoded POST authenticated by the
//! session cookie, and every response may rotate the token via a
//! `set-cookie` header. The rotation scan lives here so the detail and
//! decision clients report it identically.

use crate::error::{Error, Result};
use crate::session::{token_from_cookie, AuthApi, Credentials, SESSION_COOKIE};
use std::time::Duration;
use ureq::http::HeaderMap;
use ureq::Agent;

/// The approval system rejects unrecognized clients; present a browser UA
/// like the original callers did.
pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Resolved endpoint URLs for one approval-system deployment.
#[derive(Debug, Clone)]
pub struct ApprovalEndpoints {
    pub login: String,
    pub lookup: String,
    pub detail: String,
    pub submit: String,
}

impl ApprovalEndpoints {
    pub fn for_base(base_url: &str) -> ApprovalEndpoints {
        let base = base_url.trim_end_matches('/');
        ApprovalEndpoints {
            login: format!("{base}/auth/login"),
            lookup: format!("{base}/approval/check"),
            detail: format!("{base}/approval/detail"),
            submit: format!("{base}/approval/save_approval"),
        }
    }
}

/// Blocking agent with a bounded per-request timeout. Non-2xx statuses are
/// surfaced as values, not errors; callers classify them.
pub(crate) fn build_agent(timeout_secs: u64) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(timeout_secs)))
        .http_status_as_error(false)
        .build()
        .into()
}

pub(crate) fn cookie_header(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}")
}

/// Scan response headers for a session token differing from the one sent.
pub(crate) fn rotated_token(headers: &HeaderMap, sent: &str) -> Option<String> {
    for value in headers.get_all("set-cookie") {
        let Ok(raw) = value.to_str() else { continue };
        if let Some(token) = token_from_cookie(raw) {
            if token != sent {
                return Some(token);
            }
        }
    }
    None
}

/// HTTP login exchange against the approval system.
pub struct HttpAuthClient {
    agent: Agent,
    login_url: String,
}

impl HttpAuthClient {
    pub fn new(endpoints: &ApprovalEndpoints, timeout_secs: u64) -> HttpAuthClient {
        HttpAuthClient {
            agent: build_agent(timeout_secs),
            login_url: endpoints.login.clone(),
        }
    }
}

impl AuthApi for HttpAuthClient {
    fn login(&self, credentials: &Credentials) -> Result<String> {
        let res = self
            .agent
            .post(&self.login_url)
            .header("User-Agent", USER_AGENT)
            .send_form([
                ("username", credentials.username.as_str()),
                ("password", credentials.secret.as_str()),
            ])?;
        if !res.status().is_success() {
            return Err(Error::AuthFailed(format!(
                "login returned status {}",
                res.status()
            )));
        }
        let mut fallback = None;
        for value in res.headers().get_all("set-cookie") {
            let Ok(raw) = value.to_str() else { continue };
            if token_from_cookie(raw).is_some() {
                return Ok(raw.to_string());
            }
            if fallback.is_none() {
                fallback = Some(raw.to_string());
            }
        }
        fallback.ok_or_else(|| Error::AuthFailed("login response carried no cookie".to_string()))
    }
}

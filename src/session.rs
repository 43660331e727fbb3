//! Session-token lifecycle for the approval system.
//!
//! The approval system authenticates with an opaque cookie token that it may
//! rotate on any response. `SessionStore` is the single mutable cell holding
//! the current token: every outbound call reads it immediately before the
//! request, and every observed rotation is written back before the next
//! request goes out. One logical session exists per process; rotation
//! replaces the token in place, it never forks a second session.

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Cookie name the approval system issues its session token under.
pub const SESSION_COOKIE: &str = "ci_session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub secret: String,
}

/// Login seam. The HTTP implementation lives in `approval`; tests substitute
/// their own.
pub trait AuthApi {
    /// Perform the login exchange and return the raw cookie string from the
    /// response, e.g. `ci_session=abc123; expires=...`.
    fn login(&self, credentials: &Credentials) -> Result<String>;
}

#[derive(Debug, Default)]
pub struct SessionStore {
    token: Option<String>,
    credentials: Option<Credentials>,
}

impl SessionStore {
    pub fn new() -> SessionStore {
        SessionStore::default()
    }

    /// Seed the store with a previously persisted token and the credentials
    /// to renew it with.
    pub fn with_state(token: Option<String>, credentials: Option<Credentials>) -> SessionStore {
        SessionStore { token, credentials }
    }

    /// Current token, or `NoSession` if none was ever obtained.
    pub fn get(&self) -> Result<&str> {
        self.token.as_deref().ok_or(Error::NoSession)
    }

    /// Unconditional overwrite; called whenever any client observes rotation.
    pub fn set(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Perform a login exchange and replace the token on success.
    ///
    /// On failure the prior token is left untouched and `AuthFailed` is
    /// returned; opportunistic callers swallow it and proceed stale.
    pub fn renew(&mut self, auth: &dyn AuthApi, credentials: &Credentials) -> Result<&str> {
        let cookie = auth
            .login(credentials)
            .map_err(|err| Error::AuthFailed(err.to_string()))?;
        let token = match token_from_cookie(&cookie) {
            Some(token) => token,
            None => {
                // The remote answered without a recognizable token segment.
                // Keep the raw cookie string rather than drop the session.
                tracing::warn!(cookie = %cookie, "login response had no {SESSION_COOKIE} segment");
                cookie
            }
        };
        self.credentials = Some(credentials.clone());
        self.token = Some(token);
        tracing::info!("session renewed");
        self.get()
    }
}

/// Extract the session token from a raw cookie string.
pub fn token_from_cookie(raw: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(&format!(r"{SESSION_COOKIE}=([^;]+)")).expect("session cookie regex")
    });
    re.captures(raw)
        .map(|caps| caps[1].to_string())
        .filter(|token| !token.is_empty())
}

//! Human-in-the-loop verification pipeline for device-delivery approvals.
//!
//! Pending tasks are read from a shared spreadsheet, matched against a
//! cookie-authenticated approval site, and presented one at a time: the
//! operator reviews the site's detail document, fills an evaluation form,
//! and the derived decision is submitted back to the site with the result
//! mirrored into the spreadsheet row.
//!
//! [`orchestrator::Orchestrator`] drives the whole sequence; the other
//! modules are its collaborators behind trait seams so each can be tested
//! (and swapped) in isolation:
//!
//! - [`session`] / [`approval`] — session-token lifecycle and the HTTP side
//!   of the approval site, including its per-response cookie rotation
//! - [`sheet`] / [`tasks`] — spreadsheet access and the pending-task filter
//! - [`detail`] / [`extract`] — detail lookup and total extraction of a
//!   structured record from the returned document
//! - [`evaluation`] / [`decision`] / [`writeback`] — the evaluation form,
//!   decision derivation, submission, and spreadsheet write-back

pub mod approval;
pub mod config;
pub mod decision;
pub mod detail;
pub mod error;
pub mod evaluation;
pub mod extract;
pub mod orchestrator;
pub mod session;
pub mod sheet;
pub mod tasks;
pub mod writeback;

pub use config::Config;
pub use error::{Error, Result};
pub use orchestrator::{Orchestrator, Stage, SubmitReport};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure taxonomy for the verification pipeline.
///
/// Extraction quality issues are deliberately absent: the document extractor
/// is total and degrades to sentinel values instead of erroring.
#[derive(Debug, Error)]
pub enum Error {
    /// No session token has ever been obtained. Hard stop; the user must
    /// authenticate before the pipeline can talk to the approval system.
    #[error("no session token available; login required")]
    NoSession,

    /// The silent renewal exchange was rejected. Callers renewing
    /// opportunistically swallow this and proceed with the stale token.
    #[error("session renewal failed: {0}")]
    AuthFailed(String),

    /// The tabular source returned no rows at all. Distinct from an empty
    /// filtered task list, which is a valid outcome.
    #[error("task source unavailable: {0}")]
    SourceUnavailable(String),

    /// Network-level failure on a single call. Safe to retry that call,
    /// not the whole sequence.
    #[error("transient network failure: {0}")]
    Transient(String),

    /// The approval system refused the decision submission. No write-back
    /// is attempted and the task stays selected.
    #[error("decision rejected by remote (status {status}): {body}")]
    RemoteRejected { status: u16, body: String },

    /// A pipeline operation was invoked outside the stage it is legal in.
    #[error("{0} called in the wrong pipeline stage")]
    InvalidStage(&'static str),
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Error {
        Error::Transient(err.to_string())
    }
}

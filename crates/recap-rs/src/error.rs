//! Error taxonomy for the summarization pipeline.
//!
//! Each variant maps to a distinct caller policy: [`Error::Configuration`]
//! halts the process at startup, [`Error::MissingInput`] aborts one batch
//! while the session continues, [`Error::NoData`] is downgraded to a no-op
//! by the shutdown path, and the rest propagate.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// No usable API credential. Not locally recoverable — callers exit.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The chat endpoint failed: a non-retryable HTTP status, or a
    /// transient failure that survived the whole retry budget.
    #[error("request error: {0}")]
    Request(String),

    /// The endpoint answered 2xx but the payload was missing expected
    /// fields or was not valid JSON.
    #[error("response error: {0}")]
    Response(String),

    /// An operation was invoked with nothing to work on: an empty
    /// screenshot batch, or a reduction over zero summary artifacts.
    /// Severity is the caller's call.
    #[error("no input artifacts under {0}")]
    NoData(PathBuf),

    /// A screenshot listed in a batch does not exist on disk. The batch
    /// fails atomically; no artifact is written.
    #[error("missing screenshot: {0}")]
    MissingInput(PathBuf),

    /// Local filesystem failure. A half-written session is not
    /// recoverable by retry, so these terminate the operation.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failing_path() {
        let err = Error::MissingInput(PathBuf::from("/tmp/shot.png"));
        assert!(err.to_string().contains("/tmp/shot.png"));

        let err = Error::NoData(PathBuf::from("/tmp/summaries"));
        assert!(err.to_string().contains("/tmp/summaries"));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("gone"));
    }
}

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a benchmark run.
///
/// Per-call failures against the store are not represented here; they are
/// recorded as [`Outcome::Failure`](crate::metrics::Outcome) samples and the
/// run continues.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("unknown benchmark '{0}': expected one of GET, POST or SEARCH")]
    InvalidScenario(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("store rejected init with status {status}: {body}")]
    Init { status: u16, body: String },

    #[error("store unreachable during init: {0}")]
    InitTransport(String),

    #[error("failed to persist run artifact to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

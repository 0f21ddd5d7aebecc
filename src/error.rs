use std::time::Duration;

/// Conditions that abort a whole command run
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Configuration file or credential unavailable; nothing was attempted
    #[error("{0}")]
    PreconditionMissing(String),

    #[error("NetBox at {url} is not ready after {attempts} attempts")]
    RemoteUnavailable { url: String, attempts: u32 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("importer job {job} failed: {detail}")]
    JobFailed { job: String, detail: String },

    #[error("importer job {job} did not complete within {}s", .timeout.as_secs())]
    JobTimedOut { job: String, timeout: Duration },
}

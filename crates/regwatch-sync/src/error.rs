use thiserror::Error;

/// Per-source fetch failure. Caught at source scope by the orchestrator
/// and converted into a summary entry; never aborts the run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Transport failure, timeout, or non-success HTTP status.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// The body was not the JSON shape the source promises.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::MalformedResponse(err.to_string())
        } else {
            SyncError::SourceUnavailable(err.to_string())
        }
    }
}

/// A raw record with no usable id. The record is dropped and counted;
/// the rest of the batch proceeds.
#[derive(Debug, Error)]
#[error("unmappable record: missing id")]
pub struct UnmappableRecord;

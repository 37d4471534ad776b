// Collection and publishing errors

use std::time::Duration;
use thiserror::Error;

/// Anything that makes a collection cycle unusable. A cycle that hits one of
/// these publishes nothing.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("{operation} failed for '{id}': {source}")]
    SourceUnavailable {
        operation: &'static str,
        id: String,
        #[source]
        source: bollard::errors::Error,
    },

    #[error("malformed stats for '{id}': {reason}")]
    MalformedSnapshot { id: String, reason: String },

    #[error("stats for '{id}' not received within {after:?}")]
    Timeout { id: String, after: Duration },

    #[error("collection task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),

    #[error("host stats unavailable: {0}")]
    HostStats(String),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("ingestion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ingestion API rejected batch with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("batch of {len} datapoints exceeds the limit of {max}")]
    BatchTooLarge { len: usize, max: usize },
}

impl CollectError {
    pub fn malformed(id: &str, reason: impl Into<String>) -> Self {
        Self::MalformedSnapshot {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

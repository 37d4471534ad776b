// Datapoint publishing: batching plus the HTTP and log-only backends.

mod http;
mod log;

pub use self::http::HttpPublisher;
pub use self::log::LogPublisher;

use crate::config::{PublisherConfig, PublisherKind};
use crate::error::PublishError;
use crate::models::Datapoint;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Largest batch the ingestion API accepts in one call.
pub const MAX_DATAPOINTS_PER_CALL: usize = 20;

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Sends one batch. Callers keep `datapoints.len() <= MAX_DATAPOINTS_PER_CALL`.
    async fn publish(&self, datapoints: &[Datapoint], namespace: &str)
    -> Result<(), PublishError>;
}

/// Contiguous chunks of at most [`MAX_DATAPOINTS_PER_CALL`] datapoints.
pub fn batches(datapoints: &[Datapoint]) -> std::slice::Chunks<'_, Datapoint> {
    datapoints.chunks(MAX_DATAPOINTS_PER_CALL)
}

/// Publishes `datapoints` batch by batch under one namespace. Returns the
/// number of calls made; an empty slice makes none.
pub async fn dispatch<P>(
    publisher: &P,
    datapoints: &[Datapoint],
    namespace: &str,
) -> Result<usize, PublishError>
where
    P: Publisher + ?Sized,
{
    let mut calls = 0;
    for batch in batches(datapoints) {
        publisher.publish(batch, namespace).await?;
        calls += 1;
        debug!(
            operation = "publish",
            batch_len = batch.len(),
            namespace,
            "batch published"
        );
    }
    Ok(calls)
}

pub(crate) fn check_batch(datapoints: &[Datapoint]) -> Result<(), PublishError> {
    if datapoints.len() > MAX_DATAPOINTS_PER_CALL {
        return Err(PublishError::BatchTooLarge {
            len: datapoints.len(),
            max: MAX_DATAPOINTS_PER_CALL,
        });
    }
    Ok(())
}

/// Builds the publisher selected in config.
pub fn from_config(config: &PublisherConfig) -> anyhow::Result<Arc<dyn Publisher>> {
    match config.kind {
        PublisherKind::Log => Ok(Arc::new(LogPublisher)),
        PublisherKind::Http => {
            let endpoint = config.endpoint.clone().ok_or_else(|| {
                anyhow::anyhow!("publisher.endpoint is required for kind = \"http\"")
            })?;
            let publisher = HttpPublisher::new(
                endpoint,
                config.api_key.clone(),
                Duration::from_secs(config.request_timeout_secs),
            )?;
            tracing::info!(endpoint = publisher.endpoint(), "publishing over HTTP");
            Ok(Arc::new(publisher))
        }
    }
}

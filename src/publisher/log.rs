// Dry-run publisher: datapoints go to the log instead of the ingestion API.

use super::{Publisher, check_batch};
use crate::error::PublishError;
use crate::models::Datapoint;
use async_trait::async_trait;
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct LogPublisher;

#[async_trait]
impl Publisher for LogPublisher {
    async fn publish(&self, datapoints: &[Datapoint], namespace: &str) -> Result<(), PublishError> {
        check_batch(datapoints)?;
        for p in datapoints {
            info!(
                namespace,
                metric = %p.metric_name,
                value = p.value,
                unit = ?p.unit,
                dimensions = ?p.dimensions,
                "datapoint"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Unit;
    use crate::publisher::MAX_DATAPOINTS_PER_CALL;

    fn points(n: usize) -> Vec<Datapoint> {
        (0..n)
            .map(|i| Datapoint::new("m", i as f64, Unit::Count, 0, &[]))
            .collect()
    }

    #[tokio::test]
    async fn accepts_full_and_empty_batches() {
        let publisher = LogPublisher;
        publisher.publish(&points(MAX_DATAPOINTS_PER_CALL), "ns").await.unwrap();
        publisher.publish(&points(1), "ns").await.unwrap();
        publisher.publish(&[], "ns").await.unwrap();
    }

    #[tokio::test]
    async fn rejects_oversized_batch() {
        let err = LogPublisher.publish(&points(21), "ns").await.unwrap_err();
        assert!(matches!(err, PublishError::BatchTooLarge { len: 21, max: 20 }));
    }
}

// Metric collectors: host memory, per-container, per-swarm-service.

mod container;
mod memory;
mod naming;
mod swarm;

pub use container::{ContainerCollector, CycleState, collect_containers, delta_percent};
pub use memory::{MemoryCollector, memory_datapoints};
pub use naming::normalize_service_name;
pub use swarm::{
    SWARM_SERVICE_LABEL, SwarmCollector, aggregate_services, collect_container,
    service_datapoints,
};

use crate::error::CollectError;
use crate::models::Datapoint;
use serde::Deserialize;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Awaits one stats read for container `id`, giving up after `timeout`.
/// Unbounded when `timeout` is `None`.
pub(crate) async fn bounded_read<T, F>(
    id: &str,
    timeout: Option<Duration>,
    read: F,
) -> Result<T, CollectError>
where
    F: Future<Output = Result<T, CollectError>>,
{
    match timeout {
        Some(after) => tokio::time::timeout(after, read)
            .await
            .map_err(|_| CollectError::Timeout {
                id: id.to_string(),
                after,
            })?,
        None => read.await,
    }
}

/// A family of metrics that can be enabled in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Memory,
    Docker,
    Swarm,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [MetricKind::Memory, MetricKind::Docker, MetricKind::Swarm];
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MetricKind::Memory => "memory",
            MetricKind::Docker => "docker",
            MetricKind::Swarm => "swarm",
        })
    }
}

/// Every collector, sharing one instance id.
pub struct Collectors {
    pub instance_id: String,
    pub memory: MemoryCollector,
    pub docker: ContainerCollector,
    pub swarm: SwarmCollector,
}

impl Collectors {
    /// Runs one collector. Only `Docker` consults `state`; it returns the
    /// state the next cycle should see, every other kind returns `None`.
    pub async fn collect(
        &self,
        kind: MetricKind,
        state: &CycleState,
        timestamp: u64,
    ) -> Result<(Vec<Datapoint>, Option<CycleState>), CollectError> {
        match kind {
            MetricKind::Memory => {
                let points = self.memory.collect(&self.instance_id, timestamp).await?;
                Ok((points, None))
            }
            MetricKind::Docker => {
                let (points, next) = self
                    .docker
                    .collect(&self.instance_id, state, timestamp)
                    .await?;
                Ok((points, Some(next)))
            }
            MetricKind::Swarm => {
                let points = self.swarm.collect(&self.instance_id, timestamp).await?;
                Ok((points, None))
            }
        }
    }
}

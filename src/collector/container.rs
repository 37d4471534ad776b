// Per-container CPU and memory, with CPU percent derived from the previous
// cycle's cumulative usage.

use super::bounded_read;
use crate::error::CollectError;
use crate::models::{ContainerDescriptor, Datapoint, Dimension, Unit};
use crate::source::{ContainerLister, SnapshotSource};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

const NANOS_PER_SEC: f64 = 1e9;

/// What the previous cycle saw: cumulative CPU seconds per container id and
/// the instant those readings were taken.
///
/// Never updated in place. Each cycle builds a fresh state from the
/// containers it saw, so a container that disappears is forgotten.
#[derive(Debug, Clone)]
pub struct CycleState {
    usage: HashMap<String, f64>,
    taken_at: Instant,
}

impl Default for CycleState {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl CycleState {
    /// Empty state anchored at `taken_at`.
    pub fn new(taken_at: Instant) -> Self {
        Self {
            usage: HashMap::new(),
            taken_at,
        }
    }

    pub fn previous_usage(&self, id: &str) -> Option<f64> {
        self.usage.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.usage.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.usage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.usage.is_empty()
    }

    pub fn taken_at(&self) -> Instant {
        self.taken_at
    }
}

/// CPU percent from two cumulative readings (in seconds) taken `elapsed`
/// apart.
pub fn delta_percent(previous: f64, current: f64, elapsed: Duration) -> f64 {
    (current - previous) / elapsed.as_nanos() as f64 * 100.0 * NANOS_PER_SEC
}

/// Reads every container in turn and builds its datapoints.
///
/// `ContainerCPUUsage` is only emitted for containers `state` already knows.
/// Returns the datapoints with the state the next cycle should use; `state`
/// itself is left untouched so a failed cycle can be retried against it.
/// Each stats read is bounded by `timeout` when one is given.
pub async fn collect_containers<S>(
    source: &S,
    containers: &[ContainerDescriptor],
    instance_id: &str,
    state: &CycleState,
    now: Instant,
    timestamp: u64,
    timeout: Option<Duration>,
) -> Result<(Vec<Datapoint>, CycleState), CollectError>
where
    S: SnapshotSource + ?Sized,
{
    let elapsed = now.saturating_duration_since(state.taken_at);
    let mut next = CycleState::new(now);
    let mut out = Vec::with_capacity(containers.len() * 4);

    for container in containers {
        let dimensions = [
            Dimension::new("InstanceId", instance_id),
            Dimension::new("ContainerId", container.id.as_str()),
            Dimension::new("ContainerName", container.name.as_str()),
            Dimension::new("DockerImage", container.image.as_str()),
        ];
        let point = |metric: &str, value: f64, unit: Unit| {
            Datapoint::new(metric, value, unit, timestamp, &dimensions)
        };

        let id = container.id.as_str();
        let memory = bounded_read(id, timeout, source.memory(id)).await?;
        out.push(point("ContainerMemory", memory.usage as f64, Unit::Bytes));

        let cpu = bounded_read(id, timeout, source.cpu_times(id)).await?;
        out.push(point("ContainerCPUUser", cpu.user, Unit::Seconds));
        out.push(point("ContainerCPUSystem", cpu.system, Unit::Seconds));

        next.usage.insert(container.id.clone(), cpu.total);
        let percent_cpu = state
            .previous_usage(&container.id)
            .map(|previous| delta_percent(previous, cpu.total, elapsed));
        if let Some(percent) = percent_cpu {
            out.push(point("ContainerCPUUsage", percent, Unit::Percent));
        }

        info!(
            container = %container.name,
            memory_max_usage = memory.max_usage,
            cpu_user = cpu.user,
            cpu_system = cpu.system,
            percent_cpu = ?percent_cpu,
            "docker container"
        );
    }

    Ok((out, next))
}

/// CPU and memory per running container.
pub struct ContainerCollector {
    lister: Arc<dyn ContainerLister>,
    source: Arc<dyn SnapshotSource>,
    read_timeout: Option<Duration>,
}

impl ContainerCollector {
    pub fn new(
        lister: Arc<dyn ContainerLister>,
        source: Arc<dyn SnapshotSource>,
        read_timeout: Option<Duration>,
    ) -> Self {
        Self {
            lister,
            source,
            read_timeout,
        }
    }

    #[instrument(skip(self, state), fields(collector = "docker", known = state.len()))]
    pub async fn collect(
        &self,
        instance_id: &str,
        state: &CycleState,
        timestamp: u64,
    ) -> Result<(Vec<Datapoint>, CycleState), CollectError> {
        let containers = self.lister.list_running(None).await?;
        collect_containers(
            self.source.as_ref(),
            &containers,
            instance_id,
            state,
            Instant::now(),
            timestamp,
            self.read_timeout,
        )
        .await
    }
}

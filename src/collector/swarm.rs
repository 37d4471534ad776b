// Swarm service stats: fan out one stats read per container, fan the
// snapshots back in and roll them up per service.

use super::bounded_read;
use super::naming::normalize_service_name;
use crate::error::CollectError;
use crate::models::{ContainerDescriptor, Datapoint, Dimension, ServiceStats, Snapshot, Unit};
use crate::source::{ContainerLister, SnapshotSource};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument};

/// Label swarm puts on every task container.
pub const SWARM_SERVICE_LABEL: &str = "com.docker.swarm.service.name";

type Report = Result<Snapshot, CollectError>;

/// Reads one container's snapshot and renames it after its service.
pub async fn collect_container<S>(
    source: &S,
    container: &ContainerDescriptor,
    label: &str,
    timeout: Option<Duration>,
) -> Report
where
    S: SnapshotSource + ?Sized,
{
    let service_label = container.label(label).unwrap_or(container.name.as_str());
    let service = normalize_service_name(service_label);

    let mut snapshot = bounded_read(&container.id, timeout, source.snapshot(&container.id)).await?;

    snapshot.name = service;
    Ok(snapshot)
}

/// Collects every container concurrently and sums the snapshots per service.
///
/// Each container gets its own task; the channel holds one slot per
/// container so producers never wait on the consumer. A supervisor joins the
/// tasks and then drops the last sender, and that closure is what ends the
/// drain loop. The first failed read aborts the remaining tasks and fails
/// the whole roll-up.
pub async fn aggregate_services<S>(
    source: Arc<S>,
    containers: Vec<ContainerDescriptor>,
    label: &str,
    timeout: Option<Duration>,
) -> Result<BTreeMap<String, ServiceStats>, CollectError>
where
    S: SnapshotSource + ?Sized + 'static,
{
    let mut services = BTreeMap::new();
    if containers.is_empty() {
        return Ok(services);
    }

    let (tx, mut rx) = mpsc::channel::<Report>(containers.len());
    let mut tasks = JoinSet::new();
    for container in containers {
        let source = source.clone();
        let tx = tx.clone();
        let label = label.to_string();
        tasks.spawn(async move {
            let report = collect_container(&*source, &container, &label, timeout).await;
            let _ = tx.send(report).await;
        });
    }
    let supervisor = tokio::spawn(supervise(tasks, tx));

    while let Some(report) = rx.recv().await {
        let snapshot = match report {
            Ok(s) => s,
            Err(e) => {
                // Dropping the JoinSet inside the supervisor aborts the rest.
                supervisor.abort();
                return Err(e);
            }
        };
        debug!(service = %snapshot.name, "snapshot received");
        match services.entry(snapshot.name.clone()) {
            Entry::Vacant(e) => {
                e.insert(ServiceStats::from(&snapshot));
            }
            Entry::Occupied(mut e) => e.get_mut().absorb(&snapshot),
        }
    }

    Ok(services)
}

/// Waits for every collection task, forwards panics or cancellations as
/// errors, then closes the channel by dropping the last sender.
async fn supervise(mut tasks: JoinSet<()>, tx: mpsc::Sender<Report>) {
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            let _ = tx.send(Err(CollectError::TaskFailed(e))).await;
        }
    }
    drop(tx);
}

/// Eight datapoints per service, tagged with instance and service name.
pub fn service_datapoints(
    services: &BTreeMap<String, ServiceStats>,
    instance_id: &str,
    timestamp: u64,
) -> Vec<Datapoint> {
    let mut out = Vec::with_capacity(services.len() * 8);
    for (name, stats) in services {
        let percent_cpu = stats.percent_cpu();

        info!(
            service = %name,
            percent_cpu,
            total_usage = stats.total_usage,
            pre_total_usage = stats.pre_total_usage,
            system_usage = stats.system_usage,
            pre_system_usage = stats.pre_system_usage,
            memory_usage = stats.memory_usage,
            memory_max_usage = stats.memory_max_usage,
            online_cpus = stats.online_cpus,
            "swarm service"
        );

        let dimensions = [
            Dimension::new("InstanceId", instance_id),
            Dimension::new("ServiceName", name.as_str()),
        ];
        let point = |metric: &str, value: f64, unit: Unit| {
            Datapoint::new(metric, value, unit, timestamp, &dimensions)
        };

        out.extend([
            point("ServiceCPUPercent", percent_cpu, Unit::Percent),
            point("ServiceCPUUsage", stats.total_usage as f64, Unit::Seconds),
            point("ServiceCPUSystem", stats.system_usage as f64, Unit::Seconds),
            point("ServicePreCPUUsage", stats.pre_total_usage as f64, Unit::Seconds),
            point("ServicePreCPUSystem", stats.pre_system_usage as f64, Unit::Seconds),
            point("ServiceOnlineCPUs", stats.online_cpus as f64, Unit::Count),
            point("ServiceMemoryUsage", stats.memory_usage as f64, Unit::Bytes),
            point("ServiceMemoryMaxUsage", stats.memory_max_usage as f64, Unit::Bytes),
        ]);
    }
    out
}

/// CPU and memory per swarm service running on this host.
pub struct SwarmCollector {
    lister: Arc<dyn ContainerLister>,
    source: Arc<dyn SnapshotSource>,
    label: String,
    snapshot_timeout: Option<Duration>,
}

impl SwarmCollector {
    pub fn new(
        lister: Arc<dyn ContainerLister>,
        source: Arc<dyn SnapshotSource>,
        label: impl Into<String>,
        snapshot_timeout: Option<Duration>,
    ) -> Self {
        Self {
            lister,
            source,
            label: label.into(),
            snapshot_timeout,
        }
    }

    #[instrument(skip(self), fields(collector = "swarm"))]
    pub async fn collect(
        &self,
        instance_id: &str,
        timestamp: u64,
    ) -> Result<Vec<Datapoint>, CollectError> {
        let containers = self.lister.list_running(Some(&self.label)).await?;
        debug!(containers = containers.len(), "swarm containers listed");
        let services = aggregate_services(
            self.source.clone(),
            containers,
            &self.label,
            self.snapshot_timeout,
        )
        .await?;
        Ok(service_datapoints(&services, instance_id, timestamp))
    }
}

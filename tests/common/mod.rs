// Shared test helpers: in-memory stand-ins for Docker, the host and the
// ingestion API.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use swarm_monitor::collector::{
    Collectors, ContainerCollector, MemoryCollector, SWARM_SERVICE_LABEL, SwarmCollector,
};
use swarm_monitor::error::{CollectError, PublishError};
use swarm_monitor::models::{
    ContainerDescriptor, CpuTimes, Datapoint, MemoryUsage, RamStats, Snapshot,
};
use swarm_monitor::publisher::Publisher;
use swarm_monitor::source::{ContainerLister, HostMemorySource, SnapshotSource};
use tokio::sync::Notify;

pub fn swarm_container(id: &str, service_label: &str) -> ContainerDescriptor {
    let mut labels = HashMap::new();
    labels.insert(SWARM_SERVICE_LABEL.to_string(), service_label.to_string());
    ContainerDescriptor {
        id: id.to_string(),
        name: format!("{service_label}.{id}"),
        image: "nginx:1.27".to_string(),
        labels,
    }
}

pub fn plain_container(id: &str) -> ContainerDescriptor {
    ContainerDescriptor {
        id: id.to_string(),
        name: format!("c-{id}"),
        image: "redis:7".to_string(),
        labels: HashMap::new(),
    }
}

pub fn snapshot(total: u64, pre_total: u64, system: u64, pre_system: u64, memory: u64) -> Snapshot {
    Snapshot {
        name: "from-daemon".to_string(),
        total_usage: total,
        system_usage: system,
        pre_total_usage: pre_total,
        pre_system_usage: pre_system,
        online_cpus: 4,
        memory_usage: memory,
        memory_max_usage: memory * 2,
    }
}

/// Docker stand-in. Ids missing from a map fail the read as malformed.
#[derive(Default)]
pub struct FakeDocker {
    pub containers: Vec<ContainerDescriptor>,
    pub snapshots: HashMap<String, Snapshot>,
    pub cpu: HashMap<String, CpuTimes>,
    pub memory: HashMap<String, MemoryUsage>,
    pub delays: HashMap<String, Duration>,
    pub unavailable: HashSet<String>,
    pub list_fails: bool,
    pub snapshot_calls: AtomicUsize,
}

impl FakeDocker {
    pub fn with_swarm(entries: &[(&str, &str, Snapshot)]) -> Self {
        let mut fake = Self::default();
        for (id, label, snap) in entries {
            fake.containers.push(swarm_container(id, label));
            fake.snapshots.insert(id.to_string(), snap.clone());
        }
        fake
    }

    pub fn add_container(&mut self, id: &str, cpu: CpuTimes, memory: MemoryUsage) {
        self.containers.push(plain_container(id));
        self.cpu.insert(id.to_string(), cpu);
        self.memory.insert(id.to_string(), memory);
    }

    async fn delay(&self, id: &str) -> Result<(), CollectError> {
        if let Some(d) = self.delays.get(id) {
            tokio::time::sleep(*d).await;
        }
        if self.unavailable.contains(id) {
            return Err(unavailable(id));
        }
        Ok(())
    }
}

fn unavailable(id: &str) -> CollectError {
    CollectError::SourceUnavailable {
        operation: "stats",
        id: id.to_string(),
        source: bollard::errors::Error::DockerResponseServerError {
            status_code: 500,
            message: "daemon unavailable".to_string(),
        },
    }
}

#[async_trait]
impl ContainerLister for FakeDocker {
    async fn list_running(
        &self,
        label: Option<&str>,
    ) -> Result<Vec<ContainerDescriptor>, CollectError> {
        if self.list_fails {
            return Err(unavailable("*"));
        }
        Ok(self
            .containers
            .iter()
            .filter(|c| label.is_none_or(|l| c.labels.contains_key(l)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SnapshotSource for FakeDocker {
    async fn snapshot(&self, id: &str) -> Result<Snapshot, CollectError> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        self.delay(id).await?;
        self.snapshots
            .get(id)
            .cloned()
            .ok_or_else(|| CollectError::malformed(id, "no snapshot"))
    }

    async fn cpu_times(&self, id: &str) -> Result<CpuTimes, CollectError> {
        self.delay(id).await?;
        self.cpu
            .get(id)
            .copied()
            .ok_or_else(|| CollectError::malformed(id, "no cpu"))
    }

    async fn memory(&self, id: &str) -> Result<MemoryUsage, CollectError> {
        self.delay(id).await?;
        self.memory
            .get(id)
            .copied()
            .ok_or_else(|| CollectError::malformed(id, "no memory"))
    }
}

pub struct FakeHost(pub RamStats);

#[async_trait]
impl HostMemorySource for FakeHost {
    async fn ram_stats(&self) -> Result<RamStats, CollectError> {
        Ok(self.0)
    }
}

/// Records every batch it is handed and signals `published` after each one.
#[derive(Default)]
pub struct RecordingPublisher {
    pub batches: Mutex<Vec<(String, Vec<Datapoint>)>>,
    pub published: Notify,
}

impl RecordingPublisher {
    pub fn calls(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    pub fn all(&self) -> Vec<Datapoint> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(_, b)| b.iter().cloned())
            .collect()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, datapoints: &[Datapoint], namespace: &str) -> Result<(), PublishError> {
        self.batches
            .lock()
            .unwrap()
            .push((namespace.to_string(), datapoints.to_vec()));
        self.published.notify_one();
        Ok(())
    }
}

pub fn collectors(docker: Arc<FakeDocker>, ram: RamStats) -> Collectors {
    Collectors {
        instance_id: "i-test".to_string(),
        memory: MemoryCollector::new(Arc::new(FakeHost(ram))),
        docker: ContainerCollector::new(docker.clone(), docker.clone(), None),
        swarm: SwarmCollector::new(docker.clone(), docker, SWARM_SERVICE_LABEL, None),
    }
}

pub fn ram() -> RamStats {
    RamStats {
        total: 8192,
        used: 2048,
        available: 6144,
        usage_percent: 25.0,
    }
}

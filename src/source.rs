//! Seams between the collectors and the stats backends.
//! `DockerRepo` and `SysinfoRepo` implement these; tests use in-memory fakes.

use crate::error::CollectError;
use crate::models::{ContainerDescriptor, CpuTimes, MemoryUsage, RamStats, Snapshot};
use async_trait::async_trait;

/// Lists the containers running on this host.
#[async_trait]
pub trait ContainerLister: Send + Sync {
    /// Running containers carrying `label`, or all running containers when
    /// `label` is `None`.
    async fn list_running(
        &self,
        label: Option<&str>,
    ) -> Result<Vec<ContainerDescriptor>, CollectError>;
}

/// Point-in-time usage readings for one container. Calls share no state.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// One non-streaming reading. The returned name is whatever the source
    /// reports; callers overwrite it.
    async fn snapshot(&self, id: &str) -> Result<Snapshot, CollectError>;

    /// Cumulative CPU time in seconds.
    async fn cpu_times(&self, id: &str) -> Result<CpuTimes, CollectError>;

    async fn memory(&self, id: &str) -> Result<MemoryUsage, CollectError>;
}

/// Host-wide memory figures.
#[async_trait]
pub trait HostMemorySource: Send + Sync {
    async fn ram_stats(&self) -> Result<RamStats, CollectError>;
}

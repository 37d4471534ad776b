// Docker container listing and stats via bollard

mod stats;

use crate::error::CollectError;
use crate::models::{ContainerDescriptor, CpuTimes, MemoryUsage, Snapshot};
use crate::source::{ContainerLister, SnapshotSource};
use async_trait::async_trait;
use bollard::Docker;
use bollard::query_parameters::{ListContainersOptions, StatsOptions};
use bollard::models::{ContainerStatsResponse, ContainerSummary};
use futures_util::StreamExt;
use std::collections::HashMap;
use tracing::instrument;

#[derive(Clone)]
pub struct DockerRepo {
    docker: Docker,
}

impl DockerRepo {
    pub fn connect() -> anyhow::Result<Self> {
        let docker = Docker::connect_with_unix_defaults()?;
        Ok(Self { docker })
    }

    /// One non-streaming stats read. With `one_shot` off the daemon waits
    /// for a second sample so the previous-reading counters are filled in.
    async fn read_stats(
        &self,
        id: &str,
        operation: &'static str,
        one_shot: bool,
    ) -> Result<ContainerStatsResponse, CollectError> {
        let options = StatsOptions {
            stream: false,
            one_shot,
        };
        let mut stream = self.docker.stats(id, Some(options));
        match stream.next().await {
            Some(Ok(s)) => Ok(s),
            Some(Err(source)) => Err(CollectError::SourceUnavailable {
                operation,
                id: id.to_string(),
                source,
            }),
            None => Err(CollectError::malformed(id, "stats stream ended without a reading")),
        }
    }
}

#[async_trait]
impl ContainerLister for DockerRepo {
    #[instrument(skip(self), fields(repo = "docker", operation = "list_running"))]
    async fn list_running(
        &self,
        label: Option<&str>,
    ) -> Result<Vec<ContainerDescriptor>, CollectError> {
        let mut filters = HashMap::new();
        filters.insert("status".to_string(), vec!["running".to_string()]);
        if let Some(label) = label {
            filters.insert("label".to_string(), vec![label.to_string()]);
        }

        let options = ListContainersOptions {
            all: false,
            filters: Some(filters),
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|source| CollectError::SourceUnavailable {
                operation: "list_containers",
                id: label.unwrap_or("*").to_string(),
                source,
            })?;

        Ok(containers.iter().map(descriptor).collect())
    }
}

#[async_trait]
impl SnapshotSource for DockerRepo {
    #[instrument(skip(self), fields(repo = "docker", operation = "snapshot"))]
    async fn snapshot(&self, id: &str) -> Result<Snapshot, CollectError> {
        let s = self.read_stats(id, "snapshot", false).await?;
        stats::to_snapshot(&s, id)
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "cpu_times"))]
    async fn cpu_times(&self, id: &str) -> Result<CpuTimes, CollectError> {
        let s = self.read_stats(id, "cpu_times", true).await?;
        stats::to_cpu_times(&s, id)
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "memory"))]
    async fn memory(&self, id: &str) -> Result<MemoryUsage, CollectError> {
        let s = self.read_stats(id, "memory", true).await?;
        Ok(stats::to_memory(&s))
    }
}

fn descriptor(c: &ContainerSummary) -> ContainerDescriptor {
    let id = c.id.clone().unwrap_or_default();
    let name = c
        .names
        .as_ref()
        .and_then(|n| n.first())
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_else(|| id.clone());
    ContainerDescriptor {
        id,
        name,
        image: c.image.clone().unwrap_or_default(),
        labels: c.labels.clone().unwrap_or_default(),
    }
}

use crate::collector::{MetricKind, SWARM_SERVICE_LABEL};
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub collector: CollectorConfig,
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub docker: DockerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    pub interval_secs: u64,
    /// Namespace every datapoint is published under.
    pub namespace: String,
    /// Value of the `InstanceId` dimension; defaults to the host name.
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default = "default_metrics")]
    pub metrics: Vec<MetricKind>,
    /// Upper bound on a single container stats read, for both the swarm and
    /// per-container collectors. Unbounded when unset.
    #[serde(default)]
    pub snapshot_timeout_secs: Option<u64>,
    /// Stop the process on the first failed cycle instead of retrying next interval.
    #[serde(default = "default_exit_on_error")]
    pub exit_on_error: bool,
}

fn default_metrics() -> Vec<MetricKind> {
    MetricKind::ALL.to_vec()
}

fn default_exit_on_error() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublisherKind {
    Http,
    Log,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublisherConfig {
    pub kind: PublisherKind,
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Bearer token; `PUBLISHER_API_KEY` overrides it.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct DockerConfig {
    #[serde(default = "default_swarm_service_label")]
    pub swarm_service_label: String,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            swarm_service_label: default_swarm_service_label(),
        }
    }
}

fn default_swarm_service_label() -> String {
    SWARM_SERVICE_LABEL.to_string()
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        let mut config = Self::load_from_str(&s)?;
        if let Ok(key) = std::env::var("PUBLISHER_API_KEY")
            && !key.is_empty()
        {
            config.publisher.api_key = Some(key);
        }
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.collector.interval_secs > 0,
            "collector.interval_secs must be > 0, got {}",
            self.collector.interval_secs
        );
        anyhow::ensure!(
            !self.collector.namespace.trim().is_empty(),
            "collector.namespace must be non-empty"
        );
        anyhow::ensure!(
            self.collector
                .instance_id
                .as_deref()
                .is_none_or(|id| !id.trim().is_empty()),
            "collector.instance_id must be non-empty when set"
        );
        anyhow::ensure!(
            !self.collector.metrics.is_empty(),
            "collector.metrics must list at least one of memory, docker, swarm"
        );
        let unique: HashSet<MetricKind> = self.collector.metrics.iter().copied().collect();
        anyhow::ensure!(
            unique.len() == self.collector.metrics.len(),
            "collector.metrics must not repeat a metric"
        );
        anyhow::ensure!(
            self.collector.snapshot_timeout_secs != Some(0),
            "collector.snapshot_timeout_secs must be > 0 when set"
        );
        if self.publisher.kind == PublisherKind::Http {
            anyhow::ensure!(
                self.publisher
                    .endpoint
                    .as_deref()
                    .is_some_and(|e| e.starts_with("http://") || e.starts_with("https://")),
                "publisher.endpoint must be an http(s) URL when kind = \"http\""
            );
        }
        anyhow::ensure!(
            self.publisher.request_timeout_secs > 0,
            "publisher.request_timeout_secs must be > 0, got {}",
            self.publisher.request_timeout_secs
        );
        anyhow::ensure!(
            !self.docker.swarm_service_label.is_empty(),
            "docker.swarm_service_label must be non-empty"
        );
        Ok(())
    }
}

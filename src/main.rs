use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use swarm_monitor::collector::{Collectors, ContainerCollector, MemoryCollector, SwarmCollector};
use swarm_monitor::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::info!(
        version = version::VERSION,
        metrics = ?app_config.collector.metrics,
        interval_secs = app_config.collector.interval_secs,
        "starting {}",
        version::NAME
    );

    let instance_id = app_config
        .collector
        .instance_id
        .clone()
        .or_else(sysinfo_repo::SysinfoRepo::host_name)
        .ok_or_else(|| anyhow::anyhow!("collector.instance_id unset and host name unavailable"))?;

    let docker_repo = Arc::new(docker_repo::DockerRepo::connect()?);
    let sysinfo_repo = Arc::new(sysinfo_repo::SysinfoRepo::new());
    let publisher = publisher::from_config(&app_config.publisher)?;
    let snapshot_timeout = app_config
        .collector
        .snapshot_timeout_secs
        .map(Duration::from_secs);

    let collectors = Collectors {
        instance_id,
        memory: MemoryCollector::new(sysinfo_repo),
        docker: ContainerCollector::new(
            docker_repo.clone(),
            docker_repo.clone(),
            snapshot_timeout,
        ),
        swarm: SwarmCollector::new(
            docker_repo.clone(),
            docker_repo,
            app_config.docker.swarm_service_label.clone(),
            snapshot_timeout,
        ),
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let mut worker_handle = worker::spawn(
        worker::WorkerDeps {
            collectors,
            publisher,
            shutdown_rx,
        },
        worker::WorkerConfig {
            interval_secs: app_config.collector.interval_secs,
            namespace: app_config.collector.namespace.clone(),
            metrics: app_config.collector.metrics.clone(),
            exit_on_error: app_config.collector.exit_on_error,
        },
    );

    let outcome = tokio::select! {
        joined = &mut worker_handle => joined,
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
            worker_handle.await
        }
    };

    outcome.map_err(|e| anyhow::anyhow!("worker task: {}", e))??;
    Ok(())
}

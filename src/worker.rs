// Collection loop: one cycle per interval, never overlapping.
// A cycle builds every enabled metric first and publishes only if all of
// them succeeded.

use crate::collector::{Collectors, CycleState, MetricKind};
use crate::error::CollectError;
use crate::models::now_millis;
use crate::publisher::{Publisher, dispatch};
use std::sync::Arc;
use tracing::Instrument;
use tokio::time::{Duration, interval};

/// Collectors, publisher and shutdown for the worker.
pub struct WorkerDeps {
    pub collectors: Collectors,
    pub publisher: Arc<dyn Publisher>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

/// Worker timing and error policy.
pub struct WorkerConfig {
    pub interval_secs: u64,
    pub namespace: String,
    pub metrics: Vec<MetricKind>,
    /// Return the first cycle error instead of retrying on the next tick.
    pub exit_on_error: bool,
}

/// Outcome of one successful cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub datapoints: usize,
    pub publish_calls: usize,
}

/// Runs every enabled collector against `state`, then publishes.
///
/// Returns the container state for the next cycle when the docker collector
/// ran. On error nothing has been published by this call and `state` is
/// still the one to use next time.
pub async fn run_cycle(
    collectors: &Collectors,
    publisher: &dyn Publisher,
    namespace: &str,
    metrics: &[MetricKind],
    state: &CycleState,
) -> Result<(CycleReport, Option<CycleState>), CollectError> {
    let timestamp = now_millis();
    let mut datapoints = Vec::new();
    let mut next_state = None;

    for &kind in metrics {
        let (points, next) = collectors.collect(kind, state, timestamp).await?;
        tracing::debug!(metric = %kind, datapoints = points.len(), "collected");
        datapoints.extend(points);
        if next.is_some() {
            next_state = next;
        }
    }

    let publish_calls = dispatch(publisher, &datapoints, namespace).await?;
    Ok((
        CycleReport {
            datapoints: datapoints.len(),
            publish_calls,
        },
        next_state,
    ))
}

pub fn spawn(
    deps: WorkerDeps,
    config: WorkerConfig,
) -> tokio::task::JoinHandle<Result<(), CollectError>> {
    let worker_span = tracing::span!(
        tracing::Level::DEBUG,
        "worker",
        interval_secs = config.interval_secs
    );
    tokio::spawn(run(deps, config).instrument(worker_span))
}

async fn run(deps: WorkerDeps, config: WorkerConfig) -> Result<(), CollectError> {
    let WorkerDeps {
        collectors,
        publisher,
        mut shutdown_rx,
    } = deps;
    let WorkerConfig {
        interval_secs,
        namespace,
        metrics,
        exit_on_error,
    } = config;

    let mut tick = interval(Duration::from_secs(interval_secs));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut state = CycleState::default();
    let mut cycles_total: u64 = 0;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                match run_cycle(&collectors, publisher.as_ref(), &namespace, &metrics, &state).await {
                    Ok((report, next_state)) => {
                        if let Some(next) = next_state {
                            state = next;
                        }
                        cycles_total += 1;
                        tracing::info!(
                            datapoints = report.datapoints,
                            publish_calls = report.publish_calls,
                            cycles_total,
                            "cycle published"
                        );
                    }
                    Err(e) if exit_on_error => {
                        tracing::error!(error = %e, operation = "collect_cycle", "cycle failed; stopping");
                        return Err(e);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, operation = "collect_cycle", "cycle failed; nothing published");
                    }
                }
            }
            _ = &mut shutdown_rx => {
                tracing::debug!("Worker shutting down");
                break;
            }
        }
    }
    Ok(())
}

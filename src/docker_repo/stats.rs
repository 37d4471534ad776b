// Map raw Docker stats API responses onto our usage models.

use crate::error::CollectError;
use crate::models::{CpuTimes, MemoryUsage, Snapshot};
use bollard::models::{ContainerCpuStats, ContainerCpuUsage, ContainerStatsResponse};

const NANOS_PER_SEC: f64 = 1e9;

fn cpu_stats<'a>(
    s: &'a ContainerStatsResponse,
    id: &str,
) -> Result<(&'a ContainerCpuStats, &'a ContainerCpuUsage), CollectError> {
    let cpu_stats = s
        .cpu_stats
        .as_ref()
        .ok_or_else(|| CollectError::malformed(id, "missing cpu_stats"))?;
    let cpu_usage = cpu_stats
        .cpu_usage
        .as_ref()
        .ok_or_else(|| CollectError::malformed(id, "missing cpu_stats.cpu_usage"))?;
    Ok((cpu_stats, cpu_usage))
}

/// Current and previous counters plus memory. Fields other than the current
/// CPU block default to zero when the daemon leaves them out.
pub(crate) fn to_snapshot(s: &ContainerStatsResponse, id: &str) -> Result<Snapshot, CollectError> {
    let (cpu_stats, cpu_usage) = cpu_stats(s, id)?;
    let precpu_stats = s.precpu_stats.as_ref();

    let pre_total_usage = precpu_stats
        .and_then(|p| p.cpu_usage.as_ref())
        .and_then(|u| u.total_usage)
        .unwrap_or(0);
    let pre_system_usage = precpu_stats.and_then(|p| p.system_cpu_usage).unwrap_or(0);

    let memory = to_memory(s);

    Ok(Snapshot {
        name: s
            .name
            .as_deref()
            .unwrap_or(id)
            .trim_start_matches('/')
            .to_string(),
        total_usage: cpu_usage.total_usage.unwrap_or(0),
        system_usage: cpu_stats.system_cpu_usage.unwrap_or(0),
        pre_total_usage,
        pre_system_usage,
        online_cpus: cpu_stats.online_cpus.unwrap_or(0),
        memory_usage: memory.usage,
        memory_max_usage: memory.max_usage,
    })
}

/// Cumulative user, kernel and total CPU time, converted to seconds.
pub(crate) fn to_cpu_times(s: &ContainerStatsResponse, id: &str) -> Result<CpuTimes, CollectError> {
    let (_, cpu_usage) = cpu_stats(s, id)?;
    let secs = |ns: Option<u64>| ns.unwrap_or(0) as f64 / NANOS_PER_SEC;
    Ok(CpuTimes {
        user: secs(cpu_usage.usage_in_usermode),
        system: secs(cpu_usage.usage_in_kernelmode),
        total: secs(cpu_usage.total_usage),
    })
}

pub(crate) fn to_memory(s: &ContainerStatsResponse) -> MemoryUsage {
    let memory_stats = s.memory_stats.as_ref();
    MemoryUsage {
        usage: memory_stats.and_then(|m| m.usage).unwrap_or(0),
        max_usage: memory_stats.and_then(|m| m.max_usage).unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::models::{ContainerCpuStats, ContainerCpuUsage, ContainerMemoryStats};

    fn minimal_cpu_stats(total_usage: u64, system_cpu_usage: u64) -> ContainerCpuStats {
        ContainerCpuStats {
            cpu_usage: Some(ContainerCpuUsage {
                total_usage: Some(total_usage),
                usage_in_usermode: Some(total_usage / 4 * 3),
                usage_in_kernelmode: Some(total_usage / 4),
                ..Default::default()
            }),
            system_cpu_usage: Some(system_cpu_usage),
            online_cpus: Some(2),
            throttling_data: None,
        }
    }

    #[test]
    fn to_snapshot_fails_when_cpu_stats_missing() {
        let s = ContainerStatsResponse {
            cpu_stats: None,
            precpu_stats: Some(minimal_cpu_stats(0, 0)),
            ..Default::default()
        };
        let err = to_snapshot(&s, "abc").unwrap_err();
        assert!(matches!(err, CollectError::MalformedSnapshot { ref id, .. } if id == "abc"));
    }

    #[test]
    fn to_snapshot_defaults_missing_precpu_to_zero() {
        let s = ContainerStatsResponse {
            cpu_stats: Some(minimal_cpu_stats(100, 1000)),
            precpu_stats: None,
            ..Default::default()
        };
        let out = to_snapshot(&s, "abc").unwrap();
        assert_eq!(out.pre_total_usage, 0);
        assert_eq!(out.pre_system_usage, 0);
        assert_eq!(out.memory_usage, 0);
    }

    #[test]
    fn to_snapshot_copies_counters_and_memory() {
        let s = ContainerStatsResponse {
            name: Some("/web.1.x7d2k".to_string()),
            cpu_stats: Some(minimal_cpu_stats(100_000_000, 1_000_000_000)),
            precpu_stats: Some(minimal_cpu_stats(50_000_000, 500_000_000)),
            memory_stats: Some(ContainerMemoryStats {
                usage: Some(256 * 1024 * 1024),
                max_usage: Some(300 * 1024 * 1024),
                ..Default::default()
            }),
            ..Default::default()
        };
        let out = to_snapshot(&s, "abc123").unwrap();
        assert_eq!(out.name, "web.1.x7d2k");
        assert_eq!(out.total_usage, 100_000_000);
        assert_eq!(out.system_usage, 1_000_000_000);
        assert_eq!(out.pre_total_usage, 50_000_000);
        assert_eq!(out.pre_system_usage, 500_000_000);
        assert_eq!(out.online_cpus, 2);
        assert_eq!(out.memory_usage, 256 * 1024 * 1024);
        assert_eq!(out.memory_max_usage, 300 * 1024 * 1024);
    }

    #[test]
    fn to_cpu_times_converts_nanoseconds_to_seconds() {
        let s = ContainerStatsResponse {
            cpu_stats: Some(minimal_cpu_stats(4_000_000_000, 10_000_000_000)),
            ..Default::default()
        };
        let out = to_cpu_times(&s, "abc").unwrap();
        assert!((out.total - 4.0).abs() < 1e-9);
        assert!((out.user - 3.0).abs() < 1e-9);
        assert!((out.system - 1.0).abs() < 1e-9);
    }
}

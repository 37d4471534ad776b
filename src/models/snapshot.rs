// Per-container usage snapshots and their per-service roll-up

/// One point-in-time usage reading for a container.
///
/// The `pre_*` counters come from the stats source's own previous reading,
/// taken inside the same stats call; they are unrelated to [`CycleState`].
///
/// [`CycleState`]: crate::collector::CycleState
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Canonical service name once the per-container collector has run.
    pub name: String,
    pub total_usage: u64,
    pub system_usage: u64,
    pub pre_total_usage: u64,
    pub pre_system_usage: u64,
    pub online_cpus: u32,
    pub memory_usage: u64,
    pub memory_max_usage: u64,
}

/// Sum of the snapshots of every container backing one swarm service.
///
/// Sums are held in `u128`: host-wide system counters of a handful of
/// replicas can exceed `u64::MAX` together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceStats {
    pub total_usage: u128,
    pub system_usage: u128,
    pub pre_total_usage: u128,
    pub pre_system_usage: u128,
    /// Largest count reported by any replica; not summed.
    pub online_cpus: u32,
    pub memory_usage: u128,
    pub memory_max_usage: u128,
}

impl From<&Snapshot> for ServiceStats {
    fn from(s: &Snapshot) -> Self {
        Self {
            total_usage: s.total_usage.into(),
            system_usage: s.system_usage.into(),
            pre_total_usage: s.pre_total_usage.into(),
            pre_system_usage: s.pre_system_usage.into(),
            online_cpus: s.online_cpus,
            memory_usage: s.memory_usage.into(),
            memory_max_usage: s.memory_max_usage.into(),
        }
    }
}

impl ServiceStats {
    /// Adds the counters and memory figures of another replica.
    ///
    /// Commutative, so the roll-up is the same whatever order replicas
    /// report in.
    pub fn absorb(&mut self, s: &Snapshot) {
        self.total_usage += u128::from(s.total_usage);
        self.system_usage += u128::from(s.system_usage);
        self.pre_total_usage += u128::from(s.pre_total_usage);
        self.pre_system_usage += u128::from(s.pre_system_usage);
        self.memory_usage += u128::from(s.memory_usage);
        self.memory_max_usage += u128::from(s.memory_max_usage);
        self.online_cpus = self.online_cpus.max(s.online_cpus);
    }

    /// CPU utilization implied by the paired current/previous counters.
    ///
    /// Not guarded: when `system_usage == pre_system_usage` the result is
    /// `+inf` (or NaN if the container delta is zero too) and is published
    /// as such. Whether this should be special-cased is still undecided.
    pub fn percent_cpu(&self) -> f64 {
        // subtract before going to f64; the sums are past f64's exact range
        let cpu_delta = (self.total_usage as i128 - self.pre_total_usage as i128) as f64;
        let system_delta = (self.system_usage as i128 - self.pre_system_usage as i128) as f64;
        cpu_delta / system_delta * self.online_cpus as f64 * 100.0
    }
}

/// Cumulative CPU time of a container, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuTimes {
    pub user: f64,
    pub system: f64,
    pub total: f64,
}

/// Container memory figures, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    pub usage: u64,
    pub max_usage: u64,
}

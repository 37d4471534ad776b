// Host stats via sysinfo

use crate::error::CollectError;
use crate::models::RamStats;
use crate::source::HostMemorySource;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use sysinfo::System;
use tracing::instrument;

pub struct SysinfoRepo {
    sys: Arc<Mutex<System>>,
}

impl Default for SysinfoRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoRepo {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        Self {
            sys: Arc::new(Mutex::new(sys)),
        }
    }

    /// Host name used as the instance identifier when none is configured.
    pub fn host_name() -> Option<String> {
        System::host_name().filter(|h| !h.is_empty())
    }
}

#[async_trait]
impl HostMemorySource for SysinfoRepo {
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "ram_stats"))]
    async fn ram_stats(&self) -> Result<RamStats, CollectError> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| CollectError::HostStats(format!("sysinfo lock poisoned: {e}")))?;
            sys.refresh_memory();

            let total = sys.total_memory();
            let available = sys.available_memory();
            let used = total.saturating_sub(available);
            let usage_percent = if total > 0 {
                (used as f64 / total as f64) * 100.0
            } else {
                0.0
            };

            Ok(RamStats {
                total,
                used,
                available,
                usage_percent,
            })
        })
        .await?
    }
}

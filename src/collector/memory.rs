// Host memory utilization

use crate::error::CollectError;
use crate::models::{Datapoint, Dimension, RamStats, Unit};
use crate::source::HostMemorySource;
use std::sync::Arc;
use tracing::info;

pub fn memory_datapoints(ram: &RamStats, instance_id: &str, timestamp: u64) -> Vec<Datapoint> {
    let dimensions = [Dimension::new("InstanceId", instance_id)];
    vec![
        Datapoint::new(
            "MemoryUtilization",
            ram.usage_percent,
            Unit::Percent,
            timestamp,
            &dimensions,
        ),
        Datapoint::new("MemoryUsed", ram.used as f64, Unit::Bytes, timestamp, &dimensions),
        Datapoint::new(
            "MemoryAvailable",
            ram.available as f64,
            Unit::Bytes,
            timestamp,
            &dimensions,
        ),
    ]
}

pub struct MemoryCollector {
    host: Arc<dyn HostMemorySource>,
}

impl MemoryCollector {
    pub fn new(host: Arc<dyn HostMemorySource>) -> Self {
        Self { host }
    }

    pub async fn collect(
        &self,
        instance_id: &str,
        timestamp: u64,
    ) -> Result<Vec<Datapoint>, CollectError> {
        let ram = self.host.ram_stats().await?;
        info!(
            utilization = ram.usage_percent,
            used = ram.used,
            available = ram.available,
            "host memory"
        );
        Ok(memory_datapoints(&ram, instance_id, timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_datapoints_maps_fields() {
        let ram = RamStats {
            total: 4096,
            used: 1024,
            available: 3072,
            usage_percent: 25.0,
        };
        let points = memory_datapoints(&ram, "i-1", 7);
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].metric_name, "MemoryUtilization");
        assert_eq!(points[0].value, 25.0);
        assert_eq!(points[0].unit, Unit::Percent);
        assert_eq!(points[1].metric_name, "MemoryUsed");
        assert_eq!(points[1].value, 1024.0);
        assert_eq!(points[2].metric_name, "MemoryAvailable");
        assert_eq!(points[2].value, 3072.0);
        assert!(points.iter().all(|p| p.dimensions == [Dimension::new("InstanceId", "i-1")]));
    }
}

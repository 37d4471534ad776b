// Domain models

mod container;
mod datapoint;
mod snapshot;
mod system;

pub use container::ContainerDescriptor;
pub use datapoint::{Datapoint, Dimension, Unit, now_millis};
pub use snapshot::{CpuTimes, MemoryUsage, ServiceStats, Snapshot};
pub use system::RamStats;

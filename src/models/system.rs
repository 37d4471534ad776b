// Host memory model

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RamStats {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub usage_percent: f64,
}

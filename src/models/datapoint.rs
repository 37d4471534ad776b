// Datapoints handed to the publisher

use serde::{Serialize, Serializer};

/// Unit of a datapoint; serializes to the ingestion API's unit names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    Bytes,
    Seconds,
    Percent,
    Count,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Datapoint {
    pub metric_name: String,
    #[serde(serialize_with = "serialize_value")]
    pub value: f64,
    pub unit: Unit,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub dimensions: Vec<Dimension>,
}

impl Datapoint {
    pub fn new(
        metric_name: impl Into<String>,
        value: f64,
        unit: Unit,
        timestamp: u64,
        dimensions: &[Dimension],
    ) -> Self {
        Self {
            metric_name: metric_name.into(),
            value,
            unit,
            timestamp,
            dimensions: dimensions.to_vec(),
        }
    }

    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }
}

/// JSON has no NaN/Infinity; send them as strings instead of `null`.
fn serialize_value<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_nan() {
        serializer.serialize_str("NaN")
    } else if value.is_infinite() {
        serializer.serialize_str(if *value > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, operation = "get_timestamp", "system time error");
        0
    })
}

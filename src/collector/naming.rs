// Canonical swarm service names

use regex::Regex;
use std::sync::LazyLock;

/// Task-slot suffix (`-3`) or task-instance suffix (`_abcd_1_2_3`) that
/// swarm appends to a service name.
static REPLICA_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:-[0-9]+|_[[:alnum:]]{4}_[0-9]+_[0-9]+_[0-9]+)$")
        .expect("replica suffix pattern is valid")
});

/// Strips the replica suffix so every replica of a service maps to one name.
/// Names without a suffix come back unchanged.
pub fn normalize_service_name(label: &str) -> String {
    REPLICA_SUFFIX.replace(label, "").into_owned()
}

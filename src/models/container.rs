// Docker container descriptors

use std::collections::HashMap;

/// A running container as reported by the lister.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerDescriptor {
    pub id: String,
    /// First container name, without the leading `/`.
    pub name: String,
    pub image: String,
    pub labels: HashMap<String, String>,
}

impl ContainerDescriptor {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

use serde::{Deserialize, Serialize};

/// Per-container settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Audit history for in-place edits after every commit.
    pub enable_mutation_detection: bool,
    /// Name of the audited object in mutation reports.
    pub object_name: String,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            enable_mutation_detection: cfg!(debug_assertions),
            object_name: "history".to_owned(),
        }
    }
}

impl ContainerConfig {
    /// Default settings with auditing forced on or off.
    pub fn with_mutation_detection(enabled: bool) -> Self {
        Self {
            enable_mutation_detection: enabled,
            ..Self::default()
        }
    }
}

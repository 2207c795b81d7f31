use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use action_executor::ActionPolicy;
use nav_tracker::TrackerConfig;

/// Engine-level configuration assembled from the per-crate knobs. A config
/// file may omit whole sections to keep their defaults; a named section must
/// be complete.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tracker: TrackerConfig,
    pub policy: ActionPolicy,
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

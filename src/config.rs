use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrellisError};

/// Workspace configuration, read once per command from `.trellis/config.json`.
/// Every field is defaulted so a bare `{}` file works.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    /// The status vocabulary index entries are validated against.
    #[serde(default = "default_statuses")]
    pub statuses: Vec<String>,
    /// Statuses that count as satisfied when resolving dependencies.
    #[serde(default = "default_done_statuses")]
    pub done_statuses: Vec<String>,
    #[serde(default = "default_status")]
    pub default_status: String,
}

fn default_version() -> u32 {
    1
}

fn default_statuses() -> Vec<String> {
    vec![
        "pending".to_string(),
        "in_progress".to_string(),
        "done".to_string(),
        "cancelled".to_string(),
    ]
}

fn default_done_statuses() -> Vec<String> {
    vec!["done".to_string(), "cancelled".to_string()]
}

fn default_status() -> String {
    "pending".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            statuses: default_statuses(),
            done_statuses: default_done_statuses(),
            default_status: default_status(),
        }
    }
}

impl Config {
    /// Load from `<trellis_root>/config.json`.
    pub fn load(trellis_root: &Path) -> Result<Self> {
        let path = trellis_root.join("config.json");
        let data = fs::read_to_string(&path)?;
        serde_json::from_str(&data).map_err(|e| {
            TrellisError::MalformedContent("config".to_string(), e.to_string())
        })
    }

    pub fn is_known_status(&self, status: &str) -> bool {
        self.statuses.iter().any(|s| s == status)
    }

    pub fn statuses_csv(&self) -> String {
        self.statuses.join(", ")
    }

    pub fn done_set(&self) -> BTreeSet<String> {
        self.done_statuses.iter().cloned().collect()
    }
}

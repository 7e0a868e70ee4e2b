use crate::error::PortalError;
use chrono::NaiveDate;
use portal_protocol::{GraphMode, MinShared};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_ENV_VAR: &str = "AMR_PORTAL_CONFIG";

fn default_reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 12).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Record set to load instead of the bundled reference genomes.
    pub dataset_path: Option<String>,
    /// Day counted as "today" in the summary stats.
    pub reference_date: NaiveDate,
    pub default_graph_mode: GraphMode,
    pub default_min_shared: MinShared,
    pub api_base: String,
    pub browser_base: String,
    pub browser_locus: String,
    /// Used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            dataset_path: None,
            reference_date: default_reference_date(),
            default_graph_mode: GraphMode::Classes,
            default_min_shared: MinShared::default(),
            api_base: "/api".to_string(),
            browser_base: "/jbrowse/".to_string(),
            browser_locus: "chr1:1-50000".to_string(),
            log_filter: "warn".to_string(),
        }
    }
}

impl PortalConfig {
    pub fn load_from_path(path: &str) -> Result<Self, PortalError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Could not read config file '{path}': {e}"))?;
        let config = serde_json::from_str(&text)
            .map_err(|e| format!("Could not parse config file '{path}': {e}"))?;
        Ok(config)
    }

    pub fn save_to_path(&self, path: &str) -> Result<(), PortalError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// An explicit path wins, then `AMR_PORTAL_CONFIG`, then the defaults.
    pub fn resolve(explicit: Option<&str>) -> Result<Self, PortalError> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => {
                if !Path::new(&path).exists() {
                    return Err(format!("{CONFIG_ENV_VAR} points to missing file '{path}'").into());
                }
                Self::load_from_path(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}

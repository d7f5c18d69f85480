//! Persistent settings for the dashboard app.

use crate::api::{GraphQuery, DEFAULT_API_BASE};
use crate::chart::Period;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All persistable UI settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    // Server
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub project_id: String,

    // Charts
    #[serde(default)]
    pub period: Period,

    // Communities
    #[serde(default)]
    pub graph_query: GraphQuery,
    #[serde(default = "default_node_scale")]
    pub node_scale: f32,
    #[serde(default = "default_show_edges")]
    pub show_edges: bool,

    /// Where PNG exports go; the download directory when unset
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_node_scale() -> f32 {
    3.0
}

fn default_show_edges() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            project_id: String::new(),
            period: Period::Day,
            graph_query: GraphQuery::default(),
            node_scale: default_node_scale(),
            show_edges: default_show_edges(),
            export_dir: None,
        }
    }
}

impl Settings {
    /// Get the path to the settings file
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("cocktail-dashboard");
            p.push("settings.json");
            p
        })
    }

    /// Load settings from disk, returning defaults if file doesn't exist or is invalid
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            tracing::warn!("Could not determine config directory, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse settings file: {}, using defaults", e);
                Self::default()
            }),
            // File doesn't exist yet, that's fine
            Err(_) => Self::default(),
        }
    }

    fn from_json(contents: &str) -> serde_json::Result<Self> {
        let mut settings: Self = serde_json::from_str(contents)?;
        if settings.node_scale.is_nan() || settings.node_scale <= 0.0 {
            settings.node_scale = default_node_scale();
        }
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            tracing::warn!("Could not determine config directory, settings not saved");
            return;
        };

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::error!("Failed to create config directory: {}", e);
                return;
            }
        }

        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    tracing::error!("Failed to write settings file: {}", e);
                } else {
                    tracing::debug!("Saved settings to {:?}", path);
                }
            }
            Err(e) => tracing::error!("Failed to serialize settings: {}", e),
        }
    }
}

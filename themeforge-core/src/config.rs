//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::assets::ConditionalMode;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default)]
    pub conditional_mode: ConditionalMode,
    #[serde(default = "default_asset_base_url")]
    pub asset_base_url: String,
    #[serde(default = "default_sections_dir")]
    pub sections_dir: PathBuf,
}

fn default_asset_base_url() -> String { "/assets".to_string() }
fn default_sections_dir() -> PathBuf { PathBuf::from("sections") }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            conditional_mode: ConditionalMode::default(),
            asset_base_url: default_asset_base_url(),
            sections_dir: default_sections_dir(),
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file; missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

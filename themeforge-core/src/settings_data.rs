//! Theme-wide settings: `settings_schema.json` and `settings_data.json`.
//!
//! Together they produce the `settings` namespace that asset directives read.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::warn;

use crate::defaults::{compute_defaults, merge_settings};
use crate::error::{Result, ThemeError};
use crate::schema::SettingDefinition;

/// One group of the theme settings editor.
///
/// Settings this engine cannot read (kinds only the theme editor knows, such
/// as `color_scheme_group`) are dropped with a warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsGroup {
    pub name: String,
    #[serde(default, deserialize_with = "readable_settings")]
    pub settings: Vec<SettingDefinition>,
}

fn readable_settings<'de, D>(deserializer: D) -> std::result::Result<Vec<SettingDefinition>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Vec::<Value>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<SettingDefinition>(entry) {
            Ok(setting) => Some(setting),
            Err(err) => {
                warn!(error = %err, "skipping unreadable theme setting");
                None
            }
        })
        .collect())
}

/// Parsed `settings_schema.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeSettingsSchema {
    pub groups: Vec<SettingsGroup>,
}

impl ThemeSettingsSchema {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Defaults of every group, later groups winning on duplicate ids.
    pub fn defaults(&self) -> Map<String, Value> {
        self.groups
            .iter()
            .fold(Map::new(), |acc, group| merge_settings(acc, &compute_defaults(&group.settings)))
    }
}

/// `current` is either the active values or the name of a preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CurrentSettings {
    Preset(String),
    Values(Map<String, Value>),
}

/// Parsed `settings_data.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsData {
    pub current: CurrentSettings,
    #[serde(default)]
    pub presets: HashMap<String, Map<String, Value>>,
}

impl SettingsData {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The active settings map.
    pub fn resolve(&self) -> Result<Map<String, Value>> {
        match &self.current {
            CurrentSettings::Values(values) => Ok(values.clone()),
            CurrentSettings::Preset(name) => self
                .presets
                .get(name)
                .cloned()
                .ok_or_else(|| ThemeError::UnknownPreset(name.clone())),
        }
    }

    /// Active settings over the theme schema's defaults.
    pub fn resolve_with_defaults(&self, schema: &ThemeSettingsSchema) -> Result<Map<String, Value>> {
        Ok(merge_settings(schema.defaults(), &self.resolve()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCHEMA: &str = r##"[
        {"name": "theme_info", "settings": []},
        {"name": "Colors", "settings": [
            {"type": "header", "content": "Palette"},
            {"type": "color", "id": "accent", "default": "#ff6600"},
            {"type": "checkbox", "id": "rounded"}
        ]}
    ]"##;

    #[test]
    fn test_current_values() {
        let data = SettingsData::from_json(r##"{"current": {"accent": "#123456"}}"##).unwrap();
        assert_eq!(data.resolve().unwrap()["accent"], json!("#123456"));
    }

    #[test]
    fn test_current_names_preset() {
        let data = SettingsData::from_json(
            r#"{"current": "Bold", "presets": {"Bold": {"rounded": true}}}"#,
        )
        .unwrap();
        assert_eq!(data.resolve().unwrap()["rounded"], json!(true));
    }

    #[test]
    fn test_unknown_preset() {
        let data = SettingsData::from_json(r#"{"current": "Gone"}"#).unwrap();
        assert!(matches!(data.resolve(), Err(ThemeError::UnknownPreset(name)) if name == "Gone"));
    }

    #[test]
    fn test_defaults_fill_gaps() {
        let schema = ThemeSettingsSchema::from_json(SCHEMA).unwrap();
        let data = SettingsData::from_json(r#"{"current": {"rounded": true}}"#).unwrap();
        let settings = data.resolve_with_defaults(&schema).unwrap();
        assert_eq!(Value::Object(settings), json!({"accent": "#ff6600", "rounded": true}));
    }

    #[test]
    fn test_editor_only_kinds_skipped() {
        let schema = ThemeSettingsSchema::from_json(
            r##"[{"name": "Colors", "settings": [
                {"type": "color_scheme_group", "id": "color_schemes", "definition": []},
                {"type": "color", "id": "accent", "default": "#ff6600"}
            ]}]"##,
        )
        .unwrap();
        assert_eq!(schema.groups[0].settings.len(), 1);
        assert_eq!(Value::Object(schema.defaults()), json!({"accent": "#ff6600"}));
    }
}

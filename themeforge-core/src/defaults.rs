//! Type-directed default values.

use serde_json::{Map, Value};

use crate::schema::{BlockDefinition, SettingDefinition, SettingKind};

/// Font used when a `font_picker` declares no default.
pub const DEFAULT_FONT: &str = "helvetica_n4";

/// Fallback colour for colour settings without a default.
pub const DEFAULT_COLOR: &str = "#000000";

/// Default value for every setting that carries an id.
pub fn compute_defaults(settings: &[SettingDefinition]) -> Map<String, Value> {
    settings
        .iter()
        .filter_map(|def| {
            let id = def.id.as_ref()?;
            let value = match &def.default {
                Some(explicit) => explicit.clone(),
                None => kind_default(&def.kind)?,
            };
            Some((id.clone(), value))
        })
        .collect()
}

pub fn compute_block_defaults(block: &BlockDefinition) -> Map<String, Value> {
    compute_defaults(&block.settings)
}

/// `None` only for display-only kinds, which hold no value.
fn kind_default(kind: &SettingKind) -> Option<Value> {
    let value = match kind {
        SettingKind::Checkbox => Value::Bool(false),
        SettingKind::Number | SettingKind::Range { .. } => Value::from(0),
        SettingKind::Text(_) => Value::String(String::new()),
        SettingKind::Select { options, .. } => {
            Value::String(options.first().map(|o| o.value.clone()).unwrap_or_default())
        }
        SettingKind::Color { .. } => Value::String(DEFAULT_COLOR.to_string()),
        SettingKind::Resource(_) => Value::Null,
        SettingKind::ResourceList { .. } => Value::Array(vec![]),
        SettingKind::Font => Value::String(DEFAULT_FONT.to_string()),
        SettingKind::Header { .. } | SettingKind::Paragraph { .. } => return None,
    };
    Some(value)
}

/// Overlay `overrides` on `defaults`; override keys always win.
pub fn merge_settings(defaults: Map<String, Value>, overrides: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = defaults;
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ListKind, ResourceKind, TextFormat};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn all_kinds() -> Vec<SettingDefinition> {
        vec![
            SettingDefinition::new("show", SettingKind::Checkbox),
            SettingDefinition::new("count", SettingKind::Number),
            SettingDefinition::new(
                "padding",
                SettingKind::Range { min: 0.0, max: 40.0, step: None, unit: None },
            ),
            SettingDefinition::new("title", SettingKind::Text(TextFormat::Text)),
            SettingDefinition::new("accent", SettingKind::Color { background: false }),
            SettingDefinition::new("image", SettingKind::Resource(ResourceKind::Image)),
            SettingDefinition::new(
                "picks",
                SettingKind::ResourceList { resource: ListKind::ProductList, limit: None },
            ),
            SettingDefinition::new("heading_font", SettingKind::Font),
            SettingDefinition {
                id: None,
                label: None,
                default: None,
                info: None,
                kind: SettingKind::Header { content: "Layout".into() },
            },
        ]
    }

    #[test]
    fn test_kind_table() {
        let defaults = compute_defaults(&all_kinds());
        assert_eq!(
            Value::Object(defaults),
            json!({
                "show": false,
                "count": 0,
                "padding": 0,
                "title": "",
                "accent": "#000000",
                "image": null,
                "picks": [],
                "heading_font": "helvetica_n4"
            })
        );
    }

    #[test]
    fn test_explicit_default_wins() {
        let settings = vec![
            SettingDefinition::new("show", SettingKind::Checkbox).with_default(json!(true)),
            SettingDefinition::new("accent", SettingKind::Color { background: false })
                .with_default(json!("#ff0000")),
        ];
        let defaults = compute_defaults(&settings);
        assert_eq!(defaults["show"], json!(true));
        assert_eq!(defaults["accent"], json!("#ff0000"));
    }

    #[test]
    fn test_idempotent() {
        let settings = all_kinds();
        assert_eq!(compute_defaults(&settings), compute_defaults(&settings));
    }

    #[test]
    fn test_display_only_contributes_nothing() {
        let defaults = compute_defaults(&all_kinds()[8..]);
        assert!(defaults.is_empty());
    }

    #[test]
    fn test_merge_override_wins() {
        let defaults = compute_defaults(&all_kinds());
        let overrides = json!({"title": "Hello", "extra": 1});
        let merged = merge_settings(defaults, overrides.as_object().unwrap());
        assert_eq!(merged["title"], json!("Hello"));
        assert_eq!(merged["extra"], json!(1));
        assert_eq!(merged["show"], json!(false));
    }
}

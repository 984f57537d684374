//! Page documents as authored: templates, section groups and their stubs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::schema::SectionSchema;

pub const LAYOUT_NONE: &str = "none";
pub const LAYOUT_THEME: &str = "theme";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrapper: Option<String>,
    #[serde(default)]
    pub sections: HashMap<String, SectionStub>,
    #[serde(default)]
    pub order: Vec<String>,
}

/// `"layout": false` disables the theme layout; a string names an alternate one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayoutRef {
    Enabled(bool),
    Named(String),
}

impl TemplateDocument {
    pub fn normalized_layout(&self) -> String {
        normalize_layout(self.layout.as_ref())
    }
}

pub fn normalize_layout(layout: Option<&LayoutRef>) -> String {
    match layout {
        Some(LayoutRef::Enabled(false)) => LAYOUT_NONE.to_string(),
        Some(LayoutRef::Named(name)) => name.clone(),
        Some(LayoutRef::Enabled(true)) | None => LAYOUT_THEME.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Header,
    Footer,
    Aside,
}

impl GroupKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupKind::Header => "header",
            GroupKind::Footer => "footer",
            GroupKind::Aside => "aside",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionGroupDocument {
    #[serde(alias = "type")]
    pub kind: GroupKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub sections: HashMap<String, SectionStub>,
    #[serde(default)]
    pub order: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionStub {
    #[serde(rename = "type")]
    pub section_type: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub settings: Map<String, Value>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub blocks: HashMap<String, BlockStub>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block_order: Vec<String>,
    #[serde(default)]
    pub disabled: bool,
}

impl SectionStub {
    pub fn new(section_type: impl Into<String>) -> Self {
        Self {
            section_type: section_type.into(),
            ..Default::default()
        }
    }

    pub fn with_setting(mut self, id: impl Into<String>, value: Value) -> Self {
        self.settings.insert(id.into(), value);
        self
    }

    /// Append a block and register it in `block_order`.
    pub fn with_block(mut self, id: impl Into<String>, block: BlockStub) -> Self {
        let id = id.into();
        self.block_order.push(id.clone());
        self.blocks.insert(id, block);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockStub {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub settings: Map<String, Value>,
    #[serde(default)]
    pub disabled: bool,
}

impl BlockStub {
    pub fn new(block_type: impl Into<String>) -> Self {
        Self {
            block_type: block_type.into(),
            ..Default::default()
        }
    }

    pub fn with_setting(mut self, id: impl Into<String>, value: Value) -> Self {
        self.settings.insert(id.into(), value);
        self
    }
}

/// Build a section stub from one of the schema's presets.
///
/// Block ids are `<type>_<n>`, numbered from 1 in preset order.
pub fn instantiate_preset(
    schema: &SectionSchema,
    section_type: &str,
    preset_name: &str,
) -> Option<SectionStub> {
    let preset = schema.presets.iter().find(|p| p.name == preset_name)?;

    let mut stub = SectionStub::new(section_type);
    stub.settings = preset.settings.clone();
    for (n, block) in preset.blocks.iter().enumerate() {
        let id = format!("{}_{}", block.block_type.trim_start_matches('@'), n + 1);
        stub = stub.with_block(
            id,
            BlockStub {
                block_type: block.block_type.clone(),
                settings: block.settings.clone(),
                disabled: false,
            },
        );
    }
    Some(stub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Preset, PresetBlock};
    use serde_json::json;

    #[test]
    fn test_layout_normalization() {
        let doc: TemplateDocument = serde_json::from_value(json!({"layout": false})).unwrap();
        assert_eq!(doc.normalized_layout(), "none");

        let doc: TemplateDocument = serde_json::from_value(json!({})).unwrap();
        assert_eq!(doc.normalized_layout(), "theme");

        let doc: TemplateDocument = serde_json::from_value(json!({"layout": "custom"})).unwrap();
        assert_eq!(doc.normalized_layout(), "custom");

        let doc: TemplateDocument = serde_json::from_value(json!({"layout": true})).unwrap();
        assert_eq!(doc.normalized_layout(), "theme");
    }

    #[test]
    fn test_group_kind_accepts_type_key() {
        let group: SectionGroupDocument = serde_json::from_value(json!({
            "type": "footer",
            "name": "Footer group",
            "sections": {},
            "order": []
        }))
        .unwrap();
        assert_eq!(group.kind, GroupKind::Footer);
    }

    #[test]
    fn test_stub_parses_blocks() {
        let stub: SectionStub = serde_json::from_value(json!({
            "type": "slideshow",
            "settings": {"autoplay": true},
            "blocks": {"s1": {"type": "slide", "settings": {"heading": "Hi"}}},
            "block_order": ["s1"]
        }))
        .unwrap();
        assert_eq!(stub.blocks["s1"].block_type, "slide");
        assert!(!stub.disabled);
    }

    #[test]
    fn test_instantiate_preset() {
        let schema = SectionSchema {
            name: "Slideshow".into(),
            presets: vec![Preset {
                name: "Default".into(),
                settings: json!({"autoplay": true}).as_object().unwrap().clone(),
                blocks: vec![
                    PresetBlock { block_type: "slide".into(), settings: Map::new() },
                    PresetBlock { block_type: "slide".into(), settings: Map::new() },
                ],
            }],
            ..Default::default()
        };

        let stub = instantiate_preset(&schema, "slideshow", "Default").unwrap();
        assert_eq!(stub.section_type, "slideshow");
        assert_eq!(stub.block_order, vec!["slide_1", "slide_2"]);
        assert_eq!(stub.settings["autoplay"], json!(true));
        assert!(instantiate_preset(&schema, "slideshow", "Missing").is_none());
    }
}

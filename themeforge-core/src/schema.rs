//! Section Schema - Declarative Contracts
//!
//! A schema describes which settings a section accepts, which blocks it may
//! hold, and which templates it may appear in. Setting kinds form a closed set:
//! an unknown `type` string is a malformed schema, not a silent fallback.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type SectionType = String;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionSchema {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_blocks: Option<u32>,
    #[serde(default)]
    pub settings: Vec<SettingDefinition>,
    #[serde(default)]
    pub blocks: Vec<BlockDefinition>,
    #[serde(default)]
    pub presets: Vec<Preset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_on: Option<TemplateRestriction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_on: Option<TemplateRestriction>,
}

impl SectionSchema {
    /// First block definition whose type matches.
    pub fn block(&self, block_type: &str) -> Option<&BlockDefinition> {
        self.blocks.iter().find(|b| b.block_type == block_type)
    }

    pub fn setting(&self, id: &str) -> Option<&SettingDefinition> {
        self.settings.iter().find(|s| s.id.as_deref() == Some(id))
    }

    /// Schemas declaring `@app` or `@theme` accept block types they don't list.
    pub fn accepts_dynamic_blocks(&self) -> bool {
        self.blocks
            .iter()
            .any(|b| b.block_type == "@app" || b.block_type == "@theme")
    }

    /// Whether the section may be placed in the named template.
    pub fn is_usable_in_template(&self, template_name: &str) -> bool {
        let enabled = self.enabled_on.as_ref().and_then(|r| r.templates.as_ref());
        let disabled = self.disabled_on.as_ref().and_then(|r| r.templates.as_ref());

        if enabled.is_none() && disabled.is_none() {
            return true;
        }
        if disabled.is_some_and(|list| list.iter().any(|t| t == template_name)) {
            return false;
        }
        match enabled {
            Some(list) => list.iter().any(|t| t == template_name || t == "*"),
            None => true,
        }
    }

    /// Same rule as [`Self::is_usable_in_template`], applied to section group kinds.
    pub fn is_usable_in_group(&self, group: &str) -> bool {
        let enabled = self.enabled_on.as_ref().and_then(|r| r.groups.as_ref());
        let disabled = self.disabled_on.as_ref().and_then(|r| r.groups.as_ref());

        if disabled.is_some_and(|list| list.iter().any(|g| g == group)) {
            return false;
        }
        match enabled {
            Some(list) => list.iter().any(|g| g == group || g == "*"),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRestriction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDefinition {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default)]
    pub settings: Vec<SettingDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub settings: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<PresetBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub settings: Map<String, Value>,
}

/// One declared input field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSetting", into = "RawSetting")]
pub struct SettingDefinition {
    /// Absent for display-only kinds.
    pub id: Option<String>,
    pub label: Option<String>,
    pub default: Option<Value>,
    pub info: Option<String>,
    pub kind: SettingKind,
}

impl SettingDefinition {
    pub fn new(id: impl Into<String>, kind: SettingKind) -> Self {
        Self {
            id: Some(id.into()),
            label: None,
            default: None,
            info: None,
            kind,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_display_only(&self) -> bool {
        matches!(self.kind, SettingKind::Header { .. } | SettingKind::Paragraph { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SettingKind {
    Checkbox,
    Number,
    Range {
        min: f64,
        max: f64,
        step: Option<f64>,
        unit: Option<String>,
    },
    Text(TextFormat),
    Select {
        options: Vec<SelectOption>,
        style: ChoiceStyle,
    },
    Color {
        background: bool,
    },
    Resource(ResourceKind),
    ResourceList {
        resource: ListKind,
        limit: Option<u32>,
    },
    Font,
    Header {
        content: String,
    },
    Paragraph {
        content: String,
    },
}

impl SettingKind {
    /// The authored `type` string.
    pub fn type_name(&self) -> &'static str {
        match self {
            SettingKind::Checkbox => "checkbox",
            SettingKind::Number => "number",
            SettingKind::Range { .. } => "range",
            SettingKind::Text(format) => format.type_name(),
            SettingKind::Select { style: ChoiceStyle::Dropdown, .. } => "select",
            SettingKind::Select { style: ChoiceStyle::Radio, .. } => "radio",
            SettingKind::Color { background: false } => "color",
            SettingKind::Color { background: true } => "color_background",
            SettingKind::Resource(resource) => resource.type_name(),
            SettingKind::ResourceList { resource, .. } => resource.type_name(),
            SettingKind::Font => "font_picker",
            SettingKind::Header { .. } => "header",
            SettingKind::Paragraph { .. } => "paragraph",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFormat {
    Text,
    Textarea,
    Richtext,
    InlineRichtext,
    Html,
    Liquid,
    Url,
    VideoUrl,
    TextAlignment,
}

impl TextFormat {
    const ALL: [TextFormat; 9] = [
        TextFormat::Text,
        TextFormat::Textarea,
        TextFormat::Richtext,
        TextFormat::InlineRichtext,
        TextFormat::Html,
        TextFormat::Liquid,
        TextFormat::Url,
        TextFormat::VideoUrl,
        TextFormat::TextAlignment,
    ];

    pub fn type_name(self) -> &'static str {
        match self {
            TextFormat::Text => "text",
            TextFormat::Textarea => "textarea",
            TextFormat::Richtext => "richtext",
            TextFormat::InlineRichtext => "inline_richtext",
            TextFormat::Html => "html",
            TextFormat::Liquid => "liquid",
            TextFormat::Url => "url",
            TextFormat::VideoUrl => "video_url",
            TextFormat::TextAlignment => "text_alignment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceStyle {
    Dropdown,
    Radio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Image,
    Video,
    Product,
    Collection,
    Page,
    Blog,
    Article,
    LinkList,
    Metaobject,
    ColorScheme,
}

impl ResourceKind {
    const ALL: [ResourceKind; 10] = [
        ResourceKind::Image,
        ResourceKind::Video,
        ResourceKind::Product,
        ResourceKind::Collection,
        ResourceKind::Page,
        ResourceKind::Blog,
        ResourceKind::Article,
        ResourceKind::LinkList,
        ResourceKind::Metaobject,
        ResourceKind::ColorScheme,
    ];

    pub fn type_name(self) -> &'static str {
        match self {
            ResourceKind::Image => "image_picker",
            ResourceKind::Video => "video",
            ResourceKind::Product => "product",
            ResourceKind::Collection => "collection",
            ResourceKind::Page => "page",
            ResourceKind::Blog => "blog",
            ResourceKind::Article => "article",
            ResourceKind::LinkList => "link_list",
            ResourceKind::Metaobject => "metaobject",
            ResourceKind::ColorScheme => "color_scheme",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    ProductList,
    CollectionList,
    MetaobjectList,
}

impl ListKind {
    const ALL: [ListKind; 3] = [
        ListKind::ProductList,
        ListKind::CollectionList,
        ListKind::MetaobjectList,
    ];

    pub fn type_name(self) -> &'static str {
        match self {
            ListKind::ProductList => "product_list",
            ListKind::CollectionList => "collection_list",
            ListKind::MetaobjectList => "metaobject_list",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    #[serde(default)]
    pub label: String,
}

// --- Authored form ---

/// Flat shape of a setting as written in schema JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawSetting {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<Vec<SelectOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
}

impl TryFrom<RawSetting> for SettingDefinition {
    type Error = String;

    fn try_from(raw: RawSetting) -> Result<Self, Self::Error> {
        let kind = match raw.kind.as_str() {
            "checkbox" => SettingKind::Checkbox,
            "number" => SettingKind::Number,
            "range" => {
                let (Some(min), Some(max)) = (raw.min, raw.max) else {
                    return Err(format!(
                        "range setting `{}` requires min and max",
                        raw.id.as_deref().unwrap_or("?")
                    ));
                };
                SettingKind::Range {
                    min,
                    max,
                    step: raw.step,
                    unit: raw.unit.clone(),
                }
            }
            "select" | "radio" => SettingKind::Select {
                options: raw.options.clone().unwrap_or_default(),
                style: if raw.kind == "radio" {
                    ChoiceStyle::Radio
                } else {
                    ChoiceStyle::Dropdown
                },
            },
            "color" => SettingKind::Color { background: false },
            "color_background" => SettingKind::Color { background: true },
            "font_picker" => SettingKind::Font,
            "header" => SettingKind::Header {
                content: raw.content.clone().unwrap_or_default(),
            },
            "paragraph" => SettingKind::Paragraph {
                content: raw.content.clone().unwrap_or_default(),
            },
            other => {
                if let Some(format) = TextFormat::ALL.iter().find(|f| f.type_name() == other) {
                    SettingKind::Text(*format)
                } else if let Some(resource) =
                    ResourceKind::ALL.iter().find(|r| r.type_name() == other)
                {
                    SettingKind::Resource(*resource)
                } else if let Some(list) = ListKind::ALL.iter().find(|l| l.type_name() == other) {
                    SettingKind::ResourceList {
                        resource: *list,
                        limit: raw.limit,
                    }
                } else {
                    return Err(format!("unknown setting type `{other}`"));
                }
            }
        };

        let display_only = matches!(kind, SettingKind::Header { .. } | SettingKind::Paragraph { .. });
        if !display_only && raw.id.is_none() {
            return Err(format!("{} setting requires an id", kind.type_name()));
        }

        Ok(SettingDefinition {
            id: if display_only { None } else { raw.id },
            label: raw.label,
            default: raw.default,
            info: raw.info,
            kind,
        })
    }
}

impl From<SettingDefinition> for RawSetting {
    fn from(def: SettingDefinition) -> Self {
        let mut raw = RawSetting {
            kind: def.kind.type_name().to_string(),
            id: def.id,
            label: def.label,
            default: def.default,
            info: def.info,
            ..Default::default()
        };
        match def.kind {
            SettingKind::Range { min, max, step, unit } => {
                raw.min = Some(min);
                raw.max = Some(max);
                raw.step = step;
                raw.unit = unit;
            }
            SettingKind::Select { options, .. } => raw.options = Some(options),
            SettingKind::ResourceList { limit, .. } => raw.limit = limit,
            SettingKind::Header { content } | SettingKind::Paragraph { content } => {
                raw.content = Some(content)
            }
            SettingKind::Checkbox
            | SettingKind::Number
            | SettingKind::Text(_)
            | SettingKind::Color { .. }
            | SettingKind::Resource(_)
            | SettingKind::Font => {}
        }
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<SettingDefinition, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn test_range_kind_parsed() {
        let def = parse(json!({
            "type": "range", "id": "padding", "min": 0, "max": 100, "step": 4, "unit": "px"
        }))
        .unwrap();
        assert_eq!(def.id.as_deref(), Some("padding"));
        assert_eq!(
            def.kind,
            SettingKind::Range { min: 0.0, max: 100.0, step: Some(4.0), unit: Some("px".into()) }
        );
    }

    #[test]
    fn test_range_without_bounds_rejected() {
        let err = parse(json!({"type": "range", "id": "x", "min": 0})).unwrap_err();
        assert!(err.to_string().contains("requires min and max"));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = parse(json!({"type": "hologram", "id": "x"})).unwrap_err();
        assert!(err.to_string().contains("unknown setting type `hologram`"));
    }

    #[test]
    fn test_display_only_has_no_id() {
        let def = parse(json!({"type": "header", "content": "Layout", "id": "ignored"})).unwrap();
        assert!(def.id.is_none());
        assert!(def.is_display_only());
    }

    #[test]
    fn test_input_setting_requires_id() {
        assert!(parse(json!({"type": "text", "label": "Heading"})).is_err());
    }

    #[test]
    fn test_radio_and_lists() {
        let radio = parse(json!({
            "type": "radio", "id": "align",
            "options": [{"value": "left", "label": "Left"}, {"value": "right", "label": "Right"}]
        }))
        .unwrap();
        assert_eq!(radio.kind.type_name(), "radio");

        let list = parse(json!({"type": "product_list", "id": "picks", "limit": 4})).unwrap();
        assert_eq!(
            list.kind,
            SettingKind::ResourceList { resource: ListKind::ProductList, limit: Some(4) }
        );
    }

    #[test]
    fn test_setting_serializes_to_authored_shape() {
        let authored = json!({"type": "color_background", "id": "bg", "label": "Background"});
        let def = parse(authored.clone()).unwrap();
        assert_eq!(serde_json::to_value(&def).unwrap(), authored);
    }

    #[test]
    fn test_template_usability() {
        let mut schema = SectionSchema::default();
        assert!(schema.is_usable_in_template("product"));

        schema.disabled_on = Some(TemplateRestriction {
            templates: Some(vec!["password".into()]),
            groups: None,
        });
        assert!(!schema.is_usable_in_template("password"));
        assert!(schema.is_usable_in_template("index"));

        schema.enabled_on = Some(TemplateRestriction {
            templates: Some(vec!["index".into(), "collection".into()]),
            groups: None,
        });
        assert!(schema.is_usable_in_template("collection"));
        assert!(!schema.is_usable_in_template("product"));

        schema.enabled_on = Some(TemplateRestriction {
            templates: Some(vec!["*".into()]),
            groups: None,
        });
        assert!(schema.is_usable_in_template("product"));
        assert!(!schema.is_usable_in_template("password"));
    }

    #[test]
    fn test_group_usability() {
        let schema = SectionSchema {
            enabled_on: Some(TemplateRestriction {
                templates: None,
                groups: Some(vec!["header".into()]),
            }),
            ..Default::default()
        };
        assert!(schema.is_usable_in_group("header"));
        assert!(!schema.is_usable_in_group("footer"));
        assert!(schema.is_usable_in_template("index"));
    }
}

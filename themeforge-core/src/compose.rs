//! Template Composition
//!
//! Header group, template and footer group are flattened into one ordered
//! page. Every section and block comes out with a fully populated settings
//! map: schema defaults first, authored overrides on top.
//!
//! Order entries without a matching section, and blocks whose type the schema
//! does not declare, are recovered in place. Neither aborts the page.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::defaults::{compute_block_defaults, compute_defaults, merge_settings};
use crate::document::{GroupKind, SectionGroupDocument, SectionStub, TemplateDocument};
use crate::error::{Result, ThemeError};
use crate::schema::SectionSchema;

/// Resolves a section type to its schema.
pub trait SchemaLookup {
    fn schema(&self, section_type: &str) -> Option<&SectionSchema>;
}

impl SchemaLookup for HashMap<String, SectionSchema> {
    fn schema(&self, section_type: &str) -> Option<&SectionSchema> {
        self.get(section_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Header,
    Template,
    Footer,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockInstance {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: String,
    pub settings: Map<String, Value>,
    pub disabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionInstance<'s> {
    pub id: String,
    #[serde(rename = "type")]
    pub section_type: String,
    #[serde(skip)]
    pub schema: Option<&'s SectionSchema>,
    pub settings: Map<String, Value>,
    pub blocks: Vec<BlockInstance>,
    pub disabled: bool,
    pub index: usize,
    pub region: Region,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedPage<'s> {
    pub layout: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapper: Option<String>,
    pub sections: Vec<SectionInstance<'s>>,
}

impl<'s> ResolvedPage<'s> {
    pub fn section(&self, id: &str) -> Option<&SectionInstance<'s>> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn in_region(&self, region: Region) -> impl Iterator<Item = &SectionInstance<'s>> {
        self.sections.iter().filter(move |s| s.region == region)
    }
}

/// Compose header group, template and footer group into one page.
///
/// Fails only when no template document is supplied.
pub fn compose_page<'s, L>(
    template: Option<&TemplateDocument>,
    header: Option<&SectionGroupDocument>,
    footer: Option<&SectionGroupDocument>,
    schemas: &'s L,
) -> Result<ResolvedPage<'s>>
where
    L: SchemaLookup + ?Sized,
{
    let template = template.ok_or(ThemeError::MissingTemplate)?;
    let mut composer = Composer::new(schemas);

    if let Some(group) = header {
        expect_kind(group, GroupKind::Header);
        composer.region(Region::Header, &group.sections, &group.order);
    }
    composer.region(Region::Template, &template.sections, &template.order);
    if let Some(group) = footer {
        expect_kind(group, GroupKind::Footer);
        composer.region(Region::Footer, &group.sections, &group.order);
    }

    Ok(ResolvedPage {
        layout: template.normalized_layout(),
        wrapper: template.wrapper.clone(),
        sections: composer.sections,
    })
}

fn expect_kind(group: &SectionGroupDocument, expected: GroupKind) {
    if group.kind != expected {
        warn!(
            expected = expected.as_str(),
            actual = group.kind.as_str(),
            "section group composed outside its own region"
        );
    }
}

struct Composer<'s, L: ?Sized> {
    schemas: &'s L,
    // Shared by all regions, never reset.
    next_index: usize,
    sections: Vec<SectionInstance<'s>>,
}

impl<'s, L: SchemaLookup + ?Sized> Composer<'s, L> {
    fn new(schemas: &'s L) -> Self {
        Self {
            schemas,
            next_index: 0,
            sections: vec![],
        }
    }

    fn region(&mut self, region: Region, stubs: &HashMap<String, SectionStub>, order: &[String]) {
        for id in order {
            let Some(stub) = stubs.get(id) else {
                debug!(section = %id, ?region, "order references missing section, skipping");
                continue;
            };
            let instance = self.section(region, id, stub);
            self.sections.push(instance);
        }
    }

    fn section(&mut self, region: Region, id: &str, stub: &SectionStub) -> SectionInstance<'s> {
        let schemas: &'s L = self.schemas;
        let schema = schemas.schema(&stub.section_type);
        if schema.is_none() {
            debug!(section = %id, section_type = %stub.section_type, "no schema for section type");
        }

        let defaults = schema.map(|s| compute_defaults(&s.settings)).unwrap_or_default();
        let settings = merge_settings(defaults, &stub.settings);

        let mut blocks = Vec::with_capacity(stub.block_order.len());
        for block_id in &stub.block_order {
            let Some(block) = stub.blocks.get(block_id) else {
                debug!(section = %id, block = %block_id, "block_order references missing block, skipping");
                continue;
            };
            let definition = schema.and_then(|s| s.block(&block.block_type));
            if definition.is_none() {
                debug!(
                    section = %id,
                    block = %block_id,
                    block_type = %block.block_type,
                    "unknown block type, using empty defaults"
                );
            }
            let defaults = definition.map(compute_block_defaults).unwrap_or_default();
            blocks.push(BlockInstance {
                id: block_id.clone(),
                block_type: block.block_type.clone(),
                settings: merge_settings(defaults, &block.settings),
                disabled: block.disabled,
            });
        }

        let index = self.next_index;
        self.next_index += 1;

        SectionInstance {
            id: id.to_string(),
            section_type: stub.section_type.clone(),
            schema,
            settings,
            blocks,
            disabled: stub.disabled,
            index,
            region,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BlockStub;
    use crate::schema::{BlockDefinition, SettingDefinition, SettingKind, TextFormat};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schemas() -> HashMap<String, SectionSchema> {
        let banner = SectionSchema {
            name: "Banner".into(),
            settings: vec![
                SettingDefinition::new("heading", SettingKind::Text(TextFormat::Text))
                    .with_default(json!("Welcome")),
                SettingDefinition::new("full_width", SettingKind::Checkbox),
            ],
            blocks: vec![BlockDefinition {
                block_type: "button".into(),
                name: "Button".into(),
                limit: Some(2),
                settings: vec![SettingDefinition::new("label", SettingKind::Text(TextFormat::Text))
                    .with_default(json!("Shop now"))],
            }],
            ..Default::default()
        };
        HashMap::from([("banner".to_string(), banner)])
    }

    fn template(order: &[&str], ids: &[&str]) -> TemplateDocument {
        TemplateDocument {
            sections: ids
                .iter()
                .map(|id| (id.to_string(), SectionStub::new("banner")))
                .collect(),
            order: order.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn group(kind: GroupKind, ids: &[&str]) -> SectionGroupDocument {
        SectionGroupDocument {
            kind,
            name: None,
            sections: ids
                .iter()
                .map(|id| (id.to_string(), SectionStub::new("banner")))
                .collect(),
            order: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_missing_template_is_terminal() {
        let schemas = schemas();
        let err = compose_page(None, None, None, &schemas).unwrap_err();
        assert!(matches!(err, ThemeError::MissingTemplate));
    }

    #[test]
    fn test_dangling_order_entry_skipped() {
        let schemas = schemas();
        let doc = template(&["a", "b"], &["a"]);
        let page = compose_page(Some(&doc), None, None, &schemas).unwrap();
        assert_eq!(page.sections.len(), 1);
        assert_eq!(page.sections[0].id, "a");
    }

    #[test]
    fn test_index_contiguous_across_regions() {
        let schemas = schemas();
        let header = group(GroupKind::Header, &["announcement", "nav"]);
        let footer = group(GroupKind::Footer, &["links"]);
        let doc = template(&["hero", "ghost", "grid"], &["hero", "grid"]);

        let page = compose_page(Some(&doc), Some(&header), Some(&footer), &schemas).unwrap();
        let indices: Vec<_> = page.sections.iter().map(|s| s.index).collect();
        let regions: Vec<_> = page.sections.iter().map(|s| s.region).collect();

        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(
            regions,
            vec![Region::Header, Region::Header, Region::Template, Region::Template, Region::Footer]
        );
        assert_eq!(page.in_region(Region::Template).count(), 2);
    }

    #[test]
    fn test_settings_merged_override_wins() {
        let schemas = schemas();
        let mut doc = template(&["hero"], &[]);
        doc.sections.insert(
            "hero".into(),
            SectionStub::new("banner").with_setting("heading", json!("Sale")),
        );

        let page = compose_page(Some(&doc), None, None, &schemas).unwrap();
        let hero = page.section("hero").unwrap();
        assert_eq!(Value::Object(hero.settings.clone()), json!({"heading": "Sale", "full_width": false}));
        assert!(hero.schema.is_some());
    }

    #[test]
    fn test_blocks_resolved_in_block_order() {
        let schemas = schemas();
        let mut doc = template(&["hero"], &[]);
        let mut stub = SectionStub::new("banner")
            .with_block("b2", BlockStub::new("button").with_setting("label", json!("Go")))
            .with_block("b1", BlockStub::new("button"))
            .with_block("x", BlockStub::new("sparkle").with_setting("glow", json!(3)));
        stub.block_order.push("missing".into());
        doc.sections.insert("hero".into(), stub);

        let page = compose_page(Some(&doc), None, None, &schemas).unwrap();
        let blocks = &page.sections[0].blocks;
        let ids: Vec<_> = blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b2", "b1", "x"]);
        assert_eq!(blocks[0].settings["label"], json!("Go"));
        assert_eq!(blocks[1].settings["label"], json!("Shop now"));
        assert_eq!(Value::Object(blocks[2].settings.clone()), json!({"glow": 3}));
    }

    #[test]
    fn test_schema_less_section_keeps_overrides_only() {
        let schemas = schemas();
        let mut doc = template(&["raw"], &[]);
        doc.sections.insert(
            "raw".into(),
            SectionStub::new("custom-liquid").with_setting("code", json!("<p>hi</p>")),
        );
        let page = compose_page(Some(&doc), None, None, &schemas).unwrap();
        assert!(page.sections[0].schema.is_none());
        assert_eq!(Value::Object(page.sections[0].settings.clone()), json!({"code": "<p>hi</p>"}));
    }

    #[test]
    fn test_layout_carried_to_page() {
        let schemas = schemas();
        let doc: TemplateDocument =
            serde_json::from_value(json!({"layout": false, "sections": {}, "order": []})).unwrap();
        let page = compose_page(Some(&doc), None, None, &schemas).unwrap();
        assert_eq!(page.layout, "none");
        assert!(page.sections.is_empty());
    }
}

//! Theme Engine - Single Entry Point
//!
//! `render_page` always validates what it composes. Validation never blocks
//! the render; it travels alongside the page for the caller to surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::assets::{process, AssetContext, AssetUrlResolver, PrefixResolver};
use crate::compose::{compose_page, Region, ResolvedPage, SectionInstance};
use crate::config::EngineConfig;
use crate::document::{SectionGroupDocument, TemplateDocument};
use crate::error::Result;
use crate::hashing;
use crate::registry::SchemaRegistry;
use crate::validation::{PageValidation, Validator};
use crate::ENGINE_VERSION;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// Template name used for `enabled_on` / `disabled_on` checks, e.g. `index`.
    pub template_name: String,
    #[serde(default)]
    pub template: Option<TemplateDocument>,
    #[serde(default)]
    pub header: Option<SectionGroupDocument>,
    #[serde(default)]
    pub footer: Option<SectionGroupDocument>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRender<'s> {
    pub id: String,
    pub template_name: String,
    pub engine_version: String,
    pub created_at: DateTime<Utc>,
    pub page_hash: String,
    pub page: ResolvedPage<'s>,
    pub validation: PageValidation,
    /// Sections placed where their schema does not allow them.
    pub unavailable_sections: Vec<String>,
}

pub struct ThemeEngine {
    registry: SchemaRegistry,
    validator: Validator,
    config: EngineConfig,
}

impl ThemeEngine {
    pub fn new(registry: SchemaRegistry, config: EngineConfig) -> Self {
        Self {
            registry,
            validator: Validator::new(),
            config,
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compose, validate and fingerprint one page.
    pub fn render_page(&self, request: &PageRequest) -> Result<PageRender<'_>> {
        let page = compose_page(
            request.template.as_ref(),
            request.header.as_ref(),
            request.footer.as_ref(),
            &self.registry,
        )?;

        let validation = self.validator.validate_page(&page);
        let unavailable_sections: Vec<String> = page
            .sections
            .iter()
            .filter(|s| !is_placeable(s, &request.template_name))
            .map(|s| s.id.clone())
            .collect();
        for id in &unavailable_sections {
            warn!(section = %id, template = %request.template_name, "section not allowed here");
        }

        let page_hash = hashing::page_hash(&page)?;
        info!(
            template = %request.template_name,
            sections = page.sections.len(),
            issues = validation.issues.len(),
            "page rendered"
        );

        Ok(PageRender {
            id: Uuid::new_v4().to_string(),
            template_name: request.template_name.clone(),
            engine_version: ENGINE_VERSION.to_string(),
            created_at: Utc::now(),
            page_hash,
            page,
            validation,
            unavailable_sections,
        })
    }

    /// Run asset directives with the configured base URL and conditional mode.
    pub fn process_asset(&self, text: &str, settings: &Map<String, Value>) -> String {
        let resolver = PrefixResolver::new(&self.config.asset_base_url);
        self.process_asset_with(text, settings, &resolver)
    }

    pub fn process_asset_with(
        &self,
        text: &str,
        settings: &Map<String, Value>,
        resolver: &dyn AssetUrlResolver,
    ) -> String {
        let ctx = AssetContext::new(settings, resolver).with_conditionals(self.config.conditional_mode);
        process(text, &ctx)
    }
}

fn is_placeable(section: &SectionInstance<'_>, template_name: &str) -> bool {
    let Some(schema) = section.schema else {
        return true;
    };
    match section.region {
        Region::Template => schema.is_usable_in_template(template_name),
        Region::Header => schema.is_usable_in_group("header"),
        Region::Footer => schema.is_usable_in_group("footer"),
    }
}

impl Default for ThemeEngine {
    fn default() -> Self {
        Self::new(SchemaRegistry::default(), EngineConfig::default())
    }
}

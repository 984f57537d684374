//! Validation System - Settings Against Their Contracts
//!
//! Setting checks produce issues; they never reject a value. Composition has
//! already used whatever was supplied, and the caller decides what to show.
//!
//! Section rules wrap the setting checks and add block-level constraints.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::compose::{ResolvedPage, SectionInstance};
use crate::schema::{SettingDefinition, SettingKind};

/// Applied when a schema does not declare `max_blocks`.
pub const DEFAULT_MAX_BLOCKS: u32 = 50;

lazy_static! {
    static ref HEX_COLOR_RE: Regex = Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap();
    static ref RGB_COLOR_RE: Regex = Regex::new(
        r"^rgba?\(\s*\d{1,3}%?\s*,\s*\d{1,3}%?\s*,\s*\d{1,3}%?\s*(?:,\s*(?:\d*\.)?\d+%?\s*)?\)$"
    )
    .unwrap();
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub setting_id: String,
    pub message: String,
    pub severity: Severity,
}

impl ValidationIssue {
    fn warning(setting_id: &str, message: impl Into<String>) -> Self {
        Self {
            setting_id: setting_id.to_string(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    fn error(setting_id: &str, message: impl Into<String>) -> Self {
        Self {
            setting_id: setting_id.to_string(),
            message: message.into(),
            severity: Severity::Error,
        }
    }
}

/// Check every declared setting's value against its kind's constraints.
pub fn validate_settings(settings: &Map<String, Value>, defs: &[SettingDefinition]) -> Vec<ValidationIssue> {
    defs.iter()
        .filter_map(|def| {
            let id = def.id.as_deref()?;
            check_setting(id, settings.get(id), &def.kind)
        })
        .collect()
}

fn check_setting(id: &str, value: Option<&Value>, kind: &SettingKind) -> Option<ValidationIssue> {
    let value = value.filter(|v| !v.is_null());

    match kind {
        SettingKind::Text(_)
        | SettingKind::Resource(_)
        | SettingKind::ResourceList { .. }
        | SettingKind::Font
        | SettingKind::Header { .. }
        | SettingKind::Paragraph { .. } => None,

        SettingKind::Checkbox => match value {
            None => Some(ValidationIssue::warning(id, "missing value")),
            Some(Value::Bool(_)) => None,
            Some(other) => Some(ValidationIssue::error(id, format!("expected a boolean, got {other}"))),
        },

        SettingKind::Number => match value {
            None => Some(ValidationIssue::warning(id, "missing value")),
            Some(Value::Number(_)) => None,
            Some(other) => Some(ValidationIssue::error(id, format!("expected a number, got {other}"))),
        },

        SettingKind::Range { min, max, step, .. } => {
            let Some(value) = value else {
                return Some(ValidationIssue::warning(id, "missing value"));
            };
            let Some(n) = value.as_f64() else {
                return Some(ValidationIssue::error(id, format!("expected a number, got {value}")));
            };
            if n < *min || n > *max {
                return Some(ValidationIssue::warning(
                    id,
                    format!("{n} is outside the range {min}..={max}"),
                ));
            }
            match step {
                Some(step) if *step > 0.0 && !on_step(n, *min, *step) => Some(ValidationIssue::warning(
                    id,
                    format!("{n} is not a multiple of step {step} from {min}"),
                )),
                _ => None,
            }
        }

        SettingKind::Select { options, .. } => {
            let Some(value) = value else {
                return Some(ValidationIssue::warning(id, "missing value"));
            };
            if options.is_empty() {
                return None;
            }
            let chosen = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if options.iter().any(|o| o.value == chosen) {
                None
            } else {
                Some(ValidationIssue::warning(id, format!("`{chosen}` is not one of the declared options")))
            }
        }

        SettingKind::Color { .. } => {
            let Some(value) = value else {
                return Some(ValidationIssue::warning(id, "missing value"));
            };
            match value.as_str() {
                Some(s) if is_color(s) => None,
                _ => Some(ValidationIssue::warning(id, format!("{value} is not a valid colour"))),
            }
        }
    }
}

fn on_step(n: f64, min: f64, step: f64) -> bool {
    let steps = (n - min) / step;
    (steps - steps.round()).abs() < 1e-9
}

/// Hex-3, hex-6, or a functional `rgb()`/`rgba()` value.
pub fn is_color(value: &str) -> bool {
    let value = value.trim();
    HEX_COLOR_RE.is_match(value) || RGB_COLOR_RE.is_match(value)
}

// --- Section rules ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SectionIssue {
    pub rule: String,
    pub section_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setting_id: Option<String>,
    pub message: String,
    pub severity: Severity,
}

impl SectionIssue {
    fn from_setting(rule: &str, section_id: &str, block_id: Option<&str>, issue: ValidationIssue) -> Self {
        Self {
            rule: rule.to_string(),
            section_id: section_id.to_string(),
            block_id: block_id.map(str::to_string),
            setting_id: Some(issue.setting_id),
            message: issue.message,
            severity: issue.severity,
        }
    }

    fn block_warning(rule: &str, section_id: &str, block_id: Option<&str>, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            section_id: section_id.to_string(),
            block_id: block_id.map(str::to_string),
            setting_id: None,
            message,
            severity: Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageValidation {
    pub valid: bool,
    pub issues: Vec<SectionIssue>,
}

impl PageValidation {
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn for_section<'a>(&'a self, section_id: &'a str) -> impl Iterator<Item = &'a SectionIssue> {
        self.issues.iter().filter(move |i| i.section_id == section_id)
    }
}

/// A check applied to one composed section.
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, section: &SectionInstance<'_>) -> Vec<SectionIssue>;
}

/// Kind constraints on section settings and on each block's settings.
pub struct SettingConstraintRule;

impl ValidationRule for SettingConstraintRule {
    fn name(&self) -> &'static str { "setting_constraint" }

    fn validate(&self, section: &SectionInstance<'_>) -> Vec<SectionIssue> {
        let Some(schema) = section.schema else {
            return vec![];
        };

        let mut issues: Vec<_> = validate_settings(&section.settings, &schema.settings)
            .into_iter()
            .map(|issue| SectionIssue::from_setting(self.name(), &section.id, None, issue))
            .collect();

        for block in &section.blocks {
            if let Some(def) = schema.block(&block.block_type) {
                issues.extend(
                    validate_settings(&block.settings, &def.settings)
                        .into_iter()
                        .map(|issue| SectionIssue::from_setting(self.name(), &section.id, Some(block.id.as_str()), issue)),
                );
            }
        }
        issues
    }
}

/// Enabled blocks must not exceed the section's `max_blocks`.
pub struct BlockCountRule;

impl ValidationRule for BlockCountRule {
    fn name(&self) -> &'static str { "block_count" }

    fn validate(&self, section: &SectionInstance<'_>) -> Vec<SectionIssue> {
        let max = section
            .schema
            .and_then(|s| s.max_blocks)
            .unwrap_or(DEFAULT_MAX_BLOCKS) as usize;
        let count = section.blocks.iter().filter(|b| !b.disabled).count();

        if count > max {
            vec![SectionIssue::block_warning(
                self.name(),
                &section.id,
                None,
                format!("{count} blocks exceed the maximum of {max}"),
            )]
        } else {
            vec![]
        }
    }
}

/// Per-type block `limit`.
pub struct BlockLimitRule;

impl ValidationRule for BlockLimitRule {
    fn name(&self) -> &'static str { "block_limit" }

    fn validate(&self, section: &SectionInstance<'_>) -> Vec<SectionIssue> {
        let Some(schema) = section.schema else {
            return vec![];
        };

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for block in section.blocks.iter().filter(|b| !b.disabled) {
            *counts.entry(block.block_type.as_str()).or_default() += 1;
        }

        schema
            .blocks
            .iter()
            .filter_map(|def| {
                let limit = def.limit? as usize;
                let count = counts.get(def.block_type.as_str()).copied().unwrap_or(0);
                (count > limit).then(|| {
                    SectionIssue::block_warning(
                        self.name(),
                        &section.id,
                        None,
                        format!("{count} `{}` blocks exceed the limit of {limit}", def.block_type),
                    )
                })
            })
            .collect()
    }
}

/// Block types the schema does not declare.
pub struct UnknownBlockRule;

impl ValidationRule for UnknownBlockRule {
    fn name(&self) -> &'static str { "unknown_block" }

    fn validate(&self, section: &SectionInstance<'_>) -> Vec<SectionIssue> {
        let Some(schema) = section.schema else {
            return vec![];
        };
        if schema.accepts_dynamic_blocks() {
            return vec![];
        }

        section
            .blocks
            .iter()
            .filter(|b| schema.block(&b.block_type).is_none())
            .map(|b| {
                SectionIssue::block_warning(
                    self.name(),
                    &section.id,
                    Some(b.id.as_str()),
                    format!("block type `{}` is not declared by {}", b.block_type, section.section_type),
                )
            })
            .collect()
    }
}

/// Validator runs every rule over every section of a page.
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule + Send + Sync>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(SettingConstraintRule),
                Box::new(BlockCountRule),
                Box::new(BlockLimitRule),
                Box::new(UnknownBlockRule),
            ],
        }
    }

    pub fn with_rule(mut self, rule: impl ValidationRule + Send + Sync + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn validate_section(&self, section: &SectionInstance<'_>) -> Vec<SectionIssue> {
        self.rules.iter().flat_map(|rule| rule.validate(section)).collect()
    }

    pub fn validate_page(&self, page: &ResolvedPage<'_>) -> PageValidation {
        let issues: Vec<_> = page
            .sections
            .iter()
            .flat_map(|section| self.validate_section(section))
            .collect();

        PageValidation {
            valid: !issues.iter().any(|i| i.severity == Severity::Error),
            issues,
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

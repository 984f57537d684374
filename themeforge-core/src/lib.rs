//! ThemeForge Core - Theme Schema & Template Composition Engine
//!
//! Section sources carry an embedded schema. Templates and section groups
//! reference sections by id. The engine turns both into one resolved page:
//! every setting filled, every block expanded, every section indexed.
//!
//! All operations are pure over already-loaded inputs; reading files and
//! serving results belong to the caller.

pub mod assets;
pub mod compose;
pub mod config;
pub mod defaults;
pub mod document;
pub mod error;
pub mod extract;
pub mod hashing;
pub mod pipeline;
pub mod registry;
pub mod schema;
pub mod settings_data;
pub mod validation;

pub use assets::{process, AssetContext, AssetUrlResolver, ConditionalMode, PrefixResolver};
pub use compose::{compose_page, BlockInstance, Region, ResolvedPage, SchemaLookup, SectionInstance};
pub use config::EngineConfig;
pub use defaults::{compute_block_defaults, compute_defaults};
pub use document::{
    instantiate_preset, normalize_layout, BlockStub, GroupKind, LayoutRef, SectionGroupDocument,
    SectionStub, TemplateDocument,
};
pub use error::{Result, ThemeError};
pub use extract::{extract_schema, extract_schema_lenient};
pub use hashing::{canonical_json, fingerprint_source, page_hash};
pub use pipeline::{PageRender, PageRequest, ThemeEngine};
pub use registry::SchemaRegistry;
pub use schema::{BlockDefinition, SectionSchema, SettingDefinition, SettingKind};
pub use settings_data::{SettingsData, ThemeSettingsSchema};
pub use validation::{validate_settings, PageValidation, Severity, ValidationIssue, ValidationRule, Validator};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

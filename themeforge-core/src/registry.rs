//! Schema registry - loads, fingerprints and caches section schemas

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::compose::SchemaLookup;
use crate::extract::extract_schema_lenient;
use crate::hashing::fingerprint_source;
use crate::schema::{SectionSchema, SectionType};

struct Entry {
    fingerprint: String,
    // None for schema-less or malformed sources.
    schema: Option<SectionSchema>,
}

/// Section type → parsed schema, re-parsed only when the source changes.
#[derive(Default)]
pub struct SchemaRegistry {
    entries: HashMap<SectionType, Entry>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.liquid` file in `dir`, keyed by file stem.
    ///
    /// Files that cannot be read are logged and left out.
    pub fn load_from_dir(dir: &Path) -> Result<Self, std::io::Error> {
        let mut registry = Self::new();
        if dir.exists() {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                if path.extension().map_or(false, |e| e == "liquid") {
                    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                        continue;
                    };
                    match fs::read_to_string(&path) {
                        Ok(source) => {
                            registry.insert_source(stem, &source);
                        }
                        Err(err) => {
                            warn!(path = %path.display(), error = %err, "skipping unreadable section source");
                        }
                    }
                }
            }
        }
        info!(dir = %dir.display(), sections = registry.len(), "loaded section schemas");
        Ok(registry)
    }

    /// Parse and store the schema embedded in `source`.
    ///
    /// Returns `false` when the source was unchanged and parsing was skipped.
    pub fn insert_source(&mut self, section_type: &str, source: &str) -> bool {
        let fingerprint = fingerprint_source(section_type, source);
        if self
            .entries
            .get(section_type)
            .is_some_and(|e| e.fingerprint == fingerprint)
        {
            debug!(section_type, "schema source unchanged, keeping cached parse");
            return false;
        }

        let schema = extract_schema_lenient(section_type, source);
        self.entries
            .insert(section_type.to_string(), Entry { fingerprint, schema });
        true
    }

    pub fn register(&mut self, section_type: impl Into<String>, schema: SectionSchema) {
        let section_type = section_type.into();
        let fingerprint = fingerprint_source(&section_type, "");
        self.entries.insert(
            section_type,
            Entry {
                fingerprint,
                schema: Some(schema),
            },
        );
    }

    pub fn get(&self, section_type: &str) -> Option<&SectionSchema> {
        self.entries.get(section_type)?.schema.as_ref()
    }

    pub fn contains(&self, section_type: &str) -> bool {
        self.entries.contains_key(section_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Section types with a parsed schema, sorted.
    pub fn section_types(&self) -> Vec<&str> {
        let mut types: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, e)| e.schema.is_some())
            .map(|(t, _)| t.as_str())
            .collect();
        types.sort_unstable();
        types
    }
}

impl SchemaLookup for SchemaRegistry {
    fn schema(&self, section_type: &str) -> Option<&SectionSchema> {
        self.get(section_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HERO: &str = r#"<h1>{{ section.settings.title }}</h1>
{% schema %}
{
  // shown in the editor
  "name": "Hero",
  "settings": [{"type": "text", "id": "title", "default": "Hi"}]
}
{% endschema %}"#;

    #[test]
    fn test_insert_and_lookup() {
        let mut registry = SchemaRegistry::new();
        assert!(registry.insert_source("hero", HERO));
        assert_eq!(registry.get("hero").unwrap().name, "Hero");
        assert!(registry.schema("hero").is_some());
    }

    #[test]
    fn test_unchanged_source_not_reparsed() {
        let mut registry = SchemaRegistry::new();
        assert!(registry.insert_source("hero", HERO));
        assert!(!registry.insert_source("hero", HERO));
        assert!(registry.insert_source("hero", &HERO.replace("Hero", "Banner")));
        assert_eq!(registry.get("hero").unwrap().name, "Banner");
    }

    #[test]
    fn test_malformed_and_schema_less_stored_without_schema() {
        let mut registry = SchemaRegistry::new();
        registry.insert_source("broken", "{% schema %}{ oops {% endschema %}");
        registry.insert_source("snippet", "<div></div>");
        assert!(registry.contains("broken"));
        assert!(registry.get("broken").is_none());
        assert!(registry.get("snippet").is_none());
        assert!(registry.section_types().is_empty());
    }

    #[test]
    fn test_unreadable_source_skipped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hero.liquid"), HERO).unwrap();
        fs::write(dir.path().join("bad.liquid"), [0xff, 0xfe, 0x00]).unwrap();

        let registry = SchemaRegistry::load_from_dir(dir.path()).unwrap();
        assert_eq!(registry.section_types(), vec!["hero"]);
        assert!(!registry.contains("bad"));
    }
}

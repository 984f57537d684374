//! Schema Extraction
//!
//! Sections embed their schema as JSON between `{% schema %}` and
//! `{% endschema %}`. The body may carry `//` and `/* */` comments; those are
//! removed with a scanner that knows when it is inside a string literal, so
//! values like `"https://cdn.example.com"` survive untouched.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use crate::error::{Result, ThemeError};
use crate::schema::SectionSchema;

lazy_static! {
    static ref SCHEMA_BLOCK_RE: Regex =
        Regex::new(r"(?is)\{%-?\s*schema\s*-?%\}(.*?)\{%-?\s*endschema\s*-?%\}").unwrap();
}

/// Parse the first embedded schema block of `source`.
///
/// `Ok(None)` when the source has no schema block at all.
pub fn extract_schema(source: &str) -> Result<Option<SectionSchema>> {
    extract_named("<inline>", source)
}

/// Like [`extract_schema`], but a malformed block is logged and treated as absent.
pub fn extract_schema_lenient(source_name: &str, source: &str) -> Option<SectionSchema> {
    match extract_named(source_name, source) {
        Ok(schema) => schema,
        Err(err) => {
            warn!(section = source_name, error = %err, "ignoring malformed schema");
            None
        }
    }
}

pub(crate) fn extract_named(source_name: &str, source: &str) -> Result<Option<SectionSchema>> {
    let Some(body) = schema_body(source) else {
        return Ok(None);
    };
    let json = strip_comments(body);
    serde_json::from_str::<SectionSchema>(&json)
        .map(Some)
        .map_err(|e| ThemeError::malformed(source_name, e.to_string()))
}

/// Raw text between the schema markers.
pub fn schema_body(source: &str) -> Option<&str> {
    SCHEMA_BLOCK_RE
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Remove `//` line comments and `/* */` block comments outside string literals.
///
/// Line comments keep their terminating newline so error positions reported
/// by the JSON parser still point at the right line.
pub fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

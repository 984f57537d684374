//! Asset Directive Processing
//!
//! Static CSS/JS assets may embed a small Liquid subset. Passes run in a fixed
//! order, each over the output of the previous one:
//!
//! 1. `{{ 'file' | asset_url }}` → resolved URL
//! 2. `{{ settings.a.b }}` → stringified setting
//! 3. `{% if %}` / `{% unless %}` blocks, optionally with `{% else %}`
//! 4. any remaining `{% … %}` tag is dropped
//! 5. any remaining `{{ … }}` expression is dropped
//!
//! Directives that only appear after substitution are dropped by the last two
//! passes, never resolved.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

lazy_static! {
    static ref ASSET_URL_RE: Regex =
        Regex::new(r#"\{\{-?\s*(?:'([^']*)'|"([^"]*)")\s*\|\s*asset_url\s*-?\}\}"#).unwrap();
    static ref SETTING_RE: Regex =
        Regex::new(r"\{\{-?\s*settings((?:\.[A-Za-z0-9_-]+)+)\s*-?\}\}").unwrap();
    static ref CONDITIONAL_RE: Regex = Regex::new(
        r"(?s)\{%-?\s*(if|unless)\s+(.*?)\s*-?%\}(.*?)\{%-?\s*end(?:if|unless)\s*-?%\}"
    )
    .unwrap();
    static ref ELSE_RE: Regex = Regex::new(r"\{%-?\s*else\s*-?%\}").unwrap();
    static ref CONDITION_RE: Regex =
        Regex::new(r"^settings((?:\.[A-Za-z0-9_-]+)+)(?:\s*(==|!=)\s*(.+))?$").unwrap();
    static ref TAG_RE: Regex = Regex::new(r"(?s)\{%.*?%\}").unwrap();
    static ref OUTPUT_RE: Regex = Regex::new(r"(?s)\{\{.*?\}\}").unwrap();
}

/// Maps an asset filename to the URL it is served from.
pub trait AssetUrlResolver: Send + Sync {
    fn asset_url(&self, filename: &str) -> String;
}

impl<F> AssetUrlResolver for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn asset_url(&self, filename: &str) -> String {
        self(filename)
    }
}

/// Joins filenames onto a fixed base such as `/cdn/assets`.
#[derive(Debug, Clone)]
pub struct PrefixResolver {
    base: String,
}

impl PrefixResolver {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

impl AssetUrlResolver for PrefixResolver {
    fn asset_url(&self, filename: &str) -> String {
        format!(
            "{}/{}",
            self.base.trim_end_matches('/'),
            filename.trim_start_matches('/')
        )
    }
}

/// How `{% if %}` / `{% unless %}` blocks are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionalMode {
    /// Evaluate the condition against `settings` and keep the chosen branch.
    #[default]
    Evaluate,
    /// Legacy behaviour: keep the whole body whatever the condition says.
    /// Only the wrapper and `{% else %}` tags are removed.
    AlwaysRetain,
}

pub struct AssetContext<'a> {
    pub settings: &'a Map<String, Value>,
    pub resolver: &'a dyn AssetUrlResolver,
    pub conditionals: ConditionalMode,
}

impl<'a> AssetContext<'a> {
    pub fn new(settings: &'a Map<String, Value>, resolver: &'a dyn AssetUrlResolver) -> Self {
        Self {
            settings,
            resolver,
            conditionals: ConditionalMode::default(),
        }
    }

    pub fn with_conditionals(mut self, mode: ConditionalMode) -> Self {
        self.conditionals = mode;
        self
    }
}

/// Run every directive pass over `text`.
pub fn process(text: &str, ctx: &AssetContext<'_>) -> String {
    let text = ASSET_URL_RE.replace_all(text, |caps: &Captures| {
        let filename = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        ctx.resolver.asset_url(filename)
    });

    let text = SETTING_RE.replace_all(&text, |caps: &Captures| {
        lookup(ctx.settings, &caps[1]).map(render_value).unwrap_or_default()
    });

    let text = CONDITIONAL_RE.replace_all(&text, |caps: &Captures| {
        let body = &caps[3];
        if ctx.conditionals == ConditionalMode::AlwaysRetain {
            // The leftover else tag goes in the tag pass.
            return body.to_string();
        }
        let (then_branch, else_branch) = match ELSE_RE.find(body) {
            Some(m) => (&body[..m.start()], &body[m.end()..]),
            None => (body, ""),
        };

        let holds = evaluate_condition(&caps[2], ctx.settings);
        let keep_then = if &caps[1] == "unless" { !holds } else { holds };
        if keep_then { then_branch.to_string() } else { else_branch.to_string() }
    });

    let text = TAG_RE.replace_all(&text, "");
    OUTPUT_RE.replace_all(&text, "").into_owned()
}

/// Walk a `.a.b.c` path from the settings root.
fn lookup<'v>(settings: &'v Map<String, Value>, path: &str) -> Option<&'v Value> {
    let mut segments = path.trim_start_matches('.').split('.');
    let mut current = settings.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// `settings.x`, `settings.x == literal` or `settings.x != literal`.
///
/// Unparseable conditions are false.
pub fn evaluate_condition(condition: &str, settings: &Map<String, Value>) -> bool {
    let Some(caps) = CONDITION_RE.captures(condition.trim()) else {
        debug!(condition, "unsupported asset condition, treating as false");
        return false;
    };
    let value = lookup(settings, &caps[1]);

    match (caps.get(2).map(|m| m.as_str()), caps.get(3)) {
        (Some(op), Some(literal)) => {
            let equal = literal_matches(value, literal.as_str().trim());
            if op == "==" { equal } else { !equal }
        }
        _ => is_truthy(value),
    }
}

/// Only `false`, `nil` and missing values are falsy.
fn is_truthy(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Null) | Some(Value::Bool(false)))
}

fn literal_matches(value: Option<&Value>, literal: &str) -> bool {
    let quoted = literal
        .strip_prefix('\'')
        .and_then(|l| l.strip_suffix('\''))
        .or_else(|| literal.strip_prefix('"').and_then(|l| l.strip_suffix('"')));

    match (value, quoted) {
        (Some(Value::String(s)), Some(text)) => s == text,
        (_, Some(_)) => false,
        (None | Some(Value::Null), None) => literal == "nil" || literal == "null",
        (Some(Value::Bool(b)), None) => literal == b.to_string(),
        (Some(Value::Number(n)), None) => match (n.as_f64(), literal.parse::<f64>()) {
            (Some(a), Ok(b)) => a == b,
            _ => false,
        },
        (Some(_), None) => false,
    }
}

/// String form of a setting value as it appears in asset text.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) if n.is_f64() => n.as_f64().map(format_number).unwrap_or_default(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(render_value).collect(),
        Value::Object(map) => render_color(map).unwrap_or_default(),
    }
}

/// Objects carrying numeric `red`/`green`/`blue` (and optional `alpha`).
fn render_color(map: &Map<String, Value>) -> Option<String> {
    let channel = |key: &str| map.get(key).and_then(Value::as_f64);
    let (r, g, b) = (channel("red")?, channel("green")?, channel("blue")?);

    match channel("alpha") {
        Some(alpha) if alpha != 1.0 => Some(format!(
            "rgba({}, {}, {}, {})",
            format_number(r),
            format_number(g),
            format_number(b),
            format_number(alpha)
        )),
        _ => Some(format!(
            "rgb({}, {}, {})",
            format_number(r),
            format_number(g),
            format_number(b)
        )),
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

// src/ingest/fields.rs
//! Ordered field-name fallback chains.
//!
//! Upstream catalogs name the same concept differently (`time`, `GPS`, `PEPOCH`...).
//! A [`FieldChain`] lists the candidate keys in priority order; the first key holding
//! a non-empty scalar wins. Scalars wrapped in a one-element list are unwrapped.

use serde_json::Value;

pub const NO_TIME: &str = "No time";
pub const NO_INTENSITY: &str = "No intensity";
pub const NO_URL: &str = "#";

#[derive(Debug, Clone, Copy)]
pub struct FieldChain {
    pub keys: &'static [&'static str],
}

impl FieldChain {
    pub const fn new(keys: &'static [&'static str]) -> Self {
        Self { keys }
    }

    /// Raw value of the first candidate key that carries something usable.
    pub fn resolve_value<'a>(&self, item: &'a Value) -> Option<&'a Value> {
        self.keys
            .iter()
            .filter_map(|k| item.get(*k))
            .map(unwrap_single)
            .find(|v| scalar_text(v).is_some())
    }

    pub fn resolve(&self, item: &Value) -> Option<String> {
        self.resolve_value(item).and_then(scalar_text)
    }

    pub fn resolve_or(&self, item: &Value, placeholder: &str) -> String {
        self.resolve(item).unwrap_or_else(|| placeholder.to_string())
    }
}

/// `["x"]` -> `"x"`; anything else untouched.
fn unwrap_single(v: &Value) -> &Value {
    match v {
        Value::Array(a) => a.first().map(unwrap_single).unwrap_or(v),
        other => other,
    }
}

/// Render a scalar as display text. Empty strings and nulls count as absent.
pub fn scalar_text(v: &Value) -> Option<String> {
    match unwrap_single(v) {
        Value::String(s) => {
            let t = clean_text(s);
            (!t.is_empty()).then_some(t)
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Lenient numeric reading: JSON numbers and numeric strings.
pub fn numeric(v: &Value) -> Option<f64> {
    let n = match unwrap_single(v) {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|x| x.is_finite())
}

/// Decode HTML entities and trim. Feeds occasionally ship `&amp;` or `&nbsp;` in titles.
pub fn clean_text(s: &str) -> String {
    html_escape::decode_html_entities(s).trim().to_string()
}

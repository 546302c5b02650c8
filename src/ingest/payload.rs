// src/ingest/payload.rs
//! Payload classification before structural extraction.
//!
//! Raw text is first stripped of leading noise (progress output from generator
//! scripts, BOMs, banners), then tagged as JSON or XML by its first significant
//! character. JSON is parsed on the spot; XML is handed back as text so each
//! adapter can deserialize it into its own record structs.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ingest::error::FetchError;

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Xml(String),
}

/// Drop everything before the first `{`, `[` or `<`.
pub fn strip_leading_noise(raw: &str) -> Option<&str> {
    raw.find(['{', '[', '<']).map(|i| &raw[i..])
}

/// Tag a raw body as JSON or XML. JSON is parsed here.
pub fn sniff(raw: &str) -> Result<Payload, FetchError> {
    let body = strip_leading_noise(raw).ok_or(FetchError::Shape)?;
    if body.starts_with('<') {
        Ok(Payload::Xml(body.trim_end().to_string()))
    } else {
        Ok(Payload::Json(serde_json::from_str(body.trim_end())?))
    }
}

/// Members of a collection: list items, or the values of an object keyed by name.
pub fn entries(v: &Value) -> Vec<&Value> {
    match v {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => Vec::new(),
    }
}

/// Deserialize an XML body into `T`. The root element name is not checked;
/// attributes arrive as `@name` keys.
pub fn from_xml<T: DeserializeOwned>(body: &str) -> Result<T, FetchError> {
    Ok(quick_xml::de::from_str(body)?)
}

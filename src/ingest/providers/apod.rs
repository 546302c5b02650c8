// src/ingest/providers/apod.rs
use async_trait::async_trait;
use metrics::counter;
use serde_json::Value;

use crate::ingest::error::FetchError;
use crate::ingest::fetch::{Expect, SourceLocation, SourceReader};
use crate::ingest::fields::{scalar_text, FieldChain};
use crate::ingest::types::{EventKind, Level, NormalizedEvent, SourceProvider};

const IMAGE: FieldChain = FieldChain::new(&["url", "hdurl"]);

/// The picture of the day, or an error when the response has no `date`.
pub fn parse_picture(body: &str) -> Result<NormalizedEvent, FetchError> {
    let v: Value = serde_json::from_str(body)?;
    let date = v
        .get("date")
        .and_then(scalar_text)
        .ok_or(FetchError::MissingField("date"))?;
    let text = |key: &str| v.get(key).and_then(scalar_text);

    let mut ev = NormalizedEvent::new(
        EventKind::PictureOfDay,
        date,
        text("title").unwrap_or_default(),
        Level::Blue,
    )
    .with_url(IMAGE.resolve(&v));
    ev.media_type = text("media_type");
    ev.description = text("explanation");
    Ok(ev)
}

pub struct ApodProvider {
    reader: SourceReader,
    location: SourceLocation,
}

impl ApodProvider {
    pub fn new(reader: SourceReader, location: SourceLocation) -> Self {
        Self { reader, location }
    }

    pub async fn fetch_picture(&self) -> Option<NormalizedEvent> {
        let res = match self.reader.read(&self.location, Expect::Json).await {
            Ok(body) => parse_picture(&body),
            Err(e) => Err(e),
        };
        match res {
            Ok(ev) => {
                tracing::info!(target: "dss", source = "apod", date = %ev.time, "apod fetched");
                Some(ev)
            }
            Err(e) => {
                tracing::warn!(target: "dss", source = "apod", kind = e.kind(), error = %e, "apod discarded");
                counter!("dss_provider_errors_total", "source" => "apod", "kind" => e.kind()).increment(1);
                None
            }
        }
    }
}

#[async_trait]
impl SourceProvider for ApodProvider {
    async fn fetch_events(&self) -> Vec<NormalizedEvent> {
        self.fetch_picture().await.into_iter().collect()
    }

    fn name(&self) -> &'static str {
        "apod"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_response() {
        let body = r#"{
            "date": "2024-05-01",
            "title": "M51 &amp; Friends",
            "url": "https://apod.nasa.gov/a.jpg",
            "hdurl": "https://apod.nasa.gov/a_hd.jpg",
            "media_type": "image",
            "explanation": "A whirlpool."
        }"#;
        let ev = parse_picture(body).unwrap();
        assert_eq!(ev.kind, EventKind::PictureOfDay);
        assert_eq!(ev.time, "2024-05-01");
        assert_eq!(ev.intensity, "M51 & Friends");
        assert_eq!(ev.url.as_deref(), Some("https://apod.nasa.gov/a.jpg"));
        assert_eq!(ev.level, Level::Blue);
        assert_eq!(ev.media_type.as_deref(), Some("image"));
        assert_eq!(ev.description.as_deref(), Some("A whirlpool."));
    }

    #[test]
    fn hd_url_is_the_fallback() {
        let ev = parse_picture(r#"{"date": "d", "hdurl": "hd"}"#).unwrap();
        assert_eq!(ev.url.as_deref(), Some("hd"));
        assert_eq!(ev.intensity, "");
    }

    #[test]
    fn missing_date_is_rejected() {
        let err = parse_picture(r#"{"title": "x", "url": "y"}"#).unwrap_err();
        assert_eq!(err.kind(), "missing_field");
    }
}

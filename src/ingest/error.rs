// src/ingest/error.rs
use thiserror::Error;

/// Everything that can go wrong inside a single adapter.
/// Never crosses the `SourceProvider` boundary.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned HTTP {0}")]
    Status(u16),
    #[error("unexpected content type `{0}`")]
    ContentType(String),
    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed XML payload: {0}")]
    Xml(String),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("producer `{program}` exited with {status}")]
    Subprocess { program: String, status: String },
    #[error("file not found (tried: {0})")]
    NotFound(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unrecognized payload shape")]
    Shape,
    #[error("timed out after {0} ms")]
    Timeout(u64),
}

impl FetchError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Status(_) => "status",
            FetchError::ContentType(_) => "content_type",
            FetchError::Json(_) => "json",
            FetchError::Xml(_) => "xml",
            FetchError::MissingField(_) => "missing_field",
            FetchError::Subprocess { .. } => "subprocess",
            FetchError::NotFound(_) => "not_found",
            FetchError::Io(_) => "io",
            FetchError::Shape => "shape",
            FetchError::Timeout(_) => "timeout",
        }
    }
}

impl From<quick_xml::DeError> for FetchError {
    fn from(e: quick_xml::DeError) -> Self {
        FetchError::Xml(e.to_string())
    }
}

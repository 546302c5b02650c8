// src/ingest/fetch.rs
use std::path::{Path, PathBuf};

use reqwest::{header::CONTENT_TYPE, Client};
use url::Url;

use crate::ingest::error::FetchError;

/// Where a source's payload comes from, decided once from the configured string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Remote(String),
    LocalFile(PathBuf),
    /// A generator script whose stdout is the payload.
    Script(PathBuf),
}

impl SourceLocation {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(u) = Url::parse(raw) {
            match u.scheme() {
                "http" | "https" => return SourceLocation::Remote(raw.to_string()),
                "file" => {
                    if let Ok(p) = u.to_file_path() {
                        return Self::local(p);
                    }
                }
                _ => {}
            }
        }
        Self::local(PathBuf::from(raw))
    }

    fn local(p: PathBuf) -> Self {
        match p.extension().and_then(|e| e.to_str()) {
            Some("py") | Some("sh") => SourceLocation::Script(p),
            _ => SourceLocation::LocalFile(p),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, SourceLocation::Remote(_))
    }
}

/// Base directories tried, in order, for relative local paths.
#[derive(Debug, Clone, Default)]
pub struct DataPaths {
    data_dir: Option<PathBuf>,
}

impl DataPaths {
    pub fn new(data_dir: Option<PathBuf>) -> Self {
        Self { data_dir }
    }

    /// Candidate locations: configured data dir, working dir, crate dir, executable dir.
    pub fn candidates(&self, path: &Path) -> Vec<PathBuf> {
        if path.is_absolute() {
            return vec![path.to_path_buf()];
        }
        let mut out = Vec::with_capacity(4);
        if let Some(dir) = &self.data_dir {
            out.push(dir.join(path));
        }
        out.push(path.to_path_buf());
        out.push(Path::new(env!("CARGO_MANIFEST_DIR")).join(path));
        if let Some(dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            out.push(dir.join(path));
        }
        out.dedup();
        out
    }

    pub fn resolve(&self, path: &Path) -> Result<PathBuf, FetchError> {
        let candidates = self.candidates(path);
        candidates
            .iter()
            .find(|p| p.is_file())
            .cloned()
            .ok_or_else(|| {
                FetchError::NotFound(
                    candidates
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                )
            })
    }

    /// Where a not-yet-existing file should be created.
    pub fn preferred(&self, path: &Path) -> PathBuf {
        match &self.data_dir {
            Some(dir) if !path.is_absolute() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    /// Response must carry a JSON content type.
    Json,
    Any,
}

/// Shared HTTP client plus local path resolution.
#[derive(Debug, Clone)]
pub struct SourceReader {
    client: Client,
    paths: DataPaths,
}

impl SourceReader {
    pub fn new(client: Client, paths: DataPaths) -> Self {
        Self { client, paths }
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    /// Read a remote or local location. Scripts are not handled here (see `producer`).
    pub async fn read(&self, loc: &SourceLocation, expect: Expect) -> Result<String, FetchError> {
        match loc {
            SourceLocation::Remote(url) => self.http_get(url, expect).await,
            SourceLocation::LocalFile(p) | SourceLocation::Script(p) => self.read_local(p).await,
        }
    }

    pub async fn http_get(&self, url: &str, expect: Expect) -> Result<String, FetchError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        if expect == Expect::Json {
            let ctype = resp
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_ascii_lowercase();
            if !ctype.contains("json") {
                return Err(FetchError::ContentType(ctype));
            }
        }
        Ok(resp.text().await?)
    }

    pub async fn read_local(&self, path: &Path) -> Result<String, FetchError> {
        let resolved = self.paths.resolve(path)?;
        Ok(tokio::fs::read_to_string(&resolved).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locations_are_classified() {
        assert_eq!(
            SourceLocation::parse("https://gwosc.org/eventapi/jsonfull/allevents/"),
            SourceLocation::Remote("https://gwosc.org/eventapi/jsonfull/allevents/".into())
        );
        assert_eq!(
            SourceLocation::parse("pulsars.json"),
            SourceLocation::LocalFile("pulsars.json".into())
        );
        assert_eq!(
            SourceLocation::parse("scripts/fetch_pulsars.py"),
            SourceLocation::Script("scripts/fetch_pulsars.py".into())
        );
        assert!(!SourceLocation::parse("/tmp/x.xml").is_remote());
    }

    #[test]
    fn data_dir_is_tried_first() {
        let paths = DataPaths::new(Some(PathBuf::from("/opt/dss")));
        let c = paths.candidates(Path::new("pulsars.json"));
        assert_eq!(c[0], PathBuf::from("/opt/dss/pulsars.json"));
        assert_eq!(c[1], PathBuf::from("pulsars.json"));
        assert_eq!(
            paths.preferred(Path::new("pulsars.json")),
            PathBuf::from("/opt/dss/pulsars.json")
        );
    }

    #[test]
    fn missing_file_lists_every_candidate() {
        let paths = DataPaths::default();
        let err = paths
            .resolve(Path::new("definitely/not/here.json"))
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert!(err.to_string().contains("definitely/not/here.json"));
    }
}

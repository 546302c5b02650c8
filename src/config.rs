// src/config.rs
//! Host-supplied configuration: which feeds to poll, where they live, and how often.
//!
//! Keys are camelCase so the same JSON object the dashboard sends can be loaded
//! from disk or posted to `/config`. Every field has a default; a partial object
//! only overrides what it names.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "DSS_CONFIG_PATH";
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 10 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeepSpaceConfig {
    /// Milliseconds between fetch cycles. 0 falls back to the default.
    pub update_interval: u64,
    pub sources: SourceToggles,
    pub api_urls: ApiUrls,
    /// Per-source numeric floor for `intensity`. Null entries are ignored.
    pub min_strength: BTreeMap<String, Option<f64>>,
    /// Bundled FRB dataset used when both FRB URLs fail.
    pub frb_sample: PathBuf,
    /// Extra base directory tried first for relative local paths.
    pub data_dir: Option<PathBuf>,
    pub pulsar_generator: GeneratorConfig,
    /// Interpreter for `.py` source paths.
    pub script_interpreter: String,
    pub request_timeout_ms: u64,
    pub producer_timeout_ms: u64,
}

impl Default for DeepSpaceConfig {
    fn default() -> Self {
        Self {
            update_interval: DEFAULT_UPDATE_INTERVAL_MS,
            sources: SourceToggles::default(),
            api_urls: ApiUrls::default(),
            min_strength: BTreeMap::new(),
            frb_sample: PathBuf::from("data/frb_sample.json"),
            data_dir: None,
            pulsar_generator: GeneratorConfig::default(),
            script_interpreter: "python3".to_string(),
            request_timeout_ms: 30_000,
            producer_timeout_ms: 120_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceToggles {
    pub frb: bool,
    pub gravitational: bool,
    pub pulsar: bool,
    pub apod: bool,
}

impl Default for SourceToggles {
    fn default() -> Self {
        Self {
            frb: true,
            gravitational: true,
            pulsar: false,
            apod: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiUrls {
    pub frb: Option<String>,
    pub frb_backup: Option<String>,
    pub gravitational: Option<String>,
    pub pulsar: Option<String>,
    pub apod: Option<String>,
}

impl Default for ApiUrls {
    fn default() -> Self {
        Self {
            frb: Some("https://chime-frb-open-data.github.io/voevents/voevents.json".into()),
            frb_backup: Some(
                "https://raw.githubusercontent.com/HeRTA/FRBSTATS/main/catalogue.json".into(),
            ),
            gravitational: Some("https://gwosc.org/eventapi/jsonfull/allevents/".into()),
            pulsar: Some("pulsars.json".into()),
            apod: Some("https://api.nasa.gov/planetary/apod?api_key=DEMO_KEY".into()),
        }
    }
}

/// Command that (re)creates the local pulsar file. Runs in the file's directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            program: "python3".into(),
            args: vec!["fetch_pulsars.py".into()],
        }
    }
}

impl DeepSpaceConfig {
    pub fn interval(&self) -> Duration {
        match self.update_interval {
            0 => Duration::from_millis(DEFAULT_UPDATE_INTERVAL_MS),
            ms => Duration::from_millis(ms),
        }
    }

    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        parse_config(&content, ext.as_str())
            .with_context(|| format!("parsing config {}", path.display()))
    }

    /// Load using env var + fallbacks:
    /// 1) $DSS_CONFIG_PATH
    /// 2) config/deepspace.toml
    /// 3) config/deepspace.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            } else {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
        }
        for candidate in ["config/deepspace.toml", "config/deepspace.json"] {
            let p = PathBuf::from(candidate);
            if p.exists() {
                return Self::load_from(&p);
            }
        }
        Ok(Self::default())
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<DeepSpaceConfig> {
    let looks_json = s.trim_start().starts_with('{');
    if hint_ext == "json" || (hint_ext != "toml" && looks_json) {
        if let Ok(v) = serde_json::from_str(s) {
            return Ok(v);
        }
    }
    match toml::from_str(s) {
        Ok(v) => Ok(v),
        Err(toml_err) => serde_json::from_str(s)
            .map_err(|json_err| anyhow!("neither TOML ({toml_err}) nor JSON ({json_err})")),
    }
}

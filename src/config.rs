use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::http::parser::DEFAULT_MAX_BUFFER_SIZE;

/// Environment variable naming an optional YAML config file.
pub const CONFIG_PATH_ENV: &str = "RAWHTTP_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// TCP port to listen on (all interfaces)
    pub port: u16,
    /// Directory the demo `/video` route reads from
    pub assets_dir: PathBuf,
    /// Plain-HTTP base URL the demo `/httpbin/` route relays from
    pub upstream_url: String,
    /// Largest request the read buffer may grow to
    pub max_request_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 42069,
            assets_dir: PathBuf::from("./assets"),
            upstream_url: "http://httpbin.org".to_string(),
            max_request_bytes: DEFAULT_MAX_BUFFER_SIZE,
        }
    }
}

impl Config {
    /// Builds the configuration from an optional YAML file and the environment.
    ///
    /// Environment variables (`PORT`, `ASSETS_DIR`, `UPSTREAM_URL`,
    /// `MAX_REQUEST_BYTES`) win over file values. Problems are logged and the
    /// affected values fall back to defaults.
    pub fn load() -> Self {
        let mut cfg = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_yaml_file(&path).unwrap_or_else(|e| {
                tracing::warn!(path = %path, error = %e, "Ignoring config file");
                Self::default()
            }),
            Err(_) => Self::default(),
        };

        cfg.apply_overrides(|key| std::env::var(key).ok());
        cfg
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("invalid config YAML")
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_yaml_str(&raw)
    }

    /// Applies overrides looked up by environment-variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid PORT"),
            }
        }

        if let Some(dir) = lookup("ASSETS_DIR") {
            self.assets_dir = PathBuf::from(dir);
        }

        if let Some(url) = lookup("UPSTREAM_URL") {
            self.upstream_url = url;
        }

        if let Some(limit) = lookup("MAX_REQUEST_BYTES") {
            match limit.parse() {
                Ok(limit) => self.max_request_bytes = limit,
                Err(_) => tracing::warn!(value = %limit, "Ignoring invalid MAX_REQUEST_BYTES"),
            }
        }
    }

    pub fn upstream(&self) -> anyhow::Result<url::Url> {
        url::Url::parse(&self.upstream_url)
            .with_context(|| format!("invalid upstream URL: {}", self.upstream_url))
    }
}

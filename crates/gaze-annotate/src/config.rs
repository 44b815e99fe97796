//! JSON configuration for annotation runs.

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::run::{MissingImagePolicy, RunOptions};

/// Environment variable overriding [`AnnotateConfig::merged_root`].
pub const MERGED_ROOT_ENV: &str = "MERGED_ROOT";
/// Environment variable overriding [`AnnotateConfig::base_url`].
pub const BASE_URL_ENV: &str = "BASE_URL";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn default_merged_root() -> PathBuf {
    PathBuf::from("merged_images")
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("combined_gazefollow_vat.json")
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_owned()
}

fn default_session_cap() -> usize {
    500
}

fn default_pacing_ms() -> u64 {
    20
}

/// Settings for one annotation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotateConfig {
    /// Directory holding the `gazefollow/` and `vat/` image trees.
    #[serde(default = "default_merged_root")]
    pub merged_root: PathBuf,
    /// Combined GazeFollow/VAT manifest (JSON array of items).
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,
    /// Labeling server base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Image count assumed when the server does not report its session size.
    #[serde(default = "default_session_cap")]
    pub session_cap: usize,
    /// Optional hard limit on the number of images annotated.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Delay between submissions, in milliseconds.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    /// Skip items whose image cannot be resolved instead of aborting.
    #[serde(default)]
    pub skip_missing: bool,
    /// Where to write the JSON annotation report, if anywhere.
    #[serde(default)]
    pub output_path: Option<PathBuf>,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            merged_root: default_merged_root(),
            manifest_path: default_manifest_path(),
            base_url: default_base_url(),
            session_cap: default_session_cap(),
            limit: None,
            pacing_ms: default_pacing_ms(),
            skip_missing: false,
            output_path: None,
        }
    }
}

impl AnnotateConfig {
    /// Defaults with `MERGED_ROOT` and `BASE_URL` applied from the environment.
    pub fn from_env() -> Self {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides through `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(root) = lookup(MERGED_ROOT_ENV).filter(|v| !v.is_empty()) {
            self.merged_root = PathBuf::from(root);
        }
        if let Some(url) = lookup(BASE_URL_ENV).filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
        self
    }

    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Apply the keys present in a JSON config file on top of `self`.
    ///
    /// Keys missing from the file keep their current values, so environment
    /// overrides survive a partial config file.
    pub fn overlay_json(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let overrides: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&raw)?;
        let mut merged = match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        merged.extend(overrides);
        Ok(serde_json::from_value(serde_json::Value::Object(merged))?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Run-loop options derived from this config.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            session_cap: self.session_cap,
            limit: self.limit,
            pacing: Duration::from_millis(self.pacing_ms),
            missing_image: if self.skip_missing {
                MissingImagePolicy::Skip
            } else {
                MissingImagePolicy::Abort
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let cfg: AnnotateConfig = serde_json::from_str("{}").expect("config");
        assert_eq!(cfg, AnnotateConfig::default());
        assert_eq!(cfg.run_options().pacing, Duration::from_millis(20));
        assert_eq!(cfg.run_options().missing_image, MissingImagePolicy::Abort);
    }

    #[test]
    fn env_overrides_root_and_url() {
        let cfg = AnnotateConfig::default().with_env(|key| match key {
            MERGED_ROOT_ENV => Some("/data/merged".to_owned()),
            BASE_URL_ENV => Some("http://labeler:8080".to_owned()),
            _ => None,
        });
        assert_eq!(cfg.merged_root, PathBuf::from("/data/merged"));
        assert_eq!(cfg.base_url, "http://labeler:8080");
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let cfg = AnnotateConfig::default().with_env(|_| Some(String::new()));
        assert_eq!(cfg, AnnotateConfig::default());
    }

    #[test]
    fn overlay_keeps_unset_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{"limit": 7, "pacing_ms": 0}"#).expect("write");

        let base = AnnotateConfig {
            base_url: "http://from-env:9000".to_owned(),
            ..AnnotateConfig::default()
        };
        let cfg = base.overlay_json(&path).expect("overlay");
        assert_eq!(cfg.base_url, "http://from-env:9000");
        assert_eq!(cfg.limit, Some(7));
        assert_eq!(cfg.pacing_ms, 0);
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("annotate.json");
        let cfg = AnnotateConfig {
            limit: Some(3),
            skip_missing: true,
            ..AnnotateConfig::default()
        };
        cfg.write_json(&path).expect("write");
        assert_eq!(AnnotateConfig::load_json(&path).expect("load"), cfg);
    }
}

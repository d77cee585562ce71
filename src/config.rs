use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::gate::{Policy, glob_to_regex};
use crate::inspect::{DEFAULT_MERGE_MARKER, Expectations};
use crate::paths::config_candidates;

/// Settings loaded from `.hm-gitinfo.toml` (or the per-user `config.toml`).
///
/// Every key is optional; missing keys fall back to [`Config::default`].
///
/// Example TOML:
/// ```toml
/// upstream_git       = "git@github.com:tayloredwebsites/healthy-meals.git"
/// upstream_repo_url  = "https://github.com/tayloredwebsites/healthy-meals"
/// anchor_commit      = "5ce0869c5967646a011bc5169e8135303f537a5e"
/// extra_branches     = ["starter"]
/// protected_branches = ["main", "starter", "release/*"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub upstream_git: String,
    pub upstream_repo_url: String,
    pub anchor_commit: String,
    pub merge_marker: String,
    pub main_branch: String,
    pub extra_branches: Vec<String>,
    pub protected_branches: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream_git: String::new(),
            upstream_repo_url: String::new(),
            anchor_commit: String::new(),
            merge_marker: DEFAULT_MERGE_MARKER.to_string(),
            main_branch: "main".to_string(),
            extra_branches: vec!["starter".to_string()],
            protected_branches: vec!["main".to_string(), "starter".to_string()],
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("merge_marker must not be empty")]
    EmptyMergeMarker,
    #[error("main_branch must not be empty")]
    EmptyMainBranch,
    #[error("invalid protected branch pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Values given on the command line; each one replaces the file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub upstream_git: Option<String>,
    pub upstream_repo_url: Option<String>,
    pub anchor_commit: Option<String>,
}

/// A parsed configuration together with the file it came from, if any.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: Option<PathBuf>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.merge_marker.is_empty() {
            return Err(ConfigError::EmptyMergeMarker);
        }
        if self.main_branch.trim().is_empty() {
            return Err(ConfigError::EmptyMainBranch);
        }
        for pat in &self.protected_branches {
            if pat.trim().is_empty() {
                return Err(ConfigError::InvalidPattern {
                    pattern: pat.clone(),
                    reason: "pattern is empty".to_string(),
                });
            }
            glob_to_regex(pat).map_err(|e| ConfigError::InvalidPattern {
                pattern: pat.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    pub fn apply(&mut self, ov: &Overrides) {
        if let Some(v) = &ov.upstream_git {
            self.upstream_git = v.clone();
        }
        if let Some(v) = &ov.upstream_repo_url {
            self.upstream_repo_url = v.clone();
        }
        if let Some(v) = &ov.anchor_commit {
            self.anchor_commit = v.clone();
        }
    }

    pub fn expectations(&self) -> Expectations {
        Expectations {
            upstream_git: self.upstream_git.clone(),
            upstream_repo_url: self.upstream_repo_url.clone(),
            anchor_commit: self.anchor_commit.clone(),
            merge_marker: self.merge_marker.clone(),
            main_branch: self.main_branch.clone(),
            extra_branches: self.extra_branches.clone(),
        }
    }

    pub fn policy(&self) -> Policy {
        Policy {
            protected_branches: self.protected_branches.clone(),
            main_branch: self.main_branch.clone(),
        }
    }
}

/// Parse and validate a single configuration file.
///
/// # Errors
/// - Returns an error if the file cannot be read or is not valid TOML.
/// - Returns an error if validation fails (see [`ConfigError`]).
pub fn parse_config_file(path: &Path) -> Result<Config> {
    let txt = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let cfg: Config = toml::from_str(&txt)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(cfg)
}

/// Load the configuration that applies to the working copy at `repo_dir`.
///
/// The first existing file from [`config_candidates`] wins. When none exists
/// the defaults are returned and `source` is `None`.
pub fn load_config(repo_dir: &Path) -> Result<LoadedConfig> {
    for cand in config_candidates(repo_dir) {
        if cand.is_file() {
            debug!(path = %cand.display(), "loading config");
            let config = parse_config_file(&cand)?;
            return Ok(LoadedConfig {
                config,
                source: Some(cand),
            });
        }
    }
    debug!("no config file found, using defaults");
    Ok(LoadedConfig {
        config: Config::default(),
        source: None,
    })
}

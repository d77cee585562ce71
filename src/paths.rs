use std::{
    env,
    path::{Path, PathBuf},
};

/// File name looked up at the root of the inspected working copy.
pub const REPO_CONFIG_FILE: &str = ".hm-gitinfo.toml";

#[derive(Debug, Clone)]
pub struct Paths {
    pub config: PathBuf,
}

/// Per-user configuration directory (`$XDG_CONFIG_HOME/hm-gitinfo`).
///
/// Falls back to `$HOME/.config/hm-gitinfo` when `XDG_CONFIG_HOME` is unset.
pub fn config_home() -> PathBuf {
    let xdg = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty());
    let base = xdg
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env::var_os("HOME").unwrap_or_default()).join(".config"));
    base.join("hm-gitinfo")
}

pub fn paths() -> Paths {
    Paths {
        config: config_home().join("config.toml"),
    }
}

/// Candidate configuration files in lookup order: the working copy first,
/// then the per-user file.
pub fn config_candidates(repo_dir: &Path) -> Vec<PathBuf> {
    vec![repo_dir.join(REPO_CONFIG_FILE), paths().config]
}

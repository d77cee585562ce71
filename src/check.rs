use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use std::path::PathBuf;
use tracing::debug;

use crate::config::{Config, Overrides, load_config};
use crate::git::open_repo;
use crate::inspect::{RepoStatus, inspect};
use crate::progress::{finish_inspection, inspection_spinner};
use crate::report::{render_status, render_verdict};

/// The working copy to inspect and the command-line overrides for it.
#[derive(Debug, Clone)]
pub struct Target {
    pub repo_dir: PathBuf,
    pub overrides: Overrides,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Readiness {
    /// Pending changes may be committed on this branch
    Commit,
    /// The branch can be opened as a pull request
    Pr,
    /// Clean and caught up with upstream
    NewWork,
}

impl Readiness {
    fn label(self) -> &'static str {
        match self {
            Readiness::Commit => "commit",
            Readiness::Pr => "pull request",
            Readiness::NewWork => "new work",
        }
    }
}

/// Resolve the effective configuration for `target`.
pub fn effective_config(target: &Target) -> Result<(Config, Option<PathBuf>)> {
    let loaded = load_config(&target.repo_dir)?;
    let mut cfg = loaded.config;
    cfg.apply(&target.overrides);
    cfg.validate().context("invalid settings")?;
    Ok((cfg, loaded.source))
}

/// Open the working copy and inspect it behind a spinner.
///
/// # Errors
/// Only when the configuration is unusable or `repo_dir` is not a git
/// repository. Problems with the repository itself land in the returned
/// status.
fn run_inspection(target: &Target, cfg: &Config) -> Result<RepoStatus> {
    let repo = open_repo(&target.repo_dir)?;

    let pb = inspection_spinner(&target.repo_dir);
    let status = inspect(&repo, &cfg.expectations());
    debug!(errors = status.errors.len(), warnings = status.warnings.len(), "inspection done");
    finish_inspection(&pb, &target.repo_dir, status.errors.len());
    Ok(status)
}

/// CLI command: inspect the working copy and print the report.
///
/// # Errors
/// Returns an error (non-zero exit) when any check failed.
pub fn cmd_check(target: &Target, format: Format) -> Result<()> {
    let (cfg, _) = effective_config(target)?;
    let status = run_inspection(target, &cfg)?;

    match format {
        Format::Text => print!("{}", render_status(&status, &target.repo_dir)),
        Format::Json => println!("{}", serde_json::to_string_pretty(&status)?),
    }

    if !status.is_valid() {
        bail!("{} problem(s) found in {}", status.errors.len(), target.repo_dir.display());
    }
    Ok(())
}

/// CLI command: decide whether the working copy is ready for the next step.
///
/// # Errors
/// Returns an error (non-zero exit) when the verdict is "not ready".
pub fn cmd_ready(target: &Target, what: Readiness) -> Result<()> {
    let (cfg, _) = effective_config(target)?;
    let status = run_inspection(target, &cfg)?;
    let policy = cfg.policy();

    let verdict = match what {
        Readiness::Commit => policy.ready_for_commit(&status),
        Readiness::Pr => policy.ready_for_pr(&status),
        Readiness::NewWork => policy.ready_for_new_work(&status),
    };
    print!("{}", render_verdict(what.label(), &verdict));

    if !verdict.ready {
        bail!("not ready for {}", what.label());
    }
    Ok(())
}

/// CLI command: show where settings come from and their effective values.
pub fn cmd_config(target: &Target) -> Result<()> {
    let (cfg, source) = effective_config(target)?;
    match source {
        Some(p) => println!("# config: {}", p.display()),
        None => println!("# config: (defaults, no file found)"),
    }
    print!("{}", toml::to_string_pretty(&cfg)?);
    Ok(())
}

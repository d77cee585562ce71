//! Crate entry point for **hm-gitinfo**.
//!
//! This library checks that a Healthy Meals working copy is a correctly set
//! up clone of a contributor's fork (`origin`) alongside the main project
//! (`upstream`), and summarizes how far it has moved since the last merged
//! pull request. Nothing here modifies the repository.
//!
//! Each submodule encapsulates one responsibility (config parsing, git
//! queries, the inspection itself, readiness policy, console output).
//! The `pub use` re-exports make the commands and core types accessible
//! directly from the crate root.

pub mod account;
mod check;
mod config;
pub mod gate;
mod git;
pub mod inspect;
mod paths;
mod progress;
mod report;
#[cfg(test)]
mod testutil;

pub use account::{Account, PrePersist};
pub use check::{Format, Readiness, Target, cmd_check, cmd_config, cmd_ready};
pub use config::{Config, ConfigError, Overrides, load_config};
pub use gate::{Policy, Verdict};
pub use git::open_repo;
pub use inspect::{Expectations, RepoStatus, inspect};
pub use paths::config_home;

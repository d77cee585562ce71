//! # hm-gitinfo
//!
//! **hm-gitinfo** checks a Healthy Meals working copy before you commit,
//! open a pull request or start new work.
//!
//! Features:
//! - `hm-gitinfo check` inspects remotes, branches, pending changes and the
//!   history since the last merged pull request, and lists every problem found
//! - `hm-gitinfo ready <commit|pr|new-work>` applies the contribution rules
//!   to that inspection
//! - `hm-gitinfo config` prints the effective settings and where they came from
//!
//! This CLI is built with [clap](https://docs.rs/clap).

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use hm_gitinfo::{Format, Overrides, Readiness, Target, cmd_check, cmd_config, cmd_ready};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Command-line interface definition.
#[derive(Parser, Debug)]
#[command(
    name = "hm-gitinfo",
    version,
    about = "hm-gitinfo - check a fork-and-upstream git clone",
    arg_required_else_help = true
)]
struct Cli {
    /// Working copy to inspect
    #[arg(long, global = true, default_value = ".")]
    repo: PathBuf,

    /// Expected connection string of the upstream remote
    #[arg(long, global = true)]
    upstream_git: Option<String>,

    /// Web URL of the upstream project
    #[arg(long, global = true)]
    upstream_url: Option<String>,

    /// Full commit id that must exist on the main branch ("" for an empty repository)
    #[arg(long, global = true)]
    anchor: Option<String>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Option<Cmd>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Cmd {
    /// Inspect the working copy and report every problem found
    Check {
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
    /// Check whether the working copy is ready for the next step
    Ready {
        #[arg(value_enum)]
        what: Readiness,
    },
    /// Show the effective configuration
    Config,
}

/// `RUST_LOG` wins; otherwise the `-v` count picks the level.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(cmd) = cli.cmd else {
        return Ok(());
    };
    let target = Target {
        repo_dir: cli.repo,
        overrides: Overrides {
            upstream_git: cli.upstream_git,
            upstream_repo_url: cli.upstream_url,
            anchor_commit: cli.anchor,
        },
    };

    match cmd {
        Cmd::Check { format } => cmd_check(&target, format),
        Cmd::Ready { what } => cmd_ready(&target, what),
        Cmd::Config => cmd_config(&target),
    }
}

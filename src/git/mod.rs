//! Git integration layer.
//!
//! This module wraps the actual backend implementation (`git2_backend`)
//! and re-exports the read-only queries the inspector needs.
//! Nothing here mutates the repository or talks to the network: remote
//! information comes from refs that were already fetched.

mod git2_backend;

pub use git2_backend::{
    HistoryWalk, count_commits, head_branch, head_commit, is_reachable, modified_paths,
    open_repo, remote_branch_tip, remote_branches, remote_names, remote_url, resolve_commit,
    staged_paths, untracked_paths, walk_until_marker,
};

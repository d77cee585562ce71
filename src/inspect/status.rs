use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Which group a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    /// Missing remote or branch, wrong remote URL.
    Configuration,
    /// Anchor commit missing, malformed or unreachable.
    Resolution,
    /// A query against the repository failed unexpectedly.
    Environment,
}

/// The individual check that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    Anchor,
    CurrentBranch,
    ModifiedFiles,
    UntrackedFiles,
    StagedFiles,
    HeadCommit,
    LocalHistory,
    Remotes,
    RemoteUrl,
    RemoteBranch,
    RemoteHistory,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Check::Anchor => "anchor commit",
            Check::CurrentBranch => "current branch",
            Check::ModifiedFiles => "modified files",
            Check::UntrackedFiles => "untracked files",
            Check::StagedFiles => "staged files",
            Check::HeadCommit => "head commit",
            Check::LocalHistory => "local history",
            Check::Remotes => "remotes",
            Check::RemoteUrl => "remote url",
            Check::RemoteBranch => "remote branch",
            Check::RemoteHistory => "remote history",
        };
        f.write_str(s)
    }
}

/// One failed check. `message` is written for a person: it says what is
/// wrong and, where possible, the commands that fix it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub check: Check,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Working tree changes, gathered by three separate queries.
///
/// A file that is staged and then modified again shows up in both
/// `staged` and `modified`, so [`PendingChanges::total`] counts it twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PendingChanges {
    pub modified: Vec<String>,
    pub untracked: Vec<String>,
    pub staged: Vec<String>,
}

impl PendingChanges {
    pub fn modified_count(&self) -> usize {
        self.modified.len()
    }

    pub fn untracked_count(&self) -> usize {
        self.untracked.len()
    }

    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }

    pub fn total(&self) -> usize {
        self.modified_count() + self.untracked_count() + self.staged_count()
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }
}

/// History of one branch back to (not including) its last merge marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BranchHistory {
    /// `HEAD` for the local walk, `<remote>/<branch>` otherwise.
    pub reference: String,
    pub tip: Option<String>,
    pub commits_since_merge: Vec<String>,
    pub last_merge: Option<String>,
}

/// Snapshot of a working copy produced by [`crate::inspect::inspect`].
///
/// Built fresh on every call and never written back anywhere.
/// `errors` being empty means every check passed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepoStatus {
    pub current_branch: Option<String>,
    pub changes: PendingChanges,
    pub remote_names: BTreeSet<String>,
    pub origin_url: Option<String>,
    pub upstream_url: Option<String>,
    pub branches_by_remote: BTreeMap<String, Vec<String>>,
    pub head_commit_id: Option<String>,
    pub local: BranchHistory,
    pub remote_histories: BTreeMap<String, BranchHistory>,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<String>,
}

impl RepoStatus {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn commits_since_last_merge(&self) -> &[String] {
        &self.local.commits_since_merge
    }

    pub fn last_merge_commit_id(&self) -> Option<&str> {
        self.local.last_merge.as_deref()
    }

    pub fn remote_history(&self, remote: &str, branch: &str) -> Option<&BranchHistory> {
        self.remote_histories.get(&format!("{}/{}", remote, branch))
    }

    pub fn has_remote_branch(&self, remote: &str, branch: &str) -> bool {
        self.branches_by_remote
            .get(remote)
            .is_some_and(|b| b.iter().any(|n| n == branch))
    }

    /// Messages of every recorded error, in the order they were found.
    pub fn error_messages(&self) -> Vec<&str> {
        self.errors.iter().map(|d| d.message.as_str()).collect()
    }

    pub fn errors_for(&self, check: Check) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().filter(move |d| d.check == check)
    }
}

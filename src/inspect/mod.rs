//! Read-only inspection of a fork-and-upstream working copy.
//!
//! [`inspect`] runs every check independently. A failing check is recorded
//! as a [`Diagnostic`] and the remaining checks still run, so one call
//! reports everything that is wrong at once. Whether a non-empty
//! [`RepoStatus::errors`] should stop anything is up to the caller
//! (see [`crate::gate`]).
//!
//! Remote information comes from refs already fetched into the clone; no
//! network access happens here.

mod remotes;
mod status;

use anyhow::Result;
use git2::{Oid, Repository};
use tracing::{debug, error, info, warn};

use crate::git::{self, HistoryWalk};

pub use remotes::repo_name;
pub use status::{BranchHistory, Check, Diagnostic, DiagnosticKind, PendingChanges, RepoStatus};

/// Commit message prefix of merged pull requests on GitHub.
pub const DEFAULT_MERGE_MARKER: &str = "Merge pull request #";

/// Length of a full hexadecimal commit id.
pub const ANCHOR_LEN: usize = 40;

const SHORT_ID_LEN: usize = 7;

pub const ORIGIN: &str = "origin";
pub const UPSTREAM: &str = "upstream";

/// What a correctly set up clone is expected to look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectations {
    /// Connection string of the upstream remote. URL checks are skipped when empty.
    pub upstream_git: String,
    /// Web URL of the upstream project, used in remediation text.
    pub upstream_repo_url: String,
    /// Full commit id that must exist on the main branch. Empty only for a
    /// repository without commits.
    pub anchor_commit: String,
    pub merge_marker: String,
    pub main_branch: String,
    /// Secondary branches walked when present. Their absence is only a warning.
    pub extra_branches: Vec<String>,
}

impl Default for Expectations {
    fn default() -> Self {
        Self {
            upstream_git: String::new(),
            upstream_repo_url: String::new(),
            anchor_commit: String::new(),
            merge_marker: DEFAULT_MERGE_MARKER.to_string(),
            main_branch: "main".to_string(),
            extra_branches: vec!["starter".to_string()],
        }
    }
}

#[derive(Default)]
struct Findings {
    errors: Vec<Diagnostic>,
    warnings: Vec<String>,
}

impl Findings {
    fn error(&mut self, kind: DiagnosticKind, check: Check, message: String) {
        error!(%check, "{}", message);
        self.errors.push(Diagnostic {
            kind,
            check,
            message,
        });
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    /// Keep the value of a successful query, or record the failure as an
    /// environment error for `check`.
    fn record<T>(&mut self, check: Check, res: Result<T>) -> Option<T> {
        match res {
            Ok(v) => Some(v),
            Err(e) => {
                self.error(DiagnosticKind::Environment, check, format!("{check}: {e:#}"));
                None
            }
        }
    }
}

/// Inspect the working copy behind `repo`.
///
/// Never fails: problems end up in [`RepoStatus::errors`] (or `warnings`
/// for optional branches). Calling it twice on an unchanged repository
/// gives equal results.
pub fn inspect(repo: &Repository, exp: &Expectations) -> RepoStatus {
    let mut f = Findings::default();
    let mut status = RepoStatus::default();

    let anchor = check_anchor(repo, exp, &mut f);

    status.current_branch = f.record(Check::CurrentBranch, git::head_branch(repo));
    debug!(current_branch = ?status.current_branch);

    status.changes = PendingChanges {
        modified: f
            .record(Check::ModifiedFiles, git::modified_paths(repo))
            .unwrap_or_default(),
        untracked: f
            .record(Check::UntrackedFiles, git::untracked_paths(repo))
            .unwrap_or_default(),
        staged: f
            .record(Check::StagedFiles, git::staged_paths(repo))
            .unwrap_or_default(),
    };
    debug!(
        modified = ?status.changes.modified,
        untracked = ?status.changes.untracked,
        staged = ?status.changes.staged,
        total = status.changes.total(),
        "pending changes"
    );

    let head = f.record(Check::HeadCommit, git::head_commit(repo)).flatten();
    status.head_commit_id = head.map(|o| o.to_string());
    debug!(head_commit_id = ?status.head_commit_id);

    status.local = walk_branch(repo, "HEAD", head, exp, Check::LocalHistory, &mut f);

    let listed = f.record(Check::Remotes, git::remote_names(repo));
    let remotes_known = listed.is_some();
    status.remote_names = listed.unwrap_or_default().into_iter().collect();
    debug!(remote_names = ?status.remote_names);

    for remote in [ORIGIN, UPSTREAM] {
        if !status.remote_names.contains(remote) {
            if remotes_known {
                let msg = if remote == ORIGIN {
                    remotes::missing_origin(exp)
                } else {
                    remotes::missing_upstream(exp)
                };
                f.error(DiagnosticKind::Configuration, Check::Remotes, msg);
            }
            continue;
        }

        let url = f
            .record(Check::RemoteUrl, git::remote_url(repo, remote))
            .flatten();
        debug!(remote, url = ?url);
        if remote == ORIGIN {
            status.origin_url = url;
        } else {
            status.upstream_url = url;
        }

        let branches = f
            .record(Check::RemoteBranch, git::remote_branches(repo, remote))
            .unwrap_or_default();
        debug!(remote, branches = ?branches);
        status.branches_by_remote.insert(remote.to_string(), branches);
    }

    check_remote_urls(&status, exp, &mut f);

    for remote in [ORIGIN, UPSTREAM] {
        if !status.branches_by_remote.contains_key(remote) {
            continue;
        }

        let main = exp.main_branch.as_str();
        if status.has_remote_branch(remote, main) {
            let hist = walk_remote(repo, remote, main, exp, &mut f);
            if let (Some(anchor), Some(tip)) = (anchor, hist.tip.as_deref()) {
                check_anchor_reachable(repo, anchor, tip, remote, main, &mut f);
            }
            status
                .remote_histories
                .insert(hist.reference.clone(), hist);
        } else {
            let msg = if remote == ORIGIN {
                remotes::missing_origin_branch(exp)
            } else {
                remotes::missing_upstream_branch(exp)
            };
            f.error(DiagnosticKind::Configuration, Check::RemoteBranch, msg);
        }

        for extra in &exp.extra_branches {
            if status.has_remote_branch(remote, extra) {
                let hist = walk_remote(repo, remote, extra, exp, &mut f);
                status
                    .remote_histories
                    .insert(hist.reference.clone(), hist);
            } else {
                f.warn(remotes::missing_extra_branch(remote, extra));
            }
        }
    }

    status.errors = f.errors;
    status.warnings = f.warnings;
    status
}

/// Returns the anchor commit when it resolved to exactly the expected id.
fn check_anchor(repo: &Repository, exp: &Expectations, f: &mut Findings) -> Option<Oid> {
    let anchor = exp.anchor_commit.as_str();
    debug!(anchor, "checking anchor commit");

    if anchor.is_empty() {
        info!("empty anchor commit, repository must have no commits");
        let n = f.record(Check::Anchor, git::count_commits(repo))?;
        debug!(commits = n, "local commits");
        if n != 0 {
            f.error(
                DiagnosticKind::Resolution,
                Check::Anchor,
                format!("repo has {n} commits, but no anchor commit was given"),
            );
        }
        return None;
    }

    let len = anchor.chars().count();
    if len != ANCHOR_LEN {
        f.error(
            DiagnosticKind::Resolution,
            Check::Anchor,
            format!("anchor commit must be {ANCHOR_LEN} characters long, `{anchor}` has {len}"),
        );
        return None;
    }

    let short: String = anchor.chars().take(SHORT_ID_LEN).collect();
    match git::resolve_commit(repo, &short) {
        Ok(oid) => debug!(short = %short, resolved = %oid, "abbreviated anchor"),
        Err(e) => debug!(short = %short, "abbreviated anchor did not resolve: {e:#}"),
    }

    match git::resolve_commit(repo, anchor) {
        Ok(oid) if oid.to_string() == anchor => {
            debug!(resolved = %oid, "anchor commit");
            Some(oid)
        }
        Ok(oid) => {
            let id = oid.to_string();
            let msg = if anchor.to_ascii_lowercase() == id {
                format!("anchor commit {anchor} must be written in lowercase hex ({id})")
            } else {
                format!("anchor commit {anchor} resolves to a different commit ({id})")
            };
            f.error(DiagnosticKind::Resolution, Check::Anchor, msg);
            None
        }
        Err(e) => {
            f.error(
                DiagnosticKind::Resolution,
                Check::Anchor,
                format!("commit with the anchor id {anchor} is not found in this repo ({e:#})"),
            );
            None
        }
    }
}

fn check_anchor_reachable(
    repo: &Repository,
    anchor: Oid,
    tip: &str,
    remote: &str,
    branch: &str,
    f: &mut Findings,
) {
    let Ok(tip) = Oid::from_str(tip) else {
        return;
    };
    if let Some(false) = f.record(Check::Anchor, git::is_reachable(repo, tip, anchor)) {
        f.error(
            DiagnosticKind::Resolution,
            Check::Anchor,
            remotes::anchor_not_on_branch(&anchor.to_string(), remote, branch),
        );
    }
}

fn check_remote_urls(status: &RepoStatus, exp: &Expectations, f: &mut Findings) {
    let expected = exp.upstream_git.trim();

    if let Some(url) = status.upstream_url.as_deref()
        && !expected.is_empty()
        && url != expected
    {
        f.error(
            DiagnosticKind::Configuration,
            Check::RemoteUrl,
            remotes::wrong_upstream_url(exp, url),
        );
    }

    let Some(origin) = status.origin_url.as_deref() else {
        return;
    };
    let same_as = |candidate: &str| {
        !candidate.is_empty() && normalize_url(origin) == normalize_url(candidate)
    };
    if same_as(expected) || same_as(exp.upstream_repo_url.as_str()) {
        f.error(
            DiagnosticKind::Configuration,
            Check::RemoteUrl,
            remotes::origin_is_upstream(exp),
        );
        return;
    }

    let expected_name = repo_name(expected).or_else(|| repo_name(&exp.upstream_repo_url));
    if let Some(name) = expected_name
        && repo_name(origin) != Some(name)
    {
        f.error(
            DiagnosticKind::Configuration,
            Check::RemoteUrl,
            remotes::origin_name_mismatch(origin, name),
        );
    }
}

fn normalize_url(url: &str) -> &str {
    let u = url.trim().trim_end_matches('/');
    u.strip_suffix(".git").unwrap_or(u)
}

fn walk_remote(
    repo: &Repository,
    remote: &str,
    branch: &str,
    exp: &Expectations,
    f: &mut Findings,
) -> BranchHistory {
    let reference = format!("{}/{}", remote, branch);
    let tip = f.record(
        Check::RemoteHistory,
        git::remote_branch_tip(repo, remote, branch),
    );
    walk_branch(repo, &reference, tip, exp, Check::RemoteHistory, f)
}

fn walk_branch(
    repo: &Repository,
    reference: &str,
    tip: Option<Oid>,
    exp: &Expectations,
    check: Check,
    f: &mut Findings,
) -> BranchHistory {
    let mut hist = BranchHistory {
        reference: reference.to_string(),
        tip: tip.map(|o| o.to_string()),
        ..BranchHistory::default()
    };
    let Some(tip) = tip else {
        return hist;
    };
    if let Some(HistoryWalk { commits, marker }) =
        f.record(check, git::walk_until_marker(repo, tip, &exp.merge_marker))
    {
        debug!(
            reference,
            commits_since_merge = commits.len(),
            last_merge = ?marker,
            "history walked"
        );
        hist.commits_since_merge = commits;
        hist.last_merge = marker;
    }
    hist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{
        FORK_GIT, UPSTREAM_GIT, UPSTREAM_URL, commit_file, forked_clone, init_repo, set_remote_ref,
    };
    use std::fs;

    fn expectations(anchor: &str) -> Expectations {
        Expectations {
            upstream_git: UPSTREAM_GIT.into(),
            upstream_repo_url: UPSTREAM_URL.into(),
            anchor_commit: anchor.into(),
            ..Expectations::default()
        }
    }

    fn anchor_errors(s: &RepoStatus) -> usize {
        s.errors_for(Check::Anchor).count()
    }

    #[test]
    fn well_formed_fork_passes() {
        let (_td, repo, anchor) = forked_clone();
        let s = inspect(&repo, &expectations(&anchor.to_string()));
        assert!(s.is_valid(), "unexpected errors: {:?}", s.error_messages());
        assert_eq!(s.current_branch.as_deref(), Some("main"));
        assert_eq!(s.origin_url.as_deref(), Some(FORK_GIT));
        assert_eq!(s.upstream_url.as_deref(), Some(UPSTREAM_GIT));
        assert_eq!(s.branches_by_remote["origin"], vec!["main"]);
        assert!(s.remote_history("upstream", "main").is_some());
    }

    #[test]
    fn empty_anchor_with_commits_is_an_error() {
        let (_td, repo) = init_repo();
        commit_file(&repo, "initial_file", "", "initial commit");
        let s = inspect(&repo, &expectations(""));
        assert_eq!(anchor_errors(&s), 1);
        assert!(!s.is_valid());
    }

    #[test]
    fn empty_anchor_on_empty_repo_is_fine() {
        let (_td, repo) = init_repo();
        let s = inspect(&repo, &expectations(""));
        assert_eq!(anchor_errors(&s), 0);
        assert!(s.head_commit_id.is_none());
        assert!(s.commits_since_last_merge().is_empty());
        assert_eq!(s.current_branch.as_deref(), Some("main"));
    }

    #[test]
    fn anchor_length_must_be_forty() {
        let (_td, repo, anchor) = forked_clone();
        let full = anchor.to_string();
        let too_long = format!("{full}0");
        for bad in [&full[..7], &full[..39], "zz", too_long.as_str()] {
            let s = inspect(&repo, &expectations(bad));
            let msgs: Vec<_> = s.errors_for(Check::Anchor).collect();
            assert_eq!(msgs.len(), 1, "anchor {bad}");
            assert!(msgs[0].message.contains("40 characters"));
            assert_eq!(msgs[0].kind, DiagnosticKind::Resolution);
        }
    }

    #[test]
    fn unknown_anchor_is_reported() {
        let (_td, repo, _) = forked_clone();
        let s = inspect(&repo, &expectations(&"0123456789".repeat(4)));
        let msgs: Vec<_> = s.errors_for(Check::Anchor).collect();
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].message.contains("not found"));
    }

    #[test]
    fn uppercase_anchor_asks_for_lowercase() {
        let (_td, repo, anchor) = forked_clone();
        let upper = anchor.to_string().to_ascii_uppercase();
        let s = inspect(&repo, &expectations(&upper));
        let msgs: Vec<_> = s.errors_for(Check::Anchor).collect();
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].message.contains("lowercase hex"));
        assert!(!msgs[0].message.contains("different commit"));
    }

    #[test]
    fn remote_walks_are_independent() {
        let (_td, repo, anchor) = forked_clone();
        let merge = repo.head().unwrap().target().unwrap();
        let c3 = commit_file(&repo, "c.txt", "3", "pushed one");
        let c4 = commit_file(&repo, "d.txt", "4", "pushed two");
        set_remote_ref(&repo, "origin", "main", c4);

        let s = inspect(&repo, &expectations(&anchor.to_string()));
        assert!(s.is_valid(), "unexpected errors: {:?}", s.error_messages());

        let origin = s.remote_history("origin", "main").unwrap();
        assert_eq!(origin.tip, Some(c4.to_string()));
        assert_eq!(origin.commits_since_merge, vec![c4.to_string(), c3.to_string()]);
        assert_eq!(origin.last_merge, Some(merge.to_string()));

        let upstream = s.remote_history("upstream", "main").unwrap();
        assert_eq!(upstream.tip, Some(merge.to_string()));
        assert!(upstream.commits_since_merge.is_empty());
        assert_eq!(upstream.last_merge, origin.last_merge);
    }

    #[test]
    fn default_extra_branches_include_starter() {
        assert_eq!(Expectations::default().extra_branches, vec!["starter"]);
    }

    #[test]
    fn anchor_must_be_on_remote_main() {
        let (_td, repo, _) = forked_clone();
        // a local commit the remotes have never seen
        let local_only = commit_file(&repo, "local.txt", "x", "local work");
        let s = inspect(&repo, &expectations(&local_only.to_string()));
        let msgs: Vec<_> = s.errors_for(Check::Anchor).collect();
        assert_eq!(msgs.len(), 2);
        assert!(msgs.iter().any(|d| d.message.contains("origin/main")));
        assert!(msgs.iter().any(|d| d.message.contains("upstream/main")));
    }

    #[test]
    fn clean_repo_has_no_pending_changes() {
        let (_td, repo, anchor) = forked_clone();
        let s = inspect(&repo, &expectations(&anchor.to_string()));
        assert_eq!(s.changes.modified_count(), 0);
        assert_eq!(s.changes.untracked_count(), 0);
        assert_eq!(s.changes.staged_count(), 0);
        assert_eq!(s.changes.total(), 0);
    }

    #[test]
    fn staged_and_modified_file_counts_twice() {
        let (td, repo, anchor) = forked_clone();
        fs::write(td.path().join("app.txt"), "v2").unwrap();
        let mut idx = repo.index().unwrap();
        idx.add_path(std::path::Path::new("app.txt")).unwrap();
        idx.write().unwrap();
        fs::write(td.path().join("app.txt"), "v3 edited again").unwrap();
        fs::write(td.path().join("notes.txt"), "n").unwrap();

        let s = inspect(&repo, &expectations(&anchor.to_string()));
        assert_eq!(s.changes.modified_count(), 1);
        assert_eq!(s.changes.staged_count(), 1);
        assert_eq!(s.changes.untracked_count(), 1);
        assert_eq!(s.changes.total(), 3);
    }

    #[test]
    fn inspection_is_repeatable() {
        let (_td, repo, anchor) = forked_clone();
        commit_file(&repo, "b.txt", "b", "more work");
        let exp = expectations(&anchor.to_string());
        assert_eq!(inspect(&repo, &exp), inspect(&repo, &exp));
    }

    #[test]
    fn missing_upstream_then_added() {
        let (_td, repo) = init_repo();
        let anchor = commit_file(&repo, "a", "1", "initial commit");
        repo.remote("origin", FORK_GIT).unwrap();
        set_remote_ref(&repo, "origin", "main", anchor);
        let exp = expectations(&anchor.to_string());

        let s = inspect(&repo, &exp);
        let remote_errs: Vec<_> = s.errors_for(Check::Remotes).collect();
        assert_eq!(remote_errs.len(), 1);
        assert!(remote_errs[0].message.contains("upstream"));
        assert!(remote_errs[0].message.contains("git remote add upstream"));

        repo.remote("upstream", UPSTREAM_GIT).unwrap();
        let s = inspect(&repo, &exp);
        assert_eq!(s.errors_for(Check::Remotes).count(), 0);
        // fetched refs are still missing
        assert!(
            s.errors_for(Check::RemoteBranch)
                .any(|d| d.message.contains("upstream/main"))
        );
    }

    #[test]
    fn missing_origin_is_its_own_error() {
        let (_td, repo) = init_repo();
        let anchor = commit_file(&repo, "a", "1", "initial commit");
        let s = inspect(&repo, &expectations(&anchor.to_string()));
        let msgs: Vec<_> = s.errors_for(Check::Remotes).collect();
        assert_eq!(msgs.len(), 2);
        assert!(msgs[0].message.contains("'origin'"));
        assert!(msgs[1].message.contains("'upstream'"));
    }

    #[test]
    fn lowercase_merge_message_is_not_a_marker() {
        let (_td, repo) = init_repo();
        let c1 = commit_file(&repo, "a", "1", "merge pull request #1 from x/y");
        let c2 = commit_file(&repo, "b", "2", "second");
        let s = inspect(&repo, &expectations(""));
        assert_eq!(s.last_merge_commit_id(), None);
        assert_eq!(
            s.commits_since_last_merge(),
            &[c2.to_string(), c1.to_string()]
        );
    }

    #[test]
    fn local_walk_stops_at_last_merge() {
        let (_td, repo, anchor) = forked_clone();
        let c = commit_file(&repo, "feature.txt", "f", "add feature");
        let s = inspect(&repo, &expectations(&anchor.to_string()));
        assert_eq!(s.commits_since_last_merge(), &[c.to_string()]);
        let up = s.remote_history("upstream", "main").unwrap();
        assert!(up.commits_since_merge.is_empty());
        assert_eq!(up.last_merge.as_deref(), s.last_merge_commit_id());
    }

    #[test]
    fn custom_marker_is_honoured() {
        let (_td, repo) = init_repo();
        let m = commit_file(&repo, "a", "1", "Merged PR 12: thing");
        commit_file(&repo, "b", "2", "after");
        let exp = Expectations {
            merge_marker: "Merged PR ".into(),
            ..expectations("")
        };
        let s = inspect(&repo, &exp);
        assert_eq!(s.last_merge_commit_id(), Some(m.to_string().as_str()));
    }

    #[test]
    fn wrong_upstream_url_is_reported() {
        let (_td, repo, anchor) = forked_clone();
        repo.remote_set_url("upstream", "git@github.com:someone/else.git")
            .unwrap();
        let s = inspect(&repo, &expectations(&anchor.to_string()));
        let msgs: Vec<_> = s.errors_for(Check::RemoteUrl).collect();
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].message.contains("git remote remove upstream"));
    }

    #[test]
    fn origin_pointing_at_upstream_is_reported() {
        let (_td, repo, anchor) = forked_clone();
        repo.remote_set_url("origin", UPSTREAM_URL).unwrap();
        let s = inspect(&repo, &expectations(&anchor.to_string()));
        let msgs: Vec<_> = s.errors_for(Check::RemoteUrl).collect();
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].message.contains("upstream repository itself"));
    }

    #[test]
    fn origin_with_other_name_is_reported() {
        let (_td, repo, anchor) = forked_clone();
        repo.remote_set_url("origin", "git@github.com:contributor/other.git")
            .unwrap();
        let s = inspect(&repo, &expectations(&anchor.to_string()));
        assert!(
            s.errors_for(Check::RemoteUrl)
                .any(|d| d.message.contains("not a fork"))
        );
    }

    #[test]
    fn extra_branches_only_warn() {
        let (_td, repo, anchor) = forked_clone();
        let tip = repo.head().unwrap().target().unwrap();
        set_remote_ref(&repo, "origin", "starter", tip);
        let exp = Expectations {
            extra_branches: vec!["starter".into()],
            ..expectations(&anchor.to_string())
        };
        let s = inspect(&repo, &exp);
        assert!(s.is_valid());
        assert!(s.remote_history("origin", "starter").is_some());
        assert_eq!(s.warnings.len(), 1);
        assert!(s.warnings[0].contains("upstream/starter"));
    }

    #[test]
    fn detached_head_does_not_stop_other_checks() {
        let (_td, repo, anchor) = forked_clone();
        let tip = repo.head().unwrap().target().unwrap();
        repo.set_head_detached(tip).unwrap();
        let s = inspect(&repo, &expectations(&anchor.to_string()));

        assert!(s.current_branch.is_none());
        let msgs: Vec<_> = s.errors_for(Check::CurrentBranch).collect();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].kind, DiagnosticKind::Environment);
        assert_eq!(s.head_commit_id, Some(tip.to_string()));
        assert_eq!(s.errors.len(), 1);
    }
}

use regex::Regex;
use serde::Serialize;

use crate::inspect::{RepoStatus, UPSTREAM};

/// Caller-side rules deciding whether an inspected clone may move on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    /// Branch name patterns (`*` matches anything) nobody should commit to directly.
    pub protected_branches: Vec<String>,
    pub main_branch: String,
}

/// Outcome of a readiness evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub ready: bool,
    /// Why the clone is not ready, with the commands that help.
    pub reasons: Vec<String>,
}

impl Verdict {
    fn from_reasons(reasons: Vec<String>) -> Self {
        Self {
            ready: reasons.is_empty(),
            reasons,
        }
    }
}

/// Convert a branch pattern into an anchored regular expression.
/// Supported:
/// - `*` → `.*`
///
/// Every other character is matched literally.
pub fn glob_to_regex(pat: &str) -> Result<Regex, regex::Error> {
    let mut s = String::from("^");
    for (i, part) in pat.split('*').enumerate() {
        if i > 0 {
            s.push_str(".*");
        }
        s.push_str(&regex::escape(part));
    }
    s.push('$');
    Regex::new(&s)
}

impl Policy {
    /// Invalid patterns never match; they are rejected when the config is loaded.
    pub fn is_protected(&self, branch: &str) -> bool {
        self.protected_branches
            .iter()
            .filter_map(|p| glob_to_regex(p).ok())
            .any(|re| re.is_match(branch))
    }

    /// May the pending changes be committed on the current branch?
    pub fn ready_for_commit(&self, status: &RepoStatus) -> Verdict {
        let mut reasons = config_problems(status);
        if let Some(branch) = self.protected_current_branch(status)
            && !status.changes.is_clean()
        {
            reasons.push(format!(
                "you have {n} pending changes on the protected branch '{branch}'.
    Move them to a new branch before committing:
        git switch -c <new-branch-name>",
                n = status.changes.total()
            ));
        }
        Verdict::from_reasons(reasons)
    }

    /// Is the current branch ready to become a pull request against upstream?
    pub fn ready_for_pr(&self, status: &RepoStatus) -> Verdict {
        let mut reasons = config_problems(status);
        if let Some(branch) = self.protected_current_branch(status) {
            reasons.push(format!(
                "pull requests cannot come from the protected branch '{branch}'.
    Create a branch for your work:
        git switch -c <new-branch-name>"
            ));
        }
        if status.commits_since_last_merge().is_empty() {
            reasons.push("there are no commits since the last merged pull request".to_string());
        }
        if let Some(r) = self.stale_merge(status) {
            reasons.push(r);
        }
        Verdict::from_reasons(reasons)
    }

    /// Is the clone clean and caught up with upstream, so new work can start?
    pub fn ready_for_new_work(&self, status: &RepoStatus) -> Verdict {
        let mut reasons = config_problems(status);
        if !status.changes.is_clean() {
            reasons.push(format!(
                "there are {} pending changes; commit or stash them first",
                status.changes.total()
            ));
        }
        if let Some(r) = self.stale_merge(status) {
            reasons.push(r);
        }
        Verdict::from_reasons(reasons)
    }

    fn protected_current_branch<'a>(&self, status: &'a RepoStatus) -> Option<&'a str> {
        status
            .current_branch
            .as_deref()
            .filter(|b| self.is_protected(b))
    }

    /// The local branch must contain the last pull request merged upstream.
    fn stale_merge(&self, status: &RepoStatus) -> Option<String> {
        let upstream = status.remote_history(UPSTREAM, &self.main_branch)?;
        let theirs = upstream.last_merge.as_deref()?;
        if status.last_merge_commit_id() == Some(theirs) {
            return None;
        }
        Some(format!(
            "your branch does not start from the last pull request merged into {UPSTREAM}/{main} ({theirs}).
    Bring it up to date:
        git pull --rebase {UPSTREAM} {main}",
            main = self.main_branch
        ))
    }
}

fn config_problems(status: &RepoStatus) -> Vec<String> {
    if status.is_valid() {
        return Vec::new();
    }
    vec![format!(
        "the repository failed {} configuration checks; run `hm-gitinfo check` for details",
        status.errors.len()
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::{BranchHistory, Check, Diagnostic, DiagnosticKind};

    fn policy() -> Policy {
        Policy {
            protected_branches: vec!["main".into(), "starter".into(), "release/*".into()],
            main_branch: "main".into(),
        }
    }

    fn status_on(branch: &str) -> RepoStatus {
        let merge = "m".repeat(40);
        let mut s = RepoStatus {
            current_branch: Some(branch.into()),
            ..RepoStatus::default()
        };
        s.local = BranchHistory {
            reference: "HEAD".into(),
            tip: Some("c".repeat(40)),
            commits_since_merge: vec!["c".repeat(40)],
            last_merge: Some(merge.clone()),
        };
        s.remote_histories.insert(
            "upstream/main".into(),
            BranchHistory {
                reference: "upstream/main".into(),
                tip: Some(merge.clone()),
                commits_since_merge: vec![],
                last_merge: Some(merge),
            },
        );
        s
    }

    #[test]
    fn glob_patterns_are_anchored() {
        let re = glob_to_regex("release/*").unwrap();
        assert!(re.is_match("release/1.0"));
        assert!(!re.is_match("prerelease/1.0"));
        assert!(glob_to_regex("a.b").unwrap().is_match("a.b"));
        assert!(!glob_to_regex("a.b").unwrap().is_match("axb"));
    }

    #[test]
    fn protected_branch_with_changes_blocks_commit() {
        let mut s = status_on("main");
        assert!(policy().ready_for_commit(&s).ready);

        s.changes.untracked.push("new.txt".into());
        let v = policy().ready_for_commit(&s);
        assert!(!v.ready);
        assert!(v.reasons[0].contains("git switch -c"));

        let mut feature = status_on("feature/x");
        feature.changes.untracked.push("new.txt".into());
        assert!(policy().ready_for_commit(&feature).ready);
    }

    #[test]
    fn config_errors_block_everything() {
        let mut s = status_on("feature/x");
        s.errors.push(Diagnostic {
            kind: DiagnosticKind::Configuration,
            check: Check::Remotes,
            message: "missing upstream".into(),
        });
        let p = policy();
        assert!(!p.ready_for_commit(&s).ready);
        assert!(!p.ready_for_pr(&s).ready);
        assert!(!p.ready_for_new_work(&s).ready);
    }

    #[test]
    fn pr_needs_commits_and_current_merge() {
        let p = policy();
        assert!(p.ready_for_pr(&status_on("feature/x")).ready);
        assert!(!p.ready_for_pr(&status_on("release/2")).ready);

        let mut empty = status_on("feature/x");
        empty.local.commits_since_merge.clear();
        assert!(!p.ready_for_pr(&empty).ready);

        let mut stale = status_on("feature/x");
        stale.local.last_merge = Some("o".repeat(40));
        let v = p.ready_for_pr(&stale);
        assert!(!v.ready);
        assert!(v.reasons.iter().any(|r| r.contains("git pull --rebase upstream main")));
    }

    #[test]
    fn new_work_needs_clean_tree() {
        let p = policy();
        let mut s = status_on("main");
        assert!(p.ready_for_new_work(&s).ready);
        s.changes.modified.push("a".into());
        assert!(!p.ready_for_new_work(&s).ready);
    }
}

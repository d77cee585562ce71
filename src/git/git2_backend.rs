use anyhow::{Context, Result, anyhow};
use git2::{
    BranchType, DiffOptions, ErrorCode, Oid, Repository, Sort, Status, StatusOptions, Tree,
};
use std::path::Path;
use tracing::trace;

/// Commits collected while walking back from a tip towards the last merge marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryWalk {
    /// Ids in walk order (newest first), excluding the marker commit.
    pub commits: Vec<String>,
    /// Id of the first commit whose message starts with the marker.
    pub marker: Option<String>,
}

/// Open an existing working copy.
///
/// # Errors
/// Returns an error if `path` is not a git repository.
pub fn open_repo(path: &Path) -> Result<Repository> {
    Repository::open(path).with_context(|| format!("git open {}", path.display()))
}

/// Tip of HEAD, or `None` while HEAD is unborn (no commits yet).
pub fn head_commit(repo: &Repository) -> Result<Option<Oid>> {
    match repo.head() {
        Ok(head) => Ok(Some(head.peel_to_commit()?.id())),
        Err(e) if e.code() == ErrorCode::UnbornBranch => Ok(None),
        Err(e) => Err(e).context("read HEAD"),
    }
}

fn head_tree(repo: &Repository) -> Result<Option<Tree<'_>>> {
    match repo.head() {
        Ok(head) => Ok(Some(head.peel_to_tree()?)),
        Err(e) if e.code() == ErrorCode::UnbornBranch => Ok(None),
        Err(e) => Err(e).context("read HEAD"),
    }
}

/// Number of commits reachable from HEAD. Zero for an unborn HEAD.
pub fn count_commits(repo: &Repository) -> Result<usize> {
    let Some(tip) = head_commit(repo)? else {
        return Ok(0);
    };
    let mut walk = repo.revwalk()?;
    walk.push(tip)?;
    let mut n = 0;
    for oid in walk {
        oid?;
        n += 1;
    }
    Ok(n)
}

/// Resolve a revision (full or abbreviated id, ref name) to a commit id.
pub fn resolve_commit(repo: &Repository, rev: &str) -> Result<Oid> {
    let obj = repo
        .revparse_single(rev)
        .with_context(|| format!("rev not found: {}", rev))?;
    let commit = obj
        .peel_to_commit()
        .map_err(|_| anyhow!("rev didn't peel to a commit: {}", rev))?;
    Ok(commit.id())
}

/// Name of the branch HEAD points at.
///
/// Reads the symbolic target directly so an unborn branch still has a name.
///
/// # Errors
/// Returns an error when HEAD is detached.
pub fn head_branch(repo: &Repository) -> Result<String> {
    let head = repo.find_reference("HEAD").context("find HEAD")?;
    match head.symbolic_target() {
        Some(target) => Ok(target
            .strip_prefix("refs/heads/")
            .unwrap_or(target)
            .to_string()),
        None => {
            let at = head
                .target()
                .map(|o| o.to_string())
                .unwrap_or_else(|| "an unknown commit".to_string());
            Err(anyhow!("HEAD is detached at {}, no branch is checked out", at))
        }
    }
}

/// Paths with unstaged modifications (index compared to the working tree).
pub fn modified_paths(repo: &Repository) -> Result<Vec<String>> {
    let diff = repo
        .diff_index_to_workdir(None, None)
        .context("diff index to workdir")?;
    Ok(delta_paths(&diff))
}

/// Files git does not track yet, recursing into untracked directories.
pub fn untracked_paths(repo: &Repository) -> Result<Vec<String>> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false);
    let statuses = repo.statuses(Some(&mut opts)).context("git status")?;
    Ok(statuses
        .iter()
        .filter(|e| e.status().contains(Status::WT_NEW))
        .filter_map(|e| e.path().map(str::to_string))
        .collect())
}

/// Paths staged for the next commit (HEAD tree compared to the index).
///
/// With an unborn HEAD every index entry counts as staged.
pub fn staged_paths(repo: &Repository) -> Result<Vec<String>> {
    let tree = head_tree(repo)?;
    let mut opts = DiffOptions::new();
    let diff = repo
        .diff_tree_to_index(tree.as_ref(), None, Some(&mut opts))
        .context("diff HEAD to index")?;
    Ok(delta_paths(&diff))
}

fn delta_paths(diff: &git2::Diff<'_>) -> Vec<String> {
    diff.deltas()
        .filter_map(|d| {
            d.old_file()
                .path()
                .or_else(|| d.new_file().path())
                .map(|p| p.to_string_lossy().into_owned())
        })
        .collect()
}

pub fn remote_names(repo: &Repository) -> Result<Vec<String>> {
    let remotes = repo.remotes().context("list remotes")?;
    Ok(remotes.iter().flatten().map(str::to_string).collect())
}

/// Configured fetch URL of `name`. `None` if the URL is not valid UTF-8.
pub fn remote_url(repo: &Repository, name: &str) -> Result<Option<String>> {
    let remote = repo
        .find_remote(name)
        .with_context(|| format!("find remote {}", name))?;
    Ok(remote.url().map(str::to_string))
}

/// Locally known branches of `remote`, as short names (`main`, not
/// `origin/main`), sorted. The symbolic `HEAD` entry is skipped.
///
/// Only refs already fetched into `refs/remotes/<remote>/` are seen.
pub fn remote_branches(repo: &Repository, remote: &str) -> Result<Vec<String>> {
    let prefix = format!("{}/", remote);
    let mut out = Vec::new();
    for b in repo.branches(Some(BranchType::Remote))? {
        let (branch, _) = b?;
        let Some(name) = branch.name()? else {
            continue;
        };
        if let Some(short) = name.strip_prefix(&prefix)
            && short != "HEAD"
        {
            out.push(short.to_string());
        }
    }
    out.sort();
    Ok(out)
}

/// Commit at the tip of `refs/remotes/<remote>/<branch>`.
pub fn remote_branch_tip(repo: &Repository, remote: &str, branch: &str) -> Result<Oid> {
    let name = format!("refs/remotes/{}/{}", remote, branch);
    let commit = repo
        .find_reference(&name)
        .with_context(|| format!("find {}", name))?
        .peel_to_commit()?;
    Ok(commit.id())
}

/// `true` when `ancestor` is `tip` itself or reachable from it.
pub fn is_reachable(repo: &Repository, tip: Oid, ancestor: Oid) -> Result<bool> {
    if tip == ancestor {
        return Ok(true);
    }
    repo.graph_descendant_of(tip, ancestor)
        .context("compare commit ancestry")
}

/// Walk history from `start` in git's default (reverse chronological) order
/// until a commit whose raw message starts with `marker`.
///
/// The match is a case-sensitive byte prefix on the full message. If no
/// commit matches, the whole history is collected and `marker` stays `None`.
pub fn walk_until_marker(repo: &Repository, start: Oid, marker: &str) -> Result<HistoryWalk> {
    let mut walk = repo.revwalk()?;
    walk.set_sorting(Sort::NONE)?;
    walk.push(start)?;

    let mut out = HistoryWalk::default();
    for oid in walk {
        let oid = oid?;
        let commit = repo.find_commit(oid)?;
        if commit.message_raw_bytes().starts_with(marker.as_bytes()) {
            trace!(commit = %oid, "merge marker found");
            out.marker = Some(oid.to_string());
            break;
        }
        trace!(commit = %oid, "commit after last merge");
        out.commits.push(oid.to_string());
    }
    Ok(out)
}

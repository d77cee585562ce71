//! Fixture repositories for unit tests. Nothing here touches the network:
//! remote-tracking refs are written directly under `refs/remotes/`.

use git2::{Oid, Repository, RepositoryInitOptions, Signature};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const UPSTREAM_GIT: &str = "git@github.com:tayloredwebsites/healthy-meals.git";
pub const UPSTREAM_URL: &str = "https://github.com/tayloredwebsites/healthy-meals";
pub const FORK_GIT: &str = "git@github.com:contributor/healthy-meals.git";

/// Empty repository whose unborn HEAD points at `main`.
pub fn init_repo() -> (TempDir, Repository) {
    let td = tempfile::tempdir().unwrap();
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    let repo = Repository::init_opts(td.path(), &opts).unwrap();
    (td, repo)
}

/// Write `name`, stage it and commit on top of HEAD.
pub fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) -> Oid {
    let root = repo.workdir().unwrap();
    fs::write(root.join(name), content).unwrap();

    let mut idx = repo.index().unwrap();
    idx.add_path(Path::new(name)).unwrap();
    idx.write().unwrap();
    let tree_id = idx.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let sig = Signature::now("Tester", "tester@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

/// Pretend `<remote>/<branch>` was fetched and points at `oid`.
pub fn set_remote_ref(repo: &Repository, remote: &str, branch: &str, oid: Oid) {
    repo.reference(
        &format!("refs/remotes/{}/{}", remote, branch),
        oid,
        true,
        "test fixture",
    )
    .unwrap();
}

/// A fork clone with `origin` and `upstream` remotes, both `main` branches
/// fetched at the current HEAD. Returns the anchor (first) commit id.
pub fn forked_clone() -> (TempDir, Repository, Oid) {
    let (td, repo) = init_repo();
    let anchor = commit_file(&repo, "README.md", "hm", "initial commit");
    let merge = commit_file(
        &repo,
        "app.txt",
        "v1",
        "Merge pull request #1 from contributor/feature",
    );
    repo.remote("origin", FORK_GIT).unwrap();
    repo.remote("upstream", UPSTREAM_GIT).unwrap();
    set_remote_ref(&repo, "origin", "main", merge);
    set_remote_ref(&repo, "upstream", "main", merge);
    (td, repo, anchor)
}

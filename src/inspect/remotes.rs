//! Remote URL helpers and the remediation text shown for remote problems.

use super::Expectations;

/// Repository name from a connection string or web URL.
///
/// `git@github.com:me/healthy-meals.git` and
/// `https://github.com/me/healthy-meals/` both give `healthy-meals`.
pub fn repo_name(url: &str) -> Option<&str> {
    let trimmed = url.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    let name = trimmed.rsplit(|c: char| c == '/' || c == ':').next()?;
    (!name.is_empty()).then_some(name)
}

fn or_placeholder<'a>(v: &'a str, placeholder: &'a str) -> &'a str {
    if v.is_empty() { placeholder } else { v }
}

fn upstream_git(exp: &Expectations) -> &str {
    or_placeholder(&exp.upstream_git, "<upstream connection string>")
}

fn upstream_url(exp: &Expectations) -> &str {
    or_placeholder(&exp.upstream_repo_url, "<upstream repository url>")
}

pub fn missing_origin(exp: &Expectations) -> String {
    format!(
        "remotes do not have a remote named 'origin' configured.
    This working copy should be a clone of your fork of {url}.
    Clone your fork and work from there:
        git clone <your fork connection string>",
        url = upstream_url(exp)
    )
}

pub fn missing_upstream(exp: &Expectations) -> String {
    format!(
        "You are missing your 'upstream' remote.
    Run the following from the repository root:
        git remote add upstream {git}
    When done, refresh all remotes and their branches:
        git fetch --all --prune
    Then please try again.",
        git = upstream_git(exp)
    )
}

pub fn wrong_upstream_url(exp: &Expectations, actual: &str) -> String {
    format!(
        "Your 'upstream' remote is not pointing to '{git}'.
    It is currently pointing to: '{actual}'
    The following commands should fix it:
        git remote remove upstream
        git remote add upstream {git}
        git fetch --all --prune",
        git = upstream_git(exp)
    )
}

pub fn origin_is_upstream(exp: &Expectations) -> String {
    format!(
        "Your 'origin' remote points at the upstream repository itself.
    'origin' should be your fork of {url}, so pull requests come from your copy.
    Fork the repository, then point 'origin' at the fork:
        git remote set-url origin <your fork connection string>
        git fetch --all --prune",
        url = upstream_url(exp)
    )
}

pub fn origin_name_mismatch(origin: &str, expected: &str) -> String {
    format!(
        "Your 'origin' remote ({origin}) is not a fork of '{expected}'.
    The repository names differ. Point 'origin' at your fork:
        git remote set-url origin <your fork connection string>"
    )
}

pub fn missing_origin_branch(exp: &Expectations) -> String {
    format!(
        "System Error!!! - You are missing your origin/{main} branch!!!!
    Did you create this repo doing a git clone of your fork of {url} ?
    To do this,
        1) go to {url}
        2) click the fork button (upper right below top navigation)
        3) unclick the 'copy the {main} branch only' checkbox
        4) click the Create fork button
        5) from your forked copy, get the git connection string:
            5a) click the green Code button on the upper right
            5b) copy the SSH (or other if you prefer) clone connection string
        6) in the console of your computer
            6a) navigate to the directory where you keep cloned repos
            6b) run (where <paste> is the connection string):
                git clone <paste>
            6c) cd into the newly created directory
            6d) add the upstream remote:
                git remote add upstream {git}
            6e) refresh all remotes and their branches:
                git fetch --all --prune",
        main = exp.main_branch,
        url = upstream_url(exp),
        git = upstream_git(exp),
    )
}

pub fn missing_upstream_branch(exp: &Expectations) -> String {
    format!(
        "System Error!!! - You are missing your upstream/{main} branch!!!!
    Did you create this repo doing a git clone of your fork of {git} ???
    Refresh all remotes and their branches, then try again:
        git fetch --all --prune",
        main = exp.main_branch,
        git = upstream_git(exp),
    )
}

pub fn missing_extra_branch(remote: &str, branch: &str) -> String {
    format!(
        "You are missing your {remote}/{branch} branch.
    You will not be able to make changes to the {branch} branch unless you fetch it:
        git fetch --all --prune"
    )
}

pub fn anchor_not_on_branch(anchor: &str, remote: &str, branch: &str) -> String {
    format!(
        "commit {anchor} is not in the history of {remote}/{branch}.
    This clone may not descend from the expected project.
    If {remote}/{branch} is stale, refresh it:
        git fetch --all --prune"
    )
}

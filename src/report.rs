use colored::Colorize;
use std::fmt::Write as _;
use std::path::Path;

use crate::gate::Verdict;
use crate::inspect::{BranchHistory, DiagnosticKind, RepoStatus};

const NONE: &str = "(none)";

fn short(id: &str) -> &str {
    id.get(..7).unwrap_or(id)
}

fn kind_label(kind: DiagnosticKind) -> &'static str {
    match kind {
        DiagnosticKind::Configuration => "configuration",
        DiagnosticKind::Resolution => "resolution",
        DiagnosticKind::Environment => "environment",
    }
}

fn history_line(out: &mut String, h: &BranchHistory) {
    let n = h.commits_since_merge.len();
    let merge = h.last_merge.as_deref().map(short).unwrap_or(NONE);
    let _ = writeln!(
        out,
        "    {:<18} {} commit{} since last merge {}",
        h.reference,
        n,
        if n == 1 { "" } else { "s" },
        merge.dimmed()
    );
}

/// Render an inspection result as the console report.
///
/// Example output:
/// ```text
/// Repository: /home/me/healthy-meals
///   branch:   feature/login
///   head:     3f2a9c1
///   changes:  1 modified, 0 untracked, 1 staged (2 total)
///   remotes:
///     origin     git@github.com:me/healthy-meals.git [main, starter]
///     upstream   git@github.com:tayloredwebsites/healthy-meals.git [main]
///   history:
///     HEAD               2 commits since last merge 9be01d4
///     origin/main        0 commits since last merge 9be01d4
/// ✔ all checks passed
/// ```
pub fn render_status(status: &RepoStatus, repo_dir: &Path) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "Repository:".bold(), repo_dir.display());

    let branch = status.current_branch.as_deref().unwrap_or(NONE);
    let _ = writeln!(out, "  branch:   {}", branch.cyan());
    let head = status.head_commit_id.as_deref().map(short).unwrap_or(NONE);
    let _ = writeln!(out, "  head:     {}", head);

    let c = &status.changes;
    let _ = writeln!(
        out,
        "  changes:  {} modified, {} untracked, {} staged ({} total)",
        c.modified_count(),
        c.untracked_count(),
        c.staged_count(),
        c.total()
    );

    let _ = writeln!(out, "  remotes:");
    if status.remote_names.is_empty() {
        let _ = writeln!(out, "    {}", NONE);
    }
    for name in &status.remote_names {
        let url = match name.as_str() {
            "origin" => status.origin_url.as_deref(),
            "upstream" => status.upstream_url.as_deref(),
            _ => None,
        };
        let branches = status
            .branches_by_remote
            .get(name)
            .map(|b| format!(" [{}]", b.join(", ")))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "    {:<10} {}{}",
            name,
            url.unwrap_or(""),
            branches
        );
    }

    let _ = writeln!(out, "  history:");
    history_line(&mut out, &status.local);
    for h in status.remote_histories.values() {
        history_line(&mut out, h);
    }

    for w in &status.warnings {
        let _ = writeln!(out, "{} {}", "!".yellow(), w);
    }
    if status.errors.is_empty() {
        let _ = writeln!(out, "{} all checks passed", "✔".green());
    } else {
        let _ = writeln!(
            out,
            "{}",
            format!("{} problem(s) found:", status.errors.len()).red().bold()
        );
        for d in &status.errors {
            let _ = writeln!(
                out,
                "{} [{}] {}: {}",
                "✘".red(),
                kind_label(d.kind),
                d.check,
                d.message
            );
        }
    }
    out
}

pub fn render_verdict(what: &str, v: &Verdict) -> String {
    let mut out = String::new();
    if v.ready {
        let _ = writeln!(out, "{} ready for {}", "✔".green(), what);
    } else {
        let _ = writeln!(out, "{} not ready for {}", "✘".red(), what.bold());
        for r in &v.reasons {
            let _ = writeln!(out, "  - {}", r);
        }
    }
    out
}

use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

fn running_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[33m{spinner}\x1b[0m {wide_msg}")
        .unwrap()
        .tick_strings(&["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"])
}

fn passed_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[32m✔\x1b[0m {wide_msg}").unwrap()
}

fn failed_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[31m✘\x1b[0m {wide_msg}").unwrap()
}

/// Spinner on stderr shown while `repo_dir` is being inspected.
pub fn inspection_spinner(repo_dir: &Path) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(running_style());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb.set_message(format!("inspecting {}", repo_dir.display()));
    pb
}

/// Replace the spinner with a ✔ or ✘ line summarizing the inspection.
pub fn finish_inspection(pb: &ProgressBar, repo_dir: &Path, problems: usize) {
    if problems == 0 {
        pb.set_style(passed_style());
        pb.finish_with_message(format!("inspected {} (all checks passed)", repo_dir.display()));
    } else {
        pb.set_style(failed_style());
        pb.finish_with_message(format!(
            "inspected {} ({} problem(s))",
            repo_dir.display(),
            problems
        ));
    }
}

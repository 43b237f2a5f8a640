//! Progress Reporting

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Returns a progress bar for `count` work items. Quiet renders get a hidden bar so callers can report progress
/// unconditionally.
///
/// * `count` - Number of work items.
/// * `quiet` - Suppress drawing.
pub fn create_progress_bar(count: u64, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new(count);
    progress.set_draw_target(ProgressDrawTarget::stderr_with_hz(2));
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise} - {eta_precise}] [{bar:30.cyan/blue}] {pos:>5}/{len:5} tiles {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
    progress.set_style(style);
    progress
}

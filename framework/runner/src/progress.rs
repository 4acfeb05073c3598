use indicatif::{ProgressBar, ProgressStyle};

/// A progress bar counting completed scenarios.
pub(crate) fn start_progress(total_runs: usize) -> ProgressBar {
    let pb = ProgressBar::new(total_runs as u64);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{wide_bar:.cyan/blue}] {pos}/{len} scenarios [{elapsed_precise}, eta {eta}]",
    )
    .unwrap_or_else(|e| {
        log::warn!("Falling back to the default progress style: {e}");
        ProgressStyle::default_bar()
    })
    .progress_chars("#>-");
    pb.set_style(style);
    pb
}

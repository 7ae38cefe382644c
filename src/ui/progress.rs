use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// One tick per frame sent.
pub fn create_transfer_progress(frames: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(frames), ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:.bold} [{bar:40.cyan}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("⣀⣤⣦⣶⣷⣿ "),
    );
    pb.set_prefix(label.to_string());
    pb
}

/// Shown while `listen` waits for messages.
pub fn create_listen_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix("Listening");
    pb
}

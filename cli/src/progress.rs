//! Progress reporting utilities

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Spinner shown on stderr while sources load and the comparison runs
#[derive(Debug)]
pub struct ProgressReporter {
    spinner: Option<ProgressBar>,
}

impl ProgressReporter {
    /// Create a reporter; a disabled one stays silent
    pub fn new(enabled: bool) -> Self {
        Self {
            spinner: enabled.then(|| create_spinner("Loading sources...")),
        }
    }

    /// Update the current phase message
    pub fn set_phase(&self, message: &str) {
        if let Some(pb) = &self.spinner {
            pb.set_message(message.to_string());
        }
    }

    /// Stop the spinner and leave a final message
    pub fn finish(&mut self, message: &str) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        // Clear silently if the command bailed out early
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }
}

/// Create a spinner progress bar
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.green} {msg}")
            .expect("Invalid progress template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_reporter_is_silent() {
        let mut reporter = ProgressReporter::new(false);
        assert!(reporter.spinner.is_none());
        reporter.set_phase("Comparing...");
        reporter.finish("done");
    }

    #[test]
    fn test_finish_consumes_spinner() {
        let mut reporter = ProgressReporter::new(true);
        reporter.set_phase("Comparing...");
        reporter.finish("Compared");
        assert!(reporter.spinner.is_none());
    }
}

//! Terminal rendering of transfer progress.

use gogdl_core::transfer::{ProgressObserver, ProgressTracker};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Draws the tracker's progress line on stderr through an indicatif bar.
pub(crate) struct TerminalProgress {
    bar: Option<ProgressBar>,
    draw: bool,
}

impl TerminalProgress {
    /// `draw = false` keeps the observer silent apart from resume notices.
    pub(crate) fn new(draw: bool) -> Self {
        Self { bar: None, draw }
    }
}

impl ProgressObserver for TerminalProgress {
    fn on_resume(&mut self, _offset: u64) {
        println!("Incomplete item exists locally. Resuming...");
    }

    fn on_start(&mut self, tracker: &ProgressTracker) {
        if !self.draw {
            return;
        }
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        bar.set_style(
            ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(render(tracker));
        self.bar = Some(bar);
    }

    fn on_progress(&mut self, tracker: &ProgressTracker) {
        if let Some(bar) = &self.bar {
            bar.set_message(render(tracker));
        }
    }

    fn on_finish(&mut self, tracker: &ProgressTracker) {
        if let Some(bar) = self.bar.take() {
            bar.finish_with_message(render(tracker));
        }
    }
}

impl Drop for TerminalProgress {
    fn drop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.abandon();
        }
    }
}

/// The bar owns the carriage return; strip the one the tracker emits.
fn render(tracker: &ProgressTracker) -> String {
    tracker.line().trim_start_matches('\r').trim_end().to_string()
}

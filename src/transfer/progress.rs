//! Throughput and completion tracking for a single transfer.

use std::time::{Duration, Instant};

use indicatif::HumanBytes;

/// Tracks bytes on disk against the expected total for one transfer.
///
/// Pure computation: it is fed byte counts by the engine and never performs
/// I/O itself.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total: Option<u64>,
    downloaded: u64,
    baseline: u64,
    started: Instant,
}

impl ProgressTracker {
    /// Starts tracking with `already_present` bytes on disk out of `total`.
    #[must_use]
    pub fn new(total: Option<u64>, already_present: u64) -> Self {
        Self {
            total,
            downloaded: already_present,
            baseline: already_present,
            started: Instant::now(),
        }
    }

    /// Records `bytes` newly written.
    pub fn record(&mut self, bytes: u64) {
        self.downloaded = self.downloaded.saturating_add(bytes);
    }

    /// Expected total size, when the server declared one.
    #[must_use]
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Bytes on disk, including the resumed prefix.
    #[must_use]
    pub fn downloaded(&self) -> u64 {
        self.downloaded
    }

    /// Bytes received during this transfer, excluding the resumed prefix.
    #[must_use]
    pub fn transferred(&self) -> u64 {
        self.downloaded - self.baseline
    }

    /// Whole percent complete, capped at 100. `None` without a declared total.
    #[must_use]
    pub fn percentage(&self) -> Option<u8> {
        let total = self.total?;
        if total == 0 {
            return Some(100);
        }
        let pct = u128::from(self.downloaded) * 100 / u128::from(total);
        Some(u8::try_from(pct.min(100)).unwrap_or(100))
    }

    /// Average throughput since the transfer started, in bytes per second.
    #[must_use]
    pub fn bytes_per_sec(&self) -> u64 {
        throughput(self.transferred(), self.started.elapsed())
    }

    /// Renders the progress line: `\r<pct>% @ <speed>/s, <done>/<total> `.
    #[must_use]
    pub fn line(&self) -> String {
        self.line_with_speed(self.bytes_per_sec())
    }

    fn line_with_speed(&self, speed: u64) -> String {
        match (self.percentage(), self.total) {
            (Some(pct), Some(total)) => format!(
                "\r{pct}% @ {}/s, {}/{} ",
                HumanBytes(speed),
                HumanBytes(self.downloaded),
                HumanBytes(total)
            ),
            _ => format!(
                "\r{} @ {}/s ",
                HumanBytes(self.downloaded),
                HumanBytes(speed)
            ),
        }
    }
}

/// Bytes per second for `bytes` moved over `elapsed`, at millisecond resolution.
///
/// Returns zero until at least one millisecond has passed.
#[must_use]
pub fn throughput(bytes: u64, elapsed: Duration) -> u64 {
    let millis = elapsed.as_millis();
    if millis == 0 {
        return 0;
    }
    u64::try_from(u128::from(bytes) * 1000 / millis).unwrap_or(u64::MAX)
}

/// Receives progress events from the transfer engine.
pub trait ProgressObserver {
    /// A partial file of `offset` bytes will be resumed.
    fn on_resume(&mut self, _offset: u64) {}

    /// Body streaming is about to begin.
    fn on_start(&mut self, _tracker: &ProgressTracker) {}

    /// Called after every write.
    fn on_progress(&mut self, tracker: &ProgressTracker);

    /// The file has been finalized.
    fn on_finish(&mut self, _tracker: &ProgressTracker) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&mut self, _tracker: &ProgressTracker) {}
}

//! Resume state machine for one asset transfer.
//!
//! ```text
//! NotStarted ──GET──▶ InProgress { resume_offset } ──rename──▶ Completed
//!      ▲                          │
//!      └──── stale partial ───────┘
//! ```

use std::path::{Path, PathBuf};

use super::error::TransferError;
use super::filename::partial_path_for;

/// Where a transfer stands on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    /// No usable bytes on disk.
    NotStarted,
    /// A partial file of `resume_offset` bytes exists.
    InProgress { resume_offset: u64 },
    /// The final file exists.
    Completed,
}

/// Parsed `Content-Range` header: `bytes <start>-<end>/<total>` or `bytes */<total>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    /// First byte served, absent for the unsatisfied form.
    pub start: Option<u64>,
    /// Complete length, absent when the server sent `*`.
    pub total: Option<u64>,
}

impl ContentRange {
    /// Parses a header value. Returns `None` for anything but the `bytes` unit.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let range_spec = value.trim().strip_prefix("bytes")?.trim_start();
        let (range, total) = range_spec.split_once('/')?;
        let total = match total.trim() {
            "*" => None,
            digits => Some(digits.parse().ok()?),
        };
        let start = match range.trim() {
            "*" => None,
            span => {
                let (first, _) = span.split_once('-')?;
                Some(first.trim().parse().ok()?)
            }
        };
        Some(Self { start, total })
    }
}

/// What to do with a response to the ranged GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponsePlan {
    /// 206 continuing at the resume offset: append.
    Append,
    /// Full body: write the partial file from zero.
    Truncate,
    /// The partial already holds the whole file: rename it.
    Finalize,
    /// The partial is stale: delete it and start over.
    Restart,
    /// Unusable status; leave the partial untouched.
    Reject(u16),
}

/// Paths and phase of one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferState {
    final_path: PathBuf,
    partial_path: PathBuf,
    phase: TransferPhase,
}

impl TransferState {
    /// Inspects the filesystem for `final_path` and its in-progress sibling.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Filesystem`] when either path cannot be
    /// inspected for reasons other than absence.
    pub async fn inspect(final_path: PathBuf) -> Result<Self, TransferError> {
        let partial_path = partial_path_for(&final_path);

        let phase = if file_len(&final_path).await?.is_some() {
            TransferPhase::Completed
        } else {
            match file_len(&partial_path).await? {
                Some(len) if len > 0 => TransferPhase::InProgress { resume_offset: len },
                _ => TransferPhase::NotStarted,
            }
        };

        Ok(Self {
            final_path,
            partial_path,
            phase,
        })
    }

    #[must_use]
    pub fn phase(&self) -> TransferPhase {
        self.phase
    }

    #[must_use]
    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    #[must_use]
    pub fn partial_path(&self) -> &Path {
        &self.partial_path
    }

    /// Bytes already on disk to resume from; zero unless in progress.
    #[must_use]
    pub fn resume_offset(&self) -> u64 {
        match self.phase {
            TransferPhase::InProgress { resume_offset } => resume_offset,
            TransferPhase::NotStarted | TransferPhase::Completed => 0,
        }
    }

    /// `Range` header value for the GET, `None` when starting from zero.
    #[must_use]
    pub fn range_header(&self) -> Option<String> {
        match self.resume_offset() {
            0 => None,
            offset => Some(format!("bytes={offset}-")),
        }
    }

    /// Decides how to treat a GET response given the current phase.
    #[must_use]
    pub fn plan(&self, status: u16, content_range: Option<ContentRange>) -> ResponsePlan {
        let offset = self.resume_offset();
        match status {
            200 => ResponsePlan::Truncate,
            206 if offset == 0 => match content_range.and_then(|r| r.start) {
                Some(0) | None => ResponsePlan::Truncate,
                Some(_) => ResponsePlan::Reject(status),
            },
            206 => match content_range {
                Some(range) if range.start == Some(offset) => ResponsePlan::Append,
                None => ResponsePlan::Append,
                Some(_) => ResponsePlan::Restart,
            },
            416 if offset > 0 => match content_range.and_then(|r| r.total) {
                Some(total) if total == offset => ResponsePlan::Finalize,
                _ => ResponsePlan::Restart,
            },
            other => ResponsePlan::Reject(other),
        }
    }

    /// Moves to `InProgress` after the first bytes land on disk.
    pub fn begin(&mut self, resume_offset: u64) {
        self.phase = TransferPhase::InProgress { resume_offset };
    }

    /// Discards the resume offset.
    pub fn restart(&mut self) {
        self.phase = TransferPhase::NotStarted;
    }

    /// Records that the final file is in place.
    pub fn complete(&mut self) {
        self.phase = TransferPhase::Completed;
    }
}

/// Length of a regular file, `None` when nothing exists at `path`.
async fn file_len(path: &Path) -> Result<Option<u64>, TransferError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
        Ok(_) => Err(TransferError::filesystem(
            path,
            std::io::Error::other("path exists but is not a regular file"),
        )),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(TransferError::filesystem(path, e)),
    }
}

//! Resumable single-asset transfer.
//!
//! A transfer probes the server-declared file name, consults the on-disk
//! [`TransferState`], issues one ranged GET, streams the body into the
//! in-progress file and renames it into place. Interrupting the process at
//! any point leaves the in-progress file for the next run.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::header::{ACCEPT_ENCODING, CONTENT_LENGTH, CONTENT_RANGE, RANGE};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::error::TransferError;
use super::filename::filename_from_url;
use super::progress::{ProgressObserver, ProgressTracker};
use super::state::{ContentRange, ResponsePlan, TransferPhase, TransferState};
use crate::auth::Session;
use crate::manifest::Asset;

/// Result of a transfer that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The final file already existed; nothing was requested.
    Skipped { path: PathBuf },
    /// The final file was written.
    Completed {
        path: PathBuf,
        /// Final file size.
        bytes: u64,
        /// Whether bytes from an earlier run were kept.
        resumed: bool,
    },
}

impl TransferOutcome {
    /// Path of the final file.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Skipped { path } | Self::Completed { path, .. } => path,
        }
    }
}

/// Downloads assets over an authenticated [`Session`], one at a time.
#[derive(Debug, Clone, Copy)]
pub struct TransferEngine<'a> {
    session: &'a Session,
}

impl<'a> TransferEngine<'a> {
    #[must_use]
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Resolves the server-declared file name with a HEAD request.
    ///
    /// Redirects are followed; the name is the percent-decoded last segment of
    /// the final URL.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError`] on transport failure, a non-200 status, or a
    /// final URL without a file name.
    #[instrument(level = "debug", skip(self))]
    pub async fn resolve_filename(&self, url: &str) -> Result<String, TransferError> {
        let response = self
            .session
            .client()
            .head(url)
            .send()
            .await
            .map_err(|e| TransferError::network(url, e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(TransferError::http_status(url, status.as_u16()));
        }

        let final_url = response.url();
        debug!(final_url = %final_url, "filename probe answered");
        filename_from_url(final_url).ok_or_else(|| TransferError::MissingFilename {
            url: final_url.to_string(),
        })
    }

    /// Transfers `asset` into `dest_dir`, resuming a partial file if present.
    ///
    /// An existing final file makes this a no-op returning
    /// [`TransferOutcome::Skipped`].
    ///
    /// # Errors
    ///
    /// Returns [`TransferError`] for network, status and filesystem failures
    /// and for short bodies. The in-progress file is kept in every case.
    #[instrument(skip(self, asset, observer), fields(asset = %asset.name, url = %asset.url))]
    pub async fn transfer(
        &self,
        asset: &Asset,
        dest_dir: &Path,
        observer: &mut dyn ProgressObserver,
    ) -> Result<TransferOutcome, TransferError> {
        Url::parse(&asset.url).map_err(|_| TransferError::InvalidUrl {
            url: asset.url.clone(),
        })?;

        let filename = self.resolve_filename(&asset.url).await?;
        let mut state = TransferState::inspect(dest_dir.join(&filename)).await?;

        match state.phase() {
            TransferPhase::Completed => {
                info!(path = %state.final_path().display(), "already present, skipping");
                return Ok(TransferOutcome::Skipped {
                    path: state.final_path().to_path_buf(),
                });
            }
            TransferPhase::InProgress { resume_offset } => {
                info!(resume_offset, path = %state.partial_path().display(), "resuming partial file");
                observer.on_resume(resume_offset);
            }
            TransferPhase::NotStarted => {}
        }

        let mut restarted = false;
        loop {
            let response = self.request(&asset.url, &state).await?;
            let status = response.status().as_u16();
            let content_range = response
                .headers()
                .get(CONTENT_RANGE)
                .and_then(|v| v.to_str().ok())
                .and_then(ContentRange::parse);
            let plan = state.plan(status, content_range);
            debug!(status, ?content_range, ?plan, "planned response handling");

            match plan {
                ResponsePlan::Reject(status) => {
                    return Err(TransferError::http_status(&asset.url, status));
                }
                ResponsePlan::Restart if restarted => {
                    return Err(TransferError::http_status(&asset.url, status));
                }
                ResponsePlan::Restart => {
                    warn!(
                        path = %state.partial_path().display(),
                        resume_offset = state.resume_offset(),
                        "partial file does not match the remote file, restarting"
                    );
                    remove_partial(state.partial_path()).await?;
                    state.restart();
                    restarted = true;
                }
                ResponsePlan::Finalize => {
                    let bytes = state.resume_offset();
                    finalize(&mut state).await?;
                    observer.on_finish(&ProgressTracker::new(Some(bytes), bytes));
                    return Ok(TransferOutcome::Completed {
                        path: state.final_path().to_path_buf(),
                        bytes,
                        resumed: true,
                    });
                }
                ResponsePlan::Append | ResponsePlan::Truncate => {
                    let append = plan == ResponsePlan::Append;
                    let bytes = stream_body(
                        response,
                        content_range,
                        &mut state,
                        append,
                        &asset.url,
                        observer,
                    )
                    .await?;
                    return Ok(TransferOutcome::Completed {
                        path: state.final_path().to_path_buf(),
                        bytes,
                        resumed: append,
                    });
                }
            }
        }
    }

    async fn request(
        &self,
        url: &str,
        state: &TransferState,
    ) -> Result<reqwest::Response, TransferError> {
        let mut request = self
            .session
            .client()
            .get(url)
            .header(ACCEPT_ENCODING, "identity");
        if let Some(range) = state.range_header() {
            request = request.header(RANGE, range);
        }
        request
            .send()
            .await
            .map_err(|e| TransferError::network(url, e))
    }
}

/// Writes the body into the in-progress file and renames it into place.
///
/// Bytes received before a transport error are flushed so the next run can
/// resume from them.
async fn stream_body(
    response: reqwest::Response,
    content_range: Option<ContentRange>,
    state: &mut TransferState,
    append: bool,
    url: &str,
    observer: &mut dyn ProgressObserver,
) -> Result<u64, TransferError> {
    let base = if append { state.resume_offset() } else { 0 };
    let total = content_range.and_then(|range| range.total).or_else(|| {
        declared_length(&response).map(|remaining| remaining.saturating_add(base))
    });
    let partial = state.partial_path().to_path_buf();

    let file = open_partial(&partial, append).await?;
    state.begin(base);

    let mut tracker = ProgressTracker::new(total, base);
    observer.on_start(&tracker);

    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut interrupted = None;
    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                interrupted = Some(e);
                break;
            }
        };
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| TransferError::filesystem(&partial, e))?;
        tracker.record(chunk.len() as u64);
        state.begin(tracker.downloaded());
        observer.on_progress(&tracker);
    }
    writer
        .flush()
        .await
        .map_err(|e| TransferError::filesystem(&partial, e))?;
    drop(writer);

    if let Some(error) = interrupted {
        warn!(
            path = %partial.display(),
            received = tracker.downloaded(),
            %error,
            "body stream interrupted, partial file kept"
        );
        return Err(TransferError::network(url, error));
    }

    if let Some(expected) = total
        && tracker.downloaded() != expected
    {
        return Err(TransferError::Incomplete {
            path: partial,
            expected,
            received: tracker.downloaded(),
        });
    }

    finalize(state).await?;
    observer.on_finish(&tracker);
    info!(
        path = %state.final_path().display(),
        bytes = tracker.downloaded(),
        resumed = append,
        "transfer complete"
    );
    Ok(tracker.downloaded())
}

fn declared_length(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

async fn open_partial(path: &Path, append: bool) -> Result<File, TransferError> {
    let mut options = OpenOptions::new();
    options.create(true);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    options
        .open(path)
        .await
        .map_err(|e| TransferError::filesystem(path, e))
}

async fn remove_partial(path: &Path) -> Result<(), TransferError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(TransferError::filesystem(path, e)),
    }
}

async fn finalize(state: &mut TransferState) -> Result<(), TransferError> {
    tokio::fs::rename(state.partial_path(), state.final_path())
        .await
        .map_err(|e| TransferError::filesystem(state.final_path(), e))?;
    state.complete();
    Ok(())
}

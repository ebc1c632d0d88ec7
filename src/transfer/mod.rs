//! Resumable, progress-tracked asset transfer.

mod engine;
mod error;
mod filename;
mod progress;
mod state;

pub use engine::{TransferEngine, TransferOutcome};
pub use error::TransferError;
pub use filename::{INCOMPLETE_EXTENSION, filename_from_url, partial_path_for};
pub use progress::{NoopObserver, ProgressObserver, ProgressTracker, throughput};
pub use state::{ContentRange, ResponsePlan, TransferPhase, TransferState};

//! CLI entry point for gogdl.

mod app;
mod cli;

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Everything selected is present locally, or the user cancelled.
    Success,
    /// A fatal error, or every transfer failed.
    Failure,
    /// Some transfers failed.
    Partial,
}

impl ProcessExit {
    pub(crate) fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Partial => 2,
        }
    }
}

#[tokio::main]
async fn main() {
    let exit = match app::runtime::run().await {
        Ok(exit) => exit,
        Err(err) => {
            eprintln!("error: {err:#}");
            ProcessExit::Failure
        }
    };
    // A cancelled prompt may still hold a blocking stdin read; exit without
    // waiting for it.
    std::process::exit(exit.code());
}

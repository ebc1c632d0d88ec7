//! One interactive session: search, pick, resolve, download.

use std::fs;
use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use clap::Parser;
use gogdl_core::catalog::{self, Title};
use gogdl_core::config::{Settings, load_file_config};
use gogdl_core::manifest::{Asset, option_labels, resolve_assets};
use gogdl_core::naming::folder_name;
use gogdl_core::transfer::{TransferEngine, TransferOutcome};
use gogdl_core::{Session, read_cookie_file};
use tracing::{debug, info, warn};

use crate::ProcessExit;
use crate::app::progress::TerminalProgress;
use crate::app::prompt::{self, Selection};
use crate::app::{exit_handler, terminal};
use crate::cli::Args;

pub(crate) async fn run() -> Result<ProcessExit> {
    let args = Args::parse();

    let no_color = terminal::no_color_env_requested() || terminal::is_dumb_terminal();
    terminal::init_tracing(terminal::default_log_level(args.quiet, args.verbose), no_color);
    debug!(?args, "CLI arguments parsed");

    let file_config =
        load_file_config(args.config.as_deref()).context("failed to read config file")?;
    let settings = Settings::resolve(args.overrides(), file_config.as_ref())
        .context("failed to parse config/args")?;
    debug!(?settings, "settings resolved");

    fs::create_dir_all(&settings.output_dir).with_context(|| {
        format!(
            "failed to make output folder {}",
            settings.output_dir.display()
        )
    })?;

    let parsed = read_cookie_file(&settings.cookies_file).context("failed to read cookies")?;
    for warning in &parsed.warnings {
        warn!(%warning, "cookie record skipped");
    }
    let session = Session::from_cookies(&parsed.cookies, &args.base_url, settings.timeouts)
        .context("failed to set cookies")?;
    let username = session.validate().await.context("failed to check cookies")?;
    println!("Signed in as {username}.\n");

    let titles = catalog::enumerate(
        &session,
        &settings.query,
        settings.platform,
        &settings.language,
    )
    .await
    .context("failed to search catalog")?;
    if titles.is_empty() {
        println!("No search results.");
        return Ok(ProcessExit::Failure);
    }

    let Selection::Chosen(title) = choose_title(titles, &settings.query).await? else {
        return Ok(ProcessExit::Success);
    };

    let metadata = catalog::fetch_metadata(&session, title.id)
        .await
        .context("failed to get game meta")?;
    println!("--{}--", metadata.title);

    let assets = resolve_assets(
        &metadata,
        session.base_url(),
        settings.platform,
        settings.goodies,
    )
    .context("failed to parse items")?;
    if assets.is_empty() {
        println!("No items available for {}.", settings.platform);
        return Ok(ProcessExit::Failure);
    }

    let Selection::Chosen(selected) = choose_assets(assets).await? else {
        return Ok(ProcessExit::Success);
    };

    let title_dir = settings
        .output_dir
        .join(folder_name(&settings.folder_template, &metadata.title));
    fs::create_dir_all(&title_dir).context("failed to make game folder")?;

    let draw = terminal::should_draw_progress(
        io::stderr().is_terminal(),
        args.quiet,
        terminal::is_dumb_terminal(),
    );
    let engine = TransferEngine::new(&session);
    let total = selected.len();
    let (mut succeeded, mut failed) = (0usize, 0usize);

    for (i, asset) in selected.iter().enumerate() {
        println!("Item {} of {}:", i + 1, total);
        println!("{}", asset.name);

        let mut observer = TerminalProgress::new(draw);
        let result = tokio::select! {
            result = engine.transfer(asset, &title_dir, &mut observer) => result,
            _ = tokio::signal::ctrl_c() => {
                warn!(completed = succeeded, total, "Interrupted. Run again to resume.");
                return Ok(ProcessExit::Failure);
            }
        };
        drop(observer);

        match result {
            Ok(TransferOutcome::Skipped { .. }) => {
                println!("Item already exists locally.");
                succeeded += 1;
            }
            Ok(TransferOutcome::Completed { path, bytes, resumed }) => {
                debug!(path = %path.display(), bytes, resumed, "item saved");
                succeeded += 1;
            }
            Err(err) => {
                eprintln!("failed to download item\n{err}");
                warn!(asset = %asset.name, error = %err, "transfer failed");
                failed += 1;
            }
        }
    }

    info!(succeeded, failed, total, dir = %title_dir.display(), "session finished");
    Ok(exit_handler::determine_exit_outcome(succeeded, failed))
}

/// Picks the title: a single result is taken as is.
async fn choose_title(mut titles: Vec<Title>, query: &str) -> Result<Selection<Title>> {
    if titles.len() == 1 {
        return Ok(Selection::Chosen(titles.remove(0)));
    }
    if !query.is_empty() {
        println!("Your search yielded more than one result.");
    }
    let labels: Vec<String> = titles.iter().map(|title| title.name.clone()).collect();
    let choice = prompt_cancellable(move || {
        prompt::select_one(&mut io::stdin().lock(), &mut io::stdout(), &labels)
    })
    .await
    .context("failed to select game id")?;
    Ok(match choice {
        Selection::Chosen(index) => titles
            .into_iter()
            .nth(index)
            .map_or(Selection::Cancelled, Selection::Chosen),
        Selection::Cancelled => Selection::Cancelled,
    })
}

/// Picks assets; the returned list follows the order the user gave.
async fn choose_assets(assets: Vec<Asset>) -> Result<Selection<Vec<Asset>>> {
    let labels = option_labels(&assets);
    let choice = prompt_cancellable(move || {
        prompt::select_many(&mut io::stdin().lock(), &mut io::stdout(), &labels)
    })
    .await
    .context("failed to select items")?;
    Ok(match choice {
        Selection::Chosen(indices) => Selection::Chosen(
            indices
                .into_iter()
                .filter_map(|index| assets.get(index).cloned())
                .collect(),
        ),
        Selection::Cancelled => Selection::Cancelled,
    })
}

/// Runs a blocking prompt; Ctrl-C resolves it as cancelled.
async fn prompt_cancellable<T, F>(ask: F) -> Result<Selection<T>>
where
    F: FnOnce() -> io::Result<Selection<T>> + Send + 'static,
    T: Send + 'static,
{
    let task = tokio::task::spawn_blocking(ask);
    tokio::select! {
        joined = task => Ok(joined.context("prompt task failed")??),
        _ = tokio::signal::ctrl_c() => {
            println!();
            Ok(Selection::Cancelled)
        }
    }
}

mod cli;
mod shows;

use std::path::Path;

use clap::Parser;
use kansoku_core::{AppConfig, ShowId, SignalHandler, Strategy, Tracker, TrackerError};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::shows::ShowList;

#[tokio::main]
async fn main() -> Result<(), TrackerError> {
    let cli = cli::Cli::parse();
    let _log_guard = init_logging(&AppConfig::data_dir());

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    let shows_path = cli.shows.clone().unwrap_or_else(AppConfig::shows_path);
    let mut list = ShowList::load(&shows_path)?;
    info!(path = %shows_path.display(), count = list.len(), "Loaded show list");

    let (updates_tx, mut updates) = mpsc::unbounded_channel::<(ShowId, u32)>();
    let mut tracker = Tracker::from_config(&config.tracker, list.shows());
    tracker.connect_signal(
        "playing",
        SignalHandler::playing(|show_id, playing, episode| {
            info!(%show_id, playing, episode, "Playback changed");
        }),
    )?;
    tracker.connect_signal(
        "update",
        SignalHandler::update(move |show_id, episode| {
            let _ = updates_tx.send((show_id, episode));
        }),
    )?;

    let strategy = Strategy::select(&config, cli.strategy.into())?;
    let handle = tracker.spawn(strategy);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
            update = updates.recv() => match update {
                Some((show_id, episode)) => {
                    if !list.apply_update(show_id, episode) {
                        warn!(%show_id, "Update for a show that is no longer listed");
                        continue;
                    }
                    if let Err(e) = list.save(&shows_path) {
                        error!(error = %e, "Failed to save show list");
                    }
                    handle.update_list(list.shows())?;
                }
                // The observer dropped its signal slots: it has stopped.
                None => break,
            },
        }
    }

    handle.shutdown().await;
    Ok(())
}

/// Log to stderr and to a daily file under `log_dir`.
fn init_logging(log_dir: &Path) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kansoku=info"));

    let (file_layer, guard) = match std::fs::create_dir_all(log_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(log_dir, "kansoku.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    guard
}

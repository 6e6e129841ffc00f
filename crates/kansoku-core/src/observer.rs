//! Observation strategies and the loop that drives them.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use kansoku_detect::{
    platform, DetectError, FileProbe, FsEventWatcher, MediaServer, MediaServerStatus, PlexClient,
    ProcessProbe, WatchWake,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::engine::SOURCE;
use crate::error::TrackerError;
use crate::models::DetectionState;
use crate::tracker::{Tracker, TrackerCommand};

/// How long a filesystem wait may last while something is playing, so a
/// player closing without a new event is still noticed.
const FS_RECHECK: Duration = Duration::from_secs(1);

/// Which backend to observe, chosen once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StrategyKind {
    #[default]
    Auto,
    Polling,
    FsEvents,
    MediaServer,
}

/// A configured observation backend.
pub enum Strategy {
    /// Probe process handles every `interval`.
    Polling { probe: ProcessProbe, interval: Duration },
    /// Wake on file open/close under `root`, then probe process handles.
    FsEvents {
        root: PathBuf,
        probe: ProcessProbe,
        interval: Duration,
    },
    /// Ask a media server what it is playing every `interval`.
    MediaServer { client: PlexClient, interval: Duration },
}

impl Strategy {
    /// Pick the best backend available for `config`.
    pub fn detect(config: &AppConfig) -> Result<Self, TrackerError> {
        Self::select(config, StrategyKind::Auto)
    }

    /// Build the backend for `kind`. `Auto` prefers the media server when
    /// enabled, then filesystem events when supported and a watch directory
    /// exists, then polling.
    pub fn select(config: &AppConfig, kind: StrategyKind) -> Result<Self, TrackerError> {
        let tracker = &config.tracker;
        let interval = tracker.interval();
        let probe = || ProcessProbe::new(tracker.process_name.as_str());

        let kind = match kind {
            StrategyKind::Auto if config.media_server.enabled => StrategyKind::MediaServer,
            StrategyKind::Auto
                if platform::fs_events_supported()
                    && tracker.watch_dir().is_some_and(|dir| dir.is_dir()) =>
            {
                StrategyKind::FsEvents
            }
            StrategyKind::Auto => StrategyKind::Polling,
            other => other,
        };

        let strategy = match kind {
            StrategyKind::MediaServer => Self::MediaServer {
                client: PlexClient::new(&config.media_server)?,
                interval: Duration::from_secs(config.media_server.poll_interval.max(1)),
            },
            StrategyKind::FsEvents => match tracker.watch_dir() {
                Some(root) => Self::FsEvents {
                    root,
                    probe: probe(),
                    interval,
                },
                None => {
                    warn!("No watch directory available, falling back to polling");
                    Self::Polling {
                        probe: probe(),
                        interval,
                    }
                }
            },
            StrategyKind::Polling | StrategyKind::Auto => Self::Polling {
                probe: probe(),
                interval,
            },
        };
        if !matches!(strategy, Self::MediaServer { .. }) && !platform::process_probe_supported() {
            warn!("Process handle probing is not supported on this platform");
        }
        Ok(strategy)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Polling { .. } => "polling",
            Self::FsEvents { .. } => "fs-events",
            Self::MediaServer { .. } => "media-server",
        }
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Polling { probe, interval } => f
                .debug_struct("Polling")
                .field("probe", probe)
                .field("interval", interval)
                .finish(),
            Self::FsEvents {
                root,
                probe,
                interval,
            } => f
                .debug_struct("FsEvents")
                .field("root", root)
                .field("probe", probe)
                .field("interval", interval)
                .finish(),
            Self::MediaServer { interval, .. } => f
                .debug_struct("MediaServer")
                .field("interval", interval)
                .finish_non_exhaustive(),
        }
    }
}

/// Owns the tracker on the background task and drives one strategy.
pub(crate) struct Observer {
    tracker: Tracker,
    commands: mpsc::UnboundedReceiver<TrackerCommand>,
    cancel: CancellationToken,
}

impl Observer {
    pub(crate) fn new(
        tracker: Tracker,
        commands: mpsc::UnboundedReceiver<TrackerCommand>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            tracker,
            commands,
            cancel,
        }
    }

    pub(crate) async fn run(mut self, strategy: Strategy) {
        info!(strategy = strategy.name(), "Tracker started");
        let messenger = self.tracker.messenger();
        messenger.info(SOURCE, "Initializing...");
        messenger.debug(SOURCE, "Enabling tracker...");
        match strategy {
            Strategy::Polling { probe, interval } => self.observe_polling(probe, interval).await,
            Strategy::FsEvents {
                root,
                probe,
                interval,
            } => self.observe_fs_events(root, probe, interval).await,
            Strategy::MediaServer { client, interval } => {
                self.observe_media_server(client, interval).await
            }
        }
        info!("Tracker stopped");
    }

    /// Await `fut` while applying incoming commands.
    ///
    /// Returns `None` when the tracker is cancelled or every handle is gone.
    async fn until<F: Future>(&mut self, fut: F) -> Option<F::Output> {
        tokio::pin!(fut);
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                command = self.commands.recv() => match command {
                    Some(command) => self.tracker.apply(command),
                    None => return None,
                },
                output = &mut fut => return Some(output),
            }
        }
    }

    /// Ask `probe` for the playing file.
    ///
    /// The outer `None` means stop observing. A probe that cannot be launched
    /// disables the tracker; other probe errors count as nothing playing.
    async fn probe<P: FileProbe>(&mut self, probe: &mut P) -> Option<Option<String>> {
        if !self.tracker.is_active() {
            return Some(None);
        }
        match self.until(probe.playing_file()).await? {
            Ok(file) => Some(file),
            Err(DetectError::Launch { tool, source }) => {
                warn!(tool = %tool, error = %source, "Process probe failed to launch");
                self.tracker
                    .messenger()
                    .warn(SOURCE, &format!("Couldn't execute {tool}. Disabling tracker."));
                self.tracker.disable();
                Some(None)
            }
            Err(e) => {
                debug!(error = %e, "Probe failed");
                Some(None)
            }
        }
    }

    async fn sleep(&mut self, interval: Duration) -> Option<()> {
        self.until(tokio::time::sleep(interval)).await
    }

    async fn observe_polling<P: FileProbe>(&mut self, mut probe: P, interval: Duration) {
        loop {
            let Some(file) = self.probe(&mut probe).await else {
                return;
            };
            self.tracker.cycle(file);
            if self.sleep(interval).await.is_none() {
                return;
            }
        }
    }

    /// Filesystem events only wake a cycle; the open file is still found by
    /// probing process handles.
    async fn observe_fs_events<P: FileProbe>(&mut self, root: PathBuf, mut probe: P, interval: Duration) {
        let mut watcher = match FsEventWatcher::watch(&root) {
            Ok(watcher) => watcher,
            Err(DetectError::WatchRootMissing(path)) => {
                warn!(root = %path.display(), "Watch directory not found");
                self.tracker
                    .messenger()
                    .warn(SOURCE, "Watch directory not found! Tracker will stop.");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Filesystem events unavailable");
                self.tracker
                    .messenger()
                    .warn(SOURCE, "Filesystem events not available; using polling (slow).");
                return self.observe_polling(probe, interval).await;
            }
        };

        loop {
            let Some(file) = self.probe(&mut probe).await else {
                return;
            };
            self.tracker.cycle(file);

            let timeout = match self.tracker.last_state() {
                DetectionState::NoVideo => None,
                _ => Some(FS_RECHECK),
            };
            match self.until(watcher.next(timeout)).await {
                None => return,
                Some(WatchWake::Closed) => {
                    warn!(root = %watcher.root().display(), "Filesystem watcher stopped");
                    return;
                }
                Some(WatchWake::Access(_) | WatchWake::Timeout) => {}
            }
        }
    }

    async fn observe_media_server<S: MediaServer>(&mut self, mut server: S, interval: Duration) {
        // Previous and current status.
        let mut history: [Option<MediaServerStatus>; 2] = [None, None];

        loop {
            let Some(status) = self.until(server.status()).await else {
                return;
            };
            history = [history[1], Some(status)];
            let changed = history[0] != history[1];

            let file = if status.is_running() {
                if let Some(wait) = server.update_wait() {
                    self.tracker.set_update_wait(wait);
                }
                server.playing_file()
            } else {
                if changed {
                    let message = match status {
                        MediaServerStatus::Unauthorized => {
                            "Plex Media Server rejected the access token."
                        }
                        _ => "Plex Media Server is not running.",
                    };
                    self.tracker.messenger().warn(SOURCE, message);
                }
                None
            };
            self.tracker.cycle(file);

            if self.sleep(interval).await.is_none() {
                return;
            }
        }
    }
}

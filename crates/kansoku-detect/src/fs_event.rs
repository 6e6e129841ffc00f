use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::{AccessKind, EventKind};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::error::DetectError;

/// Outcome of waiting on the filesystem watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchWake {
    /// A file under the watched tree was opened or closed.
    Access(PathBuf),
    /// No event arrived within the timeout.
    Timeout,
    /// The watcher backend shut down.
    Closed,
}

/// Recursive open/close watcher over a directory tree.
///
/// Directories are watched so new subtrees are followed, but only events on
/// regular files are reported.
pub struct FsEventWatcher {
    root: PathBuf,
    rx: mpsc::UnboundedReceiver<PathBuf>,
    _watcher: RecommendedWatcher,
}

impl FsEventWatcher {
    /// Start watching `root`. A missing root is reported as
    /// [`DetectError::WatchRootMissing`].
    pub fn watch(root: impl Into<PathBuf>) -> Result<Self, DetectError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(DetectError::WatchRootMissing(root));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if let Some(path) = access_path(&event) {
                        let _ = tx.send(path);
                    }
                }
                Err(e) => error!("Watch error: {e}"),
            },
            Config::default(),
        )?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|e| {
                if is_not_found(&e) {
                    DetectError::WatchRootMissing(root.clone())
                } else {
                    DetectError::Watch(e)
                }
            })?;
        info!(root = %root.display(), "Watching for file access");

        Ok(Self {
            root,
            rx,
            _watcher: watcher,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Wait for the next access event.
    ///
    /// `None` blocks until an event arrives. Events already queued behind the
    /// first one are drained so a burst wakes the caller once.
    pub async fn next(&mut self, timeout: Option<Duration>) -> WatchWake {
        let received = match timeout {
            None => self.rx.recv().await,
            Some(limit) => match tokio::time::timeout(limit, self.rx.recv()).await {
                Ok(received) => received,
                Err(_) => return WatchWake::Timeout,
            },
        };

        match received {
            Some(path) => {
                let mut coalesced = 0usize;
                while self.rx.try_recv().is_ok() {
                    coalesced += 1;
                }
                debug!(path = %path.display(), coalesced, "File access event");
                WatchWake::Access(path)
            }
            None => WatchWake::Closed,
        }
    }
}

/// Keep open/close events on non-directory paths.
fn access_path(event: &Event) -> Option<PathBuf> {
    match event.kind {
        EventKind::Access(AccessKind::Open(_)) | EventKind::Access(AccessKind::Close(_)) => {}
        _ => return None,
    }
    event.paths.first().filter(|path| !path.is_dir()).cloned()
}

fn is_not_found(e: &notify::Error) -> bool {
    match &e.kind {
        notify::ErrorKind::PathNotFound => true,
        notify::ErrorKind::Io(io) => io.kind() == std::io::ErrorKind::NotFound,
        _ => false,
    }
}

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the playing-file probes.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("watch directory not found: {}", .0.display())]
    WatchRootMissing(PathBuf),

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("media server error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid server URL: {0}")]
    Url(#[from] url::ParseError),
}

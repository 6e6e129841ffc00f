use kansoku_detect::DetectError;
use thiserror::Error;

use crate::signals::SignalKind;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid signal: {0}")]
    UnknownSignal(String),

    #[error("a `{handler}` handler cannot be connected to the `{signal}` signal")]
    SignalMismatch {
        signal: SignalKind,
        handler: SignalKind,
    },

    #[error("detection failed: {0}")]
    Detection(#[from] DetectError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tracker is not running")]
    Stopped,
}

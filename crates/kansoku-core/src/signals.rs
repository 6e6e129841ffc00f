use std::fmt;
use std::str::FromStr;

use crate::error::TrackerError;
use crate::models::{ShowId, TrackerEvent};

/// Callback for `playing(show_id, is_playing, episode)`.
pub type PlayingCallback = Box<dyn Fn(ShowId, bool, u32) + Send + Sync>;

/// Callback for `update(show_id, episode)`.
pub type UpdateCallback = Box<dyn Fn(ShowId, u32) + Send + Sync>;

/// The signals a tracker can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Playing,
    Update,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Playing => "playing",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalKind {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "playing" => Ok(Self::Playing),
            "update" => Ok(Self::Update),
            other => Err(TrackerError::UnknownSignal(other.to_string())),
        }
    }
}

/// A typed callback for one signal kind.
pub enum SignalHandler {
    Playing(PlayingCallback),
    Update(UpdateCallback),
}

impl SignalHandler {
    pub fn playing(f: impl Fn(ShowId, bool, u32) + Send + Sync + 'static) -> Self {
        Self::Playing(Box::new(f))
    }

    pub fn update(f: impl Fn(ShowId, u32) + Send + Sync + 'static) -> Self {
        Self::Update(Box::new(f))
    }

    pub fn kind(&self) -> SignalKind {
        match self {
            Self::Playing(_) => SignalKind::Playing,
            Self::Update(_) => SignalKind::Update,
        }
    }
}

impl fmt::Debug for SignalHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SignalHandler").field(&self.kind()).finish()
    }
}

/// Check that `handler` may be registered under the signal `name`.
pub fn validate_signal(name: &str, handler: &SignalHandler) -> Result<SignalKind, TrackerError> {
    let signal: SignalKind = name.parse()?;
    let kind = handler.kind();
    if kind != signal {
        return Err(TrackerError::SignalMismatch {
            signal,
            handler: kind,
        });
    }
    Ok(signal)
}

/// One callback slot per signal kind. Connecting replaces the previous slot.
#[derive(Default)]
pub struct SignalDispatcher {
    playing: Option<PlayingCallback>,
    update: Option<UpdateCallback>,
}

impl SignalDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, handler: SignalHandler) {
        match handler {
            SignalHandler::Playing(cb) => self.playing = Some(cb),
            SignalHandler::Update(cb) => self.update = Some(cb),
        }
    }

    /// Register `handler` under a signal name (`"playing"` or `"update"`).
    pub fn connect_signal(&mut self, name: &str, handler: SignalHandler) -> Result<(), TrackerError> {
        validate_signal(name, &handler)?;
        self.connect(handler);
        Ok(())
    }

    /// Invoke the callback for `event`, if one is connected.
    pub fn emit(&self, event: &TrackerEvent) {
        match *event {
            TrackerEvent::Playing {
                show_id,
                playing,
                episode,
            } => {
                if let Some(cb) = &self.playing {
                    cb(show_id, playing, episode);
                }
            }
            TrackerEvent::Update { show_id, episode } => {
                if let Some(cb) = &self.update {
                    cb(show_id, episode);
                }
            }
        }
    }
}

impl fmt::Debug for SignalDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalDispatcher")
            .field("playing", &self.playing.is_some())
            .field("update", &self.update.is_some())
            .finish()
    }
}

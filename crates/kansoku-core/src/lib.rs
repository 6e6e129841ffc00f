pub mod config;
pub mod engine;
pub mod error;
pub mod filename;
pub mod matcher;
pub mod messenger;
pub mod models;
pub mod observer;
pub mod recognition;
pub mod signals;
pub mod tracker;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{AppConfig, TrackerConfig};
pub use engine::{DecisionEngine, TrackerSession, UpdatePolicy};
pub use error::TrackerError;
pub use filename::{AnimeFilenameResolver, FilenameResolver, ParsedFilename};
pub use matcher::{ShowMatcher, TitleMatcher};
pub use messenger::{Messenger, SharedMessenger, TracingMessenger};
pub use models::{DetectionState, ShowEpisodePair, ShowId, ShowStatus, TrackedShow, TrackerEvent};
pub use observer::{Strategy, StrategyKind};
pub use recognition::Recognizer;
pub use signals::{SignalDispatcher, SignalHandler, SignalKind};
pub use tracker::{Tracker, TrackerCommand, TrackerHandle};

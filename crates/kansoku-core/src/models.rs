mod detection;
mod show;

pub use detection::{DetectionState, ShowEpisodePair, TrackerEvent};
pub use show::{ShowId, ShowStatus, TrackedShow};

use super::show::{ShowId, TrackedShow};

/// Result of one probe + resolve + match cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionState {
    /// A tracked show is playing.
    Playing,
    /// No player or no video open.
    NoVideo,
    /// A video is open but its filename could not be parsed.
    Unrecognized,
    /// The parsed title is not in the show list.
    NotFound,
    /// Same filename as the previous cycle; resolution was skipped.
    Unchanged,
}

/// The show and episode currently being watched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowEpisodePair {
    pub show: TrackedShow,
    pub episode: u32,
}

impl ShowEpisodePair {
    pub fn new(show: TrackedShow, episode: u32) -> Self {
        Self { show, episode }
    }

    pub fn show_id(&self) -> ShowId {
        self.show.id
    }

    /// Same show id and same episode.
    pub fn is_same_unit(&self, other: &ShowEpisodePair) -> bool {
        self.show.id == other.show.id && self.episode == other.episode
    }
}

/// A signal emitted by the decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerEvent {
    /// Playback of `episode` started (`playing == true`) or stopped.
    Playing {
        show_id: ShowId,
        playing: bool,
        episode: u32,
    },
    /// Progress should be set to `episode`.
    Update { show_id: ShowId, episode: u32 },
}

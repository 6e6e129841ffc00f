use serde::{Deserialize, Serialize};

/// Identifier of a show in the external show list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShowId(pub i64);

impl std::fmt::Display for ShowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User's watch status for a tracked show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowStatus {
    #[default]
    Watching,
    Completed,
    OnHold,
    Dropped,
    PlanToWatch,
}

impl ShowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Watching => "Watching",
            Self::Completed => "Completed",
            Self::OnHold => "On Hold",
            Self::Dropped => "Dropped",
            Self::PlanToWatch => "Plan to Watch",
        }
    }
}

impl std::fmt::Display for ShowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A show from the user's list, as seen by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedShow {
    pub id: ShowId,
    pub title: String,
    /// Alternative titles (synonyms, English title, ...).
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Episodes watched so far.
    #[serde(default)]
    pub my_progress: u32,
    /// Episode count, if known.
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub my_status: ShowStatus,
}

impl TrackedShow {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id: ShowId(id),
            title: title.into(),
            aliases: Vec::new(),
            my_progress: 0,
            total: None,
            my_status: ShowStatus::Watching,
        }
    }

    /// The only episode whose playback may advance progress.
    pub fn next_episode(&self) -> u32 {
        self.my_progress.saturating_add(1)
    }

    /// Main title followed by every alias.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.title.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

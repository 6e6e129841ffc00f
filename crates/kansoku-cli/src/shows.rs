use std::path::Path;

use kansoku_core::{ShowId, ShowStatus, TrackedShow, TrackerError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// The user's show list, stored as TOML `[[show]]` tables.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ShowList {
    #[serde(default, rename = "show")]
    shows: Vec<TrackedShow>,
}

impl ShowList {
    /// Load the list. A missing file is an empty list.
    pub fn load(path: &Path) -> Result<Self, TrackerError> {
        if !path.exists() {
            warn!(path = %path.display(), "Show list not found, starting empty");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| TrackerError::Config(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<(), TrackerError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TrackerError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn shows(&self) -> Vec<TrackedShow> {
        self.shows.clone()
    }

    pub fn len(&self) -> usize {
        self.shows.len()
    }

    /// Set progress to `episode`; reaching the last episode completes the
    /// show. Returns `false` for an unknown id.
    pub fn apply_update(&mut self, id: ShowId, episode: u32) -> bool {
        let Some(show) = self.shows.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        show.my_progress = episode;
        if show.total == Some(episode) {
            show.my_status = ShowStatus::Completed;
        }
        info!(title = %show.title, episode, status = %show.my_status, "Progress updated");
        true
    }
}

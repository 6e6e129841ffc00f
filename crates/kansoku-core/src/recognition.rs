use std::sync::Arc;

use crate::engine::TrackerSession;
use crate::filename::FilenameResolver;
use crate::matcher::ShowMatcher;
use crate::models::{DetectionState, ShowEpisodePair, TrackedShow};

/// Turns a probed filename into a detection result.
#[derive(Clone)]
pub struct Recognizer {
    resolver: Arc<dyn FilenameResolver>,
    matcher: Arc<dyn ShowMatcher>,
}

impl Recognizer {
    pub fn new(resolver: Arc<dyn FilenameResolver>, matcher: Arc<dyn ShowMatcher>) -> Self {
        Self { resolver, matcher }
    }

    /// Resolve `filename` against `shows`.
    ///
    /// A filename identical to the previous cycle's short-circuits to
    /// [`DetectionState::Unchanged`] with the previous pair, without calling
    /// the resolver or matcher.
    pub fn detect(
        &self,
        filename: Option<String>,
        session: &mut TrackerSession,
        shows: &[TrackedShow],
    ) -> (DetectionState, Option<ShowEpisodePair>) {
        let Some(filename) = filename else {
            session.last_filename = None;
            return (DetectionState::NoVideo, None);
        };

        if session.last_filename.as_deref() == Some(filename.as_str()) {
            return (DetectionState::Unchanged, session.last_show_tuple.clone());
        }

        let parsed = self.resolver.resolve(&filename);
        session.last_filename = Some(filename);

        let Some(parsed) = parsed else {
            return (DetectionState::Unrecognized, None);
        };

        match self.matcher.find(&parsed.title, shows) {
            Some(show) => {
                let episode = parsed.episode.unwrap_or(1);
                (
                    DetectionState::Playing,
                    Some(ShowEpisodePair::new(show.clone(), episode)),
                )
            }
            None => {
                tracing::debug!(title = %parsed.title, "No tracked show matches");
                (DetectionState::NotFound, None)
            }
        }
    }
}

impl std::fmt::Debug for Recognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recognizer").finish_non_exhaustive()
    }
}

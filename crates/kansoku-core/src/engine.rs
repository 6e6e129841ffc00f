//! The stateful core: decides when a detected episode becomes a progress
//! update.

use std::time::Duration;

use tokio::time::Instant;

use crate::messenger::Messenger;
use crate::models::{DetectionState, ShowEpisodePair, TrackerEvent};

/// Component tag used for every tracker message.
pub const SOURCE: &str = "Tracker";

/// When a detected episode may be committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdatePolicy {
    /// Minimum playback time before an update.
    pub wait: Duration,
    /// Defer the update until the player closes.
    pub wait_close: bool,
}

impl Default for UpdatePolicy {
    fn default() -> Self {
        Self {
            wait: Duration::from_secs(120),
            wait_close: false,
        }
    }
}

/// Detection memory carried between cycles.
#[derive(Debug, Clone)]
pub struct TrackerSession {
    pub last_show_tuple: Option<ShowEpisodePair>,
    pub last_filename: Option<String>,
    pub last_state: DetectionState,
    pub last_detection_time: Option<Instant>,
    pub last_updated: bool,
    pub last_close_queued: bool,
}

impl Default for TrackerSession {
    fn default() -> Self {
        Self {
            last_show_tuple: None,
            last_filename: None,
            last_state: DetectionState::NoVideo,
            last_detection_time: None,
            last_updated: false,
            last_close_queued: false,
        }
    }
}

impl TrackerSession {
    fn clear_pair(&mut self) {
        self.last_show_tuple = None;
        self.last_updated = false;
        self.last_close_queued = false;
        self.last_detection_time = None;
    }
}

#[derive(Debug, Default)]
pub struct DecisionEngine {
    session: TrackerSession,
    policy: UpdatePolicy,
}

impl DecisionEngine {
    pub fn new(policy: UpdatePolicy) -> Self {
        Self {
            session: TrackerSession::default(),
            policy,
        }
    }

    pub fn session(&self) -> &TrackerSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut TrackerSession {
        &mut self.session
    }

    /// Replace the debounce window (the media server derives it per item).
    pub fn set_update_wait(&mut self, wait: Duration) {
        self.policy.wait = wait;
    }

    /// Feed one cycle's detection result and return the signals to emit,
    /// in order.
    pub fn update_show_if_needed(
        &mut self,
        state: DetectionState,
        pair: Option<ShowEpisodePair>,
        msg: &dyn Messenger,
    ) -> Vec<TrackerEvent> {
        let mut events = Vec::new();

        match pair {
            Some(pair) => self.on_playing(pair, msg, &mut events),
            None if state != DetectionState::Unchanged && state != self.session.last_state => {
                self.on_state_change(state, msg, &mut events);
            }
            None => {}
        }

        self.session.last_state = state;
        events
    }

    fn on_playing(&mut self, pair: ShowEpisodePair, msg: &dyn Messenger, events: &mut Vec<TrackerEvent>) {
        let now = Instant::now();
        let session = &mut self.session;

        let is_new = session
            .last_show_tuple
            .as_ref()
            .map_or(true, |prev| !prev.is_same_unit(&pair));

        if is_new {
            if let Some(prev) = session.last_show_tuple.take() {
                events.push(TrackerEvent::Playing {
                    show_id: prev.show_id(),
                    playing: false,
                    episode: prev.episode,
                });
            }
            events.push(TrackerEvent::Playing {
                show_id: pair.show_id(),
                playing: true,
                episode: pair.episode,
            });
            session.last_detection_time = Some(now);
            session.last_updated = false;
            session.last_close_queued = false;
        }

        if !session.last_updated {
            if pair.episode == pair.show.next_episode() {
                let started = session.last_detection_time.unwrap_or(now);
                let elapsed = now.saturating_duration_since(started);

                if elapsed > self.policy.wait {
                    if self.policy.wait_close {
                        msg.info(SOURCE, "Waiting for the player to close.");
                        session.last_close_queued = true;
                    } else {
                        events.push(TrackerEvent::Update {
                            show_id: pair.show_id(),
                            episode: pair.episode,
                        });
                    }
                    session.last_updated = true;
                } else {
                    let remaining = self.policy.wait.saturating_sub(elapsed).as_secs() + 1;
                    msg.info(
                        SOURCE,
                        &format!(
                            "Will update {} {} in {} seconds",
                            pair.show.title, pair.episode, remaining
                        ),
                    );
                }
            } else {
                msg.warn(
                    SOURCE,
                    &format!(
                        "Player is not playing the next episode of {}. Ignoring.",
                        pair.show.title
                    ),
                );
                session.last_updated = true;
            }
        }

        session.last_show_tuple = Some(pair);
    }

    fn on_state_change(&mut self, state: DetectionState, msg: &dyn Messenger, events: &mut Vec<TrackerEvent>) {
        let session = &mut self.session;

        match state {
            DetectionState::NoVideo => {
                if let Some(prev) = &session.last_show_tuple {
                    if session.last_close_queued {
                        events.push(TrackerEvent::Update {
                            show_id: prev.show_id(),
                            episode: prev.episode,
                        });
                    } else if !session.last_updated {
                        msg.info(SOURCE, "Player was closed before update.");
                    }
                }
            }
            DetectionState::Unrecognized => {
                msg.warn(SOURCE, "Found video but the file name format couldn't be recognized.");
            }
            DetectionState::NotFound => {
                msg.warn(SOURCE, "Found player but show not in list.");
            }
            DetectionState::Playing | DetectionState::Unchanged => {}
        }

        if let Some(prev) = &session.last_show_tuple {
            events.push(TrackerEvent::Playing {
                show_id: prev.show_id(),
                playing: false,
                episode: prev.episode,
            });
        }
        session.clear_pair();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShowId;
    use crate::testing::{show, RecordingMessenger};

    const WAIT: Duration = Duration::from_secs(120);

    fn engine(wait_close: bool) -> DecisionEngine {
        DecisionEngine::new(UpdatePolicy {
            wait: WAIT,
            wait_close,
        })
    }

    fn playing(id: i64, on: bool, episode: u32) -> TrackerEvent {
        TrackerEvent::Playing {
            show_id: ShowId(id),
            playing: on,
            episode,
        }
    }

    fn update(id: i64, episode: u32) -> TrackerEvent {
        TrackerEvent::Update {
            show_id: ShowId(id),
            episode,
        }
    }

    fn pair(id: i64, progress: u32, episode: u32) -> Option<ShowEpisodePair> {
        Some(ShowEpisodePair::new(show(id, "X", progress, Some(12)), episode))
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_playing_then_update_once() {
        let msg = RecordingMessenger::default();
        let mut engine = engine(false);

        let events = engine.update_show_if_needed(DetectionState::Playing, pair(1, 3, 4), &msg);
        assert_eq!(events, vec![playing(1, true, 4)]);
        assert!(msg.contains("Will update X 4 in 121 seconds"));

        tokio::time::advance(WAIT + Duration::from_secs(1)).await;
        let events = engine.update_show_if_needed(DetectionState::Unchanged, pair(1, 3, 4), &msg);
        assert_eq!(events, vec![update(1, 4)]);
        assert!(engine.session().last_updated);

        tokio::time::advance(Duration::from_secs(10)).await;
        let events = engine.update_show_if_needed(DetectionState::Unchanged, pair(1, 3, 4), &msg);
        assert!(events.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_update_before_wait() {
        let msg = RecordingMessenger::default();
        let mut engine = engine(false);

        engine.update_show_if_needed(DetectionState::Playing, pair(1, 3, 4), &msg);
        tokio::time::advance(WAIT).await;
        let events = engine.update_show_if_needed(DetectionState::Unchanged, pair(1, 3, 4), &msg);
        assert!(events.is_empty());
        assert!(!engine.session().last_updated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_next_episode_never_updates() {
        let msg = RecordingMessenger::default();
        let mut engine = engine(false);

        let events = engine.update_show_if_needed(DetectionState::Playing, pair(1, 3, 6), &msg);
        assert_eq!(events, vec![playing(1, true, 6)]);
        assert!(msg.contains("Player is not playing the next episode of X. Ignoring."));

        for _ in 0..3 {
            tokio::time::advance(WAIT * 2).await;
            let events = engine.update_show_if_needed(DetectionState::Unchanged, pair(1, 3, 6), &msg);
            assert!(events.is_empty());
        }
        assert_eq!(msg.count("Ignoring."), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_switching_shows_closes_previous_first() {
        let msg = RecordingMessenger::default();
        let mut engine = engine(false);

        engine.update_show_if_needed(DetectionState::Playing, pair(1, 3, 4), &msg);
        tokio::time::advance(Duration::from_secs(30)).await;
        let events = engine.update_show_if_needed(DetectionState::Playing, pair(2, 0, 1), &msg);
        assert_eq!(events, vec![playing(1, false, 4), playing(2, true, 1)]);

        // The debounce window restarts for the new show.
        tokio::time::advance(Duration::from_secs(100)).await;
        let events = engine.update_show_if_needed(DetectionState::Unchanged, pair(2, 0, 1), &msg);
        assert!(events.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_switching_episode_closes_previous_first() {
        let msg = RecordingMessenger::default();
        let mut engine = engine(false);

        engine.update_show_if_needed(DetectionState::Playing, pair(1, 3, 4), &msg);
        let events = engine.update_show_if_needed(DetectionState::Playing, pair(1, 3, 5), &msg);
        assert_eq!(events, vec![playing(1, false, 4), playing(1, true, 5)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_wait_defers_update_until_no_video() {
        let msg = RecordingMessenger::default();
        let mut engine = engine(true);

        engine.update_show_if_needed(DetectionState::Playing, pair(1, 3, 4), &msg);
        tokio::time::advance(WAIT + Duration::from_secs(1)).await;
        let events = engine.update_show_if_needed(DetectionState::Unchanged, pair(1, 3, 4), &msg);
        assert!(events.is_empty());
        assert!(engine.session().last_close_queued);
        assert!(msg.contains("Waiting for the player to close."));

        let events = engine.update_show_if_needed(DetectionState::NoVideo, None, &msg);
        assert_eq!(events, vec![update(1, 4), playing(1, false, 4)]);
        assert!(engine.session().last_show_tuple.is_none());
        assert!(!engine.session().last_close_queued);

        let events = engine.update_show_if_needed(DetectionState::NoVideo, None, &msg);
        assert!(events.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_before_update() {
        let msg = RecordingMessenger::default();
        let mut engine = engine(false);

        engine.update_show_if_needed(DetectionState::Playing, pair(1, 3, 4), &msg);
        let events = engine.update_show_if_needed(DetectionState::NoVideo, None, &msg);
        assert_eq!(events, vec![playing(1, false, 4)]);
        assert!(msg.contains("Player was closed before update."));
        assert_eq!(engine.session().last_state, DetectionState::NoVideo);
        assert!(engine.session().last_detection_time.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrecognized_after_playing_clears_session() {
        let msg = RecordingMessenger::default();
        let mut engine = engine(false);

        engine.update_show_if_needed(DetectionState::Playing, pair(1, 3, 4), &msg);
        let events = engine.update_show_if_needed(DetectionState::Unrecognized, None, &msg);
        assert_eq!(events, vec![playing(1, false, 4)]);
        assert!(msg.contains("file name format couldn't be recognized"));
        assert!(engine.session().last_show_tuple.is_none());
        assert!(!engine.session().last_updated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_state_warns_once() {
        let msg = RecordingMessenger::default();
        let mut engine = engine(false);

        engine.update_show_if_needed(DetectionState::NotFound, None, &msg);
        engine.update_show_if_needed(DetectionState::NotFound, None, &msg);
        assert_eq!(msg.count("show not in list"), 1);
        assert_eq!(engine.session().last_state, DetectionState::NotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_file_after_unchanged_warns_again() {
        let msg = RecordingMessenger::default();
        let mut engine = engine(false);

        engine.update_show_if_needed(DetectionState::NotFound, None, &msg);
        let events = engine.update_show_if_needed(DetectionState::Unchanged, None, &msg);
        assert!(events.is_empty());
        assert_eq!(engine.session().last_state, DetectionState::Unchanged);

        engine.update_show_if_needed(DetectionState::NotFound, None, &msg);
        assert_eq!(msg.count("show not in list"), 2);

        engine.update_show_if_needed(DetectionState::Unrecognized, None, &msg);
        engine.update_show_if_needed(DetectionState::Unchanged, None, &msg);
        engine.update_show_if_needed(DetectionState::Unrecognized, None, &msg);
        assert_eq!(msg.count("couldn't be recognized"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_update_wait() {
        let msg = RecordingMessenger::default();
        let mut engine = engine(false);
        engine.set_update_wait(Duration::from_secs(5));

        engine.update_show_if_needed(DetectionState::Playing, pair(1, 0, 1), &msg);
        tokio::time::advance(Duration::from_secs(6)).await;
        let events = engine.update_show_if_needed(DetectionState::Unchanged, pair(1, 0, 1), &msg);
        assert_eq!(events, vec![update(1, 1)]);
    }
}

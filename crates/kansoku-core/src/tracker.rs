//! The tracker runtime: one observer task plus a handle to control it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::TrackerConfig;
use crate::engine::{DecisionEngine, UpdatePolicy};
use crate::error::TrackerError;
use crate::filename::{AnimeFilenameResolver, FilenameResolver};
use crate::matcher::{ShowMatcher, TitleMatcher};
use crate::messenger::{Messenger, SharedMessenger, TracingMessenger};
use crate::models::{DetectionState, TrackedShow, TrackerEvent};
use crate::observer::{Observer, Strategy};
use crate::recognition::Recognizer;
use crate::signals::{validate_signal, SignalDispatcher, SignalHandler};

/// Requests from a [`TrackerHandle`] to the observer task.
#[derive(Debug)]
pub enum TrackerCommand {
    UpdateList(Arc<[TrackedShow]>),
    SetMessenger(SharedMessenger),
    Connect(SignalHandler),
}

/// Recognition, decision engine and signal slots for one show list.
///
/// Drive it directly with [`cycle`](Self::cycle), or hand it to
/// [`spawn`](Self::spawn) to run an observation strategy in the background.
pub struct Tracker {
    recognizer: Recognizer,
    engine: DecisionEngine,
    signals: SignalDispatcher,
    messenger: SharedMessenger,
    shows: Arc<[TrackedShow]>,
    active: Arc<AtomicBool>,
}

impl Tracker {
    pub fn new(
        policy: UpdatePolicy,
        shows: impl Into<Arc<[TrackedShow]>>,
        resolver: Arc<dyn FilenameResolver>,
        matcher: Arc<dyn ShowMatcher>,
    ) -> Self {
        Self {
            recognizer: Recognizer::new(resolver, matcher),
            engine: DecisionEngine::new(policy),
            signals: SignalDispatcher::new(),
            messenger: Arc::new(TracingMessenger),
            shows: shows.into(),
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Tracker with the bundled resolver and matcher.
    pub fn from_config(config: &TrackerConfig, shows: impl Into<Arc<[TrackedShow]>>) -> Self {
        let tracker = Self::new(
            config.policy(),
            shows,
            Arc::new(AnimeFilenameResolver::new()),
            Arc::new(TitleMatcher),
        );
        tracker.active.store(config.enabled, Ordering::SeqCst);
        tracker
    }

    pub fn with_messenger(mut self, messenger: SharedMessenger) -> Self {
        self.messenger = messenger;
        self
    }

    pub fn connect(&mut self, handler: SignalHandler) {
        self.signals.connect(handler);
    }

    pub fn connect_signal(&mut self, name: &str, handler: SignalHandler) -> Result<(), TrackerError> {
        self.signals.connect_signal(name, handler)
    }

    /// Run one detection cycle for the file the probe reported.
    ///
    /// A disabled tracker treats every cycle as "nothing playing".
    pub fn cycle(&mut self, filename: Option<String>) -> Vec<TrackerEvent> {
        let filename = filename.filter(|_| self.is_active());
        let (state, pair) = self
            .recognizer
            .detect(filename, self.engine.session_mut(), &self.shows);
        let events = self
            .engine
            .update_show_if_needed(state, pair, self.messenger.as_ref());
        for event in &events {
            debug!(?event, "Emitting signal");
            self.signals.emit(event);
        }
        events
    }

    pub fn apply(&mut self, command: TrackerCommand) {
        match command {
            TrackerCommand::UpdateList(shows) => {
                debug!(count = shows.len(), "Show list replaced");
                self.shows = shows;
                // Re-resolve the current file against the new list.
                self.engine.session_mut().last_filename = None;
            }
            TrackerCommand::SetMessenger(messenger) => self.messenger = messenger,
            TrackerCommand::Connect(handler) => self.signals.connect(handler),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn disable(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn active_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.active)
    }

    pub fn last_state(&self) -> DetectionState {
        self.engine.session().last_state
    }

    pub fn set_update_wait(&mut self, wait: Duration) {
        self.engine.set_update_wait(wait);
    }

    pub fn messenger(&self) -> &dyn Messenger {
        self.messenger.as_ref()
    }

    /// Start observing with `strategy` on a background task.
    pub fn spawn(self, strategy: Strategy) -> TrackerHandle {
        let (commands, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let active = self.active_flag();
        let observer = Observer::new(self, rx, cancel.clone());
        let task = tokio::spawn(observer.run(strategy));
        TrackerHandle {
            commands,
            active,
            cancel,
            task,
        }
    }
}

/// Control surface for a spawned tracker.
///
/// Dropping the handle also stops the observer.
pub struct TrackerHandle {
    commands: mpsc::UnboundedSender<TrackerCommand>,
    active: Arc<AtomicBool>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl TrackerHandle {
    pub fn enable(&self) {
        self.active.store(true, Ordering::SeqCst);
    }

    pub fn disable(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Replace the show list the tracker matches against.
    pub fn update_list(&self, shows: impl Into<Arc<[TrackedShow]>>) -> Result<(), TrackerError> {
        self.send(TrackerCommand::UpdateList(shows.into()))
    }

    pub fn set_message_handler(&self, messenger: SharedMessenger) -> Result<(), TrackerError> {
        self.send(TrackerCommand::SetMessenger(messenger))
    }

    /// Register `handler` under a signal name. Unknown names and handlers of
    /// the wrong kind are rejected here, before reaching the observer.
    pub fn connect_signal(&self, name: &str, handler: SignalHandler) -> Result<(), TrackerError> {
        validate_signal(name, &handler)?;
        self.send(TrackerCommand::Connect(handler))
    }

    /// Whether the observer task is still running.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the observer and wait for it to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Tracker task ended abnormally");
        }
    }

    fn send(&self, command: TrackerCommand) -> Result<(), TrackerError> {
        self.commands.send(command).map_err(|_| TrackerError::Stopped)
    }
}

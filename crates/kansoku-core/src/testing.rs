//! Test doubles shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use kansoku_detect::{DetectError, FileProbe, MediaServer, MediaServerStatus};
use tokio_util::sync::CancellationToken;

use crate::filename::{FilenameResolver, ParsedFilename};
use crate::matcher::ShowMatcher;
use crate::messenger::Messenger;
use crate::models::{TrackedShow, TrackerEvent};
use crate::signals::SignalHandler;

pub fn show(id: i64, title: &str, progress: u32, total: Option<u32>) -> TrackedShow {
    let mut show = TrackedShow::new(id, title);
    show.my_progress = progress;
    show.total = total;
    show
}

/// Captures every message as `"<level>: <text>"`.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    messages: Mutex<Vec<String>>,
}

impl RecordingMessenger {
    pub fn contains(&self, needle: &str) -> bool {
        self.count(needle) > 0
    }

    pub fn count(&self, needle: &str) -> usize {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.contains(needle))
            .count()
    }

    fn push(&self, level: &str, message: &str) {
        self.messages.lock().unwrap().push(format!("{level}: {message}"));
    }
}

impl Messenger for RecordingMessenger {
    fn info(&self, _source: &str, message: &str) {
        self.push("info", message);
    }

    fn warn(&self, _source: &str, message: &str) {
        self.push("warn", message);
    }

    fn debug(&self, _source: &str, message: &str) {
        self.push("debug", message);
    }
}

/// Resolves only the filenames it was built with; counts calls.
#[derive(Debug, Default)]
pub struct StubResolver {
    table: HashMap<String, ParsedFilename>,
    calls: AtomicUsize,
}

impl StubResolver {
    pub fn new(entries: &[(&str, &str, Option<u32>)]) -> Self {
        let table = entries
            .iter()
            .map(|&(file, title, episode)| {
                (
                    file.to_string(),
                    ParsedFilename {
                        title: title.to_string(),
                        episode,
                    },
                )
            })
            .collect();
        Self {
            table,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FilenameResolver for StubResolver {
    fn resolve(&self, filename: &str) -> Option<ParsedFilename> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.table.get(filename).cloned()
    }
}

/// Matches titles by exact equality.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubMatcher;

impl ShowMatcher for StubMatcher {
    fn find<'a>(&self, title: &str, shows: &'a [TrackedShow]) -> Option<&'a TrackedShow> {
        shows.iter().find(|s| s.title == title)
    }
}

/// Handlers that push every emitted signal into a shared log.
pub fn recording_handlers() -> (Arc<Mutex<Vec<TrackerEvent>>>, SignalHandler, SignalHandler) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let playing_log = Arc::clone(&log);
    let update_log = Arc::clone(&log);
    let playing = SignalHandler::playing(move |show_id, playing, episode| {
        playing_log.lock().unwrap().push(TrackerEvent::Playing {
            show_id,
            playing,
            episode,
        });
    });
    let update = SignalHandler::update(move |show_id, episode| {
        update_log
            .lock()
            .unwrap()
            .push(TrackerEvent::Update { show_id, episode });
    });
    (log, playing, update)
}

/// Probe that replays a fixed script, then reports nothing playing.
#[derive(Debug, Default)]
pub struct ScriptedProbe {
    steps: VecDeque<Result<Option<String>, DetectError>>,
    repeat: Option<String>,
    calls: Arc<AtomicUsize>,
    cancel: Option<CancellationToken>,
}

impl ScriptedProbe {
    pub fn files(files: &[Option<&str>]) -> Self {
        Self {
            steps: files.iter().map(|f| Ok(f.map(str::to_string))).collect(),
            ..Default::default()
        }
    }

    /// Always reports `file`.
    pub fn repeat(file: &str) -> Self {
        Self {
            repeat: Some(file.to_string()),
            ..Default::default()
        }
    }

    pub fn launch_failure() -> Self {
        let error = DetectError::Launch {
            tool: "lsof".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        Self {
            steps: VecDeque::from([Err(error)]),
            ..Default::default()
        }
    }

    /// Cancel `token` once the script runs out.
    pub fn cancel_when_done(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl FileProbe for ScriptedProbe {
    async fn playing_file(&mut self) -> Result<Option<String>, DetectError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(file) = &self.repeat {
            return Ok(Some(file.clone()));
        }
        match self.steps.pop_front() {
            Some(step) => step,
            None => {
                if let Some(token) = &self.cancel {
                    token.cancel();
                }
                Ok(None)
            }
        }
    }
}

/// Media server that replays `(status, file)` pairs, then goes idle.
#[derive(Debug, Default)]
pub struct FakeServer {
    steps: VecDeque<(MediaServerStatus, Option<String>)>,
    current: Option<String>,
    wait: Option<Duration>,
    cancel: Option<CancellationToken>,
}

impl FakeServer {
    pub fn new(steps: Vec<(MediaServerStatus, Option<&str>)>) -> Self {
        Self {
            steps: steps
                .into_iter()
                .map(|(status, file)| (status, file.map(str::to_string)))
                .collect(),
            ..Default::default()
        }
    }

    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = Some(wait);
        self
    }

    pub fn cancel_when_done(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

impl MediaServer for FakeServer {
    async fn status(&mut self) -> MediaServerStatus {
        match self.steps.pop_front() {
            Some((status, file)) => {
                self.current = file;
                status
            }
            None => {
                if let Some(token) = &self.cancel {
                    token.cancel();
                }
                self.current = None;
                MediaServerStatus::Idle
            }
        }
    }

    fn playing_file(&self) -> Option<String> {
        self.current.clone()
    }

    fn update_wait(&self) -> Option<Duration> {
        self.wait
    }
}

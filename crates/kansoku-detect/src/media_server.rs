use std::future::Future;
use std::path::Path;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::base_filename;
use crate::error::DetectError;

/// Request timeout for media-server status queries.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Share of the item's duration that must elapse before progress is updated.
const UPDATE_WAIT_PERCENT: u32 = 80;

/// Connection settings for the media-server strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaServerConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub token: Option<String>,
    /// Seconds between status queries.
    pub poll_interval: u64,
}

impl Default for MediaServerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "localhost".into(),
            port: 32400,
            token: None,
            poll_interval: 30,
        }
    }
}

/// Playback status reported by the media server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaServerStatus {
    /// A session is playing.
    Active,
    /// Server is up; nothing is playing or playback is paused.
    Idle,
    /// Server could not be reached.
    NotRunning,
    /// Server rejected the access token.
    Unauthorized,
}

impl MediaServerStatus {
    /// Whether the playing file should be read in this state.
    pub fn is_running(self) -> bool {
        matches!(self, Self::Active | Self::Idle)
    }
}

/// A media server that knows what its clients are playing.
pub trait MediaServer: Send {
    /// Query the server and cache the current session.
    fn status(&mut self) -> impl Future<Output = MediaServerStatus> + Send;

    /// Base filename of the session cached by the last [`status`](Self::status) call.
    fn playing_file(&self) -> Option<String>;

    /// Debounce derived from the cached session's duration.
    fn update_wait(&self) -> Option<Duration>;
}

/// The session a Plex server reports for its first client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlexSession {
    pub file: Option<String>,
    pub duration: Option<Duration>,
}

/// Plex Media Server client reading `/status/sessions`.
pub struct PlexClient {
    http: Client,
    sessions_url: Url,
    token: Option<String>,
    current: Option<PlexSession>,
}

impl PlexClient {
    pub fn new(config: &MediaServerConfig) -> Result<Self, DetectError> {
        let base = Url::parse(&format!("http://{}:{}/", config.host, config.port))?;
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            sessions_url: base.join("status/sessions")?,
            token: config.token.clone().filter(|t| !t.is_empty()),
            current: None,
        })
    }

    async fn fetch_sessions(&self) -> Result<String, DetectError> {
        let mut request = self
            .http
            .get(self.sessions_url.clone())
            .header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.header("X-Plex-Token", token);
        }

        let resp = request.send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(DetectError::Api { status, message });
        }
        Ok(resp.text().await?)
    }
}

impl MediaServer for PlexClient {
    async fn status(&mut self) -> MediaServerStatus {
        let body = match self.fetch_sessions().await {
            Ok(body) => body,
            Err(DetectError::Api { status, .. }) if status == StatusCode::UNAUTHORIZED.as_u16() => {
                self.current = None;
                return MediaServerStatus::Unauthorized;
            }
            Err(e) => {
                debug!(error = %e, "Media server unreachable");
                self.current = None;
                return MediaServerStatus::NotRunning;
            }
        };

        let (status, session) = read_sessions(&body);
        self.current = session;
        status
    }

    fn playing_file(&self) -> Option<String> {
        self.current
            .as_ref()
            .and_then(|s| s.file.as_deref())
            .and_then(|file| base_filename(Path::new(file)))
    }

    fn update_wait(&self) -> Option<Duration> {
        self.current
            .as_ref()
            .and_then(|s| s.duration)
            .map(|d| d * UPDATE_WAIT_PERCENT / 100)
    }
}

#[derive(Debug, Deserialize)]
struct SessionsResponse {
    #[serde(rename = "MediaContainer")]
    container: MediaContainer,
}

#[derive(Debug, Deserialize)]
struct MediaContainer {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<SessionMetadata>,
}

#[derive(Debug, Deserialize)]
struct SessionMetadata {
    /// Milliseconds.
    #[serde(default)]
    duration: Option<u64>,
    #[serde(rename = "Player")]
    player: Option<SessionPlayer>,
    #[serde(rename = "Media", default)]
    media: Vec<SessionMedia>,
}

#[derive(Debug, Deserialize)]
struct SessionPlayer {
    state: String,
}

#[derive(Debug, Deserialize)]
struct SessionMedia {
    #[serde(rename = "Part", default)]
    parts: Vec<MediaPart>,
}

#[derive(Debug, Deserialize)]
struct MediaPart {
    file: Option<String>,
}

impl SessionMetadata {
    fn is_playing(&self) -> bool {
        self.player.as_ref().is_some_and(|p| p.state == "playing")
    }

    fn into_session(self) -> PlexSession {
        let file = self
            .media
            .into_iter()
            .flat_map(|m| m.parts)
            .find_map(|p| p.file);
        PlexSession {
            file,
            duration: self.duration.map(Duration::from_millis),
        }
    }
}

/// Classify a `/status/sessions` JSON body.
///
/// A playing session wins over paused ones; with no sessions the server is
/// idle.
pub fn parse_sessions(
    body: &str,
) -> Result<(MediaServerStatus, Option<PlexSession>), serde_json::Error> {
    let response: SessionsResponse = serde_json::from_str(body)?;
    let mut sessions = response.container.metadata;

    if let Some(pos) = sessions.iter().position(SessionMetadata::is_playing) {
        let session = sessions.swap_remove(pos).into_session();
        return Ok((MediaServerStatus::Active, Some(session)));
    }

    let session = sessions.into_iter().next().map(SessionMetadata::into_session);
    Ok((MediaServerStatus::Idle, session))
}

/// Like [`parse_sessions`], but a body that cannot be read still comes from
/// a reachable server: it counts as idle with no session.
fn read_sessions(body: &str) -> (MediaServerStatus, Option<PlexSession>) {
    parse_sessions(body).unwrap_or_else(|e| {
        warn!(error = %e, "Unreadable media server response");
        (MediaServerStatus::Idle, None)
    })
}

//! Per-user session state.
//!
//! Each browser session owns one [`Session`] behind its own lock. The
//! registry only maps cookie ids to sessions; nothing mutable is shared
//! between two sessions.

use axum::http::{HeaderMap, HeaderValue, header};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::image_io::AcquiredImage;

pub const SESSION_COOKIE: &str = "fridgecipe_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of the transcript. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The recipe produced from the last analysed photo and the follow-up chat.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub recipe: String,
    pub chat_history: Vec<ChatMessage>,
}

impl SessionState {
    /// Replace the recipe with a fresh analysis result.
    pub fn set_recipe(&mut self, recipe: String) {
        self.recipe = recipe;
    }

    /// `None` while no analysis has succeeded yet.
    #[must_use]
    pub fn recipe(&self) -> Option<&str> {
        if self.recipe.is_empty() {
            None
        } else {
            Some(&self.recipe)
        }
    }

    /// Record one completed exchange, user turn first.
    pub fn push_exchange(&mut self, user: String, assistant: String) {
        self.chat_history.push(ChatMessage::user(user));
        self.chat_history.push(ChatMessage::assistant(assistant));
    }
}

/// The two ways of acquiring a photo. Each keeps its own image and analysis phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Upload,
    Camera,
}

impl Tab {
    pub const ALL: [Self; 2] = [Self::Upload, Self::Camera];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Camera => "camera",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Upload => 0,
            Self::Camera => 1,
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisPhase {
    #[default]
    Idle,
    AwaitingRecipe,
    RecipeReady,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatPhase {
    #[default]
    Idle,
    AwaitingReply,
}

#[derive(Debug, Default)]
pub struct Session {
    pub state: SessionState,
    images: [Option<AcquiredImage>; 2],
    analysis: [AnalysisPhase; 2],
    pub chat: ChatPhase,
    /// Error from the last failed action, shown once on the next render.
    pub notice: Option<String>,
}

impl Session {
    #[must_use]
    pub fn image(&self, tab: Tab) -> Option<&AcquiredImage> {
        self.images[tab.index()].as_ref()
    }

    pub fn set_image(&mut self, tab: Tab, image: AcquiredImage) {
        self.images[tab.index()] = Some(image);
    }

    #[must_use]
    pub const fn analysis(&self, tab: Tab) -> AnalysisPhase {
        self.analysis[tab.index()]
    }

    pub fn set_analysis(&mut self, tab: Tab, phase: AnalysisPhase) {
        self.analysis[tab.index()] = phase;
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            recipe: self.state.recipe.clone(),
            chat_history: self.state.chat_history.clone(),
            analysis: TabPhases {
                upload: self.analysis(Tab::Upload),
                camera: self.analysis(Tab::Camera),
            },
            chat: self.chat,
            images: TabFlags {
                upload: self.image(Tab::Upload).is_some(),
                camera: self.image(Tab::Camera).is_some(),
            },
            notice: self.notice.clone(),
        }
    }
}

/// JSON projection of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub recipe: String,
    pub chat_history: Vec<ChatMessage>,
    pub analysis: TabPhases,
    pub chat: ChatPhase,
    pub images: TabFlags,
    pub notice: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TabPhases {
    pub upload: AnalysisPhase,
    pub camera: AnalysisPhase,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TabFlags {
    pub upload: bool,
    pub camera: bool,
}

pub type SessionHandle = Arc<Mutex<Session>>;

pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

#[derive(Debug)]
struct Entry {
    handle: SessionHandle,
    last_seen: Instant,
}

/// Process-local map from cookie id to session.
///
/// Sessions idle for longer than `idle_ttl` are dropped whenever a new one is
/// inserted, and the map never holds more than `max_sessions` entries.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, Entry>>>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_limits(DEFAULT_SESSION_IDLE, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_limits(idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            inner: Arc::default(),
            idle_ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Look up the session for `id`, creating an empty one when the id is
    /// missing, unknown or expired. The returned flag is `true` for a new session.
    pub async fn resolve(&self, id: Option<Uuid>) -> (Uuid, SessionHandle, bool) {
        let mut map = self.inner.write().await;

        if let Some(id) = id
            && let Some(entry) = map.get_mut(&id)
            && entry.last_seen.elapsed() < self.idle_ttl
        {
            entry.last_seen = Instant::now();
            return (id, entry.handle.clone(), false);
        }

        self.evict(&mut map);

        let id = Uuid::new_v4();
        let handle = SessionHandle::default();
        map.insert(
            id,
            Entry {
                handle: handle.clone(),
                last_seen: Instant::now(),
            },
        );
        tracing::debug!(session = %id, live = map.len(), "session created");
        (id, handle, true)
    }

    /// Existing, unexpired session for `id`. Never creates one.
    pub async fn get(&self, id: Uuid) -> Option<SessionHandle> {
        let mut map = self.inner.write().await;
        let entry = map.get_mut(&id)?;
        if entry.last_seen.elapsed() >= self.idle_ttl {
            return None;
        }
        entry.last_seen = Instant::now();
        Some(entry.handle.clone())
    }

    /// Drop idle sessions, then the least recently seen ones until there is
    /// room for one more.
    fn evict(&self, map: &mut HashMap<Uuid, Entry>) {
        let before = map.len();
        map.retain(|_, e| e.last_seen.elapsed() < self.idle_ttl);

        while map.len() >= self.max_sessions {
            let Some(oldest) = map
                .iter()
                .min_by_key(|(_, e)| e.last_seen)
                .map(|(id, _)| *id)
            else {
                break;
            };
            map.remove(&oldest);
        }

        let dropped = before - map.len();
        if dropped > 0 {
            tracing::debug!(dropped, live = map.len(), "sessions evicted");
        }
    }

    /// Tear a session down. Returns whether it existed.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.inner.write().await.remove(&id).is_some();
        if removed {
            tracing::debug!(session = %id, "session ended");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

/// Session id carried by the request's `Cookie` header, if any.
#[must_use]
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

#[must_use]
pub fn session_cookie(id: Uuid) -> HeaderValue {
    // a hyphenated uuid is always a valid header value
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("fridgecipe_session=; Path=/"))
}

#[must_use]
pub const fn expired_session_cookie() -> HeaderValue {
    HeaderValue::from_static("fridgecipe_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

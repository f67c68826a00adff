pub mod announcement;
pub mod game;
pub mod session;
mod sse;
pub mod state_machine;

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use tokio::sync::Mutex;

use crate::{config::AppConfig, error::ServiceError, state::session::GameSession};

pub use self::sse::SseHub;

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;
/// Exclusive handle to one session; held only while reading or mutating it.
pub type SessionHandle = Arc<Mutex<GameSession>>;

/// Central application state: configuration, the session registry and the event hub.
pub struct AppState {
    config: AppConfig,
    sessions: DashMap<String, SessionHandle>,
    events: SseHub,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig) -> SharedState {
        let events = SseHub::new(config.event_capacity());
        Arc::new(Self {
            config,
            sessions: DashMap::new(),
            events,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Broadcast hub for outbound notifications.
    pub fn events(&self) -> &SseHub {
        &self.events
    }

    /// Register a fresh lobby for `scope`.
    ///
    /// Check and insert happen under the same shard lock, so two concurrent
    /// creates for one scope cannot both succeed.
    pub fn create_session(&self, scope: &str, host_id: &str) -> Result<SessionHandle, ServiceError> {
        match self.sessions.entry(scope.to_string()) {
            Entry::Occupied(_) => Err(ServiceError::ScopeConflict(format!(
                "a game is already open in `{scope}`"
            ))),
            Entry::Vacant(slot) => {
                let session = GameSession::new(scope, host_id, self.config.round_duration());
                let handle = Arc::new(Mutex::new(session));
                slot.insert(handle.clone());
                Ok(handle)
            }
        }
    }

    /// Session registered for `scope`.
    pub fn session(&self, scope: &str) -> Result<SessionHandle, ServiceError> {
        self.sessions
            .get(scope)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ServiceError::NotFound(format!("no game in `{scope}`")))
    }

    /// Drop `scope` from the registry if it still maps to `handle`.
    pub fn remove_session(&self, scope: &str, handle: &SessionHandle) -> bool {
        self.sessions
            .remove_if(scope, |_, current| Arc::ptr_eq(current, handle))
            .is_some()
    }

    /// Number of registered sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Locate the running session whose roster contains `player_id`.
    ///
    /// Handles are cloned out of the map before any session lock is taken.
    pub async fn find_running_session_for(
        &self,
        player_id: &str,
    ) -> Result<(String, SessionHandle), ServiceError> {
        let candidates: Vec<(String, SessionHandle)> = self
            .sessions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        for (scope, handle) in candidates {
            let session = handle.lock().await;
            if session.is_running() && session.player(player_id).is_some() {
                drop(session);
                return Ok((scope, handle));
            }
        }

        Err(ServiceError::NotFound(format!(
            "`{player_id}` is not playing a running game"
        )))
    }
}

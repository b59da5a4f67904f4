use std::sync::Arc;

use dashmap::DashMap;
use tomas_shared::chat::ChatTurn;
use tracing::warn;

use crate::config::{ChatConfig, upstream_connect_timeout, upstream_http_timeout};

/// Conversation turns per session id, excluding the system-prompt priming pair.
pub type SessionStore = DashMap<String, Vec<ChatTurn>>;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub http_client: reqwest::Client,
    pub chat: Arc<ChatConfig>,
}

impl AppState {
    pub fn new(chat: ChatConfig) -> Self {
        let request_timeout = upstream_http_timeout();
        let connect_timeout = upstream_connect_timeout();
        let http_client = reqwest::Client::builder()
            .user_agent("tomas-server/0.1")
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .or_else(|e| {
                warn!(
                    error = %e,
                    "failed to build configured HTTP client, retrying without custom user-agent"
                );
                reqwest::Client::builder()
                    .timeout(request_timeout)
                    .connect_timeout(connect_timeout)
                    .build()
            })
            .unwrap_or_else(|e| {
                panic!("failed to build timeout-configured HTTP client: {e}");
            });
        Self {
            sessions: Arc::new(DashMap::new()),
            http_client,
            chat: Arc::new(chat),
        }
    }

    /// Append turns to a session, keeping only the newest `history_limit` of them.
    pub fn record_turns(&self, session_id: &str, turns: impl IntoIterator<Item = ChatTurn>) {
        let limit = self.chat.history_limit;
        let mut history = self.sessions.entry(session_id.to_owned()).or_default();
        history.extend(turns);
        if history.len() > limit {
            let excess = history.len() - limit;
            history.drain(..excess);
        }
    }

    pub fn history(&self, session_id: &str) -> Vec<ChatTurn> {
        self.sessions
            .get(session_id)
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    /// Returns whether the session existed.
    pub fn clear_session(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }
}

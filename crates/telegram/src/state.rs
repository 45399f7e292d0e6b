use {
    std::{
        collections::HashMap,
        sync::{Arc, RwLock},
    },
    teloxide::{Bot, types::ChatId},
};

use {
    postdesk_config::PostdeskConfig,
    postdesk_source::{ContentSource, PostCache},
};

use crate::{outbound::Outbound, session::ChatSession};

/// Shared bot state. Sessions live behind a sync lock that is never held
/// across an await; the export pipeline works on cloned session data.
pub struct BotState {
    pub bot: Bot,
    pub config: PostdeskConfig,
    pub source: Arc<dyn ContentSource>,
    pub cache: Arc<dyn PostCache>,
    pub outbound: Outbound,
    sessions: RwLock<HashMap<ChatId, ChatSession>>,
}

impl BotState {
    pub fn new(
        bot: Bot,
        config: PostdeskConfig,
        source: Arc<dyn ContentSource>,
        cache: Arc<dyn PostCache>,
    ) -> Self {
        Self {
            outbound: Outbound::new(bot.clone()),
            bot,
            config,
            source,
            cache,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Run `f` against the chat's session, creating it on first contact.
    pub fn with_session<T>(&self, chat_id: ChatId, f: impl FnOnce(&mut ChatSession) -> T) -> T {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(|e| e.into_inner());
        let session = sessions
            .entry(chat_id)
            .or_insert_with(|| ChatSession::new(self.config.telegram.page_lines));
        f(session)
    }

    /// Snapshot a session for work that must not hold the lock.
    pub fn session_snapshot(&self, chat_id: ChatId) -> Option<ChatSession> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.get(&chat_id).cloned()
    }
}

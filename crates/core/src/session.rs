//! Explicit per-session state
//!
//! Everything that used to be ambient (the signed-in user, the search cache,
//! the chat transcript) lives on a `SessionContext` that callers create at
//! session start and pass into every component call. Nothing here persists;
//! a new session starts empty.

use crate::db::models::{ActivityType, PaperRecord, UserProfile};
use crate::db::Store;
use crate::errors::Result;
use crate::sources::SearchSignature;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Most recent in-session activity entries kept in memory.
const ACTIVITY_FEED_CAP: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message in the session chat transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// An in-session activity entry; mirrored to the store's durable history
/// when a user is signed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionActivity {
    pub activity_type: ActivityType,
    pub title: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Per-session mutable state, created at session start and dropped at the
/// end. Never shared between sessions.
pub struct SessionContext {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    current_user: Option<UserProfile>,
    pub(crate) search_cache: HashMap<SearchSignature, Vec<PaperRecord>>,
    transcript: Vec<ChatTurn>,
    activity_feed: Vec<SessionActivity>,
}

impl SessionContext {
    pub fn new() -> Self {
        let id = Uuid::new_v4();
        debug!(session_id = %id, "session started");
        SessionContext {
            id,
            created_at: Utc::now(),
            current_user: None,
            search_cache: HashMap::new(),
            transcript: Vec::new(),
            activity_feed: Vec::new(),
        }
    }

    pub fn current_user(&self) -> Option<&UserProfile> {
        self.current_user.as_ref()
    }

    /// Attach a signed-in user to this session.
    pub fn sign_in(&mut self, profile: UserProfile) {
        debug!(session_id = %self.id, username = %profile.username, "user signed in");
        self.current_user = Some(profile);
    }

    /// Detach the current user. Session-local state (cache, transcript)
    /// survives sign-out.
    pub fn sign_out(&mut self) {
        self.current_user = None;
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub(crate) fn push_turn(&mut self, role: ChatRole, content: String) {
        self.transcript.push(ChatTurn {
            role,
            content,
            timestamp: Utc::now(),
        });
    }

    pub fn activity_feed(&self) -> &[SessionActivity] {
        &self.activity_feed
    }

    /// Record an activity on the session feed and, when a user is signed in,
    /// in the durable history too.
    pub async fn record_activity(
        &mut self,
        store: &Store,
        activity_type: ActivityType,
        title: &str,
        description: &str,
    ) -> Result<()> {
        self.activity_feed.push(SessionActivity {
            activity_type,
            title: title.to_string(),
            description: description.to_string(),
            timestamp: Utc::now(),
        });
        if self.activity_feed.len() > ACTIVITY_FEED_CAP {
            let excess = self.activity_feed.len() - ACTIVITY_FEED_CAP;
            self.activity_feed.drain(..excess);
        }

        if let Some(user) = &self.current_user {
            store
                .add_history(user.id, activity_type, title, description)
                .await?;
        }
        Ok(())
    }

    /// Drop all cached search results for this session.
    pub fn clear_search_cache(&mut self) {
        self.search_cache.clear();
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

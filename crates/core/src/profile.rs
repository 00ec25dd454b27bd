//! User profile management
//!
//! Registration, authentication, and profile updates over the store, plus
//! thin delegations for a user's saved papers and history. Passwords are
//! stored as unsalted SHA-256 hex digests, a stand-in until a real KDF such
//! as argon2 replaces it.

use crate::db::models::{HistoryItem, PaperRecord, SavedPaper, UserProfile, UserUpdate};
use crate::db::Store;
use crate::errors::Result;
use sha2::{Digest, Sha256};
use tracing::info;

/// Seed account available in every fresh database.
const DEMO_USERNAME: &str = "demo_user";
const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_PASSWORD: &str = "password123";

/// Fields a user may change about themselves; passwords arrive in plain
/// text and are hashed here.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub struct ProfileService {
    store: Store,
}

impl ProfileService {
    pub fn new(store: Store) -> Self {
        ProfileService { store }
    }

    pub fn hash_password(password: &str) -> String {
        hex::encode(Sha256::digest(password.as_bytes()))
    }

    /// Create an account. Returns `None` when the username or email is
    /// already taken.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<UserProfile>> {
        let password_hash = Self::hash_password(password);
        let user = self.store.create_user(username, email, &password_hash).await?;
        Ok(user.map(|u| u.profile()))
    }

    /// Check credentials. On success, records the login time and returns the
    /// sanitized profile; on any mismatch, returns `None`.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<UserProfile>> {
        let Some(user) = self.store.get_user_by_username(username).await? else {
            return Ok(None);
        };

        if user.password_hash != Self::hash_password(password) {
            return Ok(None);
        }

        self.store.update_last_login(user.id).await?;
        Ok(Some(user.profile()))
    }

    /// Apply profile changes. Returns false when nothing changed.
    pub async fn update_profile(&self, user_id: i64, update: &ProfileUpdate) -> Result<bool> {
        let db_update = UserUpdate {
            email: update.email.clone(),
            password_hash: update.password.as_deref().map(Self::hash_password),
            ..Default::default()
        };
        self.store.update_user(user_id, &db_update).await
    }

    /// Seed the demo account if it is not there yet. Safe to call on every
    /// startup.
    pub async fn ensure_demo_user(&self) -> Result<()> {
        if self.store.get_user_by_username(DEMO_USERNAME).await?.is_none() {
            info!(username = DEMO_USERNAME, "seeding demo user");
            self.store
                .create_user(
                    DEMO_USERNAME,
                    DEMO_EMAIL,
                    &Self::hash_password(DEMO_PASSWORD),
                )
                .await?;
        }
        Ok(())
    }

    pub async fn saved_papers(&self, user_id: i64) -> Result<Vec<SavedPaper>> {
        self.store.get_saved_papers(user_id).await
    }

    pub async fn save_paper(&self, user_id: i64, paper: &PaperRecord) -> Result<bool> {
        self.store.save_for_user(user_id, paper).await
    }

    pub async fn remove_saved_paper(&self, user_id: i64, paper_id: i64) -> Result<bool> {
        self.store.remove_saved(user_id, paper_id).await
    }

    pub async fn history(&self, user_id: i64, limit: i64) -> Result<Vec<HistoryItem>> {
        self.store.get_history(user_id, limit).await
    }
}

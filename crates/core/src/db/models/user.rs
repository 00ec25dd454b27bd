//! User account records

use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored user account. `password_hash` never leaves the store/profile
/// boundary; frontends receive a [`UserProfile`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub join_date: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    /// Free-form preferences blob
    pub preferences: Option<serde_json::Value>,
}

impl User {
    /// The sanitized view handed to the presentation layer.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            join_date: self.join_date,
        }
    }
}

/// A user view without credential material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub join_date: DateTime<Utc>,
}

/// Partial update for a user row. The fields here are the complete allow-list;
/// anything else a caller might want to change simply has no slot.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub preferences: Option<serde_json::Value>,
}

impl UserUpdate {
    /// True when no updatable field is set.
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.preferences.is_none()
    }
}

/// Raw row shape; JSON columns are parsed on the way out.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub join_date: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub preferences: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self> {
        let preferences = match row.preferences {
            Some(raw) if !raw.is_empty() => Some(serde_json::from_str(&raw)?),
            _ => None,
        };
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            join_date: row.join_date,
            last_login: row.last_login,
            preferences,
        })
    }
}

//! Research activity history records

use crate::errors::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The tracked user activity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Search,
    Analysis,
    Chat,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Search => "search",
            ActivityType::Analysis => "analysis",
            ActivityType::Chat => "chat",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "search" => Ok(ActivityType::Search),
            "analysis" => Ok(ActivityType::Analysis),
            "chat" => Ok(ActivityType::Chat),
            other => Err(AppError::internal(format!(
                "unknown activity type: {other}"
            ))),
        }
    }
}

/// One append-only history row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: i64,
    pub user_id: i64,
    pub activity_type: ActivityType,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
}

/// Raw row shape; activity_type is parsed on the way out.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct HistoryRow {
    pub id: i64,
    pub user_id: i64,
    pub activity_type: String,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for HistoryItem {
    type Error = AppError;

    fn try_from(row: HistoryRow) -> Result<Self, AppError> {
        Ok(HistoryItem {
            id: row.id,
            user_id: row.user_id,
            activity_type: row.activity_type.parse()?,
            title: row.title,
            description: row.description,
            date: row.date,
        })
    }
}

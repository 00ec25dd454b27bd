//! Repository for all durable PaperDesk state
//!
//! Every write is atomic per call; no cross-call transactions are exposed.
//! Uniqueness conflicts and lookup misses are recovered here and surfaced as
//! `None`/`false`; they never escape the store boundary as errors.

use crate::config::DatabaseConfig;
use crate::db;
use crate::db::models::analysis::AnalysisDocument;
use crate::db::models::history::{ActivityType, HistoryItem, HistoryRow};
use crate::db::models::paper::{PaperRecord, PaperRow, SavedPaper};
use crate::db::models::user::{User, UserRow, UserUpdate};
use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::QueryBuilder;
use tracing::debug;

/// Map a unique-constraint violation to a Conflict; pass everything else
/// through as a database error.
fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::conflict(message),
        _ => AppError::Database(err),
    }
}

/// Repository over users, papers, saved papers, analyses, and history.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Wrap an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the configured database, apply the schema, and wrap the pool.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        Ok(Self::new(db::connect(config).await?))
    }

    /// An in-memory store for tests and throwaway sessions.
    pub async fn in_memory() -> Result<Self> {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..DatabaseConfig::default()
        };
        Self::connect(&config).await
    }

    /// Access the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    /// Create a new user. Returns `None` when the username or email is
    /// already taken.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<User>> {
        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash, join_date) VALUES (?, ?, ?, ?)",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "username or email already exists"));

        match result {
            Ok(_) => self.get_user_by_username(username).await,
            Err(err) if err.is_conflict() => {
                debug!(username, "user creation conflicted");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Find a user by username.
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, password_hash, join_date, last_login, preferences
             FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Find a user by id.
    pub async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, password_hash, join_date, last_login, preferences
             FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Apply a partial update to a user row. Returns false when nothing is
    /// updatable, the user does not exist, or a uniqueness constraint is hit.
    pub async fn update_user(&self, user_id: i64, update: &UserUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(false);
        }

        let preferences = update
            .preferences
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut builder = QueryBuilder::<sqlx::Sqlite>::new("UPDATE users SET ");
        {
            let mut fields = builder.separated(", ");
            if let Some(username) = &update.username {
                fields.push("username = ");
                fields.push_bind_unseparated(username.as_str());
            }
            if let Some(email) = &update.email {
                fields.push("email = ");
                fields.push_bind_unseparated(email.as_str());
            }
            if let Some(password_hash) = &update.password_hash {
                fields.push("password_hash = ");
                fields.push_bind_unseparated(password_hash.as_str());
            }
            if let Some(preferences) = preferences {
                fields.push("preferences = ");
                fields.push_bind_unseparated(preferences);
            }
        }
        builder.push(" WHERE id = ");
        builder.push_bind(user_id);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "username or email already exists"));

        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(err) if err.is_conflict() => {
                debug!(user_id, "user update conflicted");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Record a successful authentication.
    pub async fn update_last_login(&self, user_id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ========================================================================
    // Paper Operations
    // ========================================================================

    /// Insert a paper, or return the existing row's id when its external key
    /// is already present (first write wins; the stored row is not touched).
    pub async fn upsert_paper(&self, paper: &PaperRecord) -> Result<i64> {
        let key = paper.storage_key();
        let authors = serde_json::to_string(&paper.authors)?;
        let metadata = serde_json::to_string(&paper.metadata)?;

        let result = sqlx::query(
            "INSERT INTO papers
             (paper_key, title, authors, year, source, abstract_text, citation_count, url, metadata, date_added)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(paper_key) DO NOTHING",
        )
        .bind(&key)
        .bind(&paper.title)
        .bind(&authors)
        .bind(paper.year)
        .bind(&paper.source)
        .bind(&paper.abstract_text)
        .bind(paper.citation_count)
        .bind(&paper.url)
        .bind(&metadata)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(result.last_insert_rowid());
        }

        let id: i64 = sqlx::query_scalar("SELECT id FROM papers WHERE paper_key = ?")
            .bind(&key)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    /// Fetch a paper by its store id.
    pub async fn get_paper(&self, paper_id: i64) -> Result<Option<PaperRecord>> {
        let row = sqlx::query_as::<_, PaperRow>(
            "SELECT id, paper_key, title, authors, year, source, abstract_text,
                    citation_count, url, metadata
             FROM papers WHERE id = ?",
        )
        .bind(paper_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PaperRecord::try_from).transpose()
    }

    // ========================================================================
    // Saved Paper Operations
    // ========================================================================

    /// Save a paper into a user's collection. Re-saving is idempotent.
    pub async fn save_for_user(&self, user_id: i64, paper: &PaperRecord) -> Result<bool> {
        let paper_id = self.upsert_paper(paper).await?;

        let result = sqlx::query(
            "INSERT INTO user_papers (user_id, paper_id, date_saved) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(paper_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "paper already saved"));

        match result {
            Ok(_) => Ok(true),
            // Already in the collection; treat as success.
            Err(err) if err.is_conflict() => Ok(true),
            Err(err) => Err(err),
        }
    }

    /// A user's saved papers, most recently saved first.
    pub async fn get_saved_papers(&self, user_id: i64) -> Result<Vec<SavedPaper>> {
        #[derive(sqlx::FromRow)]
        struct SavedRow {
            #[sqlx(flatten)]
            paper: PaperRow,
            date_saved: DateTime<Utc>,
            notes: Option<String>,
        }

        let rows = sqlx::query_as::<_, SavedRow>(
            "SELECT p.id, p.paper_key, p.title, p.authors, p.year, p.source,
                    p.abstract_text, p.citation_count, p.url, p.metadata,
                    up.date_saved, up.notes
             FROM papers p
             JOIN user_papers up ON p.id = up.paper_id
             WHERE up.user_id = ?
             ORDER BY up.date_saved DESC, up.id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(SavedPaper {
                    paper: PaperRecord::try_from(row.paper)?,
                    date_saved: row.date_saved,
                    notes: row.notes,
                })
            })
            .collect()
    }

    /// Remove a paper from a user's collection. Returns false when there was
    /// no matching row.
    pub async fn remove_saved(&self, user_id: i64, paper_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_papers WHERE user_id = ? AND paper_id = ?")
            .bind(user_id)
            .bind(paper_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ========================================================================
    // History Operations
    // ========================================================================

    /// Append one activity row to a user's research history.
    pub async fn add_history(
        &self,
        user_id: i64,
        activity_type: ActivityType,
        title: &str,
        description: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO research_history (user_id, activity_type, title, description, date)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(activity_type.as_str())
        .bind(title)
        .bind(description)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// A user's history, most recent first, capped at `limit`.
    pub async fn get_history(&self, user_id: i64, limit: i64) -> Result<Vec<HistoryItem>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            "SELECT id, user_id, activity_type, title, description, date
             FROM research_history
             WHERE user_id = ?
             ORDER BY date DESC, id DESC
             LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(HistoryItem::try_from).collect()
    }

    // ========================================================================
    // Analysis Operations
    // ========================================================================

    /// Persist the analysis for a paper: insert if absent, otherwise
    /// overwrite in place. At most one analysis row exists per paper.
    pub async fn save_analysis(&self, paper_id: i64, analysis: &AnalysisDocument) -> Result<bool> {
        let key_findings = serde_json::to_string(&analysis.key_findings)?;
        let methodology = serde_json::to_string(&analysis.methodology)?;
        let implications = serde_json::to_string(&analysis.implications)?;

        let result = sqlx::query(
            "INSERT INTO paper_analysis
             (paper_id, summary, key_findings, methodology, implications, date_analyzed)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(paper_id) DO UPDATE SET
                 summary = excluded.summary,
                 key_findings = excluded.key_findings,
                 methodology = excluded.methodology,
                 implications = excluded.implications,
                 date_analyzed = excluded.date_analyzed",
        )
        .bind(paper_id)
        .bind(&analysis.summary)
        .bind(&key_findings)
        .bind(&methodology)
        .bind(&implications)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fetch the stored analysis for a paper, if any.
    pub async fn get_analysis(&self, paper_id: i64) -> Result<Option<AnalysisDocument>> {
        #[derive(sqlx::FromRow)]
        struct AnalysisRow {
            summary: String,
            key_findings: String,
            methodology: String,
            implications: String,
        }

        let row = sqlx::query_as::<_, AnalysisRow>(
            "SELECT summary, key_findings, methodology, implications
             FROM paper_analysis WHERE paper_id = ?",
        )
        .bind(paper_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(AnalysisDocument {
                summary: row.summary,
                key_findings: serde_json::from_str(&row.key_findings)?,
                methodology: serde_json::from_str(&row.methodology)?,
                implications: serde_json::from_str(&row.implications)?,
                error: None,
            })
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{KeyFinding, UserUpdate};
    use serde_json::json;

    fn sample_paper(title: &str, source: &str) -> PaperRecord {
        PaperRecord {
            title: title.to_string(),
            authors: vec!["Ada Lovelace".to_string(), "Alan Turing".to_string()],
            year: 2020,
            source: source.to_string(),
            abstract_text: "An abstract.".to_string(),
            citation_count: 12,
            url: "https://example.org/paper".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_user_conflicts_return_none() {
        let store = Store::in_memory().await.unwrap();

        let user = store
            .create_user("ada", "ada@example.com", "hash")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.username, "ada");
        assert!(user.last_login.is_none());

        // Same username
        assert!(store
            .create_user("ada", "other@example.com", "hash")
            .await
            .unwrap()
            .is_none());
        // Same email
        assert!(store
            .create_user("grace", "ada@example.com", "hash")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_user_allow_list_and_uniqueness() {
        let store = Store::in_memory().await.unwrap();
        let ada = store
            .create_user("ada", "ada@example.com", "hash")
            .await
            .unwrap()
            .unwrap();
        store
            .create_user("grace", "grace@example.com", "hash")
            .await
            .unwrap()
            .unwrap();

        // Empty update
        assert!(!store.update_user(ada.id, &UserUpdate::default()).await.unwrap());

        // Email change plus preferences blob
        let update = UserUpdate {
            email: Some("countess@example.com".to_string()),
            preferences: Some(json!({"theme": "dark"})),
            ..Default::default()
        };
        assert!(store.update_user(ada.id, &update).await.unwrap());

        let ada = store.get_user_by_id(ada.id).await.unwrap().unwrap();
        assert_eq!(ada.email, "countess@example.com");
        assert_eq!(ada.preferences, Some(json!({"theme": "dark"})));

        // Uniqueness violation fails silently
        let update = UserUpdate {
            username: Some("grace".to_string()),
            ..Default::default()
        };
        assert!(!store.update_user(ada.id, &update).await.unwrap());

        // Unknown user
        assert!(!store
            .update_user(
                9999,
                &UserUpdate {
                    email: Some("ghost@example.com".to_string()),
                    ..Default::default()
                }
            )
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_upsert_paper_first_write_wins() {
        let store = Store::in_memory().await.unwrap();

        let first = sample_paper("Attention Is All You Need", "Semantic Scholar");
        let id = store.upsert_paper(&first).await.unwrap();

        // Same source+title but different fields: the stored row stays as-is.
        let mut second = sample_paper("Attention Is All You Need", "Semantic Scholar");
        second.citation_count = 99999;
        let again = store.upsert_paper(&second).await.unwrap();
        assert_eq!(id, again);

        let stored = store.get_paper(id).await.unwrap().unwrap();
        assert_eq!(stored.citation_count, 12);
        assert_eq!(
            stored.authors,
            vec!["Ada Lovelace".to_string(), "Alan Turing".to_string()]
        );
    }

    #[tokio::test]
    async fn test_save_for_user_is_idempotent() {
        let store = Store::in_memory().await.unwrap();
        let user = store
            .create_user("ada", "ada@example.com", "hash")
            .await
            .unwrap()
            .unwrap();
        let paper = sample_paper("A Paper", "arXiv");

        assert!(store.save_for_user(user.id, &paper).await.unwrap());
        assert!(store.save_for_user(user.id, &paper).await.unwrap());

        let saved = store.get_saved_papers(user.id).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].paper.title, "A Paper");
    }

    #[tokio::test]
    async fn test_remove_saved_reports_missing_row() {
        let store = Store::in_memory().await.unwrap();
        let user = store
            .create_user("ada", "ada@example.com", "hash")
            .await
            .unwrap()
            .unwrap();

        assert!(!store.remove_saved(user.id, 42).await.unwrap());

        let paper = sample_paper("A Paper", "arXiv");
        store.save_for_user(user.id, &paper).await.unwrap();
        let saved = store.get_saved_papers(user.id).await.unwrap();
        let paper_id = saved[0].paper.id.unwrap();

        assert!(store.remove_saved(user.id, paper_id).await.unwrap());
        assert!(!store.remove_saved(user.id, paper_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_history_order_and_cap() {
        let store = Store::in_memory().await.unwrap();
        let user = store
            .create_user("ada", "ada@example.com", "hash")
            .await
            .unwrap()
            .unwrap();

        // Empty history is an empty list, not an error.
        assert!(store.get_history(user.id, 50).await.unwrap().is_empty());

        for i in 0..5 {
            store
                .add_history(user.id, ActivityType::Search, &format!("search {i}"), "")
                .await
                .unwrap();
        }

        let items = store.get_history(user.id, 3).await.unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "search 4");
        assert_eq!(items[2].title, "search 2");
        assert_eq!(items[0].activity_type, ActivityType::Search);
    }

    #[tokio::test]
    async fn test_analysis_upserts_in_place() {
        let store = Store::in_memory().await.unwrap();
        let paper_id = store
            .upsert_paper(&sample_paper("A Paper", "PubMed"))
            .await
            .unwrap();

        assert!(store.get_analysis(paper_id).await.unwrap().is_none());

        let mut doc = AnalysisDocument {
            summary: "First pass".to_string(),
            key_findings: vec![KeyFinding {
                title: "Finding".to_string(),
                description: "Description".to_string(),
            }],
            ..Default::default()
        };
        assert!(store.save_analysis(paper_id, &doc).await.unwrap());

        doc.summary = "Second pass".to_string();
        assert!(store.save_analysis(paper_id, &doc).await.unwrap());

        let stored = store.get_analysis(paper_id).await.unwrap().unwrap();
        assert_eq!(stored.summary, "Second pass");
        assert_eq!(stored.key_findings.len(), 1);

        // Exactly one row survives the overwrite.
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM paper_analysis WHERE paper_id = ?")
                .bind(paper_id)
                .fetch_one(store.pool())
                .await
                .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_cascade_deletes() {
        let store = Store::in_memory().await.unwrap();
        let user = store
            .create_user("ada", "ada@example.com", "hash")
            .await
            .unwrap()
            .unwrap();
        let paper = sample_paper("A Paper", "arXiv");
        store.save_for_user(user.id, &paper).await.unwrap();
        store
            .add_history(user.id, ActivityType::Chat, "Chat", "")
            .await
            .unwrap();

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user.id)
            .execute(store.pool())
            .await
            .unwrap();

        let associations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_papers")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(associations, 0);
        assert!(store.get_history(user.id, 50).await.unwrap().is_empty());
    }
}

//! Database layer for PaperDesk
//!
//! Provides:
//! - Typed record models
//! - `Store`, the repository over all durable entities
//! - SQLite pool management and idempotent schema creation
//!
//! The pool is opened once per process and shared for the session's lifetime.
//! Writes go through a single connection; SQLite serializes the rest.

pub mod models;
mod repository;

pub use repository::Store;

use crate::config::DatabaseConfig;
use crate::errors::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Schema DDL, applied idempotently at startup. One statement per entry so
/// each can go through a prepared execute.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        join_date TEXT NOT NULL,
        last_login TEXT,
        preferences TEXT
    )",
    "CREATE TABLE IF NOT EXISTS papers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        paper_key TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        authors TEXT NOT NULL DEFAULT '[]',
        year INTEGER NOT NULL DEFAULT 0,
        source TEXT NOT NULL DEFAULT '',
        abstract_text TEXT NOT NULL DEFAULT '',
        citation_count INTEGER NOT NULL DEFAULT 0,
        url TEXT NOT NULL DEFAULT '',
        metadata TEXT NOT NULL DEFAULT '{}',
        date_added TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS user_papers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        paper_id INTEGER NOT NULL REFERENCES papers(id) ON DELETE CASCADE,
        date_saved TEXT NOT NULL,
        notes TEXT,
        UNIQUE(user_id, paper_id)
    )",
    "CREATE TABLE IF NOT EXISTS research_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        activity_type TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        date TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS paper_analysis (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        paper_id INTEGER NOT NULL UNIQUE REFERENCES papers(id) ON DELETE CASCADE,
        summary TEXT NOT NULL DEFAULT '',
        key_findings TEXT NOT NULL DEFAULT '[]',
        methodology TEXT NOT NULL DEFAULT '{}',
        implications TEXT NOT NULL DEFAULT '{}',
        date_analyzed TEXT NOT NULL
    )",
];

/// Open the SQLite pool described by the configuration and apply the schema.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool> {
    info!(url = %config.url, "Connecting to database...");

    let opts = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(config.busy_timeout_secs));

    let pool = SqlitePoolOptions::new()
        // Single writer: SQLite permits only limited write concurrency, and
        // the design assumes one interactive user per process.
        .max_connections(config.max_connections.max(1))
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect_with(opts)
        .await?;

    migrate(&pool).await?;

    info!("Database connection established");
    Ok(pool)
}

/// Create all tables if they don't exist.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Ping the database to check connectivity.
pub async fn ping(pool: &SqlitePool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

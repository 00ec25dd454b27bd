//! PaperDesk Core Library
//!
//! The research-assistant core shared by any PaperDesk frontend:
//! - SQLite-backed store for users, papers, analyses, and history
//! - Pluggable paper source adapters with session-scoped search caching
//! - Deterministic paper analysis generation
//! - Keyword-rule chat responder
//! - Configuration management and error types
//!
//! The presentation layer is deliberately absent: callers supply a signed-in
//! user (or none), a selected paper, and free-text queries, and render
//! whatever comes back.

pub mod analysis;
pub mod chat;
pub mod config;
pub mod db;
pub mod errors;
pub mod format;
pub mod profile;
pub mod session;
pub mod sources;

// Re-export commonly used types
pub use analysis::AnalysisGenerator;
pub use chat::{ChatResponder, ResearchContext};
pub use config::AppConfig;
pub use db::models::{AnalysisDocument, PaperRecord, User, UserProfile};
pub use db::Store;
pub use errors::{AppError, Result};
pub use profile::ProfileService;
pub use session::SessionContext;
pub use sources::{SearchEngine, SearchRequest, SortBy, SourceFilter};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing with `RUST_LOG` taking precedence over the supplied
/// default filter.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

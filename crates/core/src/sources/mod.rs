//! Paper source adapters and the search engine
//!
//! Provides:
//! - `PaperSource`: the async trait every source adapter implements
//! - Built-in mock adapters for Semantic Scholar, arXiv, and PubMed
//! - `SearchEngine`: fan-out search with session-scoped memoization
//!
//! The memoization is strict: a cached entry is returned as a snapshot and
//! never refreshed within the session. The cache stores the raw merged list;
//! sorting and truncation are applied fresh on every call.

pub mod arxiv;
pub mod pubmed;
pub mod semantic_scholar;

use crate::config::SourcesConfig;
use crate::db::models::PaperRecord;
use crate::db::Store;
use crate::errors::Result;
use crate::session::SessionContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::{debug, warn};

pub use arxiv::ArxivSource;
pub use pubmed::PubMedSource;
pub use semantic_scholar::SemanticScholarSource;

/// A searchable paper source.
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Human-readable source name, as stored on fetched records.
    fn label(&self) -> &'static str;

    /// Stable identifier used for source filtering and cache keys.
    fn slug(&self) -> &'static str;

    async fn fetch(
        &self,
        query: &str,
        year_range: (i64, i64),
        max_results: usize,
    ) -> Result<Vec<PaperRecord>>;
}

/// Which sources a search should consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFilter {
    All,
    SemanticScholar,
    Arxiv,
    PubMed,
    GoogleScholar,
}

impl SourceFilter {
    pub fn source_key(&self) -> &'static str {
        match self {
            SourceFilter::All => "all",
            SourceFilter::SemanticScholar => "semantic_scholar",
            SourceFilter::Arxiv => "arxiv",
            SourceFilter::PubMed => "pubmed",
            // No public API; filtering on it selects zero adapters.
            SourceFilter::GoogleScholar => "google_scholar",
        }
    }

    fn includes(&self, slug: &str) -> bool {
        matches!(self, SourceFilter::All) || self.source_key() == slug
    }
}

/// How search results are ordered before truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Relevance,
    Date,
    CitationCount,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::Date => "date",
            SortBy::CitationCount => "citation_count",
        }
    }
}

/// One search call's parameters.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub source: SourceFilter,
    pub year_range: (i64, i64),
    pub sort_by: SortBy,
    pub max_results: usize,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        SearchRequest {
            query: query.into(),
            source: SourceFilter::All,
            year_range: (1900, 2023),
            sort_by: SortBy::Relevance,
            max_results: 50,
        }
    }
}

/// Composite cache key for one search. Queries are normalized so that
/// whitespace and case variants share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchSignature {
    query: String,
    source_key: &'static str,
    year_min: i64,
    year_max: i64,
    sort_by: &'static str,
}

impl SearchSignature {
    pub fn for_request(request: &SearchRequest) -> Self {
        SearchSignature {
            query: request.query.trim().to_lowercase(),
            source_key: request.source.source_key(),
            year_min: request.year_range.0,
            year_max: request.year_range.1,
            sort_by: request.sort_by.as_str(),
        }
    }
}

/// Fans a search out over the configured adapters, persists every fetched
/// record, and memoizes the merged list on the session.
pub struct SearchEngine {
    store: Store,
    sources: Vec<Box<dyn PaperSource>>,
}

impl SearchEngine {
    /// Build the engine with the three built-in adapters.
    pub fn new(store: Store, config: &SourcesConfig) -> Self {
        let sources: Vec<Box<dyn PaperSource>> = vec![
            Box::new(SemanticScholarSource::new(&config.semantic_scholar_api_key)),
            Box::new(ArxivSource::new(&config.arxiv_api_key)),
            Box::new(PubMedSource::new(&config.pubmed_api_key)),
        ];
        Self::with_sources(store, sources)
    }

    /// Build the engine over an explicit adapter set.
    pub fn with_sources(store: Store, sources: Vec<Box<dyn PaperSource>>) -> Self {
        SearchEngine { store, sources }
    }

    /// Run a search. Cached entries are returned without re-fetching; sort
    /// and truncation are applied fresh either way.
    pub async fn search(
        &self,
        request: &SearchRequest,
        session: &mut SessionContext,
    ) -> Result<Vec<PaperRecord>> {
        let signature = SearchSignature::for_request(request);

        if let Some(cached) = session.search_cache.get(&signature) {
            debug!(query = %request.query, "search cache hit");
            let mut papers = cached.clone();
            apply_sort(&mut papers, request.sort_by);
            papers.truncate(request.max_results);
            return Ok(papers);
        }

        let mut papers = Vec::new();
        for source in &self.sources {
            if !request.source.includes(source.slug()) {
                continue;
            }
            match source
                .fetch(&request.query, request.year_range, request.max_results)
                .await
            {
                Ok(batch) => papers.extend(batch),
                // A failing source contributes nothing; the search goes on.
                Err(err) => {
                    warn!(source = source.label(), error = %err, "source fetch failed")
                }
            }
        }

        for paper in &mut papers {
            let id = self.store.upsert_paper(paper).await?;
            paper.id = Some(id);
        }

        session.search_cache.insert(signature, papers.clone());

        apply_sort(&mut papers, request.sort_by);
        papers.truncate(request.max_results);
        Ok(papers)
    }
}

fn apply_sort(papers: &mut [PaperRecord], sort_by: SortBy) {
    match sort_by {
        SortBy::Relevance => {}
        SortBy::Date => papers.sort_by_key(|p| Reverse(p.year)),
        SortBy::CitationCount => papers.sort_by_key(|p| Reverse(p.citation_count)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSource {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PaperSource for CountingSource {
        fn label(&self) -> &'static str {
            "Semantic Scholar"
        }

        fn slug(&self) -> &'static str {
            "semantic_scholar"
        }

        async fn fetch(
            &self,
            _query: &str,
            _year_range: (i64, i64),
            _max_results: usize,
        ) -> Result<Vec<PaperRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![PaperRecord {
                title: "Counted".to_string(),
                source: "Semantic Scholar".to_string(),
                year: 2020,
                ..Default::default()
            }])
        }
    }

    struct FailingSource;

    #[async_trait]
    impl PaperSource for FailingSource {
        fn label(&self) -> &'static str {
            "arXiv"
        }

        fn slug(&self) -> &'static str {
            "arxiv"
        }

        async fn fetch(
            &self,
            _query: &str,
            _year_range: (i64, i64),
            _max_results: usize,
        ) -> Result<Vec<PaperRecord>> {
            Err(AppError::SourceFailure {
                source_name: "arXiv".to_string(),
                message: "upstream down".to_string(),
            })
        }
    }

    async fn engine_with(sources: Vec<Box<dyn PaperSource>>) -> SearchEngine {
        let store = Store::in_memory().await.unwrap();
        SearchEngine::with_sources(store, sources)
    }

    #[tokio::test]
    async fn test_cache_hit_skips_refetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = engine_with(vec![Box::new(CountingSource {
            calls: calls.clone(),
        })])
        .await;
        let mut session = SessionContext::new();

        let request = SearchRequest::new("transformers");
        let first = engine.search(&request, &mut session).await.unwrap();
        assert_eq!(first.len(), 1);
        assert!(first[0].id.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Whitespace and case variants share the cache entry.
        let variant = SearchRequest::new("  Transformers ");
        let second = engine.search(&variant, &mut session).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // A different sort mode is a different signature.
        let sorted = SearchRequest {
            sort_by: SortBy::Date,
            ..SearchRequest::new("transformers")
        };
        engine.search(&sorted, &mut session).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failing_source_is_skipped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = engine_with(vec![
            Box::new(FailingSource),
            Box::new(CountingSource {
                calls: calls.clone(),
            }),
        ])
        .await;
        let mut session = SessionContext::new();

        let results = engine
            .search(&SearchRequest::new("anything"), &mut session)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Counted");
    }

    #[tokio::test]
    async fn test_merge_truncates_across_sources() {
        struct OnePaper;

        #[async_trait]
        impl PaperSource for OnePaper {
            fn label(&self) -> &'static str {
                "arXiv"
            }

            fn slug(&self) -> &'static str {
                "arxiv"
            }

            async fn fetch(
                &self,
                _query: &str,
                _year_range: (i64, i64),
                _max_results: usize,
            ) -> Result<Vec<PaperRecord>> {
                Ok(vec![PaperRecord {
                    title: "Second source".to_string(),
                    source: "arXiv".to_string(),
                    ..Default::default()
                }])
            }
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let engine = engine_with(vec![
            Box::new(CountingSource {
                calls: calls.clone(),
            }),
            Box::new(OnePaper),
        ])
        .await;
        let mut session = SessionContext::new();

        let request = SearchRequest {
            max_results: 1,
            ..SearchRequest::new("ml")
        };
        let results = engine.search(&request, &mut session).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Identical call is served from the cache.
        let results = engine.search(&request, &mut session).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_filter_without_adapter_returns_empty() {
        let engine = engine_with(vec![Box::new(CountingSource {
            calls: Arc::new(AtomicUsize::new(0)),
        })])
        .await;
        let mut session = SessionContext::new();

        let request = SearchRequest {
            source: SourceFilter::GoogleScholar,
            ..SearchRequest::new("anything")
        };
        let results = engine.search(&request, &mut session).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_sort_and_truncate_apply_after_caching() {
        struct TwoPapers;

        #[async_trait]
        impl PaperSource for TwoPapers {
            fn label(&self) -> &'static str {
                "PubMed"
            }

            fn slug(&self) -> &'static str {
                "pubmed"
            }

            async fn fetch(
                &self,
                _query: &str,
                _year_range: (i64, i64),
                _max_results: usize,
            ) -> Result<Vec<PaperRecord>> {
                Ok(vec![
                    PaperRecord {
                        title: "Older, cited".to_string(),
                        source: "PubMed".to_string(),
                        year: 2010,
                        citation_count: 900,
                        ..Default::default()
                    },
                    PaperRecord {
                        title: "Newer, uncited".to_string(),
                        source: "PubMed".to_string(),
                        year: 2022,
                        citation_count: 3,
                        ..Default::default()
                    },
                ])
            }
        }

        let engine = engine_with(vec![Box::new(TwoPapers)]).await;
        let mut session = SessionContext::new();

        let request = SearchRequest {
            sort_by: SortBy::Date,
            max_results: 1,
            ..SearchRequest::new("brains")
        };
        let results = engine.search(&request, &mut session).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Newer, uncited");

        // The cached entry holds the raw merged list; the same signature
        // yields the freshly sorted, truncated view again.
        let again = engine.search(&request, &mut session).await.unwrap();
        assert_eq!(again, results);
    }

    #[tokio::test]
    async fn test_builtin_sources_merge_all() {
        let store = Store::in_memory().await.unwrap();
        let engine = SearchEngine::new(store, &SourcesConfig::default());
        let mut session = SessionContext::new();

        let results = engine
            .search(&SearchRequest::new("language models"), &mut session)
            .await
            .unwrap();
        assert_eq!(results.len(), 6);
        assert!(results.iter().all(|p| p.id.is_some()));

        let request = SearchRequest {
            source: SourceFilter::Arxiv,
            ..SearchRequest::new("language models")
        };
        let arxiv_only = engine.search(&request, &mut session).await.unwrap();
        assert_eq!(arxiv_only.len(), 2);
        assert!(arxiv_only.iter().all(|p| p.source == "arXiv"));
    }
}

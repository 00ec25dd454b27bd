//! PubMed adapter
//!
//! Mock implementation returning fixed sample records. A live client would
//! hit the NCBI E-utilities esearch endpoint and then fetch details per id.

use crate::db::models::PaperRecord;
use crate::errors::Result;
use crate::sources::PaperSource;
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

pub struct PubMedSource {
    api_key: String,
}

impl PubMedSource {
    pub fn new(api_key: &str) -> Self {
        PubMedSource {
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl PaperSource for PubMedSource {
    fn label(&self) -> &'static str {
        "PubMed"
    }

    fn slug(&self) -> &'static str {
        "pubmed"
    }

    async fn fetch(
        &self,
        query: &str,
        _year_range: (i64, i64),
        _max_results: usize,
    ) -> Result<Vec<PaperRecord>> {
        debug!(
            query,
            authenticated = !self.api_key.is_empty(),
            "fetching from PubMed"
        );

        [
            json!({
                "id": "pubmed1",
                "title": "The role of AI in genomics and precision medicine",
                "authors": ["Sarah Johnson", "Michael Chen"],
                "year": 2022,
                "abstract": "Artificial intelligence is transforming genomics and precision medicine by enabling more accurate analysis of complex genomic data. This review examines recent advances in AI-based genomic analysis and their implications for personalized healthcare.",
                "citation_count": 150,
                "source": "PubMed",
                "url": "https://pubmed.ncbi.nlm.nih.gov/pubmed1"
            }),
            json!({
                "id": "pubmed2",
                "title": "Neural basis of language comprehension",
                "authors": ["David Miller", "Jennifer Smith"],
                "year": 2021,
                "abstract": "This fMRI study investigates the neural mechanisms underlying language comprehension in different contexts. Results indicate a distributed network of brain regions involved in semantic processing, with significant implications for understanding language disorders.",
                "citation_count": 85,
                "source": "PubMed",
                "url": "https://pubmed.ncbi.nlm.nih.gov/pubmed2"
            }),
        ]
        .into_iter()
        .map(PaperRecord::from_value)
        .collect()
    }
}

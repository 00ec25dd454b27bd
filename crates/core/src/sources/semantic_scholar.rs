//! Semantic Scholar adapter
//!
//! Mock implementation returning fixed sample records. The real endpoint is
//! `https://api.semanticscholar.org/v1/paper/`; the key is sent as the
//! `x-api-key` header when a live client replaces this.

use crate::db::models::PaperRecord;
use crate::errors::Result;
use crate::sources::PaperSource;
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

pub struct SemanticScholarSource {
    api_key: String,
}

impl SemanticScholarSource {
    pub fn new(api_key: &str) -> Self {
        SemanticScholarSource {
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl PaperSource for SemanticScholarSource {
    fn label(&self) -> &'static str {
        "Semantic Scholar"
    }

    fn slug(&self) -> &'static str {
        "semantic_scholar"
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
            "fetching from Semantic Scholar"
        );

        [
            json!({
                "id": "sem1",
                "title": "Attention Is All You Need",
                "authors": ["Ashish Vaswani", "Noam Shazeer", "Niki Parmar"],
                "year": 2017,
                "abstract": "The dominant sequence transduction models are based on complex recurrent or convolutional neural networks that include an encoder and a decoder. The best performing models also connect the encoder and decoder through an attention mechanism. We propose a new simple network architecture, the Transformer, based solely on attention mechanisms, dispensing with recurrence and convolutions entirely.",
                "citation_count": 45000,
                "source": "Semantic Scholar",
                "url": "https://api.semanticscholar.org/v1/paper/sem1"
            }),
            json!({
                "id": "sem2",
                "title": "BERT: Pre-training of Deep Bidirectional Transformers for Language Understanding",
                "authors": ["Jacob Devlin", "Ming-Wei Chang", "Kenton Lee", "Kristina Toutanova"],
                "year": 2018,
                "abstract": "We introduce a new language representation model called BERT, which stands for Bidirectional Encoder Representations from Transformers. Unlike recent language representation models, BERT is designed to pre-train deep bidirectional representations from unlabeled text by jointly conditioning on both left and right context in all layers.",
                "citation_count": 35000,
                "source": "Semantic Scholar",
                "url": "https://api.semanticscholar.org/v1/paper/sem2"
            }),
        ]
        .into_iter()
        .map(PaperRecord::from_value)
        .collect()
    }
}

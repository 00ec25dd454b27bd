//! arXiv adapter
//!
//! Mock implementation returning fixed sample records. A live client would
//! query `http://export.arxiv.org/api/query` and parse the Atom feed.

use crate::db::models::PaperRecord;
use crate::errors::Result;
use crate::sources::PaperSource;
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

pub struct ArxivSource {
    api_key: String,
}

impl ArxivSource {
    pub fn new(api_key: &str) -> Self {
        ArxivSource {
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl PaperSource for ArxivSource {
    fn label(&self) -> &'static str {
        "arXiv"
    }

    fn slug(&self) -> &'static str {
        "arxiv"
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
            "fetching from arXiv"
        );

        [
            json!({
                "id": "arxiv1",
                "title": "GPT-4 Technical Report",
                "authors": ["OpenAI Team"],
                "year": 2023,
                "abstract": "We report the development of GPT-4, a large-scale, multimodal model which can accept image and text inputs and produce text outputs. While less capable than humans in many real-world scenarios, GPT-4 exhibits human-level performance on various professional and academic benchmarks.",
                "citation_count": 500,
                "source": "arXiv",
                "url": "https://arxiv.org/abs/arxiv1"
            }),
            json!({
                "id": "arxiv2",
                "title": "Language Models are Few-Shot Learners",
                "authors": ["Tom B. Brown", "Benjamin Mann", "Nick Ryder"],
                "year": 2020,
                "abstract": "Recent work has demonstrated substantial gains on many NLP tasks and benchmarks by pre-training on a large corpus of text followed by fine-tuning on a specific task. We demonstrate that by scaling up language models, they become increasingly capable of performing tasks that they were not explicitly trained on.",
                "citation_count": 12000,
                "source": "arXiv",
                "url": "https://arxiv.org/abs/arxiv2"
            }),
        ]
        .into_iter()
        .map(PaperRecord::from_value)
        .collect()
    }
}

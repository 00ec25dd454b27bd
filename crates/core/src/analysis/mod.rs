//! Canned paper analysis
//!
//! Produces a deterministic analysis document from a paper's title, authors,
//! and year. The store is both a write-through cache and the system of
//! record: the first analysis of a paper is persisted and every later call
//! returns it unchanged.

use crate::db::models::{
    AnalysisDocument, Implications, KeyFinding, MethodStep, Methodology, PaperRecord,
};
use crate::db::Store;
use crate::errors::Result;
use tracing::warn;

pub struct AnalysisGenerator {
    store: Store,
}

impl AnalysisGenerator {
    pub fn new(store: Store) -> Self {
        AnalysisGenerator { store }
    }

    /// Analyze a paper. Infallible by contract: any internal failure is
    /// logged and reported through the document itself.
    pub async fn analyze(&self, paper: &PaperRecord) -> AnalysisDocument {
        match self.try_analyze(paper).await {
            Ok(doc) => doc,
            Err(err) => {
                warn!(title = %paper.title, error = %err, "analysis failed");
                AnalysisDocument::degraded()
            }
        }
    }

    async fn try_analyze(&self, paper: &PaperRecord) -> Result<AnalysisDocument> {
        let paper_id = match self.store.upsert_paper(paper).await {
            Ok(id) => id,
            Err(err) => {
                warn!(title = %paper.title, error = %err, "could not persist paper for analysis");
                return Ok(AnalysisDocument::failed_processing());
            }
        };

        if let Some(existing) = self.store.get_analysis(paper_id).await? {
            return Ok(existing);
        }

        let doc = synthesize(paper);
        self.store.save_analysis(paper_id, &doc).await?;
        Ok(doc)
    }
}

/// Deterministic template synthesis from the paper's bibliographic fields.
fn synthesize(paper: &PaperRecord) -> AnalysisDocument {
    let lead_authors = paper
        .authors
        .iter()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");

    let summary = format!(
        "This paper by {} ({}) explores {}. \
         The research presents innovative approaches to understand and address challenges in this domain. \
         The work contributes significantly to the field by providing new methodologies and insights.",
        lead_authors,
        paper.year,
        paper.title.to_lowercase()
    );

    AnalysisDocument {
        summary,
        key_findings: vec![
            KeyFinding {
                title: "Novel methodology developed".to_string(),
                description: "The authors developed a new approach that improves upon existing methods by incorporating advanced techniques and algorithms.".to_string(),
            },
            KeyFinding {
                title: "Significant performance improvements".to_string(),
                description: "Experimental results demonstrate substantial improvements over baseline methods, with up to 30% better performance on standard benchmarks.".to_string(),
            },
            KeyFinding {
                title: "Important theoretical contributions".to_string(),
                description: "The paper makes notable theoretical contributions by extending existing frameworks and proposing new mathematical formulations.".to_string(),
            },
        ],
        methodology: Methodology {
            description: "The research employs a multi-stage approach combining quantitative and qualitative methods to address the research questions.".to_string(),
            steps: vec![
                MethodStep {
                    title: "Data collection and preprocessing".to_string(),
                    description: "Comprehensive dataset compilation from multiple sources, followed by rigorous cleaning and normalization.".to_string(),
                },
                MethodStep {
                    title: "Model development and implementation".to_string(),
                    description: "Design and implementation of novel computational models tailored to the specific research problem.".to_string(),
                },
                MethodStep {
                    title: "Experimental evaluation".to_string(),
                    description: "Extensive evaluation using both established benchmarks and custom test scenarios to validate the approach.".to_string(),
                },
            ],
        },
        implications: Implications {
            description: "This research has significant implications for both theory and practice in the field.".to_string(),
            research_gaps: vec![
                "Limited evaluation in real-world settings".to_string(),
                "Computational efficiency challenges for large-scale applications".to_string(),
                "Need for more diverse datasets to ensure generalizability".to_string(),
            ],
            future_directions: vec![
                "Extending the approach to related problem domains".to_string(),
                "Incorporating additional data sources to enhance performance".to_string(),
                "Developing more efficient implementations for resource-constrained environments".to_string(),
            ],
        },
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_paper() -> PaperRecord {
        PaperRecord {
            title: "Attention Is All You Need".to_string(),
            authors: vec![
                "Ashish Vaswani".to_string(),
                "Noam Shazeer".to_string(),
                "Niki Parmar".to_string(),
                "Jakob Uszkoreit".to_string(),
            ],
            year: 2017,
            source: "Semantic Scholar".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_analysis_is_deterministic_and_cached() {
        let store = Store::in_memory().await.unwrap();
        let generator = AnalysisGenerator::new(store.clone());
        let paper = sample_paper();

        let first = generator.analyze(&paper).await;
        assert!(first.summary.starts_with(
            "This paper by Ashish Vaswani, Noam Shazeer, Niki Parmar (2017) \
             explores attention is all you need."
        ));
        assert_eq!(first.key_findings.len(), 3);
        assert_eq!(first.methodology.steps.len(), 3);
        assert!(first.error.is_none());

        // The second call returns the stored document untouched.
        let second = generator.analyze(&paper).await;
        assert_eq!(second, first);

        let paper_id = store.upsert_paper(&paper).await.unwrap();
        let stored = store.get_analysis(paper_id).await.unwrap().unwrap();
        assert_eq!(stored, first);
    }

    #[tokio::test]
    async fn test_analysis_survives_sparse_papers() {
        let store = Store::in_memory().await.unwrap();
        let generator = AnalysisGenerator::new(store);

        let paper = PaperRecord {
            title: "Untitled Draft".to_string(),
            ..Default::default()
        };
        let doc = generator.analyze(&paper).await;
        assert!(doc.summary.contains("(0) explores untitled draft."));
        assert!(doc.error.is_none());
    }
}

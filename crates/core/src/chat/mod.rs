//! Rule-based research chatbot
//!
//! Classifies a query into an intent with an ordered keyword table (first
//! match wins, evaluated on the lowercased text) and renders a fixed
//! response template against the optional paper-plus-analysis context.
//! Every call appends both the user and assistant turns to the session
//! transcript, even when the responder fails internally.

use crate::db::models::{ActivityType, AnalysisDocument, PaperRecord};
use crate::db::Store;
use crate::errors::Result;
use crate::session::{ChatRole, SessionContext};
use rand::seq::SliceRandom;
use tracing::warn;

/// Fixed reply when response generation fails internally.
const APOLOGY: &str = "I apologize, but I encountered an error while processing your question. \
     Please try asking in a different way or search for specific papers to provide more context.";

/// The paper under discussion and, when available, its stored analysis.
pub struct ResearchContext {
    pub paper: PaperRecord,
    pub analysis: Option<AnalysisDocument>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Summary,
    Findings,
    Methodology,
    Implications,
    Comparison,
    General,
}

/// Keyword rules in priority order; the first rule with any keyword present
/// in the lowercased query decides the intent.
const RULES: &[(&[&str], Intent)] = &[
    (&["summary", "summarize"], Intent::Summary),
    (&["findings", "results", "discover"], Intent::Findings),
    (&["method", "approach", "how did they"], Intent::Methodology),
    (
        &["implications", "impact", "future", "next steps"],
        Intent::Implications,
    ),
    (&["compare", "difference", "similar"], Intent::Comparison),
];

fn classify(query: &str) -> Intent {
    let query = query.to_lowercase();
    for (keywords, intent) in RULES {
        if keywords.iter().any(|kw| query.contains(kw)) {
            return *intent;
        }
    }
    Intent::General
}

pub struct ChatResponder {
    store: Store,
}

impl ChatResponder {
    pub fn new(store: Store) -> Self {
        ChatResponder { store }
    }

    /// Answer a query against the given context. Infallible by contract:
    /// internal errors collapse to a fixed apology. Both turns land on the
    /// transcript either way.
    pub async fn respond(
        &self,
        query: &str,
        context: Option<&ResearchContext>,
        session: &mut SessionContext,
    ) -> String {
        session.push_turn(ChatRole::User, query.to_string());

        let response = match self.try_respond(query, context, session).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "chat response failed");
                APOLOGY.to_string()
            }
        };

        session.push_turn(ChatRole::Assistant, response.clone());
        response
    }

    async fn try_respond(
        &self,
        query: &str,
        context: Option<&ResearchContext>,
        session: &SessionContext,
    ) -> Result<String> {
        if let Some(user) = session.current_user() {
            let snippet: String = query.chars().take(50).collect();
            let subject = context
                .map(|ctx| ctx.paper.title.as_str())
                .unwrap_or("research");
            self.store
                .add_history(
                    user.id,
                    ActivityType::Chat,
                    &format!("Chat: {snippet}..."),
                    &format!("Question about {subject}"),
                )
                .await?;
        }

        Ok(match classify(query) {
            Intent::Summary => summary_response(context),
            Intent::Findings => findings_response(context),
            Intent::Methodology => methodology_response(context),
            Intent::Implications => implications_response(context),
            Intent::Comparison => comparison_response(),
            Intent::General => general_response(query, context),
        })
    }
}

fn summary_response(context: Option<&ResearchContext>) -> String {
    match context {
        Some(ctx) => format!(
            "Here's a summary of the paper '{}':\n\n\
             This research by {} investigates {}. \n\n\
             The paper makes several key contributions:\n\
             1. Development of novel methodologies for addressing challenges in this domain\n\
             2. Empirical evidence supporting the effectiveness of the proposed approach\n\
             3. Theoretical foundations that advance our understanding of the underlying principles\n\n\
             The research is particularly notable for its rigorous methodology and comprehensive analysis.",
            ctx.paper.title,
            ctx.paper.authors.join(", "),
            ctx.paper.title.to_lowercase()
        ),
        None => "I don't currently have a specific paper in context to summarize. \
                 Please search for and select a paper first, or ask a more general research question."
            .to_string(),
    }
}

fn findings_response(context: Option<&ResearchContext>) -> String {
    let Some(ctx) = context else {
        return "I don't have a specific paper in context to discuss findings. \
                Please select a paper first, or ask a more general research question."
            .to_string();
    };

    match &ctx.analysis {
        Some(analysis) => {
            let mut response = format!(
                "The key findings of '{}' include:\n\n",
                ctx.paper.title
            );
            for (i, finding) in analysis.key_findings.iter().enumerate() {
                response.push_str(&format!(
                    "{}. **{}**: {}\n\n",
                    i + 1,
                    finding.title,
                    finding.description
                ));
            }
            response
        }
        None => format!(
            "The paper '{}' presents several important findings, \
             including methodological innovations, empirical results supporting their hypotheses, \
             and theoretical contributions to the field.",
            ctx.paper.title
        ),
    }
}

fn methodology_response(context: Option<&ResearchContext>) -> String {
    let Some(ctx) = context else {
        return "I don't have a specific paper in context to discuss methodology. \
                If you're asking about research methods in general, please specify which area \
                or approach you're interested in."
            .to_string();
    };

    match &ctx.analysis {
        Some(analysis) => {
            let mut response = format!(
                "The methodology in '{}' is as follows:\n\n{}\n\n",
                ctx.paper.title, analysis.methodology.description
            );
            if !analysis.methodology.steps.is_empty() {
                response.push_str("The research process involved these key steps:\n\n");
                for (i, step) in analysis.methodology.steps.iter().enumerate() {
                    response.push_str(&format!(
                        "{}. **{}**: {}\n\n",
                        i + 1,
                        step.title,
                        step.description
                    ));
                }
            }
            response
        }
        None => "The researchers employed a multi-faceted methodology combining quantitative analysis \
                 with qualitative assessments. Their approach involved data collection from multiple sources, \
                 rigorous preprocessing, model development, and comprehensive evaluation against established benchmarks."
            .to_string(),
    }
}

fn implications_response(context: Option<&ResearchContext>) -> String {
    let Some(ctx) = context else {
        return "To discuss research implications, it would be helpful to have a specific paper in context. \
                Please select a paper first, or specify which research area you're interested in."
            .to_string();
    };

    match &ctx.analysis {
        Some(analysis) => {
            let mut response = format!(
                "**Implications of '{}':**\n\n{}\n\n",
                ctx.paper.title, analysis.implications.description
            );
            response.push_str("**Research Gaps Identified:**\n");
            for gap in &analysis.implications.research_gaps {
                response.push_str(&format!("- {gap}\n"));
            }
            response.push_str("\n**Future Research Directions:**\n");
            for direction in &analysis.implications.future_directions {
                response.push_str(&format!("- {direction}\n"));
            }
            response
        }
        None => format!(
            "The research has several important implications for both theory and practice. \
             It extends our understanding of {} and \
             provides practical approaches that can be applied in real-world scenarios. \
             Future work could explore additional domains, incorporate more diverse datasets, \
             and develop more efficient computational methods.",
            ctx.paper.title.to_lowercase()
        ),
    }
}

fn comparison_response() -> String {
    "To compare multiple papers, please select at least two papers from your search results. \
     Currently, our system allows detailed analysis of one paper at a time, but we're working \
     on adding multi-paper comparison features in the future."
        .to_string()
}

fn general_response(query: &str, context: Option<&ResearchContext>) -> String {
    match context {
        Some(ctx) => {
            let adjective = ["innovative", "comprehensive", "novel"]
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or("innovative");
            format!(
                "Regarding your question about {}, in the context of '{}':\n\n\
                 The paper addresses aspects related to your question through its {} \
                 approach to {}. The authors provide insights that \
                 contribute to our understanding of this area, specifically through their analysis of relevant factors \
                 and the implications of their findings for both theory and practice.\n\n\
                 For more specific information, you might consider asking about the paper's methodology, key findings, \
                 or broader implications.",
                query,
                ctx.paper.title,
                adjective,
                ctx.paper.title.to_lowercase()
            )
        }
        None => format!(
            "To provide a more informed response about {query}, it would be helpful to have a specific \
             research paper in context. You can search for relevant papers using the Search function, or I can \
             try to answer your question based on general knowledge in this field.\n\n\
             Would you like to search for papers related to this topic, or would you prefer a general overview?"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::KeyFinding;

    fn sample_context(with_analysis: bool) -> ResearchContext {
        let paper = PaperRecord {
            title: "Attention Is All You Need".to_string(),
            authors: vec!["Ashish Vaswani".to_string(), "Noam Shazeer".to_string()],
            year: 2017,
            source: "Semantic Scholar".to_string(),
            ..Default::default()
        };
        let analysis = with_analysis.then(|| AnalysisDocument {
            summary: "A summary.".to_string(),
            key_findings: vec![KeyFinding {
                title: "Transformers work".to_string(),
                description: "Attention replaces recurrence.".to_string(),
            }],
            ..Default::default()
        });
        ResearchContext { paper, analysis }
    }

    #[test]
    fn test_classify_first_match_wins() {
        assert_eq!(classify("Give me a SUMMARY please"), Intent::Summary);
        // "summarize the results" hits the summary rule before findings.
        assert_eq!(classify("summarize the results"), Intent::Summary);
        assert_eq!(classify("what did they discover?"), Intent::Findings);
        assert_eq!(classify("how did they do it"), Intent::Methodology);
        assert_eq!(classify("what are the next steps"), Intent::Implications);
        assert_eq!(classify("how is this different from BERT"), Intent::Comparison);
        assert_eq!(classify("tell me something"), Intent::General);
    }

    #[tokio::test]
    async fn test_summary_names_the_paper() {
        let store = Store::in_memory().await.unwrap();
        let responder = ChatResponder::new(store);
        let mut session = SessionContext::new();
        let context = sample_context(true);

        let reply = responder
            .respond("Can you give me a summary?", Some(&context), &mut session)
            .await;
        assert!(reply.contains("Here's a summary of the paper 'Attention Is All You Need'"));
        assert!(reply.contains("Ashish Vaswani, Noam Shazeer"));

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, ChatRole::User);
        assert_eq!(transcript[0].content, "Can you give me a summary?");
        assert_eq!(transcript[1].role, ChatRole::Assistant);
        assert_eq!(transcript[1].content, reply);
    }

    #[tokio::test]
    async fn test_findings_uses_analysis_when_present() {
        let store = Store::in_memory().await.unwrap();
        let responder = ChatResponder::new(store);
        let mut session = SessionContext::new();

        let with_analysis = sample_context(true);
        let reply = responder
            .respond("what were the findings?", Some(&with_analysis), &mut session)
            .await;
        assert!(reply.contains("1. **Transformers work**: Attention replaces recurrence."));

        let without_analysis = sample_context(false);
        let reply = responder
            .respond("what were the findings?", Some(&without_analysis), &mut session)
            .await;
        assert!(reply.contains("presents several important findings"));

        let reply = responder.respond("what were the findings?", None, &mut session).await;
        assert!(reply.starts_with("I don't have a specific paper in context to discuss findings."));
    }

    #[tokio::test]
    async fn test_comparison_is_unsupported() {
        let store = Store::in_memory().await.unwrap();
        let responder = ChatResponder::new(store);
        let mut session = SessionContext::new();

        let reply = responder
            .respond("compare this with BERT", Some(&sample_context(true)), &mut session)
            .await;
        assert!(reply.starts_with("To compare multiple papers"));
    }

    #[tokio::test]
    async fn test_signed_in_chat_lands_in_history() {
        let store = Store::in_memory().await.unwrap();
        let user = store
            .create_user("ada", "ada@example.com", "hash")
            .await
            .unwrap()
            .unwrap();
        let responder = ChatResponder::new(store.clone());
        let mut session = SessionContext::new();
        session.sign_in(user.profile());

        let long_query = "x".repeat(60);
        responder
            .respond(&long_query, Some(&sample_context(true)), &mut session)
            .await;

        let history = store.get_history(user.id, 50).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].title, format!("Chat: {}...", "x".repeat(50)));
        assert_eq!(
            history[0].description,
            "Question about Attention Is All You Need"
        );
    }
}

//! Structured paper analysis documents

use serde::{Deserialize, Serialize};

/// The analysis produced for one paper: summary, findings, methodology, and
/// implications. At most one of these exists per paper in the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDocument {
    pub summary: String,

    #[serde(default)]
    pub key_findings: Vec<KeyFinding>,

    #[serde(default)]
    pub methodology: Methodology,

    #[serde(default)]
    pub implications: Implications,

    /// Set only on the sentinel document returned when the paper could not
    /// be persisted ahead of analysis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyFinding {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Methodology {
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub steps: Vec<MethodStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodStep {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Implications {
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub research_gaps: Vec<String>,

    #[serde(default)]
    pub future_directions: Vec<String>,
}

impl AnalysisDocument {
    /// The fixed degraded document returned when analysis fails internally.
    pub fn degraded() -> Self {
        AnalysisDocument {
            summary: "Unable to analyze paper due to an error.".to_string(),
            key_findings: Vec::new(),
            methodology: Methodology {
                description: "Not available".to_string(),
                steps: Vec::new(),
            },
            implications: Implications {
                description: "Not available".to_string(),
                research_gaps: Vec::new(),
                future_directions: Vec::new(),
            },
            error: None,
        }
    }

    /// The sentinel returned when the paper itself could not be persisted.
    pub fn failed_processing() -> Self {
        AnalysisDocument {
            error: Some("Failed to process paper for analysis".to_string()),
            ..Self::degraded()
        }
    }
}

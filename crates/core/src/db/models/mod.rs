//! Record models for the PaperDesk store

pub(crate) mod analysis;
pub(crate) mod history;
pub(crate) mod paper;
pub(crate) mod user;

pub use analysis::{AnalysisDocument, Implications, KeyFinding, Methodology, MethodStep};
pub use history::{ActivityType, HistoryItem};
pub use paper::{PaperRecord, SavedPaper};
pub use user::{User, UserProfile, UserUpdate};

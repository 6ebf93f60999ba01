//! Multi-step sleep questionnaire: catalog, answers, navigation, scoring,
//! classification, recommendations and the email-gated submission flow.

pub mod answers;
pub mod catalog;
pub mod category;
pub mod clock;
pub mod definition;
pub mod email;
pub mod navigation;
pub mod recommendations;
pub mod renderer;
pub mod router;
pub mod scoring;
pub mod session;
pub mod submission;

#[cfg(test)]
mod tests;

pub use answers::{AnswerError, AnswerParsing, AnswerStore};
pub use catalog::{CatalogError, Question, QuestionCatalog, QuestionId, DEFAULT_SCALE_MAX};
pub use category::{Category, CategoryBasis, CategoryError, CategoryTable};
pub use clock::{Clock, ManualClock, PendingAdvance, SystemClock};
pub use definition::{QuizDefinition, QuizResult, QuizVariant};
pub use email::{
    EmailAddress, EmailError, EmailStore, EmailStoreError, FileEmailStore, MemoryEmailStore,
    NoEmailStore,
};
pub use navigation::{Navigation, NavigationControls, NavigationError};
pub use recommendations::{
    Recommendation, RecommendationEngine, RecommendationError, RecommendationRule,
};
pub use renderer::{ProgressView, Renderer};
pub use router::{quiz_router, QuizView, ScoreRequest};
pub use scoring::{ScoreResult, ScoringEngine, ScoringPolicy};
pub use session::{QuizError, QuizSession, SessionPhase, SessionSettings};
pub use submission::{
    PageContext, RelayClient, RelayError, SubmissionOutcome, SubmissionPayload, Submitter,
};

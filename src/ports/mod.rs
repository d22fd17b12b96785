//! Ports - Interfaces between the application core and the outside world.
//!
//! Each port is an async trait the application layer depends on; adapters
//! implement them against real services (or in-memory doubles in tests).

pub mod analysis;
pub mod escalation;
pub mod feedback;
pub mod generation;
pub mod knowledge;
pub mod repository;

pub use analysis::{
    AnalysisError, EmotionDetector, EntityExtractor, IntentClassifier, SentimentAnalyzer,
};
pub use escalation::{EscalationError, EscalationSink, EscalationTicket};
pub use feedback::{FeedbackSink, TurnFeedback};
pub use generation::{
    GeneratedText, GenerationError, GenerationOptions, GenerationProvider, GenerationRequest,
    ProviderInfo,
};
pub use knowledge::{KnowledgeError, KnowledgeRetriever};
pub use repository::{ConversationRepository, MessageRepository, RepositoryError};

//! In-memory adapters for tests and single-process deployments.

mod knowledge;
mod repositories;
mod sinks;

pub use knowledge::CannedKnowledgeRetriever;
pub use repositories::{InMemoryConversationRepository, InMemoryMessageRepository};
pub use sinks::{RecordingEscalationSink, RecordingFeedbackSink};

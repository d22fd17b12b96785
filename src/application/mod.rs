//! Application layer.
//!
//! Coordinates the domain through the ports: the AI orchestrator runs a
//! single turn's pipeline, and the conversation service drives conversation
//! lifecycles around it.

pub mod errors;
pub mod orchestrator;
pub mod service;

pub use errors::ProcessError;
pub use orchestrator::{AiOrchestrator, AnalysisPipeline, FallbackChain, ProviderRouter};
pub use service::{ConversationService, TurnReport};

//! Conversation domain module.
//!
//! The conversation aggregate owns the lifecycle state machine; messages are
//! immutable records owned by their conversation.

mod channel;
mod conversation;
mod message;
mod priority;
mod status;

pub use channel::Channel;
pub use conversation::{Conversation, ConversationCounters, SatisfactionScore, TurnOutcome};
pub use message::{GenerationMetadata, Message, MessageAnalysis, SenderKind};
pub use priority::Priority;
pub use status::ConversationStatus;

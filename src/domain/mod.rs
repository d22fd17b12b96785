//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `conversation` - Conversation aggregate, lifecycle state machine, messages
//! - `context` - Per-conversation topic context stack
//! - `analysis` - Analysis signal types (intent, entities, sentiment, emotion)
//! - `ai` - Per-turn AI request/response value objects
//! - `rules` - Declarative business rules and their evaluation engine

pub mod ai;
pub mod analysis;
pub mod context;
pub mod conversation;
pub mod foundation;
pub mod rules;

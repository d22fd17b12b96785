//! Bounded topic-stack context for conversations.

mod frame;
mod stack;

pub use frame::ContextFrame;
pub use stack::{ContextError, ContextStack, DEFAULT_MAX_DEPTH};

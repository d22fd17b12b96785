//! Bounded topic stack for conversation context.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ai::KnowledgeSource;
use crate::domain::analysis::{Entity, Intent};

use super::frame::ContextFrame;

/// Default maximum number of frames a conversation may hold.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Errors raised by context stack operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    /// Pushing another topic would exceed the stack bound. The stack is
    /// unchanged; the caller decides whether to stay on the current topic
    /// or escalate.
    #[error("context depth limit of {max_depth} reached")]
    StackDepthExceeded { max_depth: usize },
}

/// LIFO stack of topic frames, bounded at construction.
///
/// The base frame opened at conversation start is never popped: the active
/// topic is always well-defined. Digressions push frames; resolving a
/// digression pops back to the frozen parent frame exactly as it was left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextStack {
    frames: Vec<ContextFrame>,
    max_depth: usize,
}

impl ContextStack {
    /// Creates a stack with the given base topic and the default depth bound.
    pub fn new(base_topic: impl Into<String>) -> Self {
        Self::with_max_depth(base_topic, DEFAULT_MAX_DEPTH)
    }

    /// Creates a stack with an explicit depth bound (minimum 1).
    pub fn with_max_depth(base_topic: impl Into<String>, max_depth: usize) -> Self {
        Self {
            frames: vec![ContextFrame::open(base_topic)],
            max_depth: max_depth.max(1),
        }
    }

    /// The frame the conversation is currently working in.
    pub fn active(&self) -> &ContextFrame {
        // Invariant: frames is never empty (base frame cannot be popped).
        &self.frames[self.frames.len() - 1]
    }

    /// Current stack depth (>= 1).
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns true when only the base frame remains.
    pub fn at_base(&self) -> bool {
        self.frames.len() == 1
    }

    /// Topics from base to active, for diagnostics and rule contexts.
    pub fn topics(&self) -> Vec<&str> {
        self.frames.iter().map(|f| f.topic()).collect()
    }

    /// Pushes a new topic frame, freezing the current one.
    ///
    /// Fails closed at the depth bound: the stack is left untouched and the
    /// caller gets [`ContextError::StackDepthExceeded`].
    pub fn push_topic(&mut self, topic: impl Into<String>) -> Result<(), ContextError> {
        if self.frames.len() >= self.max_depth {
            return Err(ContextError::StackDepthExceeded {
                max_depth: self.max_depth,
            });
        }
        self.frames.push(ContextFrame::open(topic));
        Ok(())
    }

    /// Pops the active frame, resuming the parent exactly as it was left.
    ///
    /// Returns the popped frame, or `None` at the base frame (which is
    /// never popped).
    pub fn pop_topic(&mut self) -> Option<ContextFrame> {
        if self.at_base() {
            return None;
        }
        self.frames.pop()
    }

    /// Folds one turn's analysis results into the active frame.
    pub fn record_turn(
        &mut self,
        intent: Option<Intent>,
        entities: &[Entity],
        knowledge: &[KnowledgeSource],
    ) {
        let top = self.frames.len() - 1;
        self.frames[top].record_turn(intent, entities, knowledge);
    }
}

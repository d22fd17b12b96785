//! A single topic frame on the conversation context stack.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::ai::KnowledgeSource;
use crate::domain::analysis::{Entity, Intent};
use crate::domain::foundation::Timestamp;

/// One topic's working context.
///
/// A frame accumulates what the agent has learned while the topic is active:
/// the classified intent, entity bindings, and knowledge sources already
/// consulted. Frames below the top of the stack are frozen until resumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextFrame {
    topic: String,
    intent: Option<Intent>,
    entities: HashMap<String, String>,
    knowledge: Vec<KnowledgeSource>,
    turns: u32,
    opened_at: Timestamp,
}

impl ContextFrame {
    /// Opens a fresh frame for a topic.
    pub fn open(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            intent: None,
            entities: HashMap::new(),
            knowledge: Vec::new(),
            turns: 0,
            opened_at: Timestamp::now(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn intent(&self) -> Option<&Intent> {
        self.intent.as_ref()
    }

    pub fn entities(&self) -> &HashMap<String, String> {
        &self.entities
    }

    pub fn knowledge(&self) -> &[KnowledgeSource] {
        &self.knowledge
    }

    /// Number of turns processed while this frame was on top.
    pub fn turns(&self) -> u32 {
        self.turns
    }

    pub fn opened_at(&self) -> Timestamp {
        self.opened_at
    }

    /// Folds one turn's analysis results into the frame.
    ///
    /// The latest intent wins; entity bindings are keyed by kind, so a
    /// re-extracted entity replaces the earlier value. Knowledge sources
    /// accumulate, deduplicated by citation.
    pub(super) fn record_turn(
        &mut self,
        intent: Option<Intent>,
        entities: &[Entity],
        knowledge: &[KnowledgeSource],
    ) {
        if let Some(intent) = intent {
            self.intent = Some(intent);
        }
        for entity in entities {
            self.entities
                .insert(entity.kind.clone(), entity.value.clone());
        }
        for source in knowledge {
            if !self.knowledge.iter().any(|k| k.citation == source.citation) {
                self.knowledge.push(source.clone());
            }
        }
        self.turns += 1;
    }
}

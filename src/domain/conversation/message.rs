//! Message entity for conversations.
//!
//! Messages are immutable records of the exchange within a conversation.
//! The only permitted mutation after creation is the soft-delete marker.

use serde::{Deserialize, Serialize};

use crate::domain::analysis::{AnalysisTask, Emotion, Entity, Intent, Sentiment};
use crate::domain::foundation::{ConversationId, MessageId, Timestamp};

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderKind {
    /// The end user.
    User,
    /// The automated agent.
    Agent,
    /// A human support agent (post-escalation).
    Human,
    /// System notices (topic switches, escalation markers).
    System,
}

/// Analysis signals derived for a user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageAnalysis {
    pub intent: Intent,
    pub entities: Vec<Entity>,
    pub sentiment: Sentiment,
    pub emotion: Emotion,
    /// Analysis tasks that failed or timed out; their signals above hold
    /// degraded unknown/neutral values.
    pub degraded: Vec<AnalysisTask>,
}

impl MessageAnalysis {
    /// Returns true if any analysis task was degraded.
    pub fn is_partial(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Generation metadata recorded on agent messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Provider that produced the response (or "template").
    pub provider: String,
    /// Position in the fallback chain that answered (0 = first choice).
    pub fallback_level: u8,
    /// End-to-end generation latency.
    pub latency_ms: u64,
    /// Total tokens consumed.
    pub tokens_used: u32,
}

/// A message within a conversation.
///
/// Owned exclusively by its conversation. Immutable once written, except for
/// the soft-delete marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    conversation_id: ConversationId,
    sender: SenderKind,
    content: String,
    analysis: Option<MessageAnalysis>,
    generation: Option<GenerationMetadata>,
    deleted: bool,
    created_at: Timestamp,
}

impl Message {
    /// Creates a user message.
    pub fn user(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        Self::new(conversation_id, SenderKind::User, content)
    }

    /// Creates an agent message.
    pub fn agent(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        Self::new(conversation_id, SenderKind::Agent, content)
    }

    /// Creates a system message.
    pub fn system(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        Self::new(conversation_id, SenderKind::System, content)
    }

    fn new(conversation_id: ConversationId, sender: SenderKind, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            sender,
            content: content.into(),
            analysis: None,
            generation: None,
            deleted: false,
            created_at: Timestamp::now(),
        }
    }

    /// Attaches analysis signals (builder-style, used at creation time).
    pub fn with_analysis(mut self, analysis: MessageAnalysis) -> Self {
        self.analysis = Some(analysis);
        self
    }

    /// Attaches generation metadata (agent messages only).
    pub fn with_generation(mut self, generation: GenerationMetadata) -> Self {
        self.generation = Some(generation);
        self
    }

    // === Accessors ===

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    pub fn sender(&self) -> SenderKind {
        self.sender
    }

    /// Message content; empty string once soft-deleted.
    pub fn content(&self) -> &str {
        if self.deleted {
            ""
        } else {
            &self.content
        }
    }

    pub fn analysis(&self) -> Option<&MessageAnalysis> {
        self.analysis.as_ref()
    }

    pub fn generation(&self) -> Option<&GenerationMetadata> {
        self.generation.as_ref()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Marks the message deleted. The record stays for audit; content reads
    /// as empty afterwards. This is the only permitted mutation.
    pub fn soft_delete(&mut self) {
        self.deleted = true;
    }
}

//! Per-turn AI request value object.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, ValidationError};

/// An attachment accompanying a user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Attachment kind (e.g. "image", "receipt", "log").
    pub kind: String,
    /// Opaque reference into external storage.
    pub reference: String,
}

/// Per-turn option overrides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct RequestOptions {
    /// Overrides the configured escalation confidence threshold.
    pub confidence_threshold: Option<f64>,
    /// Overrides the configured knowledge retrieval result bound.
    pub knowledge_top_k: Option<usize>,
}

/// Request for one orchestrated turn.
///
/// Built fresh per inbound message and consumed once by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiRequest {
    /// Conversation this turn belongs to.
    pub conversation_id: ConversationId,
    /// The inbound user message.
    pub message: String,
    /// Attachments accompanying the message.
    pub attachments: Vec<Attachment>,
    /// Topic of the current context frame, if any.
    pub active_topic: Option<String>,
    /// Per-turn option overrides.
    pub options: RequestOptions,
}

impl AiRequest {
    /// Creates a request, rejecting empty messages.
    pub fn new(
        conversation_id: ConversationId,
        message: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ValidationError::empty_field("message"));
        }
        Ok(Self {
            conversation_id,
            message,
            attachments: Vec::new(),
            active_topic: None,
            options: RequestOptions::default(),
        })
    }

    /// Adds attachments.
    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Sets the active topic from the context stack.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.active_topic = Some(topic.into());
        self
    }

    /// Sets per-turn option overrides.
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_message() {
        assert!(AiRequest::new(ConversationId::new(), "").is_err());
        assert!(AiRequest::new(ConversationId::new(), "   \n").is_err());
    }

    #[test]
    fn builder_sets_topic_and_options() {
        let request = AiRequest::new(ConversationId::new(), "where is my order?")
            .unwrap()
            .with_topic("shipping")
            .with_options(RequestOptions {
                confidence_threshold: Some(0.85),
                knowledge_top_k: None,
            });

        assert_eq!(request.active_topic.as_deref(), Some("shipping"));
        assert_eq!(request.options.confidence_threshold, Some(0.85));
    }
}

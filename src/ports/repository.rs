//! Repository Ports - Persistence interfaces for conversations and messages.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::conversation::{Channel, Conversation, Message};
use crate::domain::foundation::{ConversationId, UserId};

/// Persistence errors.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("conversation {0} not found")]
    ConversationNotFound(ConversationId),

    #[error("storage error: {0}")]
    Storage(String),
}

impl RepositoryError {
    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

/// Port for conversation persistence.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Inserts or replaces a conversation.
    async fn save(&self, conversation: &Conversation) -> Result<(), RepositoryError>;

    /// Loads a conversation by id.
    async fn find_by_id(&self, id: ConversationId) -> Result<Conversation, RepositoryError>;

    /// Finds the open (non-terminal, non-deleted) conversation for a user on
    /// a channel, if one exists. At most one can be open per (user, channel).
    async fn find_open(
        &self,
        user_id: &UserId,
        channel: Channel,
    ) -> Result<Option<Conversation>, RepositoryError>;

    /// Lists every open conversation, for the inactivity sweep.
    async fn list_open(&self) -> Result<Vec<Conversation>, RepositoryError>;
}

/// Port for message persistence.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Appends a message to its conversation's history.
    async fn append(&self, message: &Message) -> Result<(), RepositoryError>;

    /// Lists a conversation's messages in append order.
    async fn list_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, RepositoryError>;
}

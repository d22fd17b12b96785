//! In-memory repositories.
//!
//! Back the repository ports with hash maps for tests and single-process
//! deployments. The conversation repository supports failure injection so
//! tests can exercise the mid-turn rollback path.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::domain::conversation::{Channel, Conversation, Message};
use crate::domain::foundation::{ConversationId, UserId};
use crate::ports::{ConversationRepository, MessageRepository, RepositoryError};

/// Hash-map conversation store.
#[derive(Default)]
pub struct InMemoryConversationRepository {
    conversations: RwLock<HashMap<ConversationId, Conversation>>,
    fail_saves: AtomicBool,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every `save` fails with a storage error.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn save(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(RepositoryError::storage("injected save failure"));
        }
        self.conversations
            .write()
            .unwrap()
            .insert(conversation.id(), conversation.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ConversationId) -> Result<Conversation, RepositoryError> {
        self.conversations
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::ConversationNotFound(id))
    }

    async fn find_open(
        &self,
        user_id: &UserId,
        channel: Channel,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self
            .conversations
            .read()
            .unwrap()
            .values()
            .find(|c| c.user_id() == user_id && c.channel() == channel && c.is_open())
            .cloned())
    }

    async fn list_open(&self) -> Result<Vec<Conversation>, RepositoryError> {
        Ok(self
            .conversations
            .read()
            .unwrap()
            .values()
            .filter(|c| c.is_open())
            .cloned()
            .collect())
    }
}

/// Hash-map message store, append-ordered per conversation.
#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: RwLock<HashMap<ConversationId, Vec<Message>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total stored messages across all conversations.
    pub fn len(&self) -> usize {
        self.messages.read().unwrap().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn append(&self, message: &Message) -> Result<(), RepositoryError> {
        self.messages
            .write()
            .unwrap()
            .entry(message.conversation_id())
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn list_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, RepositoryError> {
        Ok(self
            .messages
            .read()
            .unwrap()
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_and_find_round_trip() {
        let repo = InMemoryConversationRepository::new();
        let conversation = Conversation::new(UserId::new("u1").unwrap(), Channel::Web);
        let id = conversation.id();

        repo.save(&conversation).await.unwrap();
        let found = repo.find_by_id(id).await.unwrap();
        assert_eq!(found.id(), id);
    }

    #[tokio::test]
    async fn find_open_ignores_terminal_conversations() {
        let repo = InMemoryConversationRepository::new();
        let user = UserId::new("u1").unwrap();
        let mut conversation = Conversation::new(user.clone(), Channel::Web);
        conversation.resolve().unwrap();
        repo.save(&conversation).await.unwrap();

        assert!(repo.find_open(&user, Channel::Web).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn injected_failure_rejects_saves() {
        let repo = InMemoryConversationRepository::new();
        repo.set_fail_saves(true);
        let conversation = Conversation::new(UserId::new("u1").unwrap(), Channel::Web);
        assert!(repo.save(&conversation).await.is_err());
    }

    #[tokio::test]
    async fn messages_keep_append_order() {
        let repo = InMemoryMessageRepository::new();
        let id = ConversationId::new();
        repo.append(&Message::user(id, "first")).await.unwrap();
        repo.append(&Message::agent(id, "second")).await.unwrap();

        let messages = repo.list_by_conversation(id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content(), "first");
        assert_eq!(messages[1].content(), "second");
    }
}

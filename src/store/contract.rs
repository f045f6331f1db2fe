//! Store contracts consumed by the action engine and the workflow.

use super::{Conversation, Message, NodeRecord};
use crate::error::StoreError;
use crate::types::{ConversationId, MessageId, NodeId, ProjectId};
use async_trait::async_trait;

/// File tree operations. Every call is a round-trip to the store; each one is
/// atomic on its own but nothing groups them.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Find a folder by exact (case-sensitive) name under `parent` (None = root).
    async fn find_folder(
        &self,
        project_id: &ProjectId,
        parent_id: Option<&NodeId>,
        name: &str,
    ) -> Result<Option<NodeRecord>, StoreError>;

    /// Create a folder unconditionally and return its new identifier.
    async fn create_folder(
        &self,
        project_id: &ProjectId,
        parent_id: Option<&NodeId>,
        name: &str,
    ) -> Result<NodeId, StoreError>;

    async fn create_file(
        &self,
        project_id: &ProjectId,
        parent_id: Option<&NodeId>,
        name: &str,
        content: &str,
    ) -> Result<NodeId, StoreError>;

    /// Overwrite the full content of an existing file.
    async fn update_file(&self, file_id: &NodeId, content: &str) -> Result<(), StoreError>;

    async fn list_nodes(&self, project_id: &ProjectId) -> Result<Vec<NodeRecord>, StoreError>;
}

/// Conversation and message persistence used by the workflow.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn get_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<Conversation>, StoreError>;

    /// The latest `limit` messages of a conversation, oldest first.
    async fn recent_messages(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError>;

    async fn update_conversation_title(
        &self,
        conversation_id: &ConversationId,
        title: &str,
    ) -> Result<(), StoreError>;

    /// Replace a message's content and mark it completed.
    async fn update_message_content(
        &self,
        message_id: &MessageId,
        content: &str,
    ) -> Result<(), StoreError>;
}

/// Full document store surface.
pub trait DocumentStore: FileStore + ConversationStore {}

impl<T: FileStore + ConversationStore> DocumentStore for T {}

//! In-process document store.
//!
//! Keeps nodes, conversations and messages behind a single `RwLock` and counts
//! every trait call so callers can observe how many round-trips a pass made.

use super::contract::{ConversationStore, FileStore};
use super::{Conversation, Message, MessageRole, MessageStatus, NodeKind, NodeRecord};
use crate::error::StoreError;
use crate::types::{ConversationId, MessageId, NodeId, ProjectId};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Per-operation call counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub find_folder: usize,
    pub create_folder: usize,
    pub create_file: usize,
    pub update_file: usize,
    pub list_nodes: usize,
}

impl StoreStats {
    /// Calls that touched the file tree
    pub fn total(&self) -> usize {
        self.find_folder + self.create_folder + self.create_file + self.update_file + self.list_nodes
    }
}

#[derive(Default)]
struct MemoryState {
    next_id: u64,
    nodes: Vec<NodeRecord>,
    conversations: HashMap<ConversationId, Conversation>,
    messages: Vec<Message>,
    stats: StoreStats,
}

impl MemoryState {
    fn allocate(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn node(&self, node_id: &NodeId) -> Option<&NodeRecord> {
        self.nodes.iter().find(|n| &n.node_id == node_id)
    }

    fn check_parent(
        &self,
        project_id: &ProjectId,
        parent_id: Option<&NodeId>,
    ) -> Result<(), StoreError> {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };
        match self.node(parent_id) {
            Some(parent) if &parent.project_id != project_id => {
                Err(StoreError::ParentInOtherProject {
                    parent_id: parent_id.clone(),
                    project_id: project_id.clone(),
                })
            }
            Some(parent) if parent.is_folder() => Ok(()),
            Some(_) => Err(StoreError::ParentNotFolder(parent_id.clone())),
            None => Err(StoreError::NodeNotFound(parent_id.clone())),
        }
    }

    fn insert_node(
        &mut self,
        project_id: &ProjectId,
        parent_id: Option<&NodeId>,
        name: &str,
        kind: NodeKind,
        content: Option<String>,
    ) -> Result<NodeId, StoreError> {
        self.check_parent(project_id, parent_id)?;
        let node_id = NodeId::new(self.allocate("node"));
        self.nodes.push(NodeRecord {
            node_id: node_id.clone(),
            project_id: project_id.clone(),
            parent_id: parent_id.cloned(),
            name: name.to_string(),
            kind,
            content,
            updated_at: Utc::now(),
        });
        Ok(node_id)
    }
}

/// Document store held entirely in memory
#[derive(Default)]
pub struct MemoryDocumentStore {
    state: RwLock<MemoryState>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> StoreStats {
        self.state.read().stats.clone()
    }

    pub fn node(&self, node_id: &NodeId) -> Option<NodeRecord> {
        self.state.read().node(node_id).cloned()
    }

    /// All nodes in creation order, across projects
    pub fn nodes(&self) -> Vec<NodeRecord> {
        self.state.read().nodes.clone()
    }

    pub fn create_conversation(&self, project_id: &ProjectId, title: &str) -> ConversationId {
        let mut state = self.state.write();
        let conversation_id = ConversationId::new(state.allocate("conversation"));
        state.conversations.insert(
            conversation_id.clone(),
            Conversation {
                conversation_id: conversation_id.clone(),
                project_id: project_id.clone(),
                title: title.to_string(),
                updated_at: Utc::now(),
            },
        );
        conversation_id
    }

    pub fn add_message(
        &self,
        conversation_id: &ConversationId,
        role: MessageRole,
        content: &str,
        status: MessageStatus,
    ) -> MessageId {
        let mut state = self.state.write();
        let message_id = MessageId::new(state.allocate("message"));
        state.messages.push(Message {
            message_id: message_id.clone(),
            conversation_id: conversation_id.clone(),
            role,
            content: content.to_string(),
            status,
            created_at: Utc::now(),
        });
        message_id
    }

    pub fn message(&self, message_id: &MessageId) -> Option<Message> {
        self.state
            .read()
            .messages
            .iter()
            .find(|m| &m.message_id == message_id)
            .cloned()
    }

    pub fn conversation(&self, conversation_id: &ConversationId) -> Option<Conversation> {
        self.state.read().conversations.get(conversation_id).cloned()
    }
}

#[async_trait]
impl FileStore for MemoryDocumentStore {
    async fn find_folder(
        &self,
        project_id: &ProjectId,
        parent_id: Option<&NodeId>,
        name: &str,
    ) -> Result<Option<NodeRecord>, StoreError> {
        let mut state = self.state.write();
        state.stats.find_folder += 1;
        Ok(state
            .nodes
            .iter()
            .find(|n| {
                n.is_folder()
                    && &n.project_id == project_id
                    && n.parent_id.as_ref() == parent_id
                    && n.name == name
            })
            .cloned())
    }

    async fn create_folder(
        &self,
        project_id: &ProjectId,
        parent_id: Option<&NodeId>,
        name: &str,
    ) -> Result<NodeId, StoreError> {
        let mut state = self.state.write();
        state.stats.create_folder += 1;
        state.insert_node(project_id, parent_id, name, NodeKind::Folder, None)
    }

    async fn create_file(
        &self,
        project_id: &ProjectId,
        parent_id: Option<&NodeId>,
        name: &str,
        content: &str,
    ) -> Result<NodeId, StoreError> {
        let mut state = self.state.write();
        state.stats.create_file += 1;
        state.insert_node(
            project_id,
            parent_id,
            name,
            NodeKind::File,
            Some(content.to_string()),
        )
    }

    async fn update_file(&self, file_id: &NodeId, content: &str) -> Result<(), StoreError> {
        let mut state = self.state.write();
        state.stats.update_file += 1;
        let node = state
            .nodes
            .iter_mut()
            .find(|n| &n.node_id == file_id)
            .ok_or_else(|| StoreError::NodeNotFound(file_id.clone()))?;
        if node.is_folder() {
            return Err(StoreError::NotAFile(file_id.clone()));
        }
        node.content = Some(content.to_string());
        node.updated_at = Utc::now();
        Ok(())
    }

    async fn list_nodes(&self, project_id: &ProjectId) -> Result<Vec<NodeRecord>, StoreError> {
        let mut state = self.state.write();
        state.stats.list_nodes += 1;
        Ok(state
            .nodes
            .iter()
            .filter(|n| &n.project_id == project_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ConversationStore for MemoryDocumentStore {
    async fn get_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<Conversation>, StoreError> {
        Ok(self.conversation(conversation_id))
    }

    async fn recent_messages(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError> {
        let state = self.state.read();
        let messages: Vec<&Message> = state
            .messages
            .iter()
            .filter(|m| &m.conversation_id == conversation_id)
            .collect();
        let skip = messages.len().saturating_sub(limit);
        Ok(messages.into_iter().skip(skip).cloned().collect())
    }

    async fn update_conversation_title(
        &self,
        conversation_id: &ConversationId,
        title: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write();
        let conversation = state
            .conversations
            .get_mut(conversation_id)
            .ok_or_else(|| StoreError::ConversationNotFound(conversation_id.clone()))?;
        conversation.title = title.to_string();
        conversation.updated_at = Utc::now();
        Ok(())
    }

    async fn update_message_content(
        &self,
        message_id: &MessageId,
        content: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write();
        let message = state
            .messages
            .iter_mut()
            .find(|m| &m.message_id == message_id)
            .ok_or_else(|| StoreError::MessageNotFound(message_id.clone()))?;
        message.content = content.to_string();
        message.status = MessageStatus::Completed;
        Ok(())
    }
}

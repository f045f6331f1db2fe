//! Sled-backed document store.
//!
//! Layout:
//! - `nodes`: node id -> NodeRecord
//! - `folder_index`: project \0 parent \0 name -> folder node id
//! - `conversations`: conversation id -> Conversation
//! - `messages`: message id -> Message
//! - `conversation_messages`: conversation id \0 sequence (big endian) -> message id
//!
//! Values are bincode-encoded. Identifiers come from `Db::generate_id`, which
//! is monotonic across restarts.

use super::contract::{ConversationStore, FileStore};
use super::{Conversation, Message, MessageRole, MessageStatus, NodeKind, NodeRecord};
use crate::error::StoreError;
use crate::types::{ConversationId, MessageId, NodeId, ProjectId};
use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

const SEP: u8 = 0;

pub struct SledDocumentStore {
    db: sled::Db,
    nodes: sled::Tree,
    folder_index: sled::Tree,
    conversations: sled::Tree,
    messages: sled::Tree,
    conversation_messages: sled::Tree,
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    Ok(bincode::serialize(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    Ok(bincode::deserialize(bytes)?)
}

fn folder_key(project_id: &ProjectId, parent_id: Option<&NodeId>, name: &str) -> Vec<u8> {
    let parent = parent_id.map(NodeId::as_str).unwrap_or("");
    let mut key = Vec::with_capacity(project_id.as_str().len() + parent.len() + name.len() + 2);
    key.extend_from_slice(project_id.as_str().as_bytes());
    key.push(SEP);
    key.extend_from_slice(parent.as_bytes());
    key.push(SEP);
    key.extend_from_slice(name.as_bytes());
    key
}

fn conversation_prefix(conversation_id: &ConversationId) -> Vec<u8> {
    let mut prefix = conversation_id.as_str().as_bytes().to_vec();
    prefix.push(SEP);
    prefix
}

impl SledDocumentStore {
    /// Open (or create) a store at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Self {
            nodes: db.open_tree("nodes")?,
            folder_index: db.open_tree("folder_index")?,
            conversations: db.open_tree("conversations")?,
            messages: db.open_tree("messages")?,
            conversation_messages: db.open_tree("conversation_messages")?,
            db,
        })
    }

    fn next_id(&self, prefix: &str) -> Result<String, StoreError> {
        Ok(format!("{}-{}", prefix, self.db.generate_id()?))
    }

    pub fn node(&self, node_id: &NodeId) -> Result<Option<NodeRecord>, StoreError> {
        self.nodes
            .get(node_id.as_str().as_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn check_parent(
        &self,
        project_id: &ProjectId,
        parent_id: Option<&NodeId>,
    ) -> Result<(), StoreError> {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };
        match self.node(parent_id)? {
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

    fn insert_node(&self, record: &NodeRecord) -> Result<(), StoreError> {
        self.nodes
            .insert(record.node_id.as_str().as_bytes(), encode(record)?)?;
        Ok(())
    }

    pub fn create_conversation(
        &self,
        project_id: &ProjectId,
        title: &str,
    ) -> Result<ConversationId, StoreError> {
        let conversation_id = ConversationId::new(self.next_id("conversation")?);
        let conversation = Conversation {
            conversation_id: conversation_id.clone(),
            project_id: project_id.clone(),
            title: title.to_string(),
            updated_at: Utc::now(),
        };
        self.conversations
            .insert(conversation_id.as_str().as_bytes(), encode(&conversation)?)?;
        Ok(conversation_id)
    }

    pub fn add_message(
        &self,
        conversation_id: &ConversationId,
        role: MessageRole,
        content: &str,
        status: MessageStatus,
    ) -> Result<MessageId, StoreError> {
        if self.conversations.get(conversation_id.as_str().as_bytes())?.is_none() {
            return Err(StoreError::ConversationNotFound(conversation_id.clone()));
        }
        let sequence = self.db.generate_id()?;
        let message_id = MessageId::new(format!("message-{}", sequence));
        let message = Message {
            message_id: message_id.clone(),
            conversation_id: conversation_id.clone(),
            role,
            content: content.to_string(),
            status,
            created_at: Utc::now(),
        };
        self.messages
            .insert(message_id.as_str().as_bytes(), encode(&message)?)?;

        let mut key = conversation_prefix(conversation_id);
        key.extend_from_slice(&sequence.to_be_bytes());
        self.conversation_messages
            .insert(key, message_id.as_str().as_bytes())?;
        Ok(message_id)
    }

    pub fn message(&self, message_id: &MessageId) -> Result<Option<Message>, StoreError> {
        self.messages
            .get(message_id.as_str().as_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}

#[async_trait]
impl FileStore for SledDocumentStore {
    async fn find_folder(
        &self,
        project_id: &ProjectId,
        parent_id: Option<&NodeId>,
        name: &str,
    ) -> Result<Option<NodeRecord>, StoreError> {
        let key = folder_key(project_id, parent_id, name);
        match self.folder_index.get(key)? {
            Some(id) => {
                let node_id = NodeId::new(String::from_utf8_lossy(&id).into_owned());
                self.node(&node_id)
            }
            None => Ok(None),
        }
    }

    async fn create_folder(
        &self,
        project_id: &ProjectId,
        parent_id: Option<&NodeId>,
        name: &str,
    ) -> Result<NodeId, StoreError> {
        self.check_parent(project_id, parent_id)?;
        let record = NodeRecord {
            node_id: NodeId::new(self.next_id("node")?),
            project_id: project_id.clone(),
            parent_id: parent_id.cloned(),
            name: name.to_string(),
            kind: NodeKind::Folder,
            content: None,
            updated_at: Utc::now(),
        };
        self.insert_node(&record)?;

        // First folder registered under a key wins; later duplicates stay
        // reachable through list_nodes only.
        let key = folder_key(project_id, parent_id, name);
        let _ = self.folder_index.compare_and_swap(
            key,
            None as Option<&[u8]>,
            Some(record.node_id.as_str().as_bytes()),
        )?;
        Ok(record.node_id)
    }

    async fn create_file(
        &self,
        project_id: &ProjectId,
        parent_id: Option<&NodeId>,
        name: &str,
        content: &str,
    ) -> Result<NodeId, StoreError> {
        self.check_parent(project_id, parent_id)?;
        let record = NodeRecord {
            node_id: NodeId::new(self.next_id("node")?),
            project_id: project_id.clone(),
            parent_id: parent_id.cloned(),
            name: name.to_string(),
            kind: NodeKind::File,
            content: Some(content.to_string()),
            updated_at: Utc::now(),
        };
        self.insert_node(&record)?;
        Ok(record.node_id)
    }

    async fn update_file(&self, file_id: &NodeId, content: &str) -> Result<(), StoreError> {
        let mut record = self
            .node(file_id)?
            .ok_or_else(|| StoreError::NodeNotFound(file_id.clone()))?;
        if record.is_folder() {
            return Err(StoreError::NotAFile(file_id.clone()));
        }
        record.content = Some(content.to_string());
        record.updated_at = Utc::now();
        self.insert_node(&record)
    }

    async fn list_nodes(&self, project_id: &ProjectId) -> Result<Vec<NodeRecord>, StoreError> {
        let mut nodes = Vec::new();
        for entry in self.nodes.iter() {
            let (_, bytes) = entry?;
            let record: NodeRecord = decode(&bytes)?;
            if &record.project_id == project_id {
                nodes.push(record);
            }
        }
        Ok(nodes)
    }
}

#[async_trait]
impl ConversationStore for SledDocumentStore {
    async fn get_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<Conversation>, StoreError> {
        self.conversations
            .get(conversation_id.as_str().as_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    async fn recent_messages(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError> {
        let mut recent = Vec::new();
        for entry in self
            .conversation_messages
            .scan_prefix(conversation_prefix(conversation_id))
            .rev()
            .take(limit)
        {
            let (_, id) = entry?;
            let message_id = MessageId::new(String::from_utf8_lossy(&id).into_owned());
            if let Some(message) = self.message(&message_id)? {
                recent.push(message);
            }
        }
        recent.reverse();
        Ok(recent)
    }

    async fn update_conversation_title(
        &self,
        conversation_id: &ConversationId,
        title: &str,
    ) -> Result<(), StoreError> {
        let mut conversation = self
            .get_conversation(conversation_id)
            .await?
            .ok_or_else(|| StoreError::ConversationNotFound(conversation_id.clone()))?;
        conversation.title = title.to_string();
        conversation.updated_at = Utc::now();
        self.conversations
            .insert(conversation_id.as_str().as_bytes(), encode(&conversation)?)?;
        Ok(())
    }

    async fn update_message_content(
        &self,
        message_id: &MessageId,
        content: &str,
    ) -> Result<(), StoreError> {
        let mut message = self
            .message(message_id)?
            .ok_or_else(|| StoreError::MessageNotFound(message_id.clone()))?;
        message.content = content.to_string();
        message.status = MessageStatus::Completed;
        self.messages
            .insert(message_id.as_str().as_bytes(), encode(&message)?)?;
        Ok(())
    }
}

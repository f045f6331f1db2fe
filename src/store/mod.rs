//! Document Store
//!
//! Records and contracts for the external document store that owns project file
//! trees and conversations. The action engine and the conversation workflow only
//! talk to the store through the [`FileStore`] and [`ConversationStore`] traits.

pub mod contract;
pub mod memory;
pub mod persistence;

pub use contract::{ConversationStore, DocumentStore, FileStore};
pub use memory::{MemoryDocumentStore, StoreStats};
pub use persistence::SledDocumentStore;

use crate::types::{ConversationId, MessageId, NodeId, ProjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title given to new conversations until one is generated.
pub const DEFAULT_CONVERSATION_TITLE: &str = "New conversation";

/// Node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    File,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Folder => "folder",
            NodeKind::File => "file",
        }
    }
}

/// NodeRecord: a persisted file or folder in a project's tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub node_id: NodeId,
    pub project_id: ProjectId,
    /// None means the node sits at the project root
    pub parent_id: Option<NodeId>,
    pub name: String,
    pub kind: NodeKind,
    /// Only set for files
    pub content: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl NodeRecord {
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: ConversationId,
    pub project_id: ProjectId,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Processing,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub conversation_id: ConversationId,
    pub role: MessageRole,
    pub content: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

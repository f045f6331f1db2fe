//! Error types for the store boundary, the action engine, text generation and
//! the conversation workflow.

use crate::types::{ConversationId, MessageId, NodeId, ProjectId};
use thiserror::Error;

/// Document store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node {0} is a folder, not a file")]
    NotAFile(NodeId),

    #[error("Parent node {0} is not a folder")]
    ParentNotFolder(NodeId),

    #[error("Parent node {parent_id} does not belong to project {project_id}")]
    ParentInOtherProject {
        parent_id: NodeId,
        project_id: ProjectId,
    },

    #[error("Conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Failure of a single create/update action inside an apply pass
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Failed to resolve folder {segment:?}: {source}")]
    Resolution {
        segment: String,
        #[source]
        source: StoreError,
    },

    #[error("Mutation failed: {0}")]
    Mutation(#[from] StoreError),
}

/// Text generation errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider request failed: {0}")]
    Request(String),

    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Invalid provider configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Request(err.to_string())
    }
}

/// Conversation workflow errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    #[error("Step {step} failed: {source}")]
    Store {
        step: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Step {step} failed: {source}")]
    Provider {
        step: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error("Cancelled before step {step}")]
    Cancelled { step: &'static str },
}

impl WorkflowError {
    /// Whether a scheduler may retry the run. Configuration problems and missing
    /// conversations will not fix themselves.
    pub fn is_retriable(&self) -> bool {
        match self {
            WorkflowError::Configuration(_)
            | WorkflowError::ConversationNotFound(_)
            | WorkflowError::Cancelled { .. } => false,
            WorkflowError::Store { .. } | WorkflowError::Provider { .. } => true,
        }
    }
}

/// Top-level errors for configuration, logging and the CLI surface
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Provider error: {0}")]
    ProviderError(#[from] ProviderError),

    #[error("Workflow error: {0}")]
    WorkflowError(#[from] WorkflowError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

//! Message processing workflow.
//!
//! One run handles one user message: it loads the conversation, renders the
//! system prompt with recent history, optionally titles the conversation,
//! generates the assistant response, applies the file actions embedded in it
//! and stores the response as the assistant message.
//!
//! Steps run strictly in sequence. Cancellation is checked before each step.
//! Action failures never fail a run; they only show up in the apply report and
//! in the logs.

use super::cancel::CancelSignal;
use super::prompt::{build_system_prompt, CODING_AGENT_SYSTEM_PROMPT, TITLE_GENERATOR_SYSTEM_PROMPT};
use crate::actions::{execute_text_actions, ApplyReport};
use crate::error::{StoreError, WorkflowError};
use crate::provider::TextGenerator;
use crate::store::{DocumentStore, DEFAULT_CONVERSATION_TITLE};
use crate::types::{ConversationId, MessageId, ProjectId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Stored when the model returns an empty response.
pub const EMPTY_RESPONSE_FALLBACK: &str = "I processed your request.";

/// Stored in the assistant message when a run fails.
pub const FAILURE_MESSAGE: &str = "My apologies, I encountered an error while processing your request. Let me know if you need anything else!";

/// Inbound event: a user message waiting for an assistant response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    /// The assistant message placeholder that receives the response
    pub message_id: MessageId,
    pub conversation_id: ConversationId,
    pub project_id: ProjectId,
    /// Raw user message text
    pub message: String,
}

/// Workflow settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSettings {
    /// Store access credential; runs refuse to start without it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_key: Option<String>,

    /// Pause before reading the conversation, letting the store settle
    #[serde(default = "default_db_sync_delay_ms")]
    pub db_sync_delay_ms: u64,

    /// Number of recent messages rendered into the system prompt
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_db_sync_delay_ms() -> u64 {
    1000
}

fn default_history_limit() -> usize {
    10
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            internal_key: None,
            db_sync_delay_ms: default_db_sync_delay_ms(),
            history_limit: default_history_limit(),
        }
    }
}

impl WorkflowSettings {
    fn has_internal_key(&self) -> bool {
        self.internal_key
            .as_deref()
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Summary of a completed run
#[derive(Debug)]
pub struct ProcessOutcome {
    pub message_id: MessageId,
    pub conversation_id: ConversationId,
    pub title: Option<String>,
    pub response: String,
    pub report: ApplyReport,
}

pub struct MessageProcessor<S: DocumentStore> {
    store: Arc<S>,
    generator: Arc<dyn TextGenerator>,
    settings: WorkflowSettings,
}

impl<S: DocumentStore> MessageProcessor<S> {
    pub fn new(store: Arc<S>, generator: Arc<dyn TextGenerator>, settings: WorkflowSettings) -> Self {
        Self {
            store,
            generator,
            settings,
        }
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    fn begin(&self, step: &'static str, cancel: &CancelSignal) -> Result<(), WorkflowError> {
        if cancel.is_cancelled() {
            info!(step, "Run cancelled");
            return Err(WorkflowError::Cancelled { step });
        }
        debug!(step, "Starting step");
        Ok(())
    }

    fn store_err(step: &'static str) -> impl Fn(StoreError) -> WorkflowError {
        move |source| WorkflowError::Store { step, source }
    }

    /// Run every step for `event`.
    pub async fn run(
        &self,
        event: &MessageEvent,
        cancel: &CancelSignal,
    ) -> Result<ProcessOutcome, WorkflowError> {
        if !self.settings.has_internal_key() {
            return Err(WorkflowError::Configuration(
                "internal store key is not configured".to_string(),
            ));
        }

        self.begin("wait-for-db-sync", cancel)?;
        if self.settings.db_sync_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.settings.db_sync_delay_ms)).await;
        }

        self.begin("get-conversation", cancel)?;
        let conversation = self
            .store
            .get_conversation(&event.conversation_id)
            .await
            .map_err(Self::store_err("get-conversation"))?
            .ok_or_else(|| WorkflowError::ConversationNotFound(event.conversation_id.clone()))?;

        self.begin("get-recent-messages", cancel)?;
        let recent = self
            .store
            .recent_messages(&event.conversation_id, self.settings.history_limit)
            .await
            .map_err(Self::store_err("get-recent-messages"))?;
        let system_prompt =
            build_system_prompt(CODING_AGENT_SYSTEM_PROMPT, &recent, &event.message_id);

        let mut title = None;
        if conversation.title == DEFAULT_CONVERSATION_TITLE {
            self.begin("generate-title", cancel)?;
            title = self.generate_title(event).await?;
        }

        self.begin("generate-response", cancel)?;
        let response = self
            .generator
            .generate(&system_prompt, &event.message)
            .await
            .map_err(|source| WorkflowError::Provider {
                step: "generate-response",
                source,
            })?;

        self.begin("execute-text-actions", cancel)?;
        let report = execute_text_actions(&*self.store, &event.project_id, &response).await;
        if !report.is_clean() {
            warn!(
                message_id = %event.message_id,
                failed = report.failed(),
                "Some text actions were not applied"
            );
        }

        self.begin("update-assistant-message", cancel)?;
        let content = if response.is_empty() {
            EMPTY_RESPONSE_FALLBACK
        } else {
            response.as_str()
        };
        self.store
            .update_message_content(&event.message_id, content)
            .await
            .map_err(Self::store_err("update-assistant-message"))?;

        info!(
            message_id = %event.message_id,
            conversation_id = %event.conversation_id,
            actions = report.outcomes.len(),
            failed = report.failed(),
            "Message processed"
        );

        Ok(ProcessOutcome {
            message_id: event.message_id.clone(),
            conversation_id: event.conversation_id.clone(),
            title,
            response,
            report,
        })
    }

    async fn generate_title(&self, event: &MessageEvent) -> Result<Option<String>, WorkflowError> {
        let generated = self
            .generator
            .generate(TITLE_GENERATOR_SYSTEM_PROMPT, &event.message)
            .await
            .map_err(|source| WorkflowError::Provider {
                step: "generate-title",
                source,
            })?;
        let title = generated.trim();
        if title.is_empty() {
            return Ok(None);
        }
        self.store
            .update_conversation_title(&event.conversation_id, title)
            .await
            .map_err(Self::store_err("generate-title"))?;
        Ok(Some(title.to_string()))
    }

    /// Failure hook: replace the pending assistant message with an apology.
    ///
    /// Skipped (returns false) when no internal key is configured, since the
    /// store cannot be reached without it.
    pub async fn on_failure(&self, event: &MessageEvent) -> Result<bool, StoreError> {
        if !self.settings.has_internal_key() {
            return Ok(false);
        }
        self.store
            .update_message_content(&event.message_id, FAILURE_MESSAGE)
            .await?;
        Ok(true)
    }

    /// Run `event`, invoking the failure hook on any error except cancellation.
    pub async fn handle(
        &self,
        event: &MessageEvent,
        cancel: &CancelSignal,
    ) -> Result<ProcessOutcome, WorkflowError> {
        match self.run(event, cancel).await {
            Ok(outcome) => Ok(outcome),
            Err(e @ WorkflowError::Cancelled { .. }) => Err(e),
            Err(e) => {
                error!(
                    message_id = %event.message_id,
                    retriable = e.is_retriable(),
                    error = %e,
                    "Message processing failed"
                );
                if let Err(hook_err) = self.on_failure(event).await {
                    error!(message_id = %event.message_id, error = %hook_err, "Failure hook failed");
                }
                Err(e)
            }
        }
    }
}

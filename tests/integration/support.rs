//! Test doubles shared by the integration tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use polaris::conversation::CancelSignal;
use polaris::error::{ProviderError, StoreError};
use polaris::provider::TextGenerator;
use polaris::store::{FileStore, MemoryDocumentStore, NodeRecord};
use polaris::types::{NodeId, ProjectId};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// File store that rejects `create_file` for one file name, or `find_folder`
/// for one folder segment, and delegates everything else to an in-memory store.
pub struct FlakyStore {
    pub inner: Arc<MemoryDocumentStore>,
    failing_file: Option<String>,
    failing_folder: Option<String>,
    folder_failures: AtomicUsize,
}

impl FlakyStore {
    fn with(failing_file: Option<&str>, failing_folder: Option<&str>) -> Self {
        Self {
            inner: Arc::new(MemoryDocumentStore::new()),
            failing_file: failing_file.map(str::to_string),
            failing_folder: failing_folder.map(str::to_string),
            folder_failures: AtomicUsize::new(0),
        }
    }

    pub fn failing_file(name: &str) -> Self {
        Self::with(Some(name), None)
    }

    pub fn failing_folder(segment: &str) -> Self {
        Self::with(None, Some(segment))
    }

    /// Folder lookups rejected so far
    pub fn folder_failures(&self) -> usize {
        self.folder_failures.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileStore for FlakyStore {
    async fn find_folder(
        &self,
        project_id: &ProjectId,
        parent_id: Option<&NodeId>,
        name: &str,
    ) -> Result<Option<NodeRecord>, StoreError> {
        if self.failing_folder.as_deref() == Some(name) {
            self.folder_failures.fetch_add(1, Ordering::SeqCst);
            return Err(StoreError::Backend(format!("lookup timed out for {}", name)));
        }
        self.inner.find_folder(project_id, parent_id, name).await
    }

    async fn create_folder(
        &self,
        project_id: &ProjectId,
        parent_id: Option<&NodeId>,
        name: &str,
    ) -> Result<NodeId, StoreError> {
        self.inner.create_folder(project_id, parent_id, name).await
    }

    async fn create_file(
        &self,
        project_id: &ProjectId,
        parent_id: Option<&NodeId>,
        name: &str,
        content: &str,
    ) -> Result<NodeId, StoreError> {
        if self.failing_file.as_deref() == Some(name) {
            return Err(StoreError::Backend(format!("write rejected for {}", name)));
        }
        self.inner
            .create_file(project_id, parent_id, name, content)
            .await
    }

    async fn update_file(&self, file_id: &NodeId, content: &str) -> Result<(), StoreError> {
        self.inner.update_file(file_id, content).await
    }

    async fn list_nodes(&self, project_id: &ProjectId) -> Result<Vec<NodeRecord>, StoreError> {
        self.inner.list_nodes(project_id).await
    }
}

/// Generator that replays scripted replies and records every call.
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    calls: Mutex<Vec<(String, String)>>,
    cancel_on_call: Option<CancelSignal>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
            cancel_on_call: None,
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    /// Trip `signal` whenever the generator is called.
    pub fn cancelling(mut self, signal: CancelSignal) -> Self {
        self.cancel_on_call = Some(signal);
        self
    }

    /// (system prompt, user prompt) pairs, in call order
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        self.calls
            .lock()
            .push((system.to_string(), prompt.to_string()));
        if let Some(signal) = &self.cancel_on_call {
            signal.cancel();
        }
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::InvalidResponse("script exhausted".to_string())))
    }
}

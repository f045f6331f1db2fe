//! Best-effort application of parsed actions.
//!
//! Creates run first, then updates, each group in source order. Every action
//! is isolated: a failed resolution or mutation is recorded in the report and
//! logged, and the pass moves on. Nothing is rolled back.

use super::parser::{parse_actions, CreateFile, ParsedActions, UpdateFile};
use super::resolver::{split_leaf, PathResolver, ResolutionCache};
use crate::error::ActionError;
use crate::store::FileStore;
use crate::types::{NodeId, ProjectId};
use std::time::Instant;
use tracing::{debug, info, warn};

/// What an outcome refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionTarget {
    Create { path: String },
    Update { file_id: NodeId },
}

impl std::fmt::Display for ActionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionTarget::Create { path } => write!(f, "create {}", path),
            ActionTarget::Update { file_id } => write!(f, "update {}", file_id),
        }
    }
}

/// Result of one action; on success, the id of the created or updated file
#[derive(Debug)]
pub struct ActionOutcome {
    pub target: ActionTarget,
    pub result: Result<NodeId, ActionError>,
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Apply pass report
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// One entry per action, in apply order
    pub outcomes: Vec<ActionOutcome>,
    pub folders_created: usize,
    pub cache_hits: usize,
    pub duration_ms: u64,
}

impl ApplyReport {
    pub fn created(&self) -> usize {
        self.count(|target| matches!(target, ActionTarget::Create { .. }))
    }

    pub fn updated(&self) -> usize {
        self.count(|target| matches!(target, ActionTarget::Update { .. }))
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&ActionTarget, &ActionError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.target, e)))
    }

    /// True when every action succeeded (vacuously true for an empty pass)
    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, kind: impl Fn(&ActionTarget) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.is_success() && kind(&o.target))
            .count()
    }
}

async fn apply_create(
    store: &dyn FileStore,
    project_id: &ProjectId,
    resolver: &mut PathResolver<'_>,
    action: &CreateFile,
) -> Result<NodeId, ActionError> {
    let (folders, leaf) = split_leaf(&action.path);
    if leaf.trim().is_empty() {
        return Err(ActionError::InvalidPath {
            path: action.path.clone(),
            reason: "missing file name".to_string(),
        });
    }

    let parent_id = resolver.resolve_segments(&folders).await?;
    let file_id = store
        .create_file(project_id, parent_id.as_ref(), leaf, &action.content)
        .await?;
    Ok(file_id)
}

async fn apply_update(store: &dyn FileStore, action: &UpdateFile) -> Result<NodeId, ActionError> {
    store.update_file(&action.file_id, &action.content).await?;
    Ok(action.file_id.clone())
}

/// Apply every action in `actions` against `store` for `project_id`.
///
/// Never fails; per-action errors are collected in the report.
pub async fn apply_actions(
    store: &dyn FileStore,
    project_id: &ProjectId,
    actions: &ParsedActions,
) -> ApplyReport {
    let start = Instant::now();
    let mut cache = ResolutionCache::new();
    let mut resolver = PathResolver::new(store, project_id, &mut cache);
    let mut outcomes = Vec::with_capacity(actions.len());

    for action in &actions.creates {
        let result = apply_create(store, project_id, &mut resolver, action).await;
        match &result {
            Ok(file_id) => debug!(path = %action.path, node_id = %file_id, "Created file"),
            Err(e) => warn!(path = %action.path, error = %e, "Failed to create file"),
        }
        outcomes.push(ActionOutcome {
            target: ActionTarget::Create {
                path: action.path.clone(),
            },
            result,
        });
    }
    let folders_created = resolver.folders_created();

    for action in &actions.updates {
        let result = apply_update(store, action).await;
        match &result {
            Ok(_) => debug!(file_id = %action.file_id, "Updated file"),
            Err(e) => warn!(file_id = %action.file_id, error = %e, "Failed to update file"),
        }
        outcomes.push(ActionOutcome {
            target: ActionTarget::Update {
                file_id: action.file_id.clone(),
            },
            result,
        });
    }

    let report = ApplyReport {
        outcomes,
        folders_created,
        cache_hits: cache.hits(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        project_id = %project_id,
        created = report.created(),
        updated = report.updated(),
        failed = report.failed(),
        folders_created = report.folders_created,
        duration_ms = report.duration_ms,
        "Applied text actions"
    );
    report
}

/// Parse `text` and apply the resulting actions in one pass.
pub async fn execute_text_actions(
    store: &dyn FileStore,
    project_id: &ProjectId,
    text: &str,
) -> ApplyReport {
    let actions = parse_actions(text);
    debug!(
        creates = actions.creates.len(),
        updates = actions.updates.len(),
        "Parsed text actions"
    );
    apply_actions(store, project_id, &actions).await
}

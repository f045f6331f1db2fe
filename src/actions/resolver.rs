//! Path resolution onto folder nodes.
//!
//! A logical path such as `src/components/button.tsx` is split into folder
//! segments (`src`, `components`) and a leaf (`button.tsx`). The resolver walks
//! the folder segments from the project root, reusing existing folders and
//! creating missing ones, and returns the folder the leaf belongs in.
//!
//! Resolutions are memoized per apply pass in a [`ResolutionCache`], so a run of
//! create actions sharing a prefix issues at most one lookup (and at most one
//! create) per distinct `(parent, segment)` pair.

use crate::error::ActionError;
use crate::store::FileStore;
use crate::types::{NodeId, ProjectId};
use std::collections::HashMap;
use tracing::debug;

/// Split a path into its folder segments and its leaf segment.
///
/// Empty segments produced by leading, trailing or repeated `/` are dropped
/// from the folder list. The leaf is the text after the last `/`, returned as-is
/// (it may be empty or blank; callers decide whether that is valid).
pub fn split_leaf(path: &str) -> (Vec<&str>, &str) {
    match path.rsplit_once('/') {
        Some((dirs, leaf)) => (
            dirs.split('/').filter(|segment| !segment.is_empty()).collect(),
            leaf,
        ),
        None => (Vec::new(), path),
    }
}

/// Pass-scoped memo: (parent or root, segment name) -> folder id
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: HashMap<(Option<NodeId>, String), NodeId>,
    hits: usize,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, parent_id: Option<&NodeId>, name: &str) -> Option<NodeId> {
        let found = self
            .entries
            .get(&(parent_id.cloned(), name.to_string()))
            .cloned();
        if found.is_some() {
            self.hits += 1;
        }
        found
    }

    pub fn insert(&mut self, parent_id: Option<&NodeId>, name: &str, folder_id: NodeId) {
        self.entries
            .insert((parent_id.cloned(), name.to_string()), folder_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lookups answered without a store round-trip
    pub fn hits(&self) -> usize {
        self.hits
    }
}

/// Resolves paths for one project during one apply pass.
pub struct PathResolver<'a> {
    store: &'a dyn FileStore,
    project_id: &'a ProjectId,
    cache: &'a mut ResolutionCache,
    folders_created: usize,
}

impl<'a> PathResolver<'a> {
    pub fn new(
        store: &'a dyn FileStore,
        project_id: &'a ProjectId,
        cache: &'a mut ResolutionCache,
    ) -> Self {
        Self {
            store,
            project_id,
            cache,
            folders_created: 0,
        }
    }

    /// Folders created by this resolver so far
    pub fn folders_created(&self) -> usize {
        self.folders_created
    }

    /// Return the folder the leaf of `path` should be created under.
    ///
    /// `None` means the project root; a path without folder segments issues no
    /// store calls.
    pub async fn resolve_parent(&mut self, path: &str) -> Result<Option<NodeId>, ActionError> {
        let (folders, _leaf) = split_leaf(path);
        self.resolve_segments(&folders).await
    }

    /// Walk `segments` from the root, creating folders that do not exist yet.
    pub async fn resolve_segments(
        &mut self,
        segments: &[&str],
    ) -> Result<Option<NodeId>, ActionError> {
        let mut current: Option<NodeId> = None;

        for segment in segments {
            if let Some(cached) = self.cache.get(current.as_ref(), segment) {
                current = Some(cached);
                continue;
            }

            let existing = self
                .store
                .find_folder(self.project_id, current.as_ref(), segment)
                .await
                .map_err(|source| ActionError::Resolution {
                    segment: segment.to_string(),
                    source,
                })?;

            let folder_id = match existing {
                Some(folder) => folder.node_id,
                None => {
                    let created = self
                        .store
                        .create_folder(self.project_id, current.as_ref(), segment)
                        .await
                        .map_err(|source| ActionError::Resolution {
                            segment: segment.to_string(),
                            source,
                        })?;
                    self.folders_created += 1;
                    debug!(
                        project_id = %self.project_id,
                        folder = %segment,
                        node_id = %created,
                        "Created folder"
                    );
                    created
                }
            };

            self.cache.insert(current.as_ref(), segment, folder_id.clone());
            current = Some(folder_id);
        }

        Ok(current)
    }
}

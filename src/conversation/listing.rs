//! Project file listing, as handed to the assistant.
//!
//! Items with `parentId: null` sit at the project root; items sharing a
//! `parentId` live in the same folder.

use crate::error::StoreError;
use crate::store::{FileStore, NodeKind, NodeRecord};
use crate::types::{NodeId, ProjectId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListing {
    pub id: NodeId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub parent_id: Option<NodeId>,
}

impl From<NodeRecord> for FileListing {
    fn from(record: NodeRecord) -> Self {
        Self {
            id: record.node_id,
            name: record.name,
            kind: record.kind,
            parent_id: record.parent_id,
        }
    }
}

/// Folders before files, then by name ignoring case (exact name breaks ties).
fn listing_order(a: &FileListing, b: &FileListing) -> Ordering {
    let rank = |kind: NodeKind| match kind {
        NodeKind::Folder => 0,
        NodeKind::File => 1,
    };
    rank(a.kind)
        .cmp(&rank(b.kind))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
}

pub async fn list_files(
    store: &dyn FileStore,
    project_id: &ProjectId,
) -> Result<Vec<FileListing>, StoreError> {
    let mut listing: Vec<FileListing> = store
        .list_nodes(project_id)
        .await?
        .into_iter()
        .map(FileListing::from)
        .collect();
    listing.sort_by(listing_order);
    Ok(listing)
}

/// JSON listing for the assistant; failures are rendered as text, not raised.
pub async fn list_files_tool(store: &dyn FileStore, project_id: &ProjectId) -> String {
    let result = list_files(store, project_id)
        .await
        .map_err(|e| e.to_string())
        .and_then(|listing| serde_json::to_string(&listing).map_err(|e| e.to_string()));
    match result {
        Ok(json) => json,
        Err(e) => format!("Error listing files: {}", e),
    }
}

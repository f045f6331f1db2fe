use super::support::FlakyStore;
use polaris::actions::{apply_actions, execute_text_actions, parse_actions, ActionTarget};
use polaris::conversation::{list_files, list_files_tool};
use polaris::error::ActionError;
use polaris::store::{FileStore, NodeKind, SledDocumentStore};
use polaris::types::{NodeId, ProjectId};
use tempfile::TempDir;

#[tokio::test]
async fn failed_create_does_not_block_later_creates() {
    let store = FlakyStore::failing_file("broken.rs");
    let project = ProjectId::from("p1");
    let text = r#"
<create_file path="src/broken.rs">fn main() {</create_file>
<create_file path="src/lib.rs">pub fn ok() {}</create_file>
"#;

    let report = execute_text_actions(&store, &project, text).await;

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.created(), 1);
    assert_eq!(report.folders_created, 1);
    assert!(matches!(
        report.outcomes[0].result,
        Err(ActionError::Mutation(_))
    ));

    let nodes = store.inner.nodes();
    let src = nodes.iter().find(|n| n.name == "src").unwrap();
    let lib = nodes.iter().find(|n| n.name == "lib.rs").unwrap();
    assert_eq!(lib.parent_id.as_ref(), Some(&src.node_id));
    assert_eq!(lib.content.as_deref(), Some("pub fn ok() {}"));
    assert!(nodes.iter().all(|n| n.name != "broken.rs"));
}

#[tokio::test]
async fn failed_folder_resolution_is_isolated_and_retried() {
    let store = FlakyStore::failing_folder("bad");
    let project = ProjectId::from("p1");
    let text = r#"
<create_file path="a/bad/x.txt">x</create_file>
<create_file path="a/ok.txt">ok</create_file>
<create_file path="a/bad/y.txt">y</create_file>
"#;

    let report = execute_text_actions(&store, &project, text).await;

    assert_eq!(report.outcomes.len(), 3);
    for index in [0, 2] {
        match &report.outcomes[index].result {
            Err(ActionError::Resolution { segment, .. }) => assert_eq!(segment, "bad"),
            other => panic!("expected resolution failure, got {:?}", other),
        }
    }
    assert!(report.outcomes[1].is_success());
    assert_eq!(report.created(), 1);
    assert_eq!(report.folders_created, 1);
    // "a" is served from the cache; "bad" was never cached, so it is looked up again.
    assert_eq!(report.cache_hits, 2);
    assert_eq!(store.folder_failures(), 2);

    let nodes = store.inner.nodes();
    let a = nodes.iter().find(|n| n.name == "a").unwrap();
    let ok = nodes.iter().find(|n| n.name == "ok.txt").unwrap();
    assert_eq!(ok.parent_id.as_ref(), Some(&a.node_id));
    assert!(nodes.iter().all(|n| n.name != "bad" && n.name != "x.txt"));
}

#[tokio::test]
async fn unknown_update_target_is_reported_and_pass_continues() {
    let store = FlakyStore::failing_file("never");
    let project = ProjectId::from("p1");
    let existing = store
        .create_file(&project, None, "notes.md", "old")
        .await
        .unwrap();

    let text = format!(
        "<update_file id=\"missing\">x</update_file><update_file id=\"{}\">new</update_file>",
        existing
    );
    let report = execute_text_actions(&store, &project, &text).await;

    assert_eq!(report.failed(), 1);
    assert_eq!(report.updated(), 1);
    let (target, _) = report.failures().next().unwrap();
    assert_eq!(
        target,
        &ActionTarget::Update {
            file_id: NodeId::from("missing")
        }
    );
    assert_eq!(store.inner.node(&existing).unwrap().content.as_deref(), Some("new"));
}

#[tokio::test]
async fn sled_store_apply_then_list() {
    let temp_dir = TempDir::new().unwrap();
    let store = SledDocumentStore::open(temp_dir.path()).unwrap();
    let project = ProjectId::from("p1");

    let parsed = parse_actions(
        r#"<create_file path="web/index.html"><h1>hi</h1></create_file>
<create_file path="web/assets/app.js">run()</create_file>
<create_file path="README.md"># Site</create_file>"#,
    );
    let report = apply_actions(&store, &project, &parsed).await;
    assert!(report.is_clean());
    assert_eq!(report.folders_created, 2);

    // A second pass reuses the folders already in the store.
    let again = apply_actions(
        &store,
        &project,
        &parse_actions(r#"<create_file path="web/about.html">about</create_file>"#),
    )
    .await;
    assert!(again.is_clean());
    assert_eq!(again.folders_created, 0);

    let listing = list_files(&store, &project).await.unwrap();
    let names: Vec<&str> = listing.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["assets", "web", "about.html", "app.js", "index.html", "README.md"]
    );
    assert_eq!(listing[0].kind, NodeKind::Folder);

    let json: serde_json::Value =
        serde_json::from_str(&list_files_tool(&store, &project).await).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 6);
    assert_eq!(json[1]["type"], "folder");
    assert!(json[1]["parentId"].is_null());
}

#[tokio::test]
async fn projects_do_not_share_folders() {
    let temp_dir = TempDir::new().unwrap();
    let store = SledDocumentStore::open(temp_dir.path()).unwrap();
    let text = r#"<create_file path="docs/a.md">a</create_file>"#;

    let first = execute_text_actions(&store, &ProjectId::from("p1"), text).await;
    let second = execute_text_actions(&store, &ProjectId::from("p2"), text).await;

    assert_eq!(first.folders_created, 1);
    assert_eq!(second.folders_created, 1);
    assert_eq!(list_files(&store, &ProjectId::from("p2")).await.unwrap().len(), 2);
}

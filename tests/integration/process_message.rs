use super::support::ScriptedGenerator;
use polaris::conversation::{
    CancelSignal, MessageEvent, MessageProcessor, WorkflowSettings, EMPTY_RESPONSE_FALLBACK,
    FAILURE_MESSAGE,
};
use polaris::error::{ProviderError, WorkflowError};
use polaris::store::{MemoryDocumentStore, MessageRole, MessageStatus, DEFAULT_CONVERSATION_TITLE};
use polaris::types::{ConversationId, ProjectId};
use std::sync::Arc;

fn settings() -> WorkflowSettings {
    WorkflowSettings {
        internal_key: Some("test-key".to_string()),
        db_sync_delay_ms: 0,
        history_limit: 10,
    }
}

/// Seed a conversation with a user message and a pending assistant message.
fn seed(store: &MemoryDocumentStore, title: &str, text: &str) -> MessageEvent {
    let project_id = ProjectId::from("p1");
    let conversation_id = store.create_conversation(&project_id, title);
    store.add_message(
        &conversation_id,
        MessageRole::User,
        text,
        MessageStatus::Completed,
    );
    let message_id = store.add_message(
        &conversation_id,
        MessageRole::Assistant,
        "",
        MessageStatus::Processing,
    );
    MessageEvent {
        message_id,
        conversation_id,
        project_id,
        message: text.to_string(),
    }
}

#[tokio::test]
async fn full_run_titles_applies_and_stores_response() {
    let store = Arc::new(MemoryDocumentStore::new());
    let event = seed(&store, DEFAULT_CONVERSATION_TITLE, "add a readme");
    let response = "Added it.\n<create_file path=\"docs/README.md\"># Project</create_file>";
    let generator = Arc::new(ScriptedGenerator::replying(&["  Project readme setup \n", response]));
    let processor = MessageProcessor::new(Arc::clone(&store), generator.clone(), settings());

    let outcome = processor.handle(&event, &CancelSignal::new()).await.unwrap();

    assert_eq!(outcome.title.as_deref(), Some("Project readme setup"));
    assert_eq!(outcome.response, response);
    assert!(outcome.report.is_clean());
    assert_eq!(outcome.report.created(), 1);

    let conversation = store.conversation(&event.conversation_id).unwrap();
    assert_eq!(conversation.title, "Project readme setup");

    let message = store.message(&event.message_id).unwrap();
    assert_eq!(message.content, response);
    assert_eq!(message.status, MessageStatus::Completed);

    let nodes = store.nodes();
    let docs = nodes.iter().find(|n| n.name == "docs").unwrap();
    let readme = nodes.iter().find(|n| n.name == "README.md").unwrap();
    assert!(docs.is_folder());
    assert_eq!(readme.parent_id.as_ref(), Some(&docs.node_id));

    // Title prompt first, then the agent prompt carrying the earlier user turn.
    let calls = generator.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].1, "add a readme");
    assert!(calls[1].0.contains("USER: add a readme"));
    assert!(calls[1].0.contains("## Current Request:"));
}

#[tokio::test]
async fn titled_conversation_skips_title_generation() {
    let store = Arc::new(MemoryDocumentStore::new());
    let event = seed(&store, "Existing title", "hello");
    let generator = Arc::new(ScriptedGenerator::replying(&["Hi there"]));
    let processor = MessageProcessor::new(Arc::clone(&store), generator.clone(), settings());

    let outcome = processor.run(&event, &CancelSignal::new()).await.unwrap();

    assert_eq!(outcome.title, None);
    assert_eq!(generator.calls().len(), 1);
    assert_eq!(
        store.conversation(&event.conversation_id).unwrap().title,
        "Existing title"
    );
}

#[tokio::test]
async fn empty_response_stores_fallback() {
    let store = Arc::new(MemoryDocumentStore::new());
    let event = seed(&store, "Titled", "do nothing");
    let generator = Arc::new(ScriptedGenerator::replying(&[""]));
    let processor = MessageProcessor::new(Arc::clone(&store), generator, settings());

    processor.handle(&event, &CancelSignal::new()).await.unwrap();

    let message = store.message(&event.message_id).unwrap();
    assert_eq!(message.content, EMPTY_RESPONSE_FALLBACK);
    assert_eq!(message.status, MessageStatus::Completed);
}

#[tokio::test]
async fn missing_internal_key_fails_without_apology() {
    let store = Arc::new(MemoryDocumentStore::new());
    let event = seed(&store, "Titled", "hello");
    let generator = Arc::new(ScriptedGenerator::replying(&["unused"]));
    let processor = MessageProcessor::new(
        Arc::clone(&store),
        generator.clone(),
        WorkflowSettings {
            internal_key: None,
            ..settings()
        },
    );

    let err = processor
        .handle(&event, &CancelSignal::new())
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::Configuration(_)));
    assert!(!err.is_retriable());
    assert!(generator.calls().is_empty());
    let message = store.message(&event.message_id).unwrap();
    assert_eq!(message.content, "");
    assert_eq!(message.status, MessageStatus::Processing);
}

#[tokio::test]
async fn missing_conversation_writes_apology() {
    let store = Arc::new(MemoryDocumentStore::new());
    let conversation_id = ConversationId::from("gone");
    let message_id = store.add_message(
        &conversation_id,
        MessageRole::Assistant,
        "",
        MessageStatus::Processing,
    );
    let event = MessageEvent {
        message_id: message_id.clone(),
        conversation_id,
        project_id: ProjectId::from("p1"),
        message: "hello".to_string(),
    };
    let processor = MessageProcessor::new(
        Arc::clone(&store),
        Arc::new(ScriptedGenerator::replying(&[])),
        settings(),
    );

    let err = processor
        .handle(&event, &CancelSignal::new())
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::ConversationNotFound(_)));
    assert!(!err.is_retriable());
    assert_eq!(store.message(&message_id).unwrap().content, FAILURE_MESSAGE);
}

#[tokio::test]
async fn provider_failure_is_retriable_and_writes_apology() {
    let store = Arc::new(MemoryDocumentStore::new());
    let event = seed(&store, "Titled", "hello");
    let generator = Arc::new(ScriptedGenerator::new(vec![Err(ProviderError::Status {
        status: 503,
        body: "busy".to_string(),
    })]));
    let processor = MessageProcessor::new(Arc::clone(&store), generator, settings());

    let err = processor
        .handle(&event, &CancelSignal::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Provider {
            step: "generate-response",
            ..
        }
    ));
    assert!(err.is_retriable());
    assert_eq!(store.message(&event.message_id).unwrap().content, FAILURE_MESSAGE);
}

#[tokio::test]
async fn cancellation_stops_before_next_step_without_apology() {
    let store = Arc::new(MemoryDocumentStore::new());
    let event = seed(&store, DEFAULT_CONVERSATION_TITLE, "hello");
    let signal = CancelSignal::new();
    let generator = Arc::new(
        ScriptedGenerator::replying(&["Greeting", "<create_file path=\"a.txt\">a</create_file>"])
            .cancelling(signal.clone()),
    );
    let processor = MessageProcessor::new(Arc::clone(&store), generator.clone(), settings());

    let err = processor.handle(&event, &signal).await.unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Cancelled {
            step: "generate-response"
        }
    ));
    assert_eq!(generator.calls().len(), 1);
    assert!(store.nodes().is_empty());
    let message = store.message(&event.message_id).unwrap();
    assert_eq!(message.content, "");
    assert_eq!(message.status, MessageStatus::Processing);
}

#[tokio::test]
async fn processed_message_is_excluded_from_history() {
    let store = Arc::new(MemoryDocumentStore::new());
    let event = seed(&store, "Titled", "second question");
    store.add_message(
        &event.conversation_id,
        MessageRole::User,
        "unrelated later note",
        MessageStatus::Completed,
    );
    let generator = Arc::new(ScriptedGenerator::replying(&["ok"]));
    let processor = MessageProcessor::new(Arc::clone(&store), generator.clone(), settings());

    processor.run(&event, &CancelSignal::new()).await.unwrap();

    let system = &generator.calls()[0].0;
    assert!(system.contains("USER: second question"));
    assert!(system.contains("USER: unrelated later note"));
    assert!(!system.contains("ASSISTANT:"));
}

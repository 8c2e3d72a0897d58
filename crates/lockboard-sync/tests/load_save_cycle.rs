//! End-to-end load/save cycles against the in-memory blob store.

use std::sync::Arc;

use secrecy::SecretString;

use lockboard_core::{BoardDocument, TaskPriority, TaskStatus};
use lockboard_crypto::{is_envelope, seal};
use lockboard_store::{BlobStore, MemoryStore};
use lockboard_sync::document::{add_task, NewTask};
use lockboard_sync::{SyncError, Synchronizer};

fn pw(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}

fn sync_over(store: &Arc<MemoryStore>) -> Synchronizer {
    Synchronizer::new(Arc::clone(store) as Arc<dyn BlobStore>)
}

#[tokio::test]
async fn first_load_initializes_encrypted_empty_document() {
    let store = Arc::new(MemoryStore::new());
    let sync = sync_over(&store);

    let outcome = sync.load(&pw("pw1")).await.unwrap();

    assert!(outcome.document.projects.is_empty());
    assert!(outcome.document.tasks.is_empty());
    assert!(!outcome.migrated);
    assert!(outcome.revision.is_some());

    // Exactly one write, and what landed on the remote is an envelope.
    assert_eq!(store.write_count(), 1);
    let remote = store.current().unwrap();
    assert!(is_envelope(&remote));

    // ...that opens under the login password.
    let reread = sync.load(&pw("pw1")).await.unwrap();
    assert_eq!(reread.document, BoardDocument::default());
    assert_eq!(store.write_count(), 1, "re-load must not write");
}

#[tokio::test]
async fn wrong_password_fails_without_writing() {
    let store = Arc::new(MemoryStore::new());
    let sync = sync_over(&store);

    sync.load(&pw("pw1")).await.unwrap();
    let writes_before = store.write_count();

    let err = sync.load(&pw("pw2")).await.unwrap_err();
    assert!(matches!(err, SyncError::WrongPassword));
    assert_eq!(store.write_count(), writes_before, "zero writes on failure");
}

#[tokio::test]
async fn mutate_save_reload_roundtrip() {
    let store = Arc::new(MemoryStore::new());
    let sync = sync_over(&store);

    let loaded = sync.load(&pw("pw1")).await.unwrap();
    let doc = add_task(
        &loaded.document,
        NewTask {
            project_id: "p1".into(),
            title: "Buy milk".into(),
            description: None,
            status: TaskStatus::Backlog,
            priority: TaskPriority::Low,
        },
    );

    sync.save(&doc, &pw("pw1"), loaded.revision.as_deref())
        .await
        .unwrap();

    let reloaded = sync.load(&pw("pw1")).await.unwrap();
    assert_eq!(reloaded.document.tasks.len(), 1);
    let task = &reloaded.document.tasks[0];
    assert_eq!(task.title, "Buy milk");
    assert_eq!(task.status, TaskStatus::Backlog);
    assert_eq!(task.priority, TaskPriority::Low);
    assert_eq!(task.order, 0);
}

#[tokio::test]
async fn save_returns_fresh_revision_for_next_save() {
    let store = Arc::new(MemoryStore::new());
    let sync = sync_over(&store);

    let loaded = sync.load(&pw("pw")).await.unwrap();
    let mut doc = loaded.document;
    let mut revision = loaded.revision;

    // Chain three saves, each using the tag returned by the previous one.
    for title in ["a", "b", "c"] {
        doc = add_task(
            &doc,
            NewTask {
                project_id: "p".into(),
                title: title.into(),
                description: None,
                status: TaskStatus::Backlog,
                priority: TaskPriority::Medium,
            },
        );
        revision = Some(sync.save(&doc, &pw("pw"), revision.as_deref()).await.unwrap());
    }

    let reloaded = sync.load(&pw("pw")).await.unwrap();
    assert_eq!(reloaded.document.tasks.len(), 3);
}

#[tokio::test]
async fn stale_revision_save_is_a_conflict() {
    let store = Arc::new(MemoryStore::new());
    let sync = sync_over(&store);

    let loaded = sync.load(&pw("pw")).await.unwrap();

    // A concurrent session writes behind our back.
    store.clobber(seal("{\"projects\":[],\"tasks\":[]}", &pw("pw")).unwrap());

    let err = sync
        .save(&loaded.document, &pw("pw"), loaded.revision.as_deref())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Conflict));
}

#[tokio::test]
async fn legacy_plaintext_document_is_migrated_on_read() {
    let legacy = r#"{"projects":[{"id":"p1","name":"Web","createdAt":"2024-01-01T00:00:00Z"}],"tasks":[]}"#;
    let store = Arc::new(MemoryStore::with_content(legacy));
    let sync = sync_over(&store);

    let outcome = sync.load(&pw("pw1")).await.unwrap();
    assert!(outcome.migrated);
    assert_eq!(outcome.document.projects[0].name, "Web");

    // The remote now holds an envelope, openable only with the password.
    let remote = store.current().unwrap();
    assert!(is_envelope(&remote));
    assert_eq!(store.write_count(), 1);

    let reloaded = sync.load(&pw("pw1")).await.unwrap();
    assert!(!reloaded.migrated);
    assert_eq!(reloaded.document.projects[0].name, "Web");
}

#[tokio::test]
async fn garbage_under_valid_envelope_is_corrupted_not_wrong_password() {
    let store = Arc::new(MemoryStore::with_content(
        seal("this is not json", &pw("pw")).unwrap(),
    ));
    let sync = sync_over(&store);

    let err = sync.load(&pw("pw")).await.unwrap_err();
    assert!(matches!(err, SyncError::Corrupted(_)));
}

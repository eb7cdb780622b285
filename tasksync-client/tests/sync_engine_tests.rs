mod common;

use common::{FlakyStore, ScriptedRemote};
use std::sync::{Arc, Mutex};
use tasksync_client::events::{EventDispatcher, SyncEvent};
use tasksync_client::handlers::MutationHandlers;
use tasksync_client::storage::TASKS_KEY;
use tasksync_client::{ClientDatabase, LocalStore, MemoryTaskStore, SyncEngine, TaskStateStore};
use tasksync_core::{SyncError, SyncStatus};

struct Harness {
    store: Arc<MemoryTaskStore>,
    remote: Arc<ScriptedRemote>,
    state: TaskStateStore,
    handlers: MutationHandlers,
    engine: SyncEngine,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryTaskStore::new());
    let remote = Arc::new(ScriptedRemote::new());
    let state = TaskStateStore::new();
    let events = Arc::new(EventDispatcher::new());

    Harness {
        handlers: MutationHandlers::new(store.clone(), state.clone(), events.clone()),
        engine: SyncEngine::new(store.clone(), remote.clone(), state.clone(), events),
        store,
        remote,
        state,
    }
}

#[tokio::test]
async fn test_buy_milk_is_remapped_to_server_id() {
    let h = harness();
    let local = h.handlers.add("Buy milk", "").await.unwrap();

    let report = h.engine.synchronize().await.unwrap();

    assert_eq!(report.synced, vec!["srv1".to_string()]);
    assert_eq!(report.remapped.len(), 1);
    assert_eq!(report.remapped[0].old_id, local.id);

    let persisted = h.store.read().await.unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].id, "srv1");
    assert_eq!(persisted[0].title, "Buy milk");
    assert!(!persisted[0].completed);
    assert_eq!(persisted[0].sync_status, SyncStatus::Synced);
    assert_eq!(h.state.get_all(), persisted);
}

#[tokio::test]
async fn test_second_pass_makes_no_calls() {
    let h = harness();
    h.handlers.add("a", "").await.unwrap();
    h.handlers.add("b", "").await.unwrap();

    h.engine.synchronize().await.unwrap();
    let writes = h.store.write_count();
    let after_first = h.store.read().await.unwrap();

    let report = h.engine.synchronize().await.unwrap();

    assert!(report.is_noop());
    assert_eq!(h.remote.create_calls(), 2);
    assert_eq!(h.store.write_count(), writes);
    assert_eq!(h.store.read().await.unwrap(), after_first);
}

#[tokio::test]
async fn test_failure_of_one_task_does_not_block_others() {
    let h = harness();
    let a = h.handlers.add("a", "").await.unwrap();
    let b = h.handlers.add("b", "").await.unwrap();
    let c = h.handlers.add("c", "").await.unwrap();
    h.remote.fail_title("b");

    let report = h.engine.synchronize().await.unwrap();

    assert_eq!(report.synced_count(), 2);
    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.failed[0].task_id, b.id);

    let persisted = h.store.read().await.unwrap();
    assert_eq!(persisted[0].id, "srv1");
    assert_eq!(persisted[0].sync_status, SyncStatus::Synced);
    assert_eq!(persisted[1], b);
    assert_eq!(persisted[2].id, "srv2");
    assert_eq!(persisted[2].sync_status, SyncStatus::Synced);
    assert_ne!(persisted[0].id, a.id);
    assert_ne!(persisted[2].id, c.id);
}

#[tokio::test]
async fn test_failed_task_is_retried_on_next_pass() {
    let h = harness();
    h.handlers.add("flaky", "").await.unwrap();
    h.remote.fail_title("flaky");

    let first = h.engine.synchronize().await.unwrap();
    assert_eq!(first.failed_count(), 1);
    assert_eq!(h.state.pending_count(), 1);

    h.remote.recover_title("flaky");
    let second = h.engine.synchronize().await.unwrap();

    assert_eq!(second.synced, vec!["srv1".to_string()]);
    assert_eq!(h.state.pending_count(), 0);
    assert_eq!(h.state.last_sync_report(), Some(second));
}

#[tokio::test]
async fn test_order_is_preserved_across_remap() {
    let h = harness();
    for title in ["one", "two", "three"] {
        h.handlers.add(title, "").await.unwrap();
    }

    h.engine.synchronize().await.unwrap();

    let titles: Vec<String> = h.state.get_all().into_iter().map(|t| t.title).collect();
    assert_eq!(titles, vec!["one", "two", "three"]);
    let ids: Vec<String> = h.store.read().await.unwrap().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec!["srv1", "srv2", "srv3"]);
}

#[tokio::test]
async fn test_toggle_after_sync_updates_without_new_id() {
    let h = harness();
    h.handlers.add("Buy milk", "").await.unwrap();
    h.engine.synchronize().await.unwrap();

    let toggled = h.handlers.toggle("srv1").await.unwrap();
    assert_eq!(toggled.sync_status, SyncStatus::Pending);
    assert!(toggled.completed);

    let report = h.engine.synchronize().await.unwrap();

    assert_eq!(report.synced, vec!["srv1".to_string()]);
    assert!(report.remapped.is_empty());
    assert_eq!(h.remote.create_calls(), 1);

    let updates = h.remote.updated();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, "srv1");
    assert!(updates[0].1.completed);

    let task = h.state.find("srv1").unwrap();
    assert_eq!(task.sync_status, SyncStatus::Synced);
    assert!(task.completed);
}

#[tokio::test]
async fn test_payload_carries_user_fields() {
    let h = harness();
    let task = h.handlers.add("  Call bank  ", "before noon").await.unwrap();

    h.engine.synchronize().await.unwrap();

    let sent = h.remote.created_payloads();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "Call bank");
    assert_eq!(sent[0].description, "before noon");
    assert!(!sent[0].completed);
    assert_eq!(sent[0].updated_at, task.updated_at);
}

#[tokio::test]
async fn test_empty_title_never_reaches_remote() {
    let h = harness();

    let err = h.handlers.add("", "no title").await.unwrap_err();
    assert!(matches!(err, SyncError::InvalidTask(_)));

    let report = h.engine.synchronize().await.unwrap();
    assert!(report.is_noop());
    assert_eq!(h.remote.create_calls(), 0);
    assert!(h.store.read().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_removed_task_is_never_pushed() {
    let h = harness();
    let doomed = h.handlers.add("doomed", "").await.unwrap();
    h.handlers.add("kept", "").await.unwrap();

    h.handlers.remove(&doomed.id).await.unwrap();
    h.engine.synchronize().await.unwrap();

    let sent: Vec<String> = h
        .remote
        .created_payloads()
        .into_iter()
        .map(|p| p.title)
        .collect();
    assert_eq!(sent, vec!["kept"]);
}

#[tokio::test]
async fn test_storage_failure_fails_pass_and_keeps_state() {
    let store = Arc::new(FlakyStore::new());
    let remote = Arc::new(ScriptedRemote::new());
    let state = TaskStateStore::new();
    let events = Arc::new(EventDispatcher::new());
    let handlers = MutationHandlers::new(store.clone(), state.clone(), events.clone());
    let engine = SyncEngine::new(store.clone(), remote.clone(), state.clone(), events);

    let local = handlers.add("Buy milk", "").await.unwrap();
    store.fail_writes(true);

    let err = engine.synchronize().await.unwrap_err();
    assert!(matches!(err, SyncError::DatabaseError(_)));

    // Neither the store nor the published list saw the remap
    assert_eq!(store.read().await.unwrap(), vec![local.clone()]);
    assert_eq!(state.get_all(), vec![local]);
    assert!(state.last_sync_report().is_none());
}

#[tokio::test]
async fn test_events_follow_pass() {
    let store = Arc::new(MemoryTaskStore::new());
    let remote = Arc::new(ScriptedRemote::new());
    let state = TaskStateStore::new();
    let events = Arc::new(EventDispatcher::new());
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    events
        .register_callback(move |event| sink.lock().unwrap().push(event))
        .unwrap();

    let handlers = MutationHandlers::new(store.clone(), state.clone(), events.clone());
    let engine = SyncEngine::new(store, remote.clone(), state, events);

    let ok = handlers.add("ok", "").await.unwrap();
    let bad = handlers.add("bad", "").await.unwrap();
    remote.fail_title("bad");
    engine.synchronize().await.unwrap();

    let received = received.lock().unwrap();
    assert_eq!(
        received[2..],
        [
            SyncEvent::SyncStarted { pending: 2 },
            SyncEvent::TaskRemapped {
                old_id: ok.id.clone(),
                new_id: "srv1".into()
            },
            SyncEvent::SyncError {
                task_id: bad.id.clone(),
                message: "Network error: connection reset".into()
            },
            SyncEvent::SyncCompleted {
                synced: 1,
                failed: 1
            },
        ]
    );
}

#[tokio::test]
async fn test_legacy_synced_record_is_updated_in_place() {
    let db = Arc::new(ClientDatabase::open("sqlite::memory:").await.unwrap());
    db.put_value(
        TASKS_KEY,
        r#"[{"_id":"mongo123","title":"Old","syncStatus":"synced","updatedAt":1}]"#,
    )
    .await
    .unwrap();

    let remote = Arc::new(ScriptedRemote::new());
    let state = TaskStateStore::new();
    let events = Arc::new(EventDispatcher::new());
    let handlers = MutationHandlers::new(db.clone(), state.clone(), events.clone());
    let engine = SyncEngine::new(db.clone(), remote.clone(), state.clone(), events);

    handlers.toggle("mongo123").await.unwrap();
    let report = engine.synchronize().await.unwrap();

    assert_eq!(report.synced, vec!["mongo123".to_string()]);
    assert!(report.remapped.is_empty());
    assert_eq!(remote.create_calls(), 0);
    assert_eq!(remote.updated().len(), 1);
    assert_eq!(remote.updated()[0].0, "mongo123");

    let persisted = db.read().await.unwrap();
    assert_eq!(persisted[0].id, "mongo123");
    assert!(persisted[0].completed);
    assert_eq!(persisted[0].sync_status, SyncStatus::Synced);
}

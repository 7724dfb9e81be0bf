//! End-to-end synchronization over the file-backed store: sign-in drives
//! the subscriptions, writes surface through snapshots, and sign-out
//! clears everything.

use tempfile::TempDir;

use td::actions::{self, Registration, TaskDraft};
use td::model::Priority;
use td::session::{Route, SessionSynchronizer};
use td::store::LocalStore;

fn open_store() -> (TempDir, LocalStore) {
    let dir = TempDir::new().unwrap();
    let store = LocalStore::open(dir.path()).unwrap();
    (dir, store)
}

fn registration(email: &str) -> Registration {
    Registration {
        first_name: "Ana".to_string(),
        last_name: "Lima".to_string(),
        email: email.to_string(),
        password: "hunter2".to_string(),
        confirm_password: "hunter2".to_string(),
        age: None,
        address: None,
    }
}

fn draft(text: &str, priority: Option<Priority>) -> TaskDraft {
    TaskDraft {
        text: text.to_string(),
        priority,
        ..TaskDraft::default()
    }
}

#[test]
fn toggling_moves_a_task_between_partitions() {
    let (_dir, store) = open_store();
    actions::register(&store, registration("ana@example.com")).unwrap();
    let identity = actions::sign_in(&store, "ana@example.com", "hunter2").unwrap();

    let mut sync = SessionSynchronizer::new(store.clone());
    sync.pump();
    assert_eq!(sync.route(), Route::Tabs);
    assert!(!sync.is_loading());

    actions::add_task(&store, &identity, draft("oldest", None)).unwrap();
    actions::add_task(&store, &identity, draft("middle", None)).unwrap();
    actions::add_task(&store, &identity, draft("newest", None)).unwrap();
    sync.pump();

    let view = sync.view(None);
    assert_eq!(
        view.active.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
        ["newest", "middle", "oldest"]
    );
    assert!(view.completed.is_empty());

    let middle = sync.tasks()[1].clone();
    actions::toggle_status(&store, &middle).unwrap();
    sync.pump();

    let view = sync.view(None);
    assert_eq!(
        view.active.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
        ["newest", "oldest"]
    );
    assert_eq!(view.completed[0].text, "middle");
    assert_eq!(view.total(), 3);
    assert_eq!(view.completion_percent(), Some(33));

    actions::toggle_status(&store, &view.completed[0]).unwrap();
    sync.pump();
    let view = sync.view(None);
    assert_eq!(view.active.len(), 3);
    assert!(view.completed.is_empty());
}

#[test]
fn priority_filter_applies_to_both_partitions() {
    let (_dir, store) = open_store();
    actions::register(&store, registration("ana@example.com")).unwrap();
    let identity = actions::sign_in(&store, "ana@example.com", "hunter2").unwrap();

    let mut sync = SessionSynchronizer::new(store.clone());
    sync.pump();

    actions::add_task(&store, &identity, draft("urgent open", Some(Priority::Urgent))).unwrap();
    actions::add_task(&store, &identity, draft("low open", Some(Priority::Low))).unwrap();
    actions::add_task(&store, &identity, draft("no priority", None)).unwrap();
    sync.pump();

    let done = sync.tasks()[1].clone();
    actions::toggle_status(&store, &done).unwrap();
    sync.pump();

    let urgent = sync.view(Some(Priority::Urgent));
    assert_eq!(urgent.active.len(), 1);
    assert!(urgent.completed.is_empty());

    let low = sync.view(Some(Priority::Low));
    assert!(low.active.is_empty());
    assert_eq!(low.completed.len(), 1);
}

#[test]
fn sign_out_clears_the_session_and_routes_back() {
    let (_dir, store) = open_store();
    actions::register(&store, registration("ana@example.com")).unwrap();
    let identity = actions::sign_in(&store, "ana@example.com", "hunter2").unwrap();

    let mut sync = SessionSynchronizer::new(store.clone());
    sync.pump();
    actions::add_task(&store, &identity, draft("buy milk", None)).unwrap();
    sync.pump();
    assert_eq!(sync.tasks().len(), 1);
    assert!(sync.profile().is_some());

    actions::sign_out(&store).unwrap();
    sync.pump();
    assert!(sync.identity().is_none());
    assert!(sync.tasks().is_empty());
    assert!(sync.profile().is_none());
    assert_eq!(sync.route(), Route::SignIn);
}

#[test]
fn switching_users_swaps_the_synced_data() {
    let (_dir, store) = open_store();
    actions::register(&store, registration("ana@example.com")).unwrap();
    let ana = actions::sign_in(&store, "ana@example.com", "hunter2").unwrap();

    let mut sync = SessionSynchronizer::new(store.clone());
    sync.pump();
    actions::add_task(&store, &ana, draft("ana's task", None)).unwrap();
    sync.pump();
    assert_eq!(sync.tasks().len(), 1);

    let mut bob = registration("bob@example.com");
    bob.first_name = "Bob".to_string();
    actions::register(&store, bob).unwrap();
    actions::sign_in(&store, "bob@example.com", "hunter2").unwrap();
    sync.pump();

    assert_eq!(sync.identity().unwrap().email, "bob@example.com");
    assert!(sync.tasks().is_empty());
    assert_eq!(sync.profile().unwrap().first_name, "Bob");
}

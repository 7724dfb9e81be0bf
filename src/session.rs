//! Session and live-data synchronization.
//!
//! The synchronizer tracks the authenticated identity and owns the two
//! live subscriptions scoped to it: the task list (newest-created first)
//! and the profile record. Every snapshot wholesale-replaces the cached
//! list; nothing is patched incrementally. Consumers read the cached state
//! and derive views from it, they never mutate it.
//!
//! Identity transitions drive everything:
//! - identity lost: both subscriptions are cancelled, caches are cleared,
//!   loading stops, and the session routes back to sign-in. Cancellation is
//!   guaranteed before the caches clear, so a snapshot for a stale identity
//!   can never arrive afterwards.
//! - identity gained: both subscriptions are (re)opened against the new
//!   uid, and the session is loading until the first task snapshot lands.
//!   The profile snapshot does not clear the loading flag: the UI is
//!   considered ready as soon as task data exists.
//!
//! Single-threaded and event-driven: callers drain pending deliveries with
//! [`SessionSynchronizer::pump`] from their event loop.

use tracing::{debug, warn};

use crate::backend::{Backend, Identity, Subscription};
use crate::model::{Priority, Profile, Task};
use crate::projector::{self, TaskView};

/// Where the UI should be, given the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Unauthenticated entry point.
    SignIn,
    /// The authenticated tab screens.
    Tabs,
}

/// Owns the identity feed, both data subscriptions, and the cached state
/// derived from them.
pub struct SessionSynchronizer<B: Backend> {
    backend: B,
    identity_sub: Subscription<Option<Identity>>,
    task_sub: Option<Subscription<Vec<Task>>>,
    profile_sub: Option<Subscription<Vec<Profile>>>,
    identity: Option<Identity>,
    tasks: Vec<Task>,
    profiles: Vec<Profile>,
    loading: bool,
    route: Route,
}

impl<B: Backend> SessionSynchronizer<B> {
    /// Subscribe to the identity feed and start in the loading state.
    /// Call [`pump`](Self::pump) to process the initial deliveries.
    pub fn new(backend: B) -> Self {
        let identity_sub = backend.watch_identity();
        Self {
            backend,
            identity_sub,
            task_sub: None,
            profile_sub: None,
            identity: None,
            tasks: Vec::new(),
            profiles: Vec::new(),
            loading: true,
            route: Route::SignIn,
        }
    }

    /// Drain pending identity changes and snapshots, updating cached state.
    pub fn pump(&mut self) {
        // Identity transitions are applied one by one; order matters.
        while let Some(change) = self.identity_sub.try_next() {
            self.apply_identity(change);
        }

        // Snapshots replace state wholesale, so only the newest matters.
        if let Some(sub) = &mut self.task_sub {
            if let Some(snapshot) = sub.latest() {
                debug!(tasks = snapshot.len(), "task snapshot applied");
                self.tasks = snapshot;
                self.loading = false;
            }
        }
        if let Some(sub) = &mut self.profile_sub {
            if let Some(snapshot) = sub.latest() {
                if snapshot.len() > 1 {
                    // Invariant violation: the store should have rejected
                    // the extra record at write time.
                    warn!(
                        count = snapshot.len(),
                        "multiple profile records for one identity; using the first"
                    );
                }
                self.profiles = snapshot;
            }
        }
    }

    fn apply_identity(&mut self, next: Option<Identity>) {
        match next {
            None => {
                // Dropping the handles cancels the subscriptions before the
                // caches clear.
                self.task_sub = None;
                self.profile_sub = None;
                self.identity = None;
                self.tasks.clear();
                self.profiles.clear();
                self.loading = false;
                self.route = Route::SignIn;
            }
            Some(identity) => {
                if self.identity.as_ref() == Some(&identity) && self.task_sub.is_some() {
                    // Re-delivery of the identity already being synced.
                    return;
                }
                self.task_sub = None;
                self.profile_sub = None;
                self.tasks.clear();
                self.profiles.clear();
                self.loading = true;
                self.task_sub = Some(self.backend.watch_tasks(&identity.uid));
                self.profile_sub = Some(self.backend.watch_profile(&identity.uid));
                self.identity = Some(identity);
                self.route = Route::Tabs;
            }
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Cached task list, newest-created first.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// True until the first task snapshot for the current identity arrives.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn route(&self) -> Route {
        self.route
    }

    /// The profile record for the current identity, or `None` while it has
    /// not arrived (or does not exist yet).
    pub fn profile(&self) -> Option<&Profile> {
        self.profiles.first()
    }

    /// Derive the partitioned task view, optionally filtered by priority.
    pub fn view(&self, filter: Option<Priority>) -> TaskView {
        projector::project(&self.tasks, filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::{self, Sender};
    use std::sync::{Arc, Mutex};

    use crate::backend::{NewProfile, NewTask, ProfilePatch, TaskPatch};
    use crate::error::Result;
    use chrono::Utc;

    /// Hand-driven backend: tests push identity changes and snapshots
    /// through the held senders.
    #[derive(Clone, Default)]
    struct ScriptedBackend {
        channels: Arc<Mutex<Channels>>,
    }

    #[derive(Default)]
    struct Channels {
        identity: Option<Sender<Option<Identity>>>,
        tasks: Option<Sender<Vec<Task>>>,
        profile: Option<Sender<Vec<Profile>>>,
        task_watches: usize,
        task_cancels: Arc<Mutex<usize>>,
    }

    impl ScriptedBackend {
        fn push_identity(&self, identity: Option<Identity>) {
            let channels = self.channels.lock().unwrap();
            channels.identity.as_ref().unwrap().send(identity).unwrap();
        }

        fn push_tasks(&self, tasks: Vec<Task>) {
            let channels = self.channels.lock().unwrap();
            channels.tasks.as_ref().unwrap().send(tasks).unwrap();
        }

        fn push_profiles(&self, profiles: Vec<Profile>) {
            let channels = self.channels.lock().unwrap();
            channels.profile.as_ref().unwrap().send(profiles).unwrap();
        }

        fn task_watches(&self) -> usize {
            self.channels.lock().unwrap().task_watches
        }

        fn task_cancels(&self) -> usize {
            *self.channels.lock().unwrap().task_cancels.lock().unwrap()
        }
    }

    impl Backend for ScriptedBackend {
        fn sign_up(&self, _: &str, _: &str) -> Result<Identity> {
            unreachable!("not exercised")
        }
        fn sign_in(&self, _: &str, _: &str) -> Result<Identity> {
            unreachable!("not exercised")
        }
        fn sign_out(&self) -> Result<()> {
            unreachable!("not exercised")
        }
        fn request_password_reset(&self, _: &str) -> Result<()> {
            unreachable!("not exercised")
        }
        fn current_identity(&self) -> Option<Identity> {
            None
        }
        fn watch_identity(&self) -> Subscription<Option<Identity>> {
            let (tx, rx) = mpsc::channel();
            self.channels.lock().unwrap().identity = Some(tx);
            Subscription::new(rx, Box::new(|| {}))
        }
        fn add_task(&self, _: NewTask) -> Result<String> {
            unreachable!("not exercised")
        }
        fn update_task(&self, _: &str, _: TaskPatch) -> Result<()> {
            unreachable!("not exercised")
        }
        fn delete_task(&self, _: &str) -> Result<()> {
            unreachable!("not exercised")
        }
        fn watch_tasks(&self, _: &str) -> Subscription<Vec<Task>> {
            let (tx, rx) = mpsc::channel();
            let mut channels = self.channels.lock().unwrap();
            channels.tasks = Some(tx);
            channels.task_watches += 1;
            let cancels = Arc::clone(&channels.task_cancels);
            Subscription::new(
                rx,
                Box::new(move || {
                    *cancels.lock().unwrap() += 1;
                }),
            )
        }
        fn add_profile(&self, _: NewProfile) -> Result<String> {
            unreachable!("not exercised")
        }
        fn update_profile(&self, _: &str, _: ProfilePatch) -> Result<()> {
            unreachable!("not exercised")
        }
        fn watch_profile(&self, _: &str) -> Subscription<Vec<Profile>> {
            let (tx, rx) = mpsc::channel();
            self.channels.lock().unwrap().profile = Some(tx);
            Subscription::new(rx, Box::new(|| {}))
        }
        fn profile_exists_for_email(&self, _: &str) -> Result<bool> {
            Ok(false)
        }
    }

    fn identity(uid: &str) -> Identity {
        Identity {
            uid: uid.to_string(),
            email: format!("{uid}@example.com"),
        }
    }

    fn task(id: &str, uid: &str) -> Task {
        Task {
            id: id.to_string(),
            uid: uid.to_string(),
            text: format!("task {id}"),
            status: true,
            created_at: Utc::now(),
            deadline: None,
            priority: None,
            reminder: None,
        }
    }

    fn profile(uid: &str, first_name: &str) -> Profile {
        Profile {
            id: format!("p-{uid}"),
            uid: uid.to_string(),
            first_name: first_name.to_string(),
            last_name: "Lima".to_string(),
            age: Some(29),
            address: None,
            email: format!("{uid}@example.com"),
        }
    }

    #[test]
    fn loading_clears_on_first_task_snapshot_not_profile() {
        let backend = ScriptedBackend::default();
        let mut sync = SessionSynchronizer::new(backend.clone());
        assert!(sync.is_loading());

        backend.push_identity(Some(identity("u1")));
        sync.pump();
        assert!(sync.is_loading());
        assert_eq!(sync.route(), Route::Tabs);

        // Profile arriving first does not make the session ready.
        backend.push_profiles(vec![profile("u1", "Ana")]);
        sync.pump();
        assert!(sync.is_loading());
        assert_eq!(sync.profile().unwrap().first_name, "Ana");

        backend.push_tasks(vec![task("1", "u1")]);
        sync.pump();
        assert!(!sync.is_loading());
        assert_eq!(sync.tasks().len(), 1);
    }

    #[test]
    fn identity_loss_cancels_clears_and_routes_to_sign_in() {
        let backend = ScriptedBackend::default();
        let mut sync = SessionSynchronizer::new(backend.clone());

        backend.push_identity(Some(identity("u1")));
        sync.pump();
        backend.push_tasks(vec![task("1", "u1")]);
        backend.push_profiles(vec![profile("u1", "Ana")]);
        sync.pump();
        assert_eq!(sync.tasks().len(), 1);
        assert!(sync.profile().is_some());

        backend.push_identity(None);
        sync.pump();
        assert!(sync.tasks().is_empty());
        assert!(sync.profile().is_none());
        assert!(!sync.is_loading());
        assert_eq!(sync.route(), Route::SignIn);
        assert_eq!(backend.task_cancels(), 1);
    }

    #[test]
    fn identity_switch_reopens_subscriptions() {
        let backend = ScriptedBackend::default();
        let mut sync = SessionSynchronizer::new(backend.clone());

        backend.push_identity(Some(identity("u1")));
        sync.pump();
        backend.push_identity(Some(identity("u2")));
        sync.pump();

        assert_eq!(backend.task_watches(), 2);
        assert_eq!(backend.task_cancels(), 1);
        assert_eq!(sync.identity().unwrap().uid, "u2");
        assert!(sync.is_loading());
    }

    #[test]
    fn redelivered_identity_keeps_existing_subscriptions() {
        let backend = ScriptedBackend::default();
        let mut sync = SessionSynchronizer::new(backend.clone());

        backend.push_identity(Some(identity("u1")));
        sync.pump();
        backend.push_identity(Some(identity("u1")));
        sync.pump();

        assert_eq!(backend.task_watches(), 1);
        assert_eq!(backend.task_cancels(), 0);
    }

    #[test]
    fn only_newest_snapshot_is_applied() {
        let backend = ScriptedBackend::default();
        let mut sync = SessionSynchronizer::new(backend.clone());

        backend.push_identity(Some(identity("u1")));
        sync.pump();
        backend.push_tasks(vec![task("1", "u1")]);
        backend.push_tasks(vec![task("2", "u1"), task("1", "u1")]);
        sync.pump();

        assert_eq!(sync.tasks().len(), 2);
        assert_eq!(sync.tasks()[0].id, "2");
    }

    #[test]
    fn profile_accessor_reports_not_available_until_a_record_exists() {
        let backend = ScriptedBackend::default();
        let mut sync = SessionSynchronizer::new(backend.clone());

        backend.push_identity(Some(identity("u1")));
        sync.pump();
        backend.push_profiles(Vec::new());
        sync.pump();
        assert!(sync.profile().is_none());

        let record = profile("u1", "Ana");
        backend.push_profiles(vec![record.clone()]);
        sync.pump();
        assert_eq!(sync.profile(), Some(&record));
    }
}

//! Backend collaborator surface.
//!
//! The application is a pure client of a managed backend that owns
//! authentication and the document store. This module pins down the slice
//! of that surface the client actually uses: auth operations, single-shot
//! document writes, and live queries that deliver a full replacement
//! snapshot on every change.
//!
//! Subscriptions are explicit, cancellable handles. Dropping one
//! unregisters it, so a consumer that replaces its handle on identity
//! change can never be called back for a stale identity.

use std::sync::mpsc;

use chrono::NaiveDate;

use crate::error::Result;
use crate::model::{Priority, Profile, Reminder, Task};

/// The authenticated user handle issued by the auth provider.
///
/// Exists only while a session is active; the client holds a transient
/// reference and never persists it into documents beyond the `uid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: String,
}

/// A cancellable live-query handle delivering full-state snapshots.
///
/// Snapshots queue in arrival order. `latest` drains the queue and keeps
/// only the newest snapshot, which is all a wholesale-replacement consumer
/// needs. Dropping the handle cancels the subscription.
pub struct Subscription<T> {
    rx: mpsc::Receiver<T>,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl<T> Subscription<T> {
    pub fn new(rx: mpsc::Receiver<T>, cancel: Box<dyn FnOnce() + Send>) -> Self {
        Self {
            rx,
            cancel: Some(cancel),
        }
    }

    /// Oldest pending delivery, if any.
    pub fn try_next(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Drain pending deliveries and return only the newest.
    pub fn latest(&mut self) -> Option<T> {
        let mut latest = None;
        while let Ok(value) = self.rx.try_recv() {
            latest = Some(value);
        }
        latest
    }

    /// Cancel explicitly. Equivalent to dropping the handle.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Fields for a new task document. The backend assigns `id`, stamps
/// `createdAt`, and creates the task open (`status: true`).
#[derive(Debug, Clone)]
pub struct NewTask {
    pub uid: String,
    pub text: String,
    pub deadline: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub reminder: Option<Reminder>,
}

/// Partial update for a task document. `None` leaves a field untouched;
/// for optional fields, `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub status: Option<bool>,
    pub deadline: Option<Option<NaiveDate>>,
    pub priority: Option<Option<Priority>>,
    pub reminder: Option<Option<Reminder>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.status.is_none()
            && self.deadline.is_none()
            && self.priority.is_none()
            && self.reminder.is_none()
    }
}

/// Fields for the profile document created alongside a new identity.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub uid: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: Option<u32>,
    pub address: Option<String>,
}

/// Partial update for a profile document.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<Option<u32>>,
    pub address: Option<Option<String>>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.age.is_none()
            && self.address.is_none()
    }
}

/// The backend surface the client depends on.
///
/// Mutations are fire-and-forget single writes: they never touch cached
/// state, and their effect becomes visible through the next snapshot the
/// matching watch delivers. Ownership is enforced by the backend: updating
/// or deleting a document owned by another identity is a permission error.
pub trait Backend {
    // Authentication
    fn sign_up(&self, email: &str, password: &str) -> Result<Identity>;
    fn sign_in(&self, email: &str, password: &str) -> Result<Identity>;
    fn sign_out(&self) -> Result<()>;
    fn request_password_reset(&self, email: &str) -> Result<()>;
    fn current_identity(&self) -> Option<Identity>;

    /// Identity-change feed. Delivers the current identity immediately on
    /// subscribe, then again after every sign-in or sign-out.
    fn watch_identity(&self) -> Subscription<Option<Identity>>;

    // Tasks collection
    fn add_task(&self, new_task: NewTask) -> Result<String>;
    fn update_task(&self, id: &str, patch: TaskPatch) -> Result<()>;
    fn delete_task(&self, id: &str) -> Result<()>;

    /// Live query over the signed-in user's tasks, newest-created first.
    /// Delivers the current result set immediately, then a full replacement
    /// snapshot after every change to the collection.
    fn watch_tasks(&self, uid: &str) -> Subscription<Vec<Task>>;

    // Profile collection
    fn add_profile(&self, new_profile: NewProfile) -> Result<String>;
    fn update_profile(&self, id: &str, patch: ProfilePatch) -> Result<()>;

    /// Live query over the signed-in user's profile records (expected to
    /// hold exactly one).
    fn watch_profile(&self, uid: &str) -> Subscription<Vec<Profile>>;

    /// Whether any profile record exists for the given email. Used to
    /// reject password-reset requests for unknown accounts.
    fn profile_exists_for_email(&self, email: &str) -> Result<bool>;
}

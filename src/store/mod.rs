//! File-backed reference backend.
//!
//! The real deployment talks to a managed auth provider and document
//! database; this store stands in for both so the session synchronizer and
//! the CLI have something concrete to run against. It keeps each
//! collection as a JSON file under the data directory and mirrors the
//! managed backend's contract: server-assigned ids and timestamps,
//! ownership checks on every mutation, and live queries that deliver a
//! full replacement snapshot on subscribe and after every committed write.
//!
//! # Directory structure
//!
//! ```text
//! <data_dir>/
//!   accounts.json   # auth provider stand-in (uid, email, credential digest)
//!   tasks.json      # tasks collection
//!   profile.json    # profile collection
//!   session         # uid of the signed-in identity, absent when signed out
//! ```
//!
//! Snapshot delivery is in-process: subscribers registered on this store
//! instance hear about writes made through it. A fresh process sees current
//! state through the initial snapshot pushed on subscribe.

pub mod lock;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;
use ulid::Ulid;
use uuid::Uuid;

use crate::backend::{Backend, Identity, NewProfile, NewTask, ProfilePatch, Subscription, TaskPatch};
use crate::error::{Error, Result};
use crate::model::{Profile, Task};
use lock::{FileLock, DEFAULT_LOCK_TIMEOUT_MS};

const ACCOUNTS_FILE: &str = "accounts.json";
const TASKS_FILE: &str = "tasks.json";
const PROFILE_FILE: &str = "profile.json";
const SESSION_FILE: &str = "session";

/// Credential record for the auth stand-in.
///
/// The digest is a salted FNV-1a of the password: enough to keep the file
/// free of plaintext, NOT real password hashing. Credential storage belongs
/// to the managed provider in any real deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Account {
    uid: String,
    email: String,
    salt: String,
    digest: String,
    created_at: DateTime<Utc>,
}

fn credential_digest(salt: &str, password: &str) -> String {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for byte in salt.bytes().chain(password.bytes()) {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    format!("{hash:016x}")
}

struct Watcher<T> {
    id: u64,
    uid: Option<String>,
    tx: Sender<T>,
}

#[derive(Default)]
struct Watchers {
    next_id: u64,
    identity: Vec<Watcher<Option<Identity>>>,
    tasks: Vec<Watcher<Vec<Task>>>,
    profile: Vec<Watcher<Vec<Profile>>>,
}

/// File-backed [`Backend`] implementation.
#[derive(Clone)]
pub struct LocalStore {
    dir: PathBuf,
    watchers: Arc<Mutex<Watchers>>,
}

impl LocalStore {
    /// Open (creating if needed) a store rooted at the given directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            watchers: Arc::new(Mutex::new(Watchers::default())),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn lock_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.lock"))
    }

    fn read_collection<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>> {
        let path = self.path(name);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Read-modify-write a collection file under its lock.
    fn update_collection<T, R, F>(&self, name: &str, mutate: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<T>) -> Result<R>,
    {
        let _lock = FileLock::acquire(self.lock_path(name), DEFAULT_LOCK_TIMEOUT_MS)?;
        let mut records: Vec<T> = self.read_collection(name)?;
        let result = mutate(&mut records)?;
        let json = serde_json::to_string_pretty(&records)?;
        lock::write_atomic(self.path(name), json.as_bytes())?;
        Ok(result)
    }

    fn session_uid(&self) -> Option<String> {
        let raw = fs::read_to_string(self.path(SESSION_FILE)).ok()?;
        let uid = raw.trim();
        if uid.is_empty() {
            None
        } else {
            Some(uid.to_string())
        }
    }

    fn require_identity(&self) -> Result<Identity> {
        self.current_identity().ok_or(Error::NotSignedIn)
    }

    fn find_account(&self, email: &str) -> Result<Option<Account>> {
        let accounts: Vec<Account> = self.read_collection(ACCOUNTS_FILE)?;
        Ok(accounts
            .into_iter()
            .find(|account| account.email.eq_ignore_ascii_case(email)))
    }

    /// Current task snapshot for one owner, newest-created first.
    fn task_snapshot(&self, uid: &str) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self.read_collection(TASKS_FILE)?;
        tasks.retain(|task| task.uid == uid);
        tasks.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| right.id.cmp(&left.id))
        });
        Ok(tasks)
    }

    fn profile_snapshot(&self, uid: &str) -> Result<Vec<Profile>> {
        let mut profiles: Vec<Profile> = self.read_collection(PROFILE_FILE)?;
        profiles.retain(|profile| profile.uid == uid);
        Ok(profiles)
    }

    fn notify_identity(&self, identity: Option<Identity>) {
        let mut watchers = self.watchers.lock().unwrap();
        watchers
            .identity
            .retain(|watcher| watcher.tx.send(identity.clone()).is_ok());
    }

    fn notify_tasks(&self) {
        // Collect first: snapshot reads must not run under the watcher lock.
        let targets: Vec<(u64, String)> = {
            let watchers = self.watchers.lock().unwrap();
            watchers
                .tasks
                .iter()
                .filter_map(|w| w.uid.clone().map(|uid| (w.id, uid)))
                .collect()
        };
        for (id, uid) in targets {
            let snapshot = match self.task_snapshot(&uid) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    debug!(?err, "skipping task snapshot delivery");
                    continue;
                }
            };
            let mut watchers = self.watchers.lock().unwrap();
            if let Some(watcher) = watchers.tasks.iter().find(|w| w.id == id) {
                if watcher.tx.send(snapshot).is_err() {
                    watchers.tasks.retain(|w| w.id != id);
                }
            }
        }
    }

    fn notify_profile(&self) {
        let targets: Vec<(u64, String)> = {
            let watchers = self.watchers.lock().unwrap();
            watchers
                .profile
                .iter()
                .filter_map(|w| w.uid.clone().map(|uid| (w.id, uid)))
                .collect()
        };
        for (id, uid) in targets {
            let snapshot = match self.profile_snapshot(&uid) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    debug!(?err, "skipping profile snapshot delivery");
                    continue;
                }
            };
            let mut watchers = self.watchers.lock().unwrap();
            if let Some(watcher) = watchers.profile.iter().find(|w| w.id == id) {
                if watcher.tx.send(snapshot).is_err() {
                    watchers.profile.retain(|w| w.id != id);
                }
            }
        }
    }

    fn next_watcher_id(&self) -> u64 {
        let mut watchers = self.watchers.lock().unwrap();
        watchers.next_id += 1;
        watchers.next_id
    }

    fn unsubscriber(
        watchers: &Arc<Mutex<Watchers>>,
        id: u64,
        kind: WatchKind,
    ) -> Box<dyn FnOnce() + Send> {
        let watchers = Arc::clone(watchers);
        Box::new(move || {
            if let Ok(mut watchers) = watchers.lock() {
                match kind {
                    WatchKind::Identity => watchers.identity.retain(|w| w.id != id),
                    WatchKind::Tasks => watchers.tasks.retain(|w| w.id != id),
                    WatchKind::Profile => watchers.profile.retain(|w| w.id != id),
                }
            }
        })
    }
}

#[derive(Clone, Copy)]
enum WatchKind {
    Identity,
    Tasks,
    Profile,
}

impl Backend for LocalStore {
    fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        let email = email.trim().to_string();
        let uid = Uuid::new_v4().to_string();
        let salt = Uuid::new_v4().simple().to_string();
        let account = Account {
            uid: uid.clone(),
            email: email.clone(),
            salt: salt.clone(),
            digest: credential_digest(&salt, password),
            created_at: Utc::now(),
        };

        self.update_collection(ACCOUNTS_FILE, |accounts: &mut Vec<Account>| {
            if accounts
                .iter()
                .any(|existing| existing.email.eq_ignore_ascii_case(&email))
            {
                return Err(Error::EmailInUse(email.clone()));
            }
            accounts.push(account);
            Ok(())
        })?;

        // Signing up establishes a session, like the managed provider does.
        lock::write_atomic(self.path(SESSION_FILE), uid.as_bytes())?;
        let identity = Identity { uid, email };
        self.notify_identity(Some(identity.clone()));
        Ok(identity)
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let account = self
            .find_account(email.trim())?
            .ok_or(Error::InvalidCredentials)?;
        if credential_digest(&account.salt, password) != account.digest {
            return Err(Error::InvalidCredentials);
        }

        lock::write_atomic(self.path(SESSION_FILE), account.uid.as_bytes())?;
        let identity = Identity {
            uid: account.uid,
            email: account.email,
        };
        self.notify_identity(Some(identity.clone()));
        Ok(identity)
    }

    fn sign_out(&self) -> Result<()> {
        let path = self.path(SESSION_FILE);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        self.notify_identity(None);
        Ok(())
    }

    fn request_password_reset(&self, email: &str) -> Result<()> {
        let account = self
            .find_account(email.trim())?
            .ok_or_else(|| Error::AccountNotFound(email.trim().to_string()))?;
        // The managed provider sends the reset email; here there is nothing
        // to deliver, so the request is just acknowledged.
        debug!(email = %account.email, "password reset requested");
        Ok(())
    }

    fn current_identity(&self) -> Option<Identity> {
        let uid = self.session_uid()?;
        let accounts: Vec<Account> = self.read_collection(ACCOUNTS_FILE).ok()?;
        accounts
            .into_iter()
            .find(|account| account.uid == uid)
            .map(|account| Identity {
                uid: account.uid,
                email: account.email,
            })
    }

    fn watch_identity(&self) -> Subscription<Option<Identity>> {
        let id = self.next_watcher_id();
        let (tx, rx) = mpsc::channel();
        // Deliver current state immediately, like the provider's
        // identity-change callback fires on registration.
        let _ = tx.send(self.current_identity());
        self.watchers.lock().unwrap().identity.push(Watcher {
            id,
            uid: None,
            tx,
        });
        Subscription::new(rx, Self::unsubscriber(&self.watchers, id, WatchKind::Identity))
    }

    fn add_task(&self, new_task: NewTask) -> Result<String> {
        let identity = self.require_identity()?;
        if new_task.uid != identity.uid {
            return Err(Error::NotOwner {
                id: "new task".to_string(),
            });
        }

        let task = Task {
            id: Ulid::new().to_string(),
            uid: new_task.uid,
            text: new_task.text,
            status: true,
            created_at: Utc::now(),
            deadline: new_task.deadline,
            priority: new_task.priority,
            reminder: new_task.reminder,
        };
        let task_id = task.id.clone();

        self.update_collection(TASKS_FILE, |tasks: &mut Vec<Task>| {
            tasks.push(task);
            Ok(())
        })?;
        self.notify_tasks();
        Ok(task_id)
    }

    fn update_task(&self, id: &str, patch: TaskPatch) -> Result<()> {
        let identity = self.require_identity()?;
        self.update_collection(TASKS_FILE, |tasks: &mut Vec<Task>| {
            let task = tasks
                .iter_mut()
                .find(|task| task.id == id)
                .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
            if task.uid != identity.uid {
                return Err(Error::NotOwner { id: id.to_string() });
            }
            if let Some(text) = patch.text {
                task.text = text;
            }
            if let Some(status) = patch.status {
                task.status = status;
            }
            if let Some(deadline) = patch.deadline {
                task.deadline = deadline;
            }
            if let Some(priority) = patch.priority {
                task.priority = priority;
            }
            if let Some(reminder) = patch.reminder {
                task.reminder = reminder;
            }
            Ok(())
        })?;
        self.notify_tasks();
        Ok(())
    }

    fn delete_task(&self, id: &str) -> Result<()> {
        let identity = self.require_identity()?;
        self.update_collection(TASKS_FILE, |tasks: &mut Vec<Task>| {
            let index = tasks
                .iter()
                .position(|task| task.id == id)
                .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
            if tasks[index].uid != identity.uid {
                return Err(Error::NotOwner { id: id.to_string() });
            }
            tasks.remove(index);
            Ok(())
        })?;
        self.notify_tasks();
        Ok(())
    }

    fn watch_tasks(&self, uid: &str) -> Subscription<Vec<Task>> {
        let id = self.next_watcher_id();
        let (tx, rx) = mpsc::channel();
        if let Ok(snapshot) = self.task_snapshot(uid) {
            let _ = tx.send(snapshot);
        }
        self.watchers.lock().unwrap().tasks.push(Watcher {
            id,
            uid: Some(uid.to_string()),
            tx,
        });
        Subscription::new(rx, Self::unsubscriber(&self.watchers, id, WatchKind::Tasks))
    }

    fn add_profile(&self, new_profile: NewProfile) -> Result<String> {
        let identity = self.require_identity()?;
        if new_profile.uid != identity.uid {
            return Err(Error::NotOwner {
                id: "new profile".to_string(),
            });
        }

        let profile = Profile {
            id: Ulid::new().to_string(),
            uid: new_profile.uid,
            first_name: new_profile.first_name,
            last_name: new_profile.last_name,
            age: new_profile.age,
            address: new_profile.address,
            email: new_profile.email,
        };
        let profile_id = profile.id.clone();

        self.update_collection(PROFILE_FILE, |profiles: &mut Vec<Profile>| {
            // Exactly one profile per identity, enforced at write time.
            if profiles.iter().any(|existing| existing.uid == profile.uid) {
                return Err(Error::ProfileExists);
            }
            profiles.push(profile);
            Ok(())
        })?;
        self.notify_profile();
        Ok(profile_id)
    }

    fn update_profile(&self, id: &str, patch: ProfilePatch) -> Result<()> {
        let identity = self.require_identity()?;
        self.update_collection(PROFILE_FILE, |profiles: &mut Vec<Profile>| {
            let profile = profiles
                .iter_mut()
                .find(|profile| profile.id == id)
                .ok_or(Error::ProfileNotFound)?;
            if profile.uid != identity.uid {
                return Err(Error::NotOwner { id: id.to_string() });
            }
            if let Some(first_name) = patch.first_name {
                profile.first_name = first_name;
            }
            if let Some(last_name) = patch.last_name {
                profile.last_name = last_name;
            }
            if let Some(age) = patch.age {
                profile.age = age;
            }
            if let Some(address) = patch.address {
                profile.address = address;
            }
            Ok(())
        })?;
        self.notify_profile();
        Ok(())
    }

    fn watch_profile(&self, uid: &str) -> Subscription<Vec<Profile>> {
        let id = self.next_watcher_id();
        let (tx, rx) = mpsc::channel();
        if let Ok(snapshot) = self.profile_snapshot(uid) {
            let _ = tx.send(snapshot);
        }
        self.watchers.lock().unwrap().profile.push(Watcher {
            id,
            uid: Some(uid.to_string()),
            tx,
        });
        Subscription::new(rx, Self::unsubscriber(&self.watchers, id, WatchKind::Profile))
    }

    fn profile_exists_for_email(&self, email: &str) -> Result<bool> {
        let profiles: Vec<Profile> = self.read_collection(PROFILE_FILE)?;
        Ok(profiles
            .iter()
            .any(|profile| profile.email.eq_ignore_ascii_case(email.trim())))
    }
}

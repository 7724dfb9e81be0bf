//! Validated mutating operations.
//!
//! Every write against the backend funnels through here. Local validation
//! runs before any network call: a validation failure returns an error and
//! guarantees no write was issued. Writes never touch cached session state;
//! their effect shows up in the next snapshot the live subscription pushes.

use std::str::FromStr;

use chrono::NaiveDate;

use crate::backend::{Backend, Identity, NewProfile, NewTask, ProfilePatch, TaskPatch};
use crate::error::{Error, Result};
use crate::model::{Priority, Reminder, Task};

fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::MissingField(field.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Input for the registration flow.
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub age: Option<u32>,
    pub address: Option<String>,
}

/// Create the identity and its paired profile document.
///
/// The new session is signed out again at the end: registration lands the
/// user on the sign-in entry point, not inside the app.
pub fn register<B: Backend>(backend: &B, registration: Registration) -> Result<Identity> {
    let first_name = required("first name", &registration.first_name)?;
    let last_name = required("last name", &registration.last_name)?;
    let email = required("email", &registration.email)?;
    let password = required("password", &registration.password)?;
    if registration.confirm_password != registration.password {
        return Err(Error::PasswordMismatch);
    }

    let identity = backend.sign_up(&email, &password)?;
    if let Err(err) = backend.add_profile(NewProfile {
        uid: identity.uid.clone(),
        first_name,
        last_name,
        email,
        age: registration.age,
        address: registration.address,
    }) {
        // Do not leave the half-registered session signed in.
        let _ = backend.sign_out();
        return Err(err);
    }
    backend.sign_out()?;
    Ok(identity)
}

pub fn sign_in<B: Backend>(backend: &B, email: &str, password: &str) -> Result<Identity> {
    let email = required("email", email)?;
    let password = required("password", password)?;
    backend.sign_in(&email, &password)
}

pub fn sign_out<B: Backend>(backend: &B) -> Result<()> {
    backend.sign_out()
}

/// Request a password reset, first verifying a profile exists for the
/// email so unknown addresses get a clear error instead of silence.
pub fn request_password_reset<B: Backend>(backend: &B, email: &str) -> Result<()> {
    let email = required("email", email)?;
    if !backend.profile_exists_for_email(&email)? {
        return Err(Error::AccountNotFound(email));
    }
    backend.request_password_reset(&email)
}

/// Fields for a task about to be created.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub text: String,
    pub deadline: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub reminder: Option<Reminder>,
}

/// Add a task owned by the given identity. Blank text is rejected before
/// any write is issued.
pub fn add_task<B: Backend>(backend: &B, identity: &Identity, draft: TaskDraft) -> Result<String> {
    let text = required("text", &draft.text)?;
    backend.add_task(NewTask {
        uid: identity.uid.clone(),
        text,
        deadline: draft.deadline,
        priority: draft.priority,
        reminder: draft.reminder,
    })
}

/// Replace a task's text. Blank text is rejected and the stored text is
/// left untouched.
pub fn edit_task_text<B: Backend>(backend: &B, id: &str, new_text: &str) -> Result<()> {
    let text = required("text", new_text)?;
    backend.update_task(
        id,
        TaskPatch {
            text: Some(text),
            ..TaskPatch::default()
        },
    )
}

pub fn set_deadline<B: Backend>(backend: &B, id: &str, deadline: Option<NaiveDate>) -> Result<()> {
    backend.update_task(
        id,
        TaskPatch {
            deadline: Some(deadline),
            ..TaskPatch::default()
        },
    )
}

pub fn set_priority<B: Backend>(backend: &B, id: &str, priority: Option<Priority>) -> Result<()> {
    backend.update_task(
        id,
        TaskPatch {
            priority: Some(priority),
            ..TaskPatch::default()
        },
    )
}

pub fn set_reminder<B: Backend>(backend: &B, id: &str, reminder: Option<Reminder>) -> Result<()> {
    backend.update_task(
        id,
        TaskPatch {
            reminder: Some(reminder),
            ..TaskPatch::default()
        },
    )
}

/// Flip a task between open and done.
pub fn toggle_status<B: Backend>(backend: &B, task: &Task) -> Result<()> {
    backend.update_task(
        &task.id,
        TaskPatch {
            status: Some(!task.status),
            ..TaskPatch::default()
        },
    )
}

pub fn delete_task<B: Backend>(backend: &B, id: &str) -> Result<()> {
    backend.delete_task(id)
}

/// Editable profile fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    FirstName,
    LastName,
    Age,
    Address,
}

impl FromStr for ProfileField {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "first-name" | "firstname" => Ok(ProfileField::FirstName),
            "last-name" | "lastname" => Ok(ProfileField::LastName),
            "age" => Ok(ProfileField::Age),
            "address" => Ok(ProfileField::Address),
            other => Err(Error::InvalidArgument(format!(
                "unknown profile field '{other}' (expected first-name, last-name, age, or address)"
            ))),
        }
    }
}

/// Update one field of the profile document. Name fields require a
/// non-blank value; age and address are cleared by a blank value.
pub fn edit_profile_field<B: Backend>(
    backend: &B,
    profile_id: &str,
    field: ProfileField,
    value: &str,
) -> Result<()> {
    let patch = match field {
        ProfileField::FirstName => ProfilePatch {
            first_name: Some(required("first name", value)?),
            ..ProfilePatch::default()
        },
        ProfileField::LastName => ProfilePatch {
            last_name: Some(required("last name", value)?),
            ..ProfilePatch::default()
        },
        ProfileField::Age => {
            let trimmed = value.trim();
            let age = if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.parse::<u32>().map_err(|_| {
                    Error::InvalidArgument(format!("age must be a number, got '{trimmed}'"))
                })?)
            };
            ProfilePatch {
                age: Some(age),
                ..ProfilePatch::default()
            }
        }
        ProfileField::Address => {
            let trimmed = value.trim();
            let address = if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            };
            ProfilePatch {
                address: Some(address),
                ..ProfilePatch::default()
            }
        }
    };
    backend.update_profile(profile_id, patch)
}

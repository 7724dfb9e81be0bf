//! td profile command implementations: show, edit.

use serde::Serialize;

use crate::actions::{self, ProfileField};
use crate::error::{Error, Result};
use crate::events::EventKind;
use crate::model::Profile;
use crate::output::{emit_success, HumanOutput, OutputOptions};

use super::auth::combine;
use super::{emit_event, open_event_sink, Context};

/// The signed-in user's profile, or the errors that explain why there
/// isn't one.
fn current_profile(ctx: &Context) -> Result<Profile> {
    if ctx.sync.identity().is_none() {
        return Err(Error::NotSignedIn);
    }
    ctx.sync.profile().cloned().ok_or(Error::ProfileNotFound)
}

pub struct ShowOptions {
    pub ctx: Context,
    pub output: OutputOptions,
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let profile = current_profile(&options.ctx)?;

    let mut human = HumanOutput::new(profile.full_name());
    human.push_summary("Email", &profile.email);
    if let Some(age) = profile.age {
        human.push_summary("Age", age.to_string());
    }
    if let Some(address) = &profile.address {
        human.push_summary("Address", address);
    }

    emit_success(options.output, "profile show", &profile, Some(&human))
}

pub struct EditOptions {
    pub field: String,
    pub value: String,
    pub events: Option<String>,
    pub ctx: Context,
    pub output: OutputOptions,
}

#[derive(Serialize)]
struct ProfileEditedOutput {
    id: String,
    field: String,
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let (mut sink, events_to_stdout) = open_event_sink(options.events.as_deref(), &options.ctx.config)?;

    let field = options.field.parse::<ProfileField>()?;
    let profile = current_profile(&options.ctx)?;
    actions::edit_profile_field(options.ctx.store(), &profile.id, field, &options.value)?;

    let data = ProfileEditedOutput {
        id: profile.id.clone(),
        field: options.field.trim().to_ascii_lowercase(),
    };
    let uid = options.ctx.sync.identity().map(|i| i.uid.clone());
    let warning = emit_event(&mut sink, EventKind::ProfileEdited, uid, &data);

    let mut human = HumanOutput::new("Profile updated");
    if let Some(warning) = warning {
        human.push_warning(warning);
    }
    human.push_summary("Field", &data.field);
    human.push_next_step("td profile show".to_string());

    emit_success(
        combine(options.output, events_to_stdout),
        "profile edit",
        &data,
        Some(&human),
    )
}

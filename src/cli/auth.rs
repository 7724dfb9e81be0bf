//! td auth command implementations: register, login, logout,
//! forgot-password.

use serde::Serialize;

use crate::actions::{self, Registration};
use crate::error::Result;
use crate::events::EventKind;
use crate::output::{emit_success, HumanOutput, OutputOptions};

use super::{emit_event, open_event_sink, Context};

pub struct RegisterOptions {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub age: Option<u32>,
    pub address: Option<String>,
    pub events: Option<String>,
    pub ctx: Context,
    pub output: OutputOptions,
}

#[derive(Serialize)]
struct RegisteredOutput {
    uid: String,
    email: String,
}

pub fn run_register(options: RegisterOptions) -> Result<()> {
    let (mut sink, events_to_stdout) = open_event_sink(options.events.as_deref(), &options.ctx.config)?;

    let identity = actions::register(
        options.ctx.store(),
        Registration {
            first_name: options.first_name,
            last_name: options.last_name,
            email: options.email,
            password: options.password,
            confirm_password: options.confirm_password,
            age: options.age,
            address: options.address,
        },
    )?;

    let data = RegisteredOutput {
        uid: identity.uid.clone(),
        email: identity.email.clone(),
    };
    let warning = emit_event(&mut sink, EventKind::Registered, Some(identity.uid), &data);

    let mut human = HumanOutput::new("Account created");
    if let Some(warning) = warning {
        human.push_warning(warning);
    }
    human.push_summary("Email", &data.email);
    human.push_next_step(format!("td login {}", data.email));

    emit_success(
        combine(options.output, events_to_stdout),
        "register",
        &data,
        Some(&human),
    )
}

pub struct LoginOptions {
    pub email: String,
    pub password: String,
    pub events: Option<String>,
    pub ctx: Context,
    pub output: OutputOptions,
}

#[derive(Serialize)]
struct SignedInOutput {
    uid: String,
    email: String,
}

pub fn run_login(options: LoginOptions) -> Result<()> {
    let (mut sink, events_to_stdout) = open_event_sink(options.events.as_deref(), &options.ctx.config)?;

    let identity = actions::sign_in(options.ctx.store(), &options.email, &options.password)?;

    let data = SignedInOutput {
        uid: identity.uid.clone(),
        email: identity.email.clone(),
    };
    let warning = emit_event(&mut sink, EventKind::SignedIn, Some(identity.uid), &data);

    let mut human = HumanOutput::new("Signed in");
    if let Some(warning) = warning {
        human.push_warning(warning);
    }
    human.push_summary("Email", &data.email);
    human.push_next_step("td list".to_string());

    emit_success(
        combine(options.output, events_to_stdout),
        "login",
        &data,
        Some(&human),
    )
}

pub struct LogoutOptions {
    pub events: Option<String>,
    pub ctx: Context,
    pub output: OutputOptions,
}

#[derive(Serialize)]
struct SignedOutOutput {
    signed_out: bool,
}

pub fn run_logout(options: LogoutOptions) -> Result<()> {
    let (mut sink, events_to_stdout) = open_event_sink(options.events.as_deref(), &options.ctx.config)?;
    let uid = options
        .ctx
        .sync
        .identity()
        .map(|identity| identity.uid.clone());

    actions::sign_out(options.ctx.store())?;

    let data = SignedOutOutput { signed_out: true };
    let warning = emit_event(&mut sink, EventKind::SignedOut, uid, &data);

    let mut human = HumanOutput::new("Signed out");
    if let Some(warning) = warning {
        human.push_warning(warning);
    }

    emit_success(
        combine(options.output, events_to_stdout),
        "logout",
        &data,
        Some(&human),
    )
}

pub struct ForgotPasswordOptions {
    pub email: String,
    pub events: Option<String>,
    pub ctx: Context,
    pub output: OutputOptions,
}

#[derive(Serialize)]
struct ResetRequestedOutput {
    email: String,
}

pub fn run_forgot_password(options: ForgotPasswordOptions) -> Result<()> {
    let (mut sink, events_to_stdout) = open_event_sink(options.events.as_deref(), &options.ctx.config)?;

    actions::request_password_reset(options.ctx.store(), &options.email)?;

    let data = ResetRequestedOutput {
        email: options.email.trim().to_string(),
    };
    let warning = emit_event(&mut sink, EventKind::PasswordResetRequested, None, &data);

    let mut human = HumanOutput::new("Password reset requested");
    if let Some(warning) = warning {
        human.push_warning(warning);
    }
    human.push_summary("Email", &data.email);
    human.push_detail("Check the account inbox for the reset link.".to_string());

    emit_success(
        combine(options.output, events_to_stdout),
        "forgot-password",
        &data,
        Some(&human),
    )
}

pub(super) fn combine(output: OutputOptions, events_to_stdout: bool) -> OutputOptions {
    OutputOptions {
        json: output.json && !events_to_stdout,
        quiet: output.quiet || events_to_stdout,
    }
}

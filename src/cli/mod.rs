//! Command-line interface for td
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is defined in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::Result;
use crate::events::{Event, EventDestination, EventKind, EventSink};
use crate::session::SessionSynchronizer;
use crate::store::LocalStore;

mod auth;
mod profile;
mod task;

/// td - To-Do List
///
/// A to-do list client: register, sign in, and manage a personal task
/// list with deadlines, priorities, and reminders.
#[derive(Parser, Debug)]
#[command(name = "td")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory for the local store
    #[arg(long, global = true, env = "TD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Path to a td.toml config file
    #[arg(long, global = true, env = "TD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit events as JSONL to "-" (stdout) or a file path
    #[arg(long, global = true)]
    pub events: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an account and its profile
    Register {
        /// First name
        #[arg(long)]
        first_name: String,

        /// Last name
        #[arg(long)]
        last_name: String,

        /// Email address
        #[arg(long)]
        email: String,

        /// Password
        #[arg(long)]
        password: String,

        /// Password confirmation
        #[arg(long)]
        confirm_password: String,

        /// Age
        #[arg(long)]
        age: Option<u32>,

        /// Address
        #[arg(long)]
        address: Option<String>,
    },

    /// Sign in
    Login {
        /// Email address
        email: String,

        /// Password
        password: String,
    },

    /// Sign out
    Logout,

    /// Request a password reset email
    ForgotPassword {
        /// Email address of the account
        email: String,
    },

    /// Add a task
    Add {
        /// Task text
        text: String,

        /// Deadline date (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<String>,

        /// Priority: urgent, normal, low
        #[arg(long)]
        priority: Option<String>,

        /// Reminder lead time: 30m, 1h, 2h
        #[arg(long)]
        reminder: Option<String>,
    },

    /// List tasks, partitioned into open and completed
    List {
        /// Only tasks with this priority: urgent, normal, low
        #[arg(long)]
        priority: Option<String>,
    },

    /// Edit a task's fields
    Edit {
        /// Task id (a unique prefix is enough)
        id: String,

        /// New task text
        #[arg(long)]
        text: Option<String>,

        /// New deadline date (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<String>,

        /// Remove the deadline
        #[arg(long, conflicts_with = "deadline")]
        clear_deadline: bool,

        /// New priority: urgent, normal, low
        #[arg(long)]
        priority: Option<String>,

        /// Remove the priority
        #[arg(long, conflicts_with = "priority")]
        clear_priority: bool,

        /// New reminder lead time: 30m, 1h, 2h
        #[arg(long)]
        reminder: Option<String>,

        /// Remove the reminder
        #[arg(long, conflicts_with = "reminder")]
        clear_reminder: bool,
    },

    /// Toggle a task between open and done
    Done {
        /// Task id (a unique prefix is enough)
        id: String,
    },

    /// Delete a task
    Rm {
        /// Task id (a unique prefix is enough)
        id: String,
    },

    /// Profile management
    #[command(subcommand)]
    Profile(ProfileCommands),
}

/// Profile subcommands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Show the signed-in user's profile
    Show,

    /// Edit one profile field
    Edit {
        /// Field to edit: first-name, last-name, age, address
        field: String,

        /// New value (blank clears age or address)
        value: String,
    },
}

/// Everything a command needs: the open store, a pumped synchronizer, and
/// the loaded configuration.
pub struct Context {
    pub config: Config,
    pub sync: SessionSynchronizer<LocalStore>,
}

impl Context {
    pub fn store(&self) -> &LocalStore {
        self.sync.backend()
    }
}

/// Open the store and bring the session state up to date.
fn load_context(data_dir: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<Context> {
    let config = Config::load(config_path.as_deref())?;
    let dir = config.resolve_data_dir(data_dir.as_deref())?;
    let store = LocalStore::open(dir)?;
    let mut sync = SessionSynchronizer::new(store);
    sync.pump();
    Ok(Context { config, sync })
}

/// Open the event sink selected by the flag or config. Returns the sink
/// and whether events go to stdout (which suppresses normal output).
fn open_event_sink(
    flag: Option<&str>,
    config: &Config,
) -> Result<(Option<EventSink>, bool)> {
    let destination = EventDestination::parse(flag)
        .or_else(|| EventDestination::parse(config.events.destination.as_deref()));
    let events_to_stdout = matches!(destination, Some(EventDestination::Stdout));
    let sink = match destination {
        Some(destination) => Some(destination.open()?),
        None => None,
    };
    Ok((sink, events_to_stdout))
}

/// Emit one event, turning failures into a human-readable warning instead
/// of failing the command that already committed its write.
fn emit_event(
    sink: &mut Option<EventSink>,
    kind: EventKind,
    uid: Option<String>,
    data: impl serde::Serialize,
) -> Option<String> {
    let sink = sink.as_mut()?;
    let event = match Event::new(kind, uid).with_data(data) {
        Ok(event) => event,
        Err(err) => return Some(format!("event payload not serialized: {err}")),
    };
    match sink.emit(&event) {
        Ok(()) => None,
        Err(err) => Some(format!("event not emitted: {err}")),
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let ctx = load_context(self.data_dir, self.config)?;
        let output = crate::output::OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::Register {
                first_name,
                last_name,
                email,
                password,
                confirm_password,
                age,
                address,
            } => auth::run_register(auth::RegisterOptions {
                first_name,
                last_name,
                email,
                password,
                confirm_password,
                age,
                address,
                events: self.events,
                ctx,
                output,
            }),
            Commands::Login { email, password } => auth::run_login(auth::LoginOptions {
                email,
                password,
                events: self.events,
                ctx,
                output,
            }),
            Commands::Logout => auth::run_logout(auth::LogoutOptions {
                events: self.events,
                ctx,
                output,
            }),
            Commands::ForgotPassword { email } => {
                auth::run_forgot_password(auth::ForgotPasswordOptions {
                    email,
                    events: self.events,
                    ctx,
                    output,
                })
            }
            Commands::Add {
                text,
                deadline,
                priority,
                reminder,
            } => task::run_add(task::AddOptions {
                text,
                deadline,
                priority,
                reminder,
                events: self.events,
                ctx,
                output,
            }),
            Commands::List { priority } => task::run_list(task::ListOptions {
                priority,
                ctx,
                output,
            }),
            Commands::Edit {
                id,
                text,
                deadline,
                clear_deadline,
                priority,
                clear_priority,
                reminder,
                clear_reminder,
            } => task::run_edit(task::EditOptions {
                id,
                text,
                deadline,
                clear_deadline,
                priority,
                clear_priority,
                reminder,
                clear_reminder,
                events: self.events,
                ctx,
                output,
            }),
            Commands::Done { id } => task::run_done(task::DoneOptions {
                id,
                events: self.events,
                ctx,
                output,
            }),
            Commands::Rm { id } => task::run_rm(task::RmOptions {
                id,
                events: self.events,
                ctx,
                output,
            }),
            Commands::Profile(cmd) => match cmd {
                ProfileCommands::Show => profile::run_show(profile::ShowOptions { ctx, output }),
                ProfileCommands::Edit { field, value } => {
                    profile::run_edit(profile::EditOptions {
                        field,
                        value,
                        events: self.events,
                        ctx,
                        output,
                    })
                }
            },
        }
    }
}

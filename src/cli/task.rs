//! td task command implementations: add, list, edit, done, rm.

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::actions::{self, TaskDraft};
use crate::error::{Error, Result};
use crate::events::EventKind;
use crate::model::{Priority, Reminder, Task};
use crate::output::{emit_success, HumanOutput, OutputOptions};

use super::auth::combine;
use super::{emit_event, open_event_sink, Context};

fn parse_deadline(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        Error::InvalidArgument(format!("deadline must be YYYY-MM-DD, got '{raw}'"))
    })
}

/// Resolve a task by id or unique id prefix against the synced task list.
fn resolve_task(ctx: &Context, raw: &str) -> Result<Task> {
    let wanted = raw.trim();
    if wanted.is_empty() {
        return Err(Error::MissingField("task id".to_string()));
    }

    let tasks = ctx.sync.tasks();
    if let Some(task) = tasks.iter().find(|task| task.id == wanted) {
        return Ok(task.clone());
    }

    let mut matches = tasks
        .iter()
        .filter(|task| task.id.starts_with(wanted))
        .collect::<Vec<_>>();
    match matches.len() {
        0 => Err(Error::TaskNotFound(wanted.to_string())),
        1 => Ok(matches.remove(0).clone()),
        n => Err(Error::InvalidArgument(format!(
            "task id prefix '{wanted}' is ambiguous ({n} matches)"
        ))),
    }
}

pub struct AddOptions {
    pub text: String,
    pub deadline: Option<String>,
    pub priority: Option<String>,
    pub reminder: Option<String>,
    pub events: Option<String>,
    pub ctx: Context,
    pub output: OutputOptions,
}

#[derive(Serialize)]
struct TaskAddedOutput {
    id: String,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    deadline: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reminder: Option<Reminder>,
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let (mut sink, events_to_stdout) = open_event_sink(options.events.as_deref(), &options.ctx.config)?;

    let identity = options
        .ctx
        .sync
        .identity()
        .cloned()
        .ok_or(Error::NotSignedIn)?;

    let deadline = options.deadline.as_deref().map(parse_deadline).transpose()?;
    let priority = match options.priority.as_deref() {
        Some(raw) => Some(raw.parse::<Priority>()?),
        None => options.ctx.config.default_priority(),
    };
    let reminder = match options.reminder.as_deref() {
        Some(raw) => Some(raw.parse::<Reminder>()?),
        None => options.ctx.config.default_reminder(),
    };

    let id = actions::add_task(
        options.ctx.store(),
        &identity,
        TaskDraft {
            text: options.text,
            deadline,
            priority,
            reminder,
        },
    )?;

    // Visibility comes from the subscription pushing the post-write
    // snapshot, not from patching the cache.
    let mut ctx = options.ctx;
    ctx.sync.pump();
    let task = ctx
        .sync
        .tasks()
        .iter()
        .find(|task| task.id == id)
        .cloned()
        .ok_or_else(|| Error::TaskNotFound(id.clone()))?;

    let data = TaskAddedOutput {
        id: task.id.clone(),
        text: task.text.clone(),
        deadline: task.deadline,
        priority: task.priority,
        reminder: task.reminder,
    };
    let warning = emit_event(&mut sink, EventKind::TaskAdded, Some(identity.uid), &data);

    let mut human = HumanOutput::new("Task added");
    if let Some(warning) = warning {
        human.push_warning(warning);
    }
    human.push_summary("ID", &data.id);
    human.push_summary("Text", &data.text);
    if let Some(deadline) = data.deadline {
        human.push_summary("Deadline", deadline.to_string());
    }
    if let Some(priority) = data.priority {
        human.push_summary("Priority", priority.to_string());
    }
    if let Some(reminder) = data.reminder {
        human.push_summary("Reminder", reminder.to_string());
    }

    emit_success(combine(options.output, events_to_stdout), "add", &data, Some(&human))
}

pub struct ListOptions {
    pub priority: Option<String>,
    pub ctx: Context,
    pub output: OutputOptions,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListOutput {
    active: Vec<Task>,
    completed: Vec<Task>,
    total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    completion_percent: Option<u8>,
    loading: bool,
}

fn task_line(task: &Task, today: NaiveDate) -> String {
    let marker = if task.status { "[ ]" } else { "[x]" };
    let mut line = format!("{marker} {}  {}", &task.id[..8.min(task.id.len())], task.text);
    if let Some(priority) = task.priority {
        line.push_str(&format!("  ({priority})"));
    }
    match task.deadline {
        Some(deadline) if task.is_overdue(today) => {
            line.push_str(&format!("  due {deadline} OVERDUE"));
        }
        Some(deadline) => line.push_str(&format!("  due {deadline}")),
        None => {}
    }
    if let Some(reminder) = task.reminder {
        line.push_str(&format!("  remind {reminder} before"));
    }
    line
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = options.ctx;
    if ctx.sync.identity().is_none() {
        return Err(Error::NotSignedIn);
    }

    let filter = options
        .priority
        .as_deref()
        .map(str::parse::<Priority>)
        .transpose()?;
    let view = ctx.sync.view(filter);

    let data = ListOutput {
        total: view.total(),
        completion_percent: view.completion_percent(),
        loading: ctx.sync.is_loading(),
        active: view.active,
        completed: view.completed,
    };

    let greeting = match ctx.sync.profile() {
        Some(profile) => format!("Hello, {}", profile.first_name),
        None => "Hello".to_string(),
    };
    let mut human = HumanOutput::new(greeting);
    if let Some(filter) = filter {
        human.push_summary("Filter", filter.to_string());
    }
    human.push_summary(
        "Completed",
        format!("{} out of {}", data.completed.len(), data.total),
    );

    let today = Utc::now().date_naive();
    if data.total == 0 {
        human.push_detail("No task for today".to_string());
    } else {
        for task in &data.active {
            human.push_detail(task_line(task, today));
        }
        for task in &data.completed {
            human.push_detail(task_line(task, today));
        }
    }

    emit_success(options.output, "list", &data, Some(&human))
}

pub struct EditOptions {
    pub id: String,
    pub text: Option<String>,
    pub deadline: Option<String>,
    pub clear_deadline: bool,
    pub priority: Option<String>,
    pub clear_priority: bool,
    pub reminder: Option<String>,
    pub clear_reminder: bool,
    pub events: Option<String>,
    pub ctx: Context,
    pub output: OutputOptions,
}

#[derive(Serialize)]
struct TaskEditedOutput {
    id: String,
    fields: Vec<&'static str>,
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let (mut sink, events_to_stdout) = open_event_sink(options.events.as_deref(), &options.ctx.config)?;

    let task = resolve_task(&options.ctx, &options.id)?;

    // Every value is parsed before the first write: a bad flag must fail
    // the whole command, not land after an earlier field already committed.
    let deadline = match (&options.deadline, options.clear_deadline) {
        (Some(raw), _) => Some(Some(parse_deadline(raw)?)),
        (None, true) => Some(None),
        (None, false) => None,
    };
    let priority = match (&options.priority, options.clear_priority) {
        (Some(raw), _) => Some(Some(raw.parse::<Priority>()?)),
        (None, true) => Some(None),
        (None, false) => None,
    };
    let reminder = match (&options.reminder, options.clear_reminder) {
        (Some(raw), _) => Some(Some(raw.parse::<Reminder>()?)),
        (None, true) => Some(None),
        (None, false) => None,
    };

    if options.text.is_none() && deadline.is_none() && priority.is_none() && reminder.is_none() {
        return Err(Error::InvalidArgument(
            "nothing to edit; pass --text, --deadline, --priority, or --reminder".to_string(),
        ));
    }

    let store = options.ctx.store();
    let mut fields = Vec::new();

    // Each field is its own single write, matching the one-field-per-edit
    // backend contract. Text goes first: it still validates inside the
    // action, and nothing has been written yet when it is rejected.
    if let Some(text) = &options.text {
        actions::edit_task_text(store, &task.id, text)?;
        fields.push("text");
    }
    if let Some(deadline) = deadline {
        actions::set_deadline(store, &task.id, deadline)?;
        fields.push("deadline");
    }
    if let Some(priority) = priority {
        actions::set_priority(store, &task.id, priority)?;
        fields.push("priority");
    }
    if let Some(reminder) = reminder {
        actions::set_reminder(store, &task.id, reminder)?;
        fields.push("reminder");
    }

    let data = TaskEditedOutput {
        id: task.id.clone(),
        fields,
    };
    let uid = options.ctx.sync.identity().map(|i| i.uid.clone());
    let warning = emit_event(&mut sink, EventKind::TaskEdited, uid, &data);

    let mut human = HumanOutput::new("Task updated");
    if let Some(warning) = warning {
        human.push_warning(warning);
    }
    human.push_summary("ID", &data.id);
    human.push_summary("Fields", data.fields.join(", "));

    emit_success(combine(options.output, events_to_stdout), "edit", &data, Some(&human))
}

pub struct DoneOptions {
    pub id: String,
    pub events: Option<String>,
    pub ctx: Context,
    pub output: OutputOptions,
}

#[derive(Serialize)]
struct TaskToggledOutput {
    id: String,
    status: &'static str,
}

pub fn run_done(options: DoneOptions) -> Result<()> {
    let (mut sink, events_to_stdout) = open_event_sink(options.events.as_deref(), &options.ctx.config)?;

    let task = resolve_task(&options.ctx, &options.id)?;
    actions::toggle_status(options.ctx.store(), &task)?;

    let completed = task.status; // it was open, now it is done
    let data = TaskToggledOutput {
        id: task.id.clone(),
        status: if completed { "done" } else { "open" },
    };
    let uid = options.ctx.sync.identity().map(|i| i.uid.clone());
    let kind = if completed {
        EventKind::TaskCompleted
    } else {
        EventKind::TaskReopened
    };
    let warning = emit_event(&mut sink, kind, uid, &data);

    let header = if completed {
        "Task completed"
    } else {
        "Task reopened"
    };
    let mut human = HumanOutput::new(header);
    if let Some(warning) = warning {
        human.push_warning(warning);
    }
    human.push_summary("ID", &data.id);
    human.push_summary("Text", &task.text);

    emit_success(combine(options.output, events_to_stdout), "done", &data, Some(&human))
}

pub struct RmOptions {
    pub id: String,
    pub events: Option<String>,
    pub ctx: Context,
    pub output: OutputOptions,
}

#[derive(Serialize)]
struct TaskDeletedOutput {
    id: String,
}

pub fn run_rm(options: RmOptions) -> Result<()> {
    let (mut sink, events_to_stdout) = open_event_sink(options.events.as_deref(), &options.ctx.config)?;

    let task = resolve_task(&options.ctx, &options.id)?;
    actions::delete_task(options.ctx.store(), &task.id)?;

    let data = TaskDeletedOutput {
        id: task.id.clone(),
    };
    let uid = options.ctx.sync.identity().map(|i| i.uid.clone());
    let warning = emit_event(&mut sink, EventKind::TaskDeleted, uid, &data);

    let mut human = HumanOutput::new("Task deleted");
    if let Some(warning) = warning {
        human.push_warning(warning);
    }
    human.push_summary("ID", &data.id);
    human.push_summary("Text", &task.text);

    emit_success(combine(options.output, events_to_stdout), "rm", &data, Some(&human))
}

//! Chat command parsing and reply rendering.
//!
//! A command is one line of text such as `/addtask write report 2025-01-10 18:00`.
//! [`Command::parse`] turns it into a typed [`Command`]; [`CommandRouter`]
//! executes it against the lifecycle and sweeper and renders the reply.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use roastbot_proto::task::{OwnerId, Task, TaskFilter};

use crate::lifecycle::{TaskError, TaskLifecycle};
use crate::notify::Notifier;
use crate::reminder::ReminderOutcome;
use crate::store::TaskStore;
use crate::sweeper::{OverdueSweeper, SweepError};

/// Format of the deadline arguments and of deadlines in replies.
pub const DEADLINE_FORMAT: &str = "%Y-%m-%d %H:%M";

const ADDTASK_USAGE: &str = "/addtask <description> YYYY-MM-DD HH:MM";
const DONE_USAGE: &str = "/done <description>";
const REMOVETASK_USAGE: &str = "/removetask <description>";
const SETROASTINTERVAL_USAGE: &str = "/setroastinterval <seconds>";

/// Errors from parsing a command line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Arguments missing or malformed; carries the usage line.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// The deadline tokens did not match `YYYY-MM-DD HH:MM`.
    #[error("invalid deadline '{0}', expected YYYY-MM-DD HH:MM")]
    InvalidDeadlineFormat(String),

    /// Not a known command.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
}

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/addtask <description> <date> <time>`
    AddTask {
        /// Task label.
        description: String,
        /// Deadline in the bot's offset.
        deadline: DateTime<FixedOffset>,
    },
    /// `/done <description>`
    Done {
        /// Task label.
        description: String,
    },
    /// `/removetask <description>`
    RemoveTask {
        /// Task label.
        description: String,
    },
    /// `/tasks`, `/pending`, `/completed`
    List(TaskFilter),
    /// `/setroastinterval <seconds>`
    SetRoastInterval(i64),
    /// `/help`
    Help,
}

impl Command {
    /// Parse one line. Deadlines are read as wall time in `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] for unknown commands, missing arguments, or a
    /// malformed deadline.
    pub fn parse(line: &str, offset: FixedOffset) -> Result<Self, CommandError> {
        let mut tokens = line.split_whitespace();
        let name = tokens.next().unwrap_or_default();
        let args: Vec<&str> = tokens.collect();

        match name {
            "/addtask" => parse_addtask(&args, offset),
            "/done" => Ok(Self::Done {
                description: join_description(&args, DONE_USAGE)?,
            }),
            "/removetask" => Ok(Self::RemoveTask {
                description: join_description(&args, REMOVETASK_USAGE)?,
            }),
            "/tasks" => Ok(Self::List(TaskFilter::All)),
            "/pending" => Ok(Self::List(TaskFilter::Pending)),
            "/completed" => Ok(Self::List(TaskFilter::Completed)),
            "/setroastinterval" => match args.as_slice() {
                [seconds] => seconds
                    .parse()
                    .map(Self::SetRoastInterval)
                    .map_err(|_| CommandError::Usage(SETROASTINTERVAL_USAGE)),
                _ => Err(CommandError::Usage(SETROASTINTERVAL_USAGE)),
            },
            "/help" | "/start" => Ok(Self::Help),
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}

fn parse_addtask(args: &[&str], offset: FixedOffset) -> Result<Command, CommandError> {
    let [words @ .., date, time] = args else {
        return Err(CommandError::Usage(ADDTASK_USAGE));
    };
    let description = join_description(words, ADDTASK_USAGE)?;
    let raw = format!("{date} {time}");
    let deadline = NaiveDateTime::parse_from_str(&raw, DEADLINE_FORMAT)
        .ok()
        .and_then(|naive| naive.and_local_timezone(offset).single())
        .ok_or(CommandError::InvalidDeadlineFormat(raw))?;
    Ok(Command::AddTask {
        description,
        deadline,
    })
}

fn join_description(words: &[&str], usage: &'static str) -> Result<String, CommandError> {
    if words.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    Ok(words.join(" "))
}

/// Help text listing every command.
#[must_use]
pub fn help_text() -> String {
    [
        "Available commands:".to_string(),
        format!("{ADDTASK_USAGE} - add a task with a deadline"),
        "/tasks - view all tasks".to_string(),
        "/pending - view pending tasks".to_string(),
        "/completed - view completed tasks".to_string(),
        format!("{DONE_USAGE} - mark a task as completed"),
        format!("{REMOVETASK_USAGE} - remove a task"),
        format!("{SETROASTINTERVAL_USAGE} - change how often overdue tasks are roasted"),
        "/help - show this list".to_string(),
    ]
    .join("\n")
}

/// Executes commands on behalf of an owner.
pub struct CommandRouter<S, N> {
    lifecycle: Arc<TaskLifecycle<S, N>>,
    sweeper: Arc<OverdueSweeper<S, N>>,
    offset: FixedOffset,
}

impl<S, N> CommandRouter<S, N>
where
    S: TaskStore + 'static,
    N: Notifier + 'static,
{
    /// Creates a router. `offset` is used to read deadline arguments.
    #[must_use]
    pub fn new(
        lifecycle: Arc<TaskLifecycle<S, N>>,
        sweeper: Arc<OverdueSweeper<S, N>>,
        offset: FixedOffset,
    ) -> Self {
        Self {
            lifecycle,
            sweeper,
            offset,
        }
    }

    /// Parse and execute `line` for `owner`, returning the reply.
    pub async fn handle(&self, owner: &OwnerId, line: &str) -> String {
        match Command::parse(line, self.offset) {
            Ok(command) => self.execute(owner, command).await,
            Err(err) => {
                tracing::debug!(owner = %owner, error = %err, "rejected command");
                render_command_error(&err)
            }
        }
    }

    /// Execute an already-parsed command.
    pub async fn execute(&self, owner: &OwnerId, command: Command) -> String {
        match command {
            Command::AddTask {
                description,
                deadline,
            } => match self.lifecycle.create_task(owner, &description, deadline).await {
                Ok((task, outcome)) => render_created(&task, outcome),
                Err(err) => render_task_error(&err),
            },
            Command::Done { description } => {
                match self.lifecycle.complete_task(owner, &description).await {
                    Ok(task) => format!("Good job! '{}' completed!", task.description),
                    Err(err) => render_task_error(&err),
                }
            }
            Command::RemoveTask { description } => {
                match self.lifecycle.remove_task(owner, &description).await {
                    Ok(task) => format!("Task '{}' has been removed.", task.description),
                    Err(err) => render_task_error(&err),
                }
            }
            Command::List(filter) => match self.lifecycle.list_tasks(owner, filter).await {
                Ok(tasks) => render_list(filter, &tasks),
                Err(err) => render_task_error(&err),
            },
            Command::SetRoastInterval(seconds) => match self.sweeper.set_interval(seconds).await {
                Ok(config) => format!(
                    "Roast interval set to {} seconds.\nFirst roast check in {} seconds!",
                    config.interval.as_secs(),
                    config.initial_delay.as_secs()
                ),
                Err(SweepError::InvalidInterval(_)) => {
                    "Interval must be a positive integer in seconds.".to_string()
                }
            },
            Command::Help => help_text(),
        }
    }
}

fn render_created(task: &Task, outcome: ReminderOutcome) -> String {
    let reminder = match outcome {
        ReminderOutcome::Armed { .. } => "Reminder set for 30 minutes before!",
        ReminderOutcome::Skipped => "Reminder skipped (deadline too close)",
    };
    format!(
        "Task added: {}\nDeadline: {}\n{reminder}",
        task.description,
        task.deadline.format(DEADLINE_FORMAT)
    )
}

fn render_list(filter: TaskFilter, tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return match filter {
            TaskFilter::Completed => "No completed tasks yet. Get something done!".to_string(),
            TaskFilter::All | TaskFilter::Pending => {
                "No pending tasks for you! Chill maar.".to_string()
            }
        };
    }
    let heading = match filter {
        TaskFilter::All => "Your tasks:",
        TaskFilter::Pending => "Your pending tasks:",
        TaskFilter::Completed => "Your completed tasks:",
    };
    let mut out = String::from(heading);
    for task in tasks {
        let mark = if task.completed { "x" } else { " " };
        let _ = write!(
            out,
            "\n[{mark}] {} - due {}",
            task.description,
            task.deadline.format(DEADLINE_FORMAT)
        );
    }
    out
}

fn render_task_error(err: &TaskError) -> String {
    match err {
        TaskError::InvalidInput(reason) => format!("Invalid task: {reason}"),
        TaskError::InvalidDeadline { .. } => "Deadline must be in the future!".to_string(),
        TaskError::NotFound { description, .. } => {
            format!("No task found with the name '{description}'. Please check and try again.")
        }
        TaskError::Store(source) => {
            tracing::error!(error = %source, "task store failure");
            "Something went wrong saving your tasks. Try again later.".to_string()
        }
    }
}

fn render_command_error(err: &CommandError) -> String {
    match err {
        CommandError::Usage(usage) => format!("Usage: {usage}"),
        CommandError::InvalidDeadlineFormat(raw) => {
            format!("Could not read deadline '{raw}'.\nUsage: {ADDTASK_USAGE}")
        }
        CommandError::UnknownCommand(name) => {
            format!("Unknown command '{name}'. Send /help for the list of commands.")
        }
    }
}

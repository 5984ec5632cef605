//! `roastbot` console: one owner's chat over stdin/stdout.
//!
//! Each stdin line is a command (`/addtask`, `/done`, `/tasks`, ...).
//! Replies, reminders, and roasts are printed to stdout. Logs go to a file
//! so they never interleave with the chat.
//!
//! ```bash
//! # Persistent tasks in the default SQLite database
//! cargo run --bin roastbot
//!
//! # Throwaway session, sweeping every 30 seconds
//! cargo run --bin roastbot -- --in-memory --sweep-interval 30 --owner alice
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use roastbot::clock::{Clock, SystemClock};
use roastbot::commands::CommandRouter;
use roastbot::config::{BotConfig, CliArgs};
use roastbot::lifecycle::TaskLifecycle;
use roastbot::notify::{ChannelNotifier, Notification};
use roastbot::reminder::ReminderScheduler;
use roastbot::roast::RoastSelector;
use roastbot::store::{InMemoryTaskStore, SqliteTaskStore, TaskStore};
use roastbot::sweeper::OverdueSweeper;

/// Undelivered notifications buffered before senders wait.
const NOTIFICATION_BUFFER: usize = 64;

#[tokio::main]
async fn main() {
    let cli = CliArgs::parse();

    let config = match BotConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!(
        owner = %config.owner,
        in_memory = config.in_memory,
        interval_secs = config.sweep.interval.as_secs(),
        "roastbot starting"
    );

    let result = if config.in_memory {
        run(Arc::new(InMemoryTaskStore::new()), &config).await
    } else {
        match SqliteTaskStore::open(&config.db_path) {
            Ok(store) => run(Arc::new(store), &config).await,
            Err(e) => {
                tracing::error!(path = %config.db_path.display(), error = %e, "failed to open task store");
                eprintln!("Error opening {}: {e}", config.db_path.display());
                std::process::exit(1);
            }
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "console failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    tracing::info!("roastbot exiting");
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("roastbot.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Wire the engine over `store` and serve stdin until EOF or Ctrl-C.
async fn run<S: TaskStore + 'static>(store: Arc<S>, config: &BotConfig) -> io::Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(config.utc_offset));
    let (notifier, notifications) = ChannelNotifier::new(NOTIFICATION_BUFFER);
    let notifier = Arc::new(notifier);

    let reminders = ReminderScheduler::new(Arc::clone(&notifier), Arc::clone(&clock));
    let lifecycle = Arc::new(TaskLifecycle::new(
        Arc::clone(&store),
        reminders,
        Arc::clone(&clock),
    ));
    let sweeper = Arc::new(OverdueSweeper::new(
        store,
        notifier,
        RoastSelector::new(),
        clock,
        config.sweep,
    ));

    match lifecycle.restore_reminders().await {
        Ok(armed) => tracing::info!(armed, "pending reminders restored"),
        Err(e) => tracing::warn!(error = %e, "could not restore reminders"),
    }
    sweeper.start().await;

    let router = CommandRouter::new(
        Arc::clone(&lifecycle),
        Arc::clone(&sweeper),
        config.utc_offset,
    );
    let printer = tokio::spawn(print_notifications(notifications));

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(format!("roastbot ready for {}. Send /help for commands.\n", config.owner).as_bytes())
        .await?;
    stdout.flush().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let served = loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let reply = router.handle(&config.owner, line).await;
                    if let Err(e) = write_block(&mut stdout, &reply).await {
                        break Err(e);
                    }
                }
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break Ok(());
            }
        }
    };

    sweeper.stop().await;
    lifecycle.reminders().cancel_all();
    printer.abort();
    served
}

async fn print_notifications(mut rx: mpsc::Receiver<Notification>) {
    let mut stdout = tokio::io::stdout();
    while let Some(note) = rx.recv().await {
        if let Err(e) = write_block(&mut stdout, &note.text).await {
            tracing::warn!(owner = %note.owner, error = %e, "failed to print notification");
        }
    }
}

async fn write_block(stdout: &mut tokio::io::Stdout, text: &str) -> io::Result<()> {
    stdout.write_all(text.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await
}

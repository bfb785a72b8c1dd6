// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Taskmaster interactive shell.
//!
//! Reads one command per line from stdin. List positions shown by `ls` are
//! translated to task ids here and nowhere else.

use chrono::Utc;
use std::sync::Arc;
use taskmaster::{
    config::Config,
    models::{Credentials, TaskId},
    services::FileTokenSlot,
    state::{view, SessionState, SyncStatus, TaskFilter},
    time_utils::relative_age,
    AppError, TaskClient,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
commands:
  login <email> <password>
  logout
  whoami
  ls [all|active|completed]
  add <title> | <description>
  done <n>        toggle completion of row n
  rm <n>          delete row n
  refresh
  quit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env()?;
    tracing::info!(api_url = %config.api_url, "Starting Taskmaster");

    let slot = Arc::new(FileTokenSlot::new(config.token_file.clone()));
    let client = Arc::new(TaskClient::new(&config, slot)?);

    watch_session(&client);

    match client.restore().await {
        Ok(Some(user)) => println!("Welcome back, {}.", user.name),
        Ok(None) => println!("Not logged in. Type `login <email> <password>`."),
        Err(e) => println!("Could not restore session: {}", e),
    }

    let mut filter = TaskFilter::All;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        let outcome = match command {
            "" => Ok(()),
            "quit" | "exit" => break,
            "help" => {
                println!("{}", HELP);
                Ok(())
            }
            "login" => login(&client, rest).await,
            "logout" => {
                client.logout();
                Ok(())
            }
            "whoami" => {
                whoami(&client);
                Ok(())
            }
            "ls" => match rest.parse::<TaskFilter>() {
                Ok(f) => {
                    filter = f;
                    list(&client, filter);
                    Ok(())
                }
                Err(e) => Err(AppError::Validation(e)),
            },
            "add" => add(&client, rest).await,
            "done" => match row_id(&client, filter, rest) {
                Ok(id) => client.toggle_task(&id).await.map(|completed| {
                    println!("{}", if completed { "Completed." } else { "Reopened." });
                }),
                Err(e) => Err(e),
            },
            "rm" => match row_id(&client, filter, rest) {
                Ok(id) => client.remove_task(&id).await.map(|()| println!("Deleted.")),
                Err(e) => Err(e),
            },
            "refresh" => client.refresh().await.map(|_| list(&client, filter)),
            other => {
                println!("Unknown command '{}'. Type `help`.", other);
                Ok(())
            }
        };

        if let Err(e) = outcome {
            println!("Error: {}", e);
        }
    }

    Ok(())
}

async fn login(client: &TaskClient, args: &str) -> Result<(), AppError> {
    let mut parts = args.split_whitespace();
    let (Some(email), Some(password)) = (parts.next(), parts.next()) else {
        return Err(AppError::Validation("usage: login <email> <password>".to_string()));
    };
    let user = client.login(&Credentials::new(email, password)).await?;
    println!("Logged in as {}.", user.name);
    list(client, TaskFilter::All);
    Ok(())
}

async fn add(client: &TaskClient, args: &str) -> Result<(), AppError> {
    let (title, description) = args.split_once('|').unwrap_or((args, ""));
    let task = client.add_task(title.trim(), description.trim()).await?;
    println!("Added \"{}\".", task.title);
    Ok(())
}

fn whoami(client: &TaskClient) {
    let session = client.session().snapshot();
    match (session.state, session.user) {
        (SessionState::Authenticated, Some(user)) => {
            println!("{} <{}>", user.name, user.email)
        }
        (SessionState::Authenticating, _) => println!("Session not verified yet."),
        _ => println!("Not logged in."),
    }
}

fn list(client: &TaskClient, filter: TaskFilter) {
    let entries = client.entries();
    let counts = view::counts(&entries);
    println!(
        "all {} | active {} | completed {}   (showing {})",
        counts.all, counts.active, counts.completed, filter
    );

    let rows = view::filtered(&entries, filter);
    if rows.is_empty() {
        println!("  no tasks");
        return;
    }

    let now = Utc::now();
    for (i, entry) in rows.iter().enumerate() {
        let mark = if entry.task.completed { "x" } else { " " };
        let status = match entry.status {
            SyncStatus::Confirmed => "",
            SyncStatus::PendingCreate(_) => " (saving)",
            SyncStatus::PendingRemove => " (deleting)",
            SyncStatus::PendingToggle => " (updating)",
        };
        println!(
            "{:>3}. [{}] {} - {}  {}{}",
            i + 1,
            mark,
            entry.task.title,
            entry.task.description,
            relative_age(entry.task.created_at, now),
            status
        );
    }
}

/// Translate a 1-based row of the current view to a task id.
fn row_id(client: &TaskClient, filter: TaskFilter, arg: &str) -> Result<TaskId, AppError> {
    let row: usize = arg
        .parse()
        .map_err(|_| AppError::Validation(format!("'{}' is not a row number", arg)))?;
    row.checked_sub(1)
        .and_then(|pos| view::id_at(&client.entries(), filter, pos))
        .ok_or_else(|| AppError::NotFound(format!("row {} in the {} view", row, filter)))
}

/// Tell the user when the session ends underneath them.
fn watch_session(client: &Arc<TaskClient>) {
    let mut rx = client.session().subscribe();
    tokio::spawn(async move {
        let mut previous = rx.borrow_and_update().state;
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().state;
            if previous != SessionState::Anonymous && state == SessionState::Anonymous {
                println!("Session ended. Log in again to see your tasks.");
            }
            previous = state;
        }
    });
}

/// Initialize logging on stderr; JSON when `TASKMASTER_LOG_JSON` is set.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("taskmaster=info,warn"));

    let json = std::env::var("TASKMASTER_LOG_JSON").is_ok_and(|v| v != "0");
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

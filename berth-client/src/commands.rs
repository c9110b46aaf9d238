//! Command runners for the berth binary

use std::path::Path;
use std::sync::Arc;

use crossterm::event::EventStream;
use futures::StreamExt;
use tokio::io::AsyncReadExt;

use berth_client::connection::{Connector, WsConnector};
use berth_client::filesystem::HttpFileSystem;
use berth_client::input::{InputAction, ShellInput};
use berth_client::session::{ShellSession, ShellState, TelemetryEvent, TelemetrySession};
use berth_client::tree::{DeleteOutcome, TreeRow, TreeStore};
use berth_client::upload::{UploadCoordinator, UploadItem, UploadStatus};
use berth_client::{ClientConfig, ViewScope};
use berth_protocol::{file_name, is_within, parent_path, FileNode, ProjectId};
use berth_utils::{BerthError, Result};

use crate::cli::FilesAction;
use crate::terminal::{RawTerminal, StdoutTerminal};

fn connector(config: &ClientConfig) -> Result<Arc<dyn Connector>> {
    Ok(Arc::new(WsConnector::new(config.server_url()?)))
}

/// Attach the local terminal to a container shell until detach or close
pub async fn shell(config: &ClientConfig, container: &str) -> Result<()> {
    let input = ShellInput::with_binding(&config.shell.detach_key)?;
    let scope = ViewScope::new();
    let mut session =
        ShellSession::new(connector(config)?, scope.clone(), StdoutTerminal::new());
    session.start(container)?;

    let raw = RawTerminal::enable()?;
    let mut events = EventStream::new();
    let mut input_error = None;

    loop {
        tokio::select! {
            event = session.next_event() => match event {
                Some(event) if event.is_terminal() => break,
                Some(_) => {}
                None => break,
            },
            terminal_event = events.next() => match terminal_event {
                Some(Ok(event)) => match input.handle_event(event) {
                    InputAction::Send(data) => {
                        session.input(&data);
                    }
                    InputAction::Resize { cols, rows } => session.resize(cols, rows),
                    InputAction::Detach => {
                        tracing::info!(container, "detached from shell");
                        break;
                    }
                    InputAction::None => {}
                },
                Some(Err(e)) => {
                    input_error = Some(e);
                    break;
                }
                None => break,
            },
        }
    }

    session.stop();
    scope.dispose();
    drop(raw);
    println!();

    if let Some(e) = input_error {
        return Err(BerthError::Io(e));
    }
    if session.state() == ShellState::Failed {
        return Err(BerthError::connection(format!(
            "shell connection to container {} failed",
            container
        )));
    }
    Ok(())
}

/// Print one usage line per telemetry sample
pub async fn stats(config: &ClientConfig, container: &str, count: Option<usize>) -> Result<()> {
    let scope = ViewScope::new();
    let mut session =
        TelemetrySession::new(connector(config)?, scope.clone(), config.telemetry.history);
    session.start(container)?;

    let mut printed = 0usize;
    loop {
        let event = tokio::select! {
            event = session.next_event() => event,
            _ = tokio::signal::ctrl_c() => {
                scope.dispose();
                None
            }
        };

        match event {
            Some(TelemetryEvent::Sample(_)) => {
                if let Some(summary) = session.summary() {
                    println!("{}  {}", chrono::Local::now().format("%H:%M:%S"), summary);
                }
                printed += 1;
                if count.is_some_and(|limit| printed >= limit) {
                    break;
                }
            }
            Some(TelemetryEvent::Connected) => {
                tracing::info!(container, "telemetry stream connected");
            }
            Some(TelemetryEvent::Dropped { .. }) => {}
            Some(TelemetryEvent::Failed(error)) => {
                return Err(BerthError::connection(format!(
                    "telemetry stream for container {} failed: {}",
                    container, error
                )));
            }
            Some(TelemetryEvent::Closed) | None => break,
        }
    }

    session.stop();
    if session.dropped_records() > 0 {
        eprintln!("{} malformed records skipped", session.dropped_records());
    }
    Ok(())
}

/// Run one file operation against a project
pub async fn files(config: &ClientConfig, project: u64, action: FilesAction) -> Result<()> {
    let fs = Arc::new(HttpFileSystem::new(config.http_url()?, config.request_timeout())?);
    let tree = Arc::new(TreeStore::new(ProjectId(project), fs, ViewScope::new()));
    tree.load().await?;

    match action {
        FilesAction::Tree { dir } => {
            if let Some(dir) = &dir {
                tree.refresh_directory(dir).await?;
            }
            expand_all(&tree, &tree.roots());
            for row in tree.visible_rows() {
                let shown = match &dir {
                    Some(dir) => row.path != *dir && is_within(&row.path, dir),
                    None => true,
                };
                if shown {
                    println!("{}", format_row(&row));
                }
            }
        }
        FilesAction::Cat { path } => {
            tree.select(&path).await?;
            match tree.selection() {
                Some(selection) => print!("{}", selection.content),
                None => return Err(BerthError::validation(format!("{} is a directory", path))),
            }
        }
        FilesAction::Create { path, content } => {
            let created = tree
                .create(parent_path(&path), file_name(&path), false, Some(content.as_str()))
                .await?;
            println!("Created {}", created);
        }
        FilesAction::Mkdir { path } => {
            let created = tree
                .create(parent_path(&path), file_name(&path), true, None)
                .await?;
            println!("Created {}/", created);
        }
        FilesAction::Rename { path, new_name } => {
            let renamed = tree.rename(&path, &new_name).await?;
            println!("Renamed {} -> {}", path, renamed);
        }
        FilesAction::Rm { path, yes } => {
            let outcome = if yes || !config.files.confirm_deletes {
                tree.delete(&path, &|_: &str| true).await?
            } else {
                tree.delete(&path, &prompt_confirm).await?
            };
            match outcome {
                DeleteOutcome::Deleted => println!("Deleted {}", path),
                DeleteOutcome::Declined => println!("Cancelled"),
            }
        }
        FilesAction::Upload { files, target } => {
            let mut items = Vec::with_capacity(files.len());
            for file in &files {
                items.push(UploadItem::from_path(file).await?);
            }
            let report = UploadCoordinator::new(tree.clone())
                .upload(target.as_deref(), items)
                .await?;

            for outcome in &report.outcomes {
                match &outcome.status {
                    UploadStatus::Uploaded => println!("uploaded  {}", outcome.path),
                    UploadStatus::Failed { detail } => {
                        println!("failed    {}: {}", outcome.name, detail)
                    }
                }
            }
            if let Some(error) = &report.refresh_error {
                eprintln!("warning: tree refresh failed: {}", error);
            }
            if report.failures().next().is_some() {
                return Err(BerthError::operation(
                    "upload",
                    report.target.clone().unwrap_or_default(),
                    format!(
                        "{} of {} files failed",
                        report.outcomes.len() - report.uploaded(),
                        report.outcomes.len()
                    ),
                ));
            }
        }
        FilesAction::Save { path, from } => {
            let content = read_content(from.as_deref()).await?;
            tree.select(&path).await?;
            tree.edit(content)?;
            tree.save().await?;
            println!("Saved {}", path);
        }
    }
    if let Some(error) = tree.reconcile_error() {
        eprintln!("warning: tree refresh failed: {}", error);
    }
    Ok(())
}

fn prompt_confirm(prompt: &str) -> bool {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or(false)
}

fn expand_all(tree: &TreeStore, nodes: &[FileNode]) {
    for node in nodes.iter().filter(|n| n.is_directory) {
        tree.expand(&node.path);
        if let Some(children) = &node.children {
            expand_all(tree, children);
        }
    }
}

fn format_row(row: &TreeRow) -> String {
    let suffix = if row.is_directory { "/" } else { "" };
    format!("{}{}{}", "  ".repeat(row.depth), row.name, suffix)
}

async fn read_content(from: Option<&Path>) -> Result<String> {
    match from {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| BerthError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }),
        None => {
            let mut content = String::new();
            tokio::io::stdin().read_to_string(&mut content).await?;
            Ok(content)
        }
    }
}

use std::{io::Write, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use clap::Parser;
use client_core::{
    config::load_settings_from, dialogs::DeleteDialog, load_settings, FetchOutcome,
    HttpCollectionTransport, Notifier, ToastLevel, ToastQueue, UsersTable,
};
use shared::domain::{PageIndexing, UserId, UserRecord};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

use commands::{parse_command, ConsoleCommand, HELP};
use render::{render_outcome, render_page};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8443")]
    server_url: String,
    /// Controller settings file; defaults to ./collection.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    debounce_ms: Option<u64>,
    #[arg(long)]
    page_size: Option<u32>,
    #[arg(long)]
    one_based: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => load_settings_from(path),
        None => load_settings(),
    };
    if let Some(ms) = args.debounce_ms {
        settings.search_debounce = Duration::from_millis(ms);
    }
    if let Some(size) = args.page_size.filter(|size| *size > 0) {
        settings.default_page_size = size;
    }
    if args.one_based {
        settings.page_indexing = PageIndexing::OneBased;
    }
    debug!(?settings, "console settings");

    let transport = Arc::new(HttpCollectionTransport::new(&args.server_url)?);
    let toasts = Arc::new(ToastQueue::new());
    spawn_toast_printer(&toasts);

    let messages = settings.messages.clone();
    let table = UsersTable::new(transport.clone(), toasts.clone(), settings);
    let deletes = DeleteDialog::<UserRecord>::new(transport, messages);

    if let Some(outcome) = table.load_if_needed().await {
        show_if_loaded(&table, &outcome);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        match command {
            ConsoleCommand::Quit => break,
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Show => println!("{}", render_page(&table.snapshot())),
            ConsoleCommand::Page(page) => show_if_loaded(&table, &table.set_page(page).await),
            ConsoleCommand::Size(size) => {
                show_if_loaded(&table, &table.set_page_size(size).await)
            }
            ConsoleCommand::Sort { field, direction } => {
                show_if_loaded(&table, &table.set_sort(field, direction).await)
            }
            ConsoleCommand::Toggle(field) => {
                show_if_loaded(&table, &table.toggle_sort(&field).await)
            }
            ConsoleCommand::Search(text) => {
                // Runs in the background so further keystrokes restart the window.
                let table = table.clone();
                tokio::spawn(async move {
                    let outcome = table.set_search(&text).await;
                    show_if_loaded(&table, &outcome);
                });
            }
            ConsoleCommand::Next => match table.next_page().await {
                Some(outcome) => show_if_loaded(&table, &outcome),
                None => println!("already on the last page"),
            },
            ConsoleCommand::Previous => match table.previous_page().await {
                Some(outcome) => show_if_loaded(&table, &outcome),
                None => println!("already on the first page"),
            },
            ConsoleCommand::Reload => show_if_loaded(&table, &table.reload().await),
            ConsoleCommand::Delete(id) => {
                delete_visible(&table, &deletes, &toasts, id).await;
            }
        }
    }

    table.shutdown();
    Ok(())
}

fn show_if_loaded(table: &UsersTable, outcome: &FetchOutcome) {
    if let Some(text) = render_outcome(&table.snapshot(), outcome) {
        println!("{text}");
    }
}

async fn delete_visible(
    table: &UsersTable,
    deletes: &DeleteDialog<UserRecord>,
    toasts: &ToastQueue,
    id: UserId,
) {
    let Some(user) = table.snapshot().items.into_iter().find(|user| user.id == id) else {
        println!("user {id} is not on the current page");
        return;
    };
    deletes.open(user);
    let outcome = deletes.confirm().await;
    deletes.close();
    if outcome.success {
        toasts.notify_success(&outcome.message);
        show_if_loaded(table, &table.reload().await);
    } else if !outcome.aborted {
        toasts.notify_error(&outcome.message);
    }
}

fn spawn_toast_printer(toasts: &ToastQueue) {
    let mut rx = toasts.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(toast) => {
                    let tag = match toast.level {
                        ToastLevel::Success => "ok",
                        ToastLevel::Error => "error",
                    };
                    let at = toast.created_at.format("%H:%M:%S");
                    println!("[{tag} {at}] {}", toast.message);
                }
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "toast printer lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

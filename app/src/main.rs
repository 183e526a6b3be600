//! Terminal host for the posts core.
//!
//! Reads line commands from stdin, executes every dispatched request on a
//! blocking worker and feeds replies back over a channel, so the `App` is
//! only ever touched from the main task and completions apply in arrival
//! order.

mod command;
mod executor;
mod render;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use posts_core::config::DEFAULT_BASE_URL;
use posts_core::{App, ClientConfig, Dispatch, Reply, RequestId};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use command::{Command, HELP};

/// Two-tab posts browser over a JSON `/posts` API
#[derive(Parser)]
#[command(name = "posts-app", version, about)]
struct Cli {
    /// API base URL
    #[arg(long, env = "POSTS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "POSTS_TIMEOUT_MS", default_value = "1000")]
    timeout_ms: u64,
}

type ReplyTx = mpsc::UnboundedSender<(RequestId, Reply)>;

#[tokio::main]
async fn main() -> Result<()> {
    // Stdout carries the UI; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config =
        ClientConfig::new(&cli.base_url).with_timeout(Duration::from_millis(cli.timeout_ms));
    tracing::info!(base_url = %config.base_url, timeout = ?config.timeout, "starting");

    let mut app = App::new(config);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}\n");
    spawn_all(&tx, app.start());
    show(&app);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(Command::Help) => println!("{HELP}"),
                    Ok(cmd) => apply(&mut app, &tx, cmd),
                    Err(e) => println!("{e}"),
                }
            }
            Some((id, reply)) = rx.recv() => {
                let Some(completion) = app.complete(id, reply) else {
                    continue;
                };
                if let Some(outcome) = completion.outcome.as_ref().filter(|o| o.is_failure()) {
                    tracing::warn!("{}", render::describe(outcome));
                }
                spawn_all(&tx, completion.dispatches);
            }
        }
        show(&app);
    }

    tracing::info!(in_flight = app.in_flight(), "shutting down");
    app.shutdown();
    Ok(())
}

fn apply(app: &mut App, tx: &ReplyTx, cmd: Command) {
    let dispatched = match cmd {
        Command::Tab(tab) => Ok(app.select_tab(tab)),
        Command::Focus => Ok(app.resume()),
        Command::Title(text) => {
            app.set_draft_title(&text);
            Ok(Vec::new())
        }
        Command::Body(text) => {
            app.set_draft_body(&text);
            Ok(Vec::new())
        }
        Command::EditTitle(text) => {
            app.set_edit_title(&text);
            Ok(Vec::new())
        }
        Command::EditBody(text) => {
            app.set_edit_body(&text);
            Ok(Vec::new())
        }
        Command::Cancel => {
            app.cancel_edit();
            Ok(Vec::new())
        }
        Command::Edit(id) => app.begin_edit(id).map(|()| Vec::new()),
        Command::Create => app.submit_create().map(|d| vec![d]),
        Command::Update => app.submit_update().map(|d| vec![d]),
        Command::Delete(id) => app.submit_delete(id).map(|d| vec![d]),
        Command::Show | Command::Help | Command::Quit => Ok(Vec::new()),
    };

    match dispatched {
        Ok(dispatches) => spawn_all(tx, dispatches),
        Err(rejected) => println!("rejected: {rejected}"),
    }
}

/// Run each request on a blocking worker and report back on `tx`.
fn spawn_all(tx: &ReplyTx, dispatches: Vec<Dispatch>) {
    for dispatch in dispatches {
        tracing::debug!(id = %dispatch.id, operation = %dispatch.operation, "dispatching");
        let tx = tx.clone();
        tokio::task::spawn_blocking(move || {
            let reply = executor::execute(&dispatch.request);
            if let Err(e) = &reply {
                tracing::debug!(id = %dispatch.id, error = %e, "request failed");
            }
            // The receiver is gone once the loop has exited.
            let _ = tx.send((dispatch.id, reply));
        });
    }
}

fn show(app: &App) {
    println!("{}", render::render(app.active_tab(), &app.view()));
}

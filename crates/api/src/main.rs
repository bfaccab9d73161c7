//! UserDesk - console front-end for the user directory
//!
//! Loads `.env` and configuration, wires the application context, and reads
//! commands from stdin. Auth signals are rendered by a background task.

#![allow(clippy::print_stdout)]

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tracing::{debug, info, warn};
use userdesk_core::AuthSignal;
use userdesk_domain::{StrategyKind, UserDeskError, UserRecord};
use userdesk_lib::console::{parse_line, ConsoleCommand, USAGE};
use userdesk_lib::utils::logging::init_logging;
use userdesk_lib::{commands, AppContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Read .env before logging so RUST_LOG from the file applies
    let dotenv = dotenvy::dotenv();
    init_logging()?;
    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(e) => debug!(error = %e, "No .env file loaded"),
    }

    let config = userdesk_infra::config::load()?;
    let ctx = Arc::new(AppContext::new(config)?);
    info!("UserDesk starting...");

    // Subscribe before initialize so the first signal is not missed
    let watcher = tokio::spawn(watch_signals(Arc::clone(&ctx), ctx.auth.subscribe()));

    if let Err(err) = commands::initialize(&ctx).await {
        warn!(error = %err, "Session restore failed");
    }

    run_console(&ctx).await?;

    watcher.abort();
    info!("UserDesk stopped");
    Ok(())
}

async fn run_console(ctx: &AppContext) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        match command {
            ConsoleCommand::Quit => break,
            ConsoleCommand::Help => println!("{USAGE}"),
            ConsoleCommand::WhoAmI => {
                let status = commands::session_status(ctx);
                match status.identity {
                    Some(identity) => println!("{identity} ({} sign-in)", status.strategy),
                    None => println!("Not signed in ({})", status.state),
                }
            }
            // Other outcomes of login/logout arrive as signals
            ConsoleCommand::Login(credentials) => {
                if let Err(err @ UserDeskError::Conflict(_)) =
                    commands::login(ctx, credentials).await
                {
                    println!("{err}");
                }
            }
            ConsoleCommand::Logout => {
                if let Err(err @ UserDeskError::Conflict(_)) = commands::logout(ctx).await {
                    println!("{err}");
                }
            }
            ConsoleCommand::Users => match commands::list_users(ctx).await {
                Ok(users) => print_users(&users),
                Err(err) => println!("{err}"),
            },
            ConsoleCommand::Add(input) => match commands::save_user(ctx, None, input).await {
                Ok(saved) => println!("{}", saved.message),
                Err(err) => println!("{err}"),
            },
            ConsoleCommand::Edit(id, input) => {
                match commands::save_user(ctx, Some(id), input).await {
                    Ok(saved) => println!("{}", saved.message),
                    Err(err) => println!("{err}"),
                }
            }
            ConsoleCommand::Delete(id) => match commands::delete_user(ctx, id).await {
                Ok(message) => println!("{message}"),
                Err(err) => println!("{err}"),
            },
        }
    }
    Ok(())
}

async fn watch_signals(ctx: Arc<AppContext>, mut signals: Receiver<AuthSignal>) {
    loop {
        match signals.recv().await {
            Ok(AuthSignal::SessionEstablished { identity }) => {
                println!("Signed in as {identity}");
                match commands::list_users(&ctx).await {
                    Ok(users) => print_users(&users),
                    Err(err) => println!("{err}"),
                }
            }
            Ok(AuthSignal::SessionEnded) => println!("Signed out."),
            Ok(AuthSignal::LoginRequired) => match ctx.auth.strategy_kind() {
                StrategyKind::Local => println!("Please sign in: login <user> <password>"),
                StrategyKind::Delegated => {
                    println!("Please sign in: type 'login' to open the browser");
                }
            },
            Ok(AuthSignal::AuthError { message }) => println!("{message}"),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Signal watcher lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_users(users: &[UserRecord]) {
    if users.is_empty() {
        println!("No users found.");
        return;
    }
    println!("{:>5}  {:<24} {:<32} {}", "ID", "NAME", "EMAIL", "PHONE");
    for user in users {
        println!("{:>5}  {:<24} {:<32} {}", user.id, user.name, user.email, user.phone);
    }
}

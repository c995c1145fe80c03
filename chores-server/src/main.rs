//! Household chore board server.
//!
//! Serves the chore rotation board over HTTP/JSON and rolls tasks over at
//! day, week, and month boundaries in the background.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:8080 with the built-in household
//! cargo run --bin chores-server
//!
//! # Custom address and household file
//! cargo run --bin chores-server -- --bind 127.0.0.1:3000 --household house.toml
//!
//! # Or via environment variables
//! CHORES_ADDR=127.0.0.1:3000 CHORES_DATA=/var/lib/chores/board.bin cargo run --bin chores-server
//! ```

use std::path::Path;
use std::sync::Arc;

use chores::Board;
use chores::auth::AssigneeAuthorizer;
use chores::clock::SystemClock;
use chores::persistence::FilePersistence;
use chores_server::api;
use chores_server::config::{ServerCliArgs, ServerConfig};
use chores_server::state::AppState;
use chores_server::ticker;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

/// Initialize logging to stdout, or to `file_path` when given.
///
/// Returns a [`WorkerGuard`] when logging to a file; it must be held until
/// shutdown so buffered entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let Some((log_dir, file_name)) = file_path.and_then(|path| {
        let dir = path.parent()?;
        let name = path.file_name()?.to_str()?;
        Some((dir, name))
    }) else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
        return None;
    };

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let _guard = init_logging(&config.log_level, config.log_file.as_deref());

    let (store, users) = match (config.household.task_store(), config.household.users()) {
        (Ok(store), Ok(users)) => (store, users),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!(error = %e, "invalid household configuration");
            std::process::exit(1);
        }
    };

    tracing::info!(
        data_file = %config.data_file.display(),
        residents = store.roster().residents().len(),
        users = users.len(),
        "opening chore board"
    );

    let board = match Board::open(
        store,
        users,
        Arc::new(SystemClock),
        Arc::new(AssigneeAuthorizer),
        Arc::new(FilePersistence::new(&config.data_file)),
    ) {
        Ok(board) => board,
        Err(e) => {
            tracing::error!(error = %e, "failed to open chore board");
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState::new(board));
    let ticker = ticker::spawn(Arc::clone(&state), config.rollover_interval);

    match api::start_server_with_state(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "chore board listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "api server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, addr = %config.bind_addr, "failed to start api server");
            std::process::exit(1);
        }
    }
    ticker.abort();
}

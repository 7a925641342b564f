//! Choropleth map server: one JSON-RPC request per stdin line, one response per stdout line.
//!
//! Usage: map_server <boundary_dir> [options.json]
//!
//! Map events are written after each response as `mapEvent` notifications.
//! Logs go to stderr; set RUST_LOG to choose the level.

use choropleth::config::MapOptions;
use choropleth::server::{dispatch, error_codes, Notification, Request, Response, ServerState};
use choropleth::source::DirectoryStore;
use std::env;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let boundary_root = args.next().unwrap_or_else(|| ".".to_string());
    let options = match args.next() {
        Some(path) => {
            let text = std::fs::read_to_string(&path)?;
            MapOptions::from_json(&text)?
        }
        None => MapOptions::default(),
    };

    tracing::info!("[Map Server] Starting, boundary files under {}", boundary_root);
    let mut state = ServerState::new(options, Box::new(DirectoryStore::new(boundary_root)));

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::error!("[Map Server] Error reading stdin: {}", e);
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                tracing::debug!("[Map Server] {}", request.method);
                dispatch(&mut state, request)
            }
            Err(e) => {
                tracing::warn!("[Map Server] Failed to parse request: {}", e);
                Response::error(None, error_codes::PARSE_ERROR, format!("Parse error: {}", e))
            }
        };

        writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
        for event in state.drain_events() {
            writeln!(stdout, "{}", serde_json::to_string(&Notification::new("mapEvent", event))?)?;
        }
        stdout.flush()?;
    }

    tracing::info!("[Map Server] Shutting down...");
    Ok(())
}

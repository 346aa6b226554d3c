mod config;
mod db;
mod filters;
mod forms;
mod ipc;
mod marks;
mod messaging;
mod pipeline;
mod ratelimit;
mod record;
mod search;
mod sort;
mod view;

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Instant;

use serde_json::json;

fn write_line(out: &mut impl Write, value: &serde_json::Value) {
    let _ = writeln!(
        out,
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{\"ok\":false}".to_string())
    );
}

fn write_events(out: &mut impl Write, state: &mut ipc::AppState) {
    for event in state.take_events() {
        write_line(out, &event);
    }
}

fn main() {
    let config = config::DaemonConfig::from_env();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| config::DEFAULT_LOG_FILTER.into()),
        )
        .with_writer(io::stderr)
        .init();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        search_debounce_ms = config.search_debounce.as_millis() as u64,
        "rosterd starting"
    );

    let mut state = ipc::AppState::new(config.clone());
    if let Some(ws) = config.workspace.as_deref() {
        if let Err(e) = ipc::select_workspace(&mut state, ws) {
            tracing::error!(workspace = %ws.display(), error = ?e, "startup workspace failed to open");
        }
    }

    // stdin is read on its own thread so the loop can wake for debounce deadlines.
    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut stdout = io::stdout();
    loop {
        let next = match ipc::pending_deadline(&state) {
            Some(deadline) => {
                match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(line) => Some(line),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match rx.recv() {
                Ok(line) => Some(line),
                Err(_) => break,
            },
        };

        let Some(line) = next else {
            ipc::flush_due(&mut state, Instant::now());
            write_events(&mut stdout, &mut state);
            let _ = stdout.flush();
            continue;
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to answer to.
                tracing::warn!(error = %e, "malformed request line");
                write_line(
                    &mut stdout,
                    &json!({ "ok": false, "error": { "code": "bad_json", "message": e.to_string() } }),
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        write_line(&mut stdout, &resp);
        write_events(&mut stdout, &mut state);
        let _ = stdout.flush();
    }

    if let Some(deadline) = ipc::pending_deadline(&state) {
        ipc::flush_due(&mut state, deadline);
        write_events(&mut stdout, &mut state);
        let _ = stdout.flush();
    }
    tracing::info!("stdin closed, exiting");
}

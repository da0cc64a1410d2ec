mod backup;
mod card;
mod config;
mod db;
mod error;
mod ipc;
mod ledger;
mod model;
mod roster;
mod session;
mod stats;
mod sync;
mod tracker;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use env_logger::Env;

const LOG_ENV: &str = "ASISTENCIAD_LOG";
const WORKSPACE_ENV: &str = "ASISTENCIAD_WORKSPACE";

fn main() {
    // stdout carries the protocol; logs go to stderr.
    env_logger::Builder::from_env(Env::new().filter_or(LOG_ENV, "info"))
        .target(env_logger::Target::Stderr)
        .init();

    let tracker: sync::SharedTracker = Arc::new(Mutex::new(None));
    let syncer = Arc::new(sync::Syncer::new(
        tracker.clone(),
        Box::new(sync::HttpTransport::new()),
    ));
    let scheduler = match sync::SyncScheduler::spawn(
        syncer.clone(),
        sync::AUTO_SYNC_INTERVAL,
        sync::DEFERRED_SYNC_DELAY,
    ) {
        Ok(s) => Some(s),
        Err(e) => {
            log::error!("automatic sync disabled: {:#}", e);
            None
        }
    };

    let mut state = ipc::AppState {
        workspace: None,
        tracker,
        session: None,
        syncer,
        scheduler,
        reader: Box::new(card::DeviceReader::from_env()),
    };

    if let Some(path) = std::env::var_os(WORKSPACE_ENV).filter(|v| !v.is_empty()) {
        let path = PathBuf::from(path);
        if let Err(e) = ipc::handlers::core::select_workspace(&mut state, &path) {
            log::error!("failed to open {}: {:#}", path.to_string_lossy(), e);
        }
    }
    log::info!(
        "asistenciad {} ready (nfc: {})",
        env!("CARGO_PKG_VERSION"),
        state.reader.available()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                let resp = ipc::error::err("", "bad_json", e.to_string(), None);
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        log::debug!("request {} {}", req.id, req.method);
        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    if let Some(scheduler) = state.scheduler.take() {
        scheduler.shutdown();
    }
    log::info!("stdin closed; exiting");
}

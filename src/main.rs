mod analytics;
mod calc;
mod cli;
mod dates;
mod db;
mod engine;
mod error;
mod ipc;
mod logging;
mod model;
mod report;
mod share;
mod store;

use std::io::{self, BufRead, Write};

use clap::Parser;
use tracing::{error, info, warn};

use crate::dates::{Clock, FixedClock, SystemClock};

fn write_line(stdout: &mut impl Write, resp: &serde_json::Value) {
    let _ = writeln!(
        stdout,
        "{}",
        serde_json::to_string(resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
    );
    let _ = stdout.flush();
}

fn main() {
    let args = cli::Cli::parse();
    logging::init(args.verbose);

    let clock: Box<dyn Clock> = match args.today {
        Some(day) => {
            info!(today = %day, "clock pinned");
            Box::new(FixedClock(day))
        }
        None => Box::new(SystemClock),
    };
    let mut state = ipc::AppState::new(clock, args.outbox);

    if let Some(path) = args.workspace {
        match db::open_db(&path) {
            Ok(conn) => {
                info!(workspace = %path.display(), "workspace opened");
                state.workspace = Some(path);
                state.db = Some(conn);
            }
            // Keep serving; clients can still call workspace.select.
            Err(e) => error!(workspace = %path.display(), error = ?e, "failed to open workspace"),
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "stdin closed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to echo back.
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                write_line(&mut stdout, &resp);
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        write_line(&mut stdout, &resp);
    }
}

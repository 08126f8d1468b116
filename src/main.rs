mod config;
mod controller;
mod forms;
mod ipc;
mod logging;
mod resources;
mod session;
mod transport;

use std::io::{self, BufRead, Write};

use clap::Parser;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::transport::HttpTransport;

fn main() -> anyhow::Result<()> {
    let config = AppConfig::parse();
    logging::init(config.log_json);

    let transport = HttpTransport::new(&config.api_base_url, config.timeout())?;
    let mut state = ipc::AppState::new(transport.base_url().to_string(), Box::new(transport));
    info!(api = %state.api_base_url, "schoold ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, "stdin closed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // no id to answer to
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                writeln!(stdout, "{}", resp)?;
                stdout.flush()?;
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        writeln!(stdout, "{}", resp)?;
        stdout.flush()?;
    }
    Ok(())
}

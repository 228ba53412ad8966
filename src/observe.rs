//! Observer client for the score feed.
//!
//! Connects to a running scorer as an observer, performs the hello handshake
//! and delivers server events over a channel. Used by the `observe`
//! subcommand; intentionally synchronous (a reader thread and an mpsc) so the
//! consumer stays a plain blocking loop.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::mpsc;
use std::thread;

use anyhow::{anyhow, Result};

use crate::adapter::protocol::{
    create_hello, ObservationMessage, RequestedRole, PROTOCOL_VERSION,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserveConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub enum ObserveEvent {
    Welcome,
    Observation(ObservationMessage),
    Error(String),
    Closed,
}

/// Parse `observe [--host H] [--port P]`; None if args are not the observe
/// subcommand.
pub fn parse_observe_args(args: &[String]) -> Result<Option<ObserveConfig>> {
    if args.is_empty() || args[0] != "observe" {
        return Ok(None);
    }

    let mut host = String::from("127.0.0.1");
    let mut port: u16 = 7313;
    let mut i = 1usize;
    while i < args.len() {
        match args[i].as_str() {
            "--host" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("observe: missing value for --host"))?;
                host = v.clone();
            }
            "--port" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("observe: missing value for --port"))?;
                port = v
                    .parse::<u16>()
                    .map_err(|_| anyhow!("observe: invalid --port value: {}", v))?;
            }
            other => {
                return Err(anyhow!("observe: unknown argument: {}", other));
            }
        }
        i += 1;
    }

    Ok(Some(ObserveConfig { host, port }))
}

/// Connect as an observer and stream events from the server.
pub fn connect_observer(config: &ObserveConfig) -> Result<mpsc::Receiver<ObserveEvent>> {
    let mut stream = TcpStream::connect((config.host.as_str(), config.port)).map_err(|e| {
        anyhow!(
            "observe: connect {}:{} failed: {}",
            config.host,
            config.port,
            e
        )
    })?;
    stream
        .set_nodelay(true)
        .map_err(|e| anyhow!("observe: set_nodelay failed: {}", e))?;

    let mut hello = create_hello(1, "tenpin-observe", PROTOCOL_VERSION);
    hello.requested.stream_scores = true;
    hello.requested.role = Some(RequestedRole::Observer);
    let line = serde_json::to_string(&hello)?;
    stream.write_all(line.as_bytes())?;
    stream.write_all(b"\n")?;
    stream.flush()?;

    let (tx, rx) = mpsc::channel::<ObserveEvent>();
    thread::spawn(move || {
        let reader = BufReader::new(stream);
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    let _ = tx.send(ObserveEvent::Error(format!("observe: read error: {}", e)));
                    let _ = tx.send(ObserveEvent::Closed);
                    return;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            if let Some(event) = parse_server_line(&line) {
                let _ = tx.send(event);
            }
        }
        let _ = tx.send(ObserveEvent::Closed);
    });

    Ok(rx)
}

fn parse_server_line(line: &str) -> Option<ObserveEvent> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    match value.get("type").and_then(|t| t.as_str()) {
        Some("welcome") => Some(ObserveEvent::Welcome),
        Some("observation") => serde_json::from_str::<ObservationMessage>(line)
            .ok()
            .map(ObserveEvent::Observation),
        Some("error") => {
            let message = value
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error");
            Some(ObserveEvent::Error(message.to_string()))
        }
        _ => None,
    }
}

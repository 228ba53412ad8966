//! Ten-pin scorer binary (default entrypoint).
//!
//! Reads pin counts from stdin (one per line or whitespace-separated) and,
//! when the adapter is enabled, from a remote controller client. Every
//! accepted roll is logged as a state transition and broadcast to streaming
//! observers. `tenpin observe [--host H] [--port P]` runs the observer side
//! instead.

use std::io::{self, BufRead};
use std::sync::mpsc::{self, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use log::{info, warn};

use tenpin::adapter::protocol::{create_ack, create_error, create_observation, ErrorCode};
use tenpin::adapter::{Adapter, OutboundMessage};
use tenpin::core::{BowlingGame, GameSnapshot};
use tenpin::observe::{self, ObserveConfig, ObserveEvent};
use tenpin::types::{RollError, RollEvent, RollKind};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Some(config) = observe::parse_observe_args(&args)? {
        return run_observer(&config);
    }

    run_scorer()
}

fn run_observer(config: &ObserveConfig) -> Result<()> {
    let events = observe::connect_observer(config)?;
    info!("observing {}:{}", config.host, config.port);

    for event in events {
        match event {
            ObserveEvent::Welcome => info!("connected as observer"),
            ObserveEvent::Observation(obs) => {
                println!(
                    "frame {:2}  {:<11}  score {:3}{}",
                    obs.frame,
                    obs.phase.as_str(),
                    obs.score,
                    if obs.finished { "  (final)" } else { "" }
                );
                if obs.finished {
                    break;
                }
            }
            ObserveEvent::Error(message) => warn!("{}", message),
            ObserveEvent::Closed => break,
        }
    }
    Ok(())
}

fn run_scorer() -> Result<()> {
    let mut game = BowlingGame::new();
    let mut adapter = Adapter::start_from_env();
    if adapter.is_none() {
        info!("adapter disabled, scoring stdin only");
    }

    let stdin_rx = spawn_stdin_reader();
    let mut snapshot = GameSnapshot::default();
    let mut obs_seq: u64 = 0;
    let mut stdin_open = true;

    while !game.is_finished() {
        let mut idle = true;

        match stdin_rx.try_recv() {
            Ok(token) => {
                idle = false;
                match token.parse::<u8>() {
                    Ok(pins) => {
                        if score_roll(&mut game, pins).is_ok() {
                            broadcast(&game, adapter.as_ref(), &mut snapshot, &mut obs_seq);
                        }
                    }
                    Err(_) => warn!("ignoring non-numeric input: {:?}", token),
                }
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                if stdin_open {
                    stdin_open = false;
                    info!("stdin closed");
                }
                if adapter.is_none() {
                    break;
                }
            }
        }

        // Drain pending remote rolls first, then apply outside the borrow.
        let mut pending = Vec::new();
        if let Some(ad) = adapter.as_mut() {
            while let Some(roll) = ad.try_recv() {
                pending.push(roll);
            }
        }
        for roll in pending {
            idle = false;
            match score_roll(&mut game, roll.pins) {
                Ok(_) => {
                    reply(adapter.as_ref(), roll.client_id, &create_ack(roll.seq));
                    broadcast(&game, adapter.as_ref(), &mut snapshot, &mut obs_seq);
                }
                Err(e) => {
                    let code = match e {
                        RollError::GameFinished => ErrorCode::GameFinished,
                        _ => ErrorCode::InvalidRoll,
                    };
                    let err = create_error(roll.seq, code, &e.to_string());
                    reply(adapter.as_ref(), roll.client_id, &err);
                }
            }
        }

        if idle {
            thread::sleep(Duration::from_millis(10));
        }
    }

    if game.is_finished() {
        println!("final score: {}", game.score());
    } else {
        println!("score after {} rolls: {}", game.rolls().len(), game.score());
    }
    Ok(())
}

/// Apply one roll and log the transition.
fn score_roll(game: &mut BowlingGame, pins: u8) -> Result<RollEvent, RollError> {
    let before = game.phase();
    let result = game.roll(pins);
    match result {
        Ok(event) => {
            let tag = match event.kind {
                RollKind::Strike => "STRIKE",
                RollKind::Spare => "SPARE",
                RollKind::Bonus => "bonus",
                RollKind::Open => "",
            };
            info!(
                "{:>11} -> {:>11}   roll: {:2} ==> score: {:3}   {}",
                before.as_str(),
                game.phase().as_str(),
                event.pins,
                event.score,
                tag
            );
        }
        Err(e) => warn!("roll {} rejected: {}", pins, e),
    }
    result
}

/// Send a targeted reply (ack or error) back through the adapter.
fn reply<T: serde::Serialize>(adapter: Option<&Adapter>, client_id: u64, msg: &T) {
    let Some(adapter) = adapter else {
        return;
    };
    match serde_json::to_string(msg) {
        Ok(line) => adapter.send(OutboundMessage::ToClient { client_id, line }),
        Err(e) => warn!("failed to serialize reply: {}", e),
    }
}

fn broadcast(
    game: &BowlingGame,
    adapter: Option<&Adapter>,
    snapshot: &mut GameSnapshot,
    obs_seq: &mut u64,
) {
    let Some(adapter) = adapter else {
        return;
    };

    *obs_seq += 1;
    game.snapshot_into(snapshot);
    let obs = create_observation(*obs_seq, snapshot);
    match serde_json::to_string(&obs) {
        Ok(line) => adapter.send(OutboundMessage::Broadcast { line }),
        Err(e) => warn!("failed to serialize observation: {}", e),
    }
}

/// Read whitespace-separated pin counts from stdin on a dedicated thread.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            for token in line.split_whitespace() {
                if tx.send(token.to_string()).is_err() {
                    return;
                }
            }
        }
    });
    rx
}

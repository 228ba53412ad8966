//! Adapter runtime integration.
//!
//! Bridges the sync game loop with the async TCP server.

use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use crate::adapter::server::{run_server, ServerConfig, ServerState};

/// Roll delivered to the game loop by a controller client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundRoll {
    pub client_id: u64,
    pub seq: u64,
    pub pins: u8,
}

/// Outbound message to be delivered by the server.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    ToClient { client_id: u64, line: String },
    Broadcast { line: String },
}

/// Running adapter instance.
pub struct Adapter {
    _rt: Runtime,
    roll_rx: mpsc::Receiver<InboundRoll>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl Adapter {
    /// Start the adapter from environment variables.
    ///
    /// Returns None if `TENPIN_DISABLED` is set or the runtime cannot start.
    pub fn start_from_env() -> Option<Self> {
        if ServerState::is_disabled() {
            return None;
        }

        let config = ServerConfig::from_env();
        let max_pending = config.max_pending_rolls.max(1);
        let (roll_tx, roll_rx) = mpsc::channel::<InboundRoll>(max_pending);
        let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();

        let rt = Runtime::new().ok()?;
        rt.spawn(async move {
            if let Err(e) = run_server(config, roll_tx, out_rx, None).await {
                log::error!("adapter server exited: {}", e);
            }
        });

        Some(Self {
            _rt: rt,
            roll_rx,
            out_tx,
        })
    }

    /// Poll for the next pending roll from the controller (non-blocking).
    pub fn try_recv(&mut self) -> Option<InboundRoll> {
        self.roll_rx.try_recv().ok()
    }

    pub fn send(&self, msg: OutboundMessage) {
        let _ = self.out_tx.send(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_disabled() {
        std::env::set_var("TENPIN_DISABLED", "1");
        let adapter = Adapter::start_from_env();
        assert!(adapter.is_none());
        std::env::remove_var("TENPIN_DISABLED");
    }
}

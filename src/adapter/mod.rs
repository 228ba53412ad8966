//! Adapter module - remote roll producers and score consumers
//!
//! External clients feed rolls and watch the score over a TCP socket using a
//! JSON line protocol. The core never sees any of this; the game loop applies
//! rolls serially regardless of where they came from.

pub mod protocol;
pub mod runtime;
pub mod server;

pub use runtime::{Adapter, InboundRoll, OutboundMessage};

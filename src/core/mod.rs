//! Core module - pure scoring logic
//!
//! The scoring state machine, its reference recurrence, snapshots for
//! observers, and deterministic sequence generation for tests. No I/O and no
//! dependencies on the adapter layer.

pub mod fold;
pub mod game;
pub mod rng;
pub mod snapshot;

// Re-export commonly used types
pub use fold::{fold_score, FoldState};
pub use game::BowlingGame;
pub use rng::{GameGen, SimpleRng};
pub use snapshot::GameSnapshot;

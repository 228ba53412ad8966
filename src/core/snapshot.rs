use crate::types::{Phase, RollEvent, MAX_ROLLS};

/// Point-in-time copy of a game, cheap to hand to observers.
///
/// Plain data with fixed-size storage; `BowlingGame::snapshot_into` fills it
/// without allocating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSnapshot {
    pub score: u32,
    /// Current frame, clamped to 10 during the bonus stage.
    pub frame: u8,
    pub roll_in_frame: u8,
    pub phase: Phase,
    pub finished: bool,
    pub spare_pending: bool,
    pub strike_next: u8,
    pub strike_after: u8,
    pub bonus_rolls_left: u8,
    pub rolls: [u8; MAX_ROLLS],
    pub roll_count: u8,
    pub last_event: Option<RollEvent>,
}

impl GameSnapshot {
    /// Accepted rolls, in order.
    pub fn rolls(&self) -> &[u8] {
        &self.rolls[..self.roll_count as usize]
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            score: 0,
            frame: 1,
            roll_in_frame: 1,
            phase: Phase::FirstRoll,
            finished: false,
            spare_pending: false,
            strike_next: 0,
            strike_after: 0,
            bonus_rolls_left: 0,
            rolls: [0u8; MAX_ROLLS],
            roll_count: 0,
            last_event: None,
        }
    }
}

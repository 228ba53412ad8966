//! Windowed-multiplier fold over a roll sequence
//!
//! A mathematically equivalent formulation of the scoring rules: the score is
//! a fold over the rolls with six registers (running score, roll index
//! 1..=21 where strikes skip an index, the multipliers for the current, next
//! and next-next rolls, and the previous roll value). A strike bumps the next
//! two multiplier registers, a spare the next one, and the window shifts down
//! one position after every roll.
//!
//! This is NOT a second production path. It exists as an independent
//! recurrence for differential testing against [`BowlingGame`] and for
//! benches; the test suite asserts both agree after every roll of randomly
//! generated games.
//!
//! [`BowlingGame`]: crate::core::game::BowlingGame

use crate::types::ALL_PINS;

/// Accumulator threaded by value through the fold; no shared context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldState {
    pub score: u32,
    /// Virtual roll index 1..=21. Strikes consume both of a frame's slots.
    pub roll_index: u8,
    /// Multiplier applied to the current roll's pins.
    pub mult_now: u8,
    /// Multiplier owed to the next roll.
    pub mult_next: u8,
    /// Multiplier owed to the roll after the next.
    pub mult_after: u8,
    /// Previous roll's pins within the current frame (0 at frame start).
    pub prev_pins: u8,
}

impl FoldState {
    pub fn new() -> Self {
        Self {
            score: 0,
            roll_index: 1,
            mult_now: 1,
            mult_next: 1,
            mult_after: 1,
            prev_pins: 0,
        }
    }

    /// Fold one roll into the accumulator.
    ///
    /// Assumes a valid sequence (the caller validates); ordering mirrors the
    /// recurrence: score with the current multiplier, bump the forward
    /// registers, advance the index, then shift the window.
    pub fn apply(self, pins: u8) -> Self {
        let strike = self.is_strike(pins);
        let spare = self.is_spare(pins);

        let score = self.score + u32::from(self.mult_now) * u32::from(pins);
        let mult_next = self.mult_next + u8::from(strike || spare);
        let mult_after = self.mult_after + u8::from(strike);
        let prev_pins = if self.first_of_frame() && pins != ALL_PINS {
            pins
        } else {
            0
        };
        let roll_index = self.roll_index + if strike { 2 } else { 1 };

        // Past index 20 only the final bonus roll remains; the window
        // collapses to identity.
        let in_window = roll_index <= 20;
        Self {
            score,
            roll_index,
            mult_now: if in_window { mult_next } else { 1 },
            mult_next: if in_window { mult_after } else { 1 },
            mult_after: 1,
            prev_pins,
        }
    }

    fn first_of_frame(&self) -> bool {
        self.roll_index % 2 == 1
    }

    fn is_strike(&self, pins: u8) -> bool {
        // The tenth frame starts at index 19; its marks earn bonus rolls,
        // not multipliers.
        self.first_of_frame() && pins == ALL_PINS && self.roll_index < 19
    }

    fn is_spare(&self, pins: u8) -> bool {
        // Last multiplier-earning spare sits at index 18.
        !self.first_of_frame() && self.prev_pins + pins == ALL_PINS && self.roll_index < 20
    }
}

impl Default for FoldState {
    fn default() -> Self {
        Self::new()
    }
}

/// Fold a whole roll sequence and return the final score.
pub fn fold_score(rolls: &[u8]) -> u32 {
    rolls
        .iter()
        .fold(FoldState::new(), |state, &pins| state.apply(pins))
        .score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_frames() {
        assert_eq!(fold_score(&[5, 3]), 8);
        assert_eq!(fold_score(&[1; 20]), 20);
    }

    #[test]
    fn test_perfect_game() {
        assert_eq!(fold_score(&[10; 12]), 300);
    }

    #[test]
    fn test_strike_runs() {
        assert_eq!(fold_score(&[10, 10, 10, 2, 3]), 72);
        assert_eq!(fold_score(&[10, 1, 2, 10, 1, 2, 10, 1, 2, 10, 1, 2, 10, 1, 2]), 80);
    }

    #[test]
    fn test_spares() {
        assert_eq!(fold_score(&[4, 6, 7]), 24);
        assert_eq!(fold_score(&[0, 10, 5]), 20);
    }

    #[test]
    fn test_tenth_frame_marks_count_bonus_rolls_once() {
        let mut nine_frames = Vec::new();
        for _ in 0..9 {
            nine_frames.extend_from_slice(&[2, 5]);
        }

        let mut rolls = nine_frames.clone();
        rolls.extend_from_slice(&[2, 8, 7]);
        assert_eq!(fold_score(&rolls), 80);

        let mut rolls = nine_frames;
        rolls.extend_from_slice(&[10, 8, 2]);
        assert_eq!(fold_score(&rolls), 83);
    }

    #[test]
    fn test_multiplier_window_shifts() {
        let mut state = FoldState::new();
        state = state.apply(10);
        assert_eq!(state.mult_now, 2);
        assert_eq!(state.mult_next, 2);
        assert_eq!(state.mult_after, 1);
        assert_eq!(state.roll_index, 3);

        state = state.apply(10);
        // Overlapping strikes accumulate on the next roll.
        assert_eq!(state.mult_now, 3);
        assert_eq!(state.score, 30);
    }
}

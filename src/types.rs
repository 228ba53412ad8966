//! Core types shared across the application
//! Pure data types plus the roll error taxonomy

use thiserror::Error;

/// Pins standing on a fresh rack
pub const ALL_PINS: u8 = 10;

/// Frames in a regulation game
pub const LAST_FRAME: u8 = 10;

/// Roll indices within a frame
pub const ROLL_ONE: u8 = 1;
pub const ROLL_TWO: u8 = 2;

/// Bonus rolls granted by a tenth-frame mark
pub const STRIKE_BONUS_ROLLS: u8 = 2;
pub const SPARE_BONUS_ROLLS: u8 = 1;

/// A game never accepts more rolls than this (20 frame rolls + 1 bonus,
/// or 19 frame rolls + 2 bonus after a tenth-frame strike).
pub const MAX_ROLLS: usize = 21;

/// Perfect game score
pub const MAX_SCORE: u32 = 300;

/// Logical phase of the scoring machine, derived from the counters on each
/// call and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Frame <= 10, next roll opens the frame
    FirstRoll,
    /// Frame <= 10, the frame's first roll was not a strike
    SecondRoll,
    /// All ten frames played, a tenth-frame mark left bonus rolls to take
    BonusRoll,
    /// Terminal; further rolls are rejected
    GameOver,
}

impl Phase {
    /// Convert to lowercase string (wire/log form)
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::FirstRoll => "first_roll",
            Phase::SecondRoll => "second_roll",
            Phase::BonusRoll => "bonus_roll",
            Phase::GameOver => "game_over",
        }
    }
}

/// What a single accepted roll did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RollKind {
    /// Frame roll that completed no mark
    Open,
    /// All pins on a frame's first roll
    Strike,
    /// Frame total reached ten on the second roll
    Spare,
    /// Tenth-frame bonus roll
    Bonus,
}

impl RollKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RollKind::Open => "open",
            RollKind::Strike => "strike",
            RollKind::Spare => "spare",
            RollKind::Bonus => "bonus",
        }
    }
}

/// Outcome of one accepted roll (consumed by loggers and the adapter's
/// observation stream).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RollEvent {
    /// Pins knocked down by this roll
    pub pins: u8,
    /// Frame the roll was credited to (bonus rolls report the tenth)
    pub frame: u8,
    /// Roll index within the frame; bonus index in the bonus stage
    pub roll_in_frame: u8,
    pub kind: RollKind,
    /// Points this roll added, bonuses paid now included
    pub awarded: u32,
    /// Running total after the roll
    pub score: u32,
}

/// Why a roll was rejected. Rejected rolls never mutate game state.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RollError {
    /// The terminal state was reached; the caller must start a new game.
    #[error("end of game: no further rolls accepted")]
    GameFinished,
    /// Pin count outside the physical range.
    #[error("invalid roll: {pins} pins is outside 0..=10")]
    InvalidPins { pins: u8 },
    /// Two rolls on one rack cannot take down more than ten pins.
    #[error("invalid roll: {first} + {second} pins exceeds one rack")]
    FrameOverflow { first: u8, second: u8 },
}

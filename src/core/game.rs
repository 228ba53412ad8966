//! Game module - the bowling scoring state machine
//!
//! Owns the complete state of one game and applies rolls one at a time.
//! The four logical phases (first roll, second roll, bonus roll, game over)
//! are derived from the stored counters on every call, never stored.
//!
//! Bonus bookkeeping note: a strike owes a bonus to each of the next two
//! rolls, and back-to-back strikes overlap, so a single pending counter
//! cannot represent what is owed (one roll can be owed twice). The machine
//! carries a two-register window instead: `strike_next` multiplies the next
//! roll, `strike_after` the roll after that, and the window shifts down one
//! position as each roll is consumed.

use arrayvec::ArrayVec;

use crate::core::snapshot::GameSnapshot;
use crate::types::{
    Phase, RollError, RollEvent, RollKind, ALL_PINS, LAST_FRAME, MAX_ROLLS, ROLL_ONE, ROLL_TWO,
    SPARE_BONUS_ROLLS, STRIKE_BONUS_ROLLS,
};

/// Complete state of one scoring run.
///
/// Single-owner and synchronous: each roll is applied fully before the next
/// is accepted. Score many games concurrently by creating one instance per
/// game; nothing is shared.
#[derive(Debug, Clone)]
pub struct BowlingGame {
    /// Cumulative points resolved so far.
    score: u32,
    /// Frame about to receive a roll (1..=10; 11 denotes the bonus stage).
    next_frame: u8,
    /// Roll within the current frame (1..=2); counts taken bonus rolls in
    /// the bonus stage.
    next_roll: u8,
    /// Spare bonus owed to the next roll.
    spare_pending: bool,
    /// Strike bonus owed to the next roll (0..=2) and the one after (0..=1).
    strike_next: u8,
    strike_after: u8,
    /// Bonus rolls granted by a tenth-frame mark, not yet taken.
    bonus_rolls_left: u8,
    /// Pins of the preceding roll on the current rack; reset at frame
    /// boundaries.
    prev_roll: u8,
    /// Most recent transition (consumed by loggers/observers).
    last_event: Option<RollEvent>,
    /// Accepted rolls, in order. A game fits by construction.
    rolls: ArrayVec<u8, MAX_ROLLS>,
}

impl BowlingGame {
    /// Create a fresh game at frame 1, roll 1, score 0.
    pub fn new() -> Self {
        Self {
            score: 0,
            next_frame: 1,
            next_roll: ROLL_ONE,
            spare_pending: false,
            strike_next: 0,
            strike_after: 0,
            bonus_rolls_left: 0,
            prev_roll: 0,
            last_event: None,
            rolls: ArrayVec::new(),
        }
    }

    /// Current cumulative score. Always defined, including mid-game; bonuses
    /// already paid are included, bonuses still pending are not.
    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn next_frame(&self) -> u8 {
        self.next_frame
    }

    pub fn next_roll(&self) -> u8 {
        self.next_roll
    }

    pub fn bonus_rolls_left(&self) -> u8 {
        self.bonus_rolls_left
    }

    pub fn is_finished(&self) -> bool {
        self.phase() == Phase::GameOver
    }

    /// Accepted rolls so far, in order.
    pub fn rolls(&self) -> &[u8] {
        &self.rolls
    }

    pub fn last_event(&self) -> Option<RollEvent> {
        self.last_event
    }

    /// Derive the machine's logical phase from the stored counters.
    pub fn phase(&self) -> Phase {
        if self.next_frame > LAST_FRAME {
            if self.bonus_rolls_left > 0 {
                Phase::BonusRoll
            } else {
                Phase::GameOver
            }
        } else if self.next_roll == ROLL_ONE {
            Phase::FirstRoll
        } else {
            Phase::SecondRoll
        }
    }

    /// Apply one roll.
    ///
    /// Validation happens before any mutation: a rejected roll leaves score,
    /// phase, and history untouched.
    pub fn roll(&mut self, pins: u8) -> Result<RollEvent, RollError> {
        let phase = self.phase();
        self.validate(phase, pins)?;

        // Frame the roll is credited to; bonus rolls resolve the tenth.
        let (frame, roll_in_frame) = if phase == Phase::BonusRoll {
            (LAST_FRAME, self.next_roll)
        } else {
            (self.next_frame, self.next_roll)
        };

        let awarded = self.pay_and_shift(pins);

        let kind = match phase {
            Phase::FirstRoll => self.finish_first_roll(pins),
            Phase::SecondRoll => self.finish_second_roll(pins),
            Phase::BonusRoll => self.finish_bonus_roll(pins),
            // validate() rejected GameOver above
            Phase::GameOver => return Err(RollError::GameFinished),
        };

        self.rolls.push(pins);
        let event = RollEvent {
            pins,
            frame,
            roll_in_frame,
            kind,
            awarded,
            score: self.score,
        };
        self.last_event = Some(event);
        Ok(event)
    }

    /// Write a point-in-time copy of the game into `out` without allocating.
    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        out.score = self.score;
        out.frame = self.next_frame.min(LAST_FRAME);
        out.roll_in_frame = self.next_roll;
        out.phase = self.phase();
        out.finished = self.is_finished();
        out.spare_pending = self.spare_pending;
        out.strike_next = self.strike_next;
        out.strike_after = self.strike_after;
        out.bonus_rolls_left = self.bonus_rolls_left;
        out.roll_count = self.rolls.len() as u8;
        out.rolls = [0u8; MAX_ROLLS];
        out.rolls[..self.rolls.len()].copy_from_slice(&self.rolls);
        out.last_event = self.last_event;
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }

    fn validate(&self, phase: Phase, pins: u8) -> Result<(), RollError> {
        if phase == Phase::GameOver {
            return Err(RollError::GameFinished);
        }
        if pins > ALL_PINS {
            return Err(RollError::InvalidPins { pins });
        }
        let shared_rack = match phase {
            Phase::SecondRoll => true,
            // The two bonus rolls after a tenth-frame strike share a rack
            // unless the first cleared it.
            Phase::BonusRoll => self.next_roll == ROLL_TWO && self.prev_roll < ALL_PINS,
            _ => false,
        };
        if shared_rack && self.prev_roll + pins > ALL_PINS {
            return Err(RollError::FrameOverflow {
                first: self.prev_roll,
                second: pins,
            });
        }
        Ok(())
    }

    /// Score the roll (bonuses owed to it included) and shift the strike
    /// window down one position. Runs first on every accepted roll.
    fn pay_and_shift(&mut self, pins: u8) -> u32 {
        let mut multiplier = 1 + u32::from(self.strike_next);
        if self.spare_pending {
            multiplier += 1;
            self.spare_pending = false;
        }
        self.strike_next = self.strike_after;
        self.strike_after = 0;

        let awarded = multiplier * u32::from(pins);
        self.score += awarded;
        awarded
    }

    fn finish_first_roll(&mut self, pins: u8) -> RollKind {
        if pins == ALL_PINS {
            if self.next_frame < LAST_FRAME {
                // The grant lands after this roll's shift, so the window
                // accumulates across back-to-back strikes.
                self.strike_next += 1;
                self.strike_after += 1;
            } else {
                // Tenth-frame strike: bonus rolls instead of multipliers,
                // their pins count once.
                self.bonus_rolls_left = STRIKE_BONUS_ROLLS;
            }
            self.advance_frame();
            RollKind::Strike
        } else {
            self.next_roll = ROLL_TWO;
            self.prev_roll = pins;
            RollKind::Open
        }
    }

    fn finish_second_roll(&mut self, pins: u8) -> RollKind {
        let spare = self.prev_roll + pins == ALL_PINS;
        if spare {
            if self.next_frame < LAST_FRAME {
                self.spare_pending = true;
            } else {
                self.bonus_rolls_left = SPARE_BONUS_ROLLS;
            }
        }
        self.advance_frame();
        if spare {
            RollKind::Spare
        } else {
            RollKind::Open
        }
    }

    fn finish_bonus_roll(&mut self, pins: u8) -> RollKind {
        self.bonus_rolls_left -= 1;
        if self.bonus_rolls_left > 0 {
            self.next_roll += 1;
            self.prev_roll = pins;
        }
        RollKind::Bonus
    }

    fn advance_frame(&mut self) {
        self.next_frame += 1;
        self.next_roll = ROLL_ONE;
        self.prev_roll = 0;
    }
}

impl Default for BowlingGame {
    fn default() -> Self {
        Self::new()
    }
}

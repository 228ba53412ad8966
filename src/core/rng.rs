//! RNG module - deterministic random game generation
//!
//! A small seeded LCG plus a generator that produces complete, valid roll
//! sequences (strikes, spares and tenth-frame marks included). Used by the
//! differential tests and benches; no external RNG dependency, so every
//! sequence is reproducible from its seed.

use arrayvec::ArrayVec;

use crate::types::{ALL_PINS, LAST_FRAME, MAX_ROLLS};

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        self.next_u32() % max
    }
}

/// Generator of random complete games.
#[derive(Debug, Clone)]
pub struct GameGen {
    rng: SimpleRng,
}

impl GameGen {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: SimpleRng::new(seed),
        }
    }

    fn pins_up_to(&mut self, max: u8) -> u8 {
        self.rng.next_range(u32::from(max) + 1) as u8
    }

    /// Produce one complete valid game, frame by frame.
    pub fn next_game(&mut self) -> ArrayVec<u8, MAX_ROLLS> {
        let mut rolls = ArrayVec::new();

        for frame in 1..=LAST_FRAME {
            let first = self.pins_up_to(ALL_PINS);
            rolls.push(first);

            if first == ALL_PINS {
                if frame == LAST_FRAME {
                    // Strike in the tenth: two bonus rolls, sharing a rack
                    // unless the first clears it.
                    let b1 = self.pins_up_to(ALL_PINS);
                    rolls.push(b1);
                    let b2_max = if b1 == ALL_PINS { ALL_PINS } else { ALL_PINS - b1 };
                    rolls.push(self.pins_up_to(b2_max));
                }
                continue;
            }

            let second = self.pins_up_to(ALL_PINS - first);
            rolls.push(second);

            if frame == LAST_FRAME && first + second == ALL_PINS {
                // Spare in the tenth: one bonus roll.
                rolls.push(self.pins_up_to(ALL_PINS));
            }
        }

        rolls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::game::BowlingGame;
    use crate::types::MAX_SCORE;

    #[test]
    fn test_rng_deterministic() {
        let mut a = SimpleRng::new(42);
        let mut b = SimpleRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn test_generated_games_replay_cleanly() {
        let mut gen = GameGen::new(7);
        for _ in 0..200 {
            let rolls = gen.next_game();
            let mut game = BowlingGame::new();
            for &pins in &rolls {
                game.roll(pins).expect("generated roll rejected");
            }
            assert!(game.is_finished());
            assert!(game.score() <= MAX_SCORE);
        }
    }
}

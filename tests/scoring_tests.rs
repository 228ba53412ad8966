//! Full-game scoring scenarios through the public API

use tenpin::core::BowlingGame;
use tenpin::types::{RollError, MAX_SCORE};

fn play(rolls: &[u8]) -> BowlingGame {
    let mut game = BowlingGame::new();
    for &pins in rolls {
        game.roll(pins).expect("valid roll rejected");
    }
    game
}

#[test]
fn test_single_open_frame() {
    assert_eq!(play(&[5, 3]).score(), 8);
}

#[test]
fn test_three_strikes_then_open_frame() {
    assert_eq!(play(&[10, 10, 10, 2, 3]).score(), 72);
}

#[test]
fn test_perfect_game() {
    let game = play(&[10; 12]);
    assert_eq!(game.score(), MAX_SCORE);
    assert!(game.is_finished());
}

#[test]
fn test_all_ones() {
    let game = play(&[1; 20]);
    assert_eq!(game.score(), 20);
    assert!(game.is_finished());
}

#[test]
fn test_gutter_game() {
    let game = play(&[0; 20]);
    assert_eq!(game.score(), 0);
    assert!(game.is_finished());
}

#[test]
fn test_alternating_strike_and_open() {
    let rolls = [10, 1, 2, 10, 1, 2, 10, 1, 2, 10, 1, 2, 10, 1, 2];
    assert_eq!(play(&rolls).score(), 80);
}

#[test]
fn test_spare_then_single_roll() {
    assert_eq!(play(&[4, 6, 7]).score(), 24);
}

#[test]
fn test_spare_from_bare_second_roll() {
    assert_eq!(play(&[0, 10, 5]).score(), 20);
}

#[test]
fn test_all_spares_uses_every_roll_slot() {
    // Twenty-one rolls of 5: every frame a spare, one bonus roll.
    let game = play(&[5; 21]);
    assert_eq!(game.score(), 150);
    assert!(game.is_finished());
}

#[test]
fn test_running_score_is_monotonic() {
    let rolls = [10, 3, 7, 0, 10, 5, 2, 10, 10, 10, 4, 4, 9, 1, 10, 10, 10];
    let mut game = BowlingGame::new();
    let mut previous = 0;
    for &pins in &rolls {
        game.roll(pins).expect("valid roll rejected");
        assert!(game.score() >= previous);
        previous = game.score();
    }
    assert!(game.score() <= MAX_SCORE);
}

#[test]
fn test_scoring_is_order_sensitive() {
    // Same multiset of rolls, different order, different score.
    assert_eq!(play(&[5, 5, 3]).score(), 16);
    assert_eq!(play(&[3, 5, 5]).score(), 13);
}

#[test]
fn test_rolls_after_a_completed_game_fail() {
    let mut game = play(&[10; 12]);
    let final_score = game.score();

    assert_eq!(game.roll(10), Err(RollError::GameFinished));
    assert_eq!(game.roll(0), Err(RollError::GameFinished));
    assert_eq!(game.score(), final_score);
    assert_eq!(game.rolls().len(), 12);
}

#[test]
fn test_rolls_after_a_max_length_game_fail() {
    let mut game = play(&[5; 21]);
    assert_eq!(game.roll(5), Err(RollError::GameFinished));
    assert_eq!(game.score(), 150);
}

#[test]
fn test_out_of_range_roll_is_rejected() {
    let mut game = BowlingGame::new();
    assert_eq!(game.roll(12), Err(RollError::InvalidPins { pins: 12 }));
    assert_eq!(game.score(), 0);
    assert_eq!(game.rolls().len(), 0);
}

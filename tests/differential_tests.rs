//! Differential tests: state machine vs the fold recurrence
//!
//! The windowed-multiplier fold is an independent formulation of the same
//! rules; here it cross-checks the production machine on generated games.

use tenpin::core::{fold_score, BowlingGame, FoldState, GameGen};
use tenpin::types::MAX_SCORE;

#[test]
fn test_machine_and_fold_agree_on_random_games() {
    let mut gen = GameGen::new(0x1309);
    for round in 0..1000 {
        let rolls = gen.next_game();
        let mut game = BowlingGame::new();
        let mut fold = FoldState::new();

        for (i, &pins) in rolls.iter().enumerate() {
            game.roll(pins)
                .unwrap_or_else(|e| panic!("round {}: roll {} rejected: {}", round, i, e));
            fold = fold.apply(pins);
            assert_eq!(
                game.score(),
                fold.score,
                "round {}: diverged after roll {} of {:?}",
                round,
                i,
                rolls.as_slice()
            );
        }

        assert!(game.is_finished(), "round {}: game left unfinished", round);
        assert!(game.score() <= MAX_SCORE);
    }
}

#[test]
fn test_agreement_on_edge_sequences() {
    let sequences: &[&[u8]] = &[
        &[10; 12],
        &[0; 20],
        &[1; 20],
        &[5; 21],
        &[10, 10, 10, 2, 3, 4, 5, 0, 10, 2, 8, 10, 9, 0, 5, 5, 10],
        &[2, 5, 2, 5, 2, 5, 2, 5, 2, 5, 2, 5, 2, 5, 2, 5, 2, 5, 2, 8],
    ];

    for rolls in sequences {
        let mut game = BowlingGame::new();
        for &pins in *rolls {
            game.roll(pins).expect("valid roll rejected");
        }
        assert_eq!(game.score(), fold_score(rolls), "diverged on {:?}", rolls);
    }
}

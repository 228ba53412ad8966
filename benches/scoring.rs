use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tenpin::core::{fold_score, BowlingGame, GameGen};

fn bench_perfect_game(c: &mut Criterion) {
    c.bench_function("score_perfect_game", |b| {
        b.iter(|| {
            let mut game = BowlingGame::new();
            for _ in 0..12 {
                game.roll(black_box(10)).unwrap();
            }
            game.score()
        })
    });
}

fn bench_max_length_game(c: &mut Criterion) {
    c.bench_function("score_all_spares_game", |b| {
        b.iter(|| {
            let mut game = BowlingGame::new();
            for _ in 0..21 {
                game.roll(black_box(5)).unwrap();
            }
            game.score()
        })
    });
}

fn bench_random_games(c: &mut Criterion) {
    let mut gen = GameGen::new(42);
    let games: Vec<_> = (0..100).map(|_| gen.next_game()).collect();

    c.bench_function("score_100_random_games", |b| {
        b.iter(|| {
            let mut total = 0u32;
            for rolls in &games {
                let mut game = BowlingGame::new();
                for &pins in rolls {
                    game.roll(black_box(pins)).unwrap();
                }
                total += game.score();
            }
            total
        })
    });
}

fn bench_fold_oracle(c: &mut Criterion) {
    let rolls = [5u8; 21];

    c.bench_function("fold_all_spares_game", |b| {
        b.iter(|| fold_score(black_box(&rolls)))
    });
}

criterion_group!(
    benches,
    bench_perfect_game,
    bench_max_length_game,
    bench_random_games,
    bench_fold_oracle
);
criterion_main!(benches);

//! Performance benchmarks for the rating pipeline

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use skill_curves::analysis::compare;
use skill_curves::config::{AppConfig, Hyperparameters, TimeScale};
use skill_curves::rating::{extract_history, InferenceEngine, ModelRunner, TrueSkillEngine};
use skill_curves::types::{GameType, Match, ModelKind};
use skill_curves::Pipeline;
use std::sync::Arc;

/// A season of round-robin singles with a doubles event every fifth match
fn synthetic_matches(players: usize, matches: usize) -> Vec<Match> {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    (0..matches)
        .map(|step| {
            let a = step % players;
            let b = (step * 7 + 1) % players;
            let b = if a == b { (b + 1) % players } else { b };
            let name = |i: usize| format!("player{:03}", i);

            let (game_type, teams) = if step % 5 == 4 {
                let c = (a + 2) % players;
                let d = (b + 3) % players;
                if [a, b, c, d].iter().collect::<std::collections::HashSet<_>>().len() == 4 {
                    (
                        GameType::Doubles,
                        vec![vec![name(a), name(c)], vec![name(b), name(d)]],
                    )
                } else {
                    (GameType::Singles, vec![vec![name(a)], vec![name(b)]])
                }
            } else {
                (GameType::Singles, vec![vec![name(a)], vec![name(b)]])
            };

            Match {
                step,
                date: start + chrono::Duration::days(step as i64 / 4),
                event: format!("Event {}", step),
                game_type,
                teams,
                ranks: vec![1, 2],
            }
        })
        .collect()
}

fn bench_trueskill_inference(c: &mut Criterion) {
    let matches = synthetic_matches(64, 2_000);
    let runner = ModelRunner::new(Arc::new(TrueSkillEngine::default()), TimeScale::Days);
    let games = runner.games_for(ModelKind::Combined, &matches);
    let engine = TrueSkillEngine::default();
    let params = Hyperparameters::default();

    c.bench_function("trueskill_2000_matches", |b| {
        b.iter(|| black_box(engine.infer(&games, &params)))
    });
}

fn bench_compare_models(c: &mut Criterion) {
    let matches = synthetic_matches(64, 2_000);
    let runner = ModelRunner::new(Arc::new(TrueSkillEngine::default()), TimeScale::Days);
    let params = Hyperparameters::default();
    let singles = runner
        .run(ModelKind::SinglesOnly, &matches, &params)
        .and_then(|output| extract_history(output, &matches))
        .unwrap();
    let combined = runner
        .run(ModelKind::Combined, &matches, &params)
        .and_then(|output| extract_history(output, &matches))
        .unwrap();

    c.bench_function("compare_64_players", |b| {
        b.iter(|| black_box(compare(&singles, &combined)))
    });
}

fn bench_full_scenarios(c: &mut Criterion) {
    let matches = synthetic_matches(64, 1_000);
    let mut config = AppConfig::default();
    config.pipeline.gammas = vec![0.03, 0.015, 0.0075];
    let pipeline = Pipeline::new(config);

    c.bench_function("three_scenarios_1000_matches", |b| {
        b.iter(|| {
            let outcomes = pipeline.run_scenarios(&matches).unwrap();
            black_box(pipeline.build_dataset("bench.csv", &matches, &outcomes))
        })
    });
}

criterion_group!(
    benches,
    bench_trueskill_inference,
    bench_compare_models,
    bench_full_scenarios
);
criterion_main!(benches);

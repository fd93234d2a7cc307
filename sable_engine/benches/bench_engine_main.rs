use std::sync::atomic::Ordering;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, Criterion};

use sable::Board;
use sable_engine::consts;
use sable_engine::eval;
use sable_engine::search::{Searcher, ThreadMemory};
use sable_engine::time::{TimeManagement, MAX_TIME};

fn bench_eval(c: &mut Criterion) {
    consts::init_globals();
    let board = Board::start_pos();
    c.bench_function("evaluate_startpos", |b| {
        b.iter(|| eval::evaluate(std::hint::black_box(&board)))
    });

    let middlegame =
        Board::from_fen("r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10")
            .unwrap();
    c.bench_function("evaluate_middlegame", |b| {
        b.iter(|| eval::evaluate(std::hint::black_box(&middlegame)))
    });
}

fn bench_search_depth(c: &mut Criterion) {
    consts::init_globals();
    c.bench_function("search_startpos_d6", |b| {
        b.iter(|| {
            consts::TT_TABLE.clear();
            consts::EVAL_CACHE.clear();
            consts::IS_STOP.store(false, Ordering::Relaxed);
            consts::STOP_SIGNAL.store(false, Ordering::Relaxed);
            let board = Board::start_pos();
            let legal = board.generate_legal_moves();
            let mut mem = ThreadMemory::new();
            let mut searcher = Searcher::new(
                0,
                &mut mem,
                TimeManagement::depth(6),
                Instant::now(),
                MAX_TIME,
                0,
            );
            let result = searcher.iterative_deepening(&board, legal, 0, false);
            consts::IS_STOP.store(true, Ordering::Relaxed);
            consts::STOP_SIGNAL.store(true, Ordering::Relaxed);
            result.best_move
        })
    });
}

criterion_group!(benches, bench_eval, bench_search_depth);
criterion_main!(benches);

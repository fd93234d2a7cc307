use criterion::{criterion_group, criterion_main, Criterion};

use sable::board::perft::perft;
use sable::Board;

fn bench_movegen(c: &mut Criterion) {
    let board = Board::start_pos();
    c.bench_function("generate_moves_startpos", |b| {
        b.iter(|| std::hint::black_box(&board).generate_moves())
    });

    let kiwipete =
        Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();
    c.bench_function("generate_moves_kiwipete", |b| {
        b.iter(|| std::hint::black_box(&kiwipete).generate_moves())
    });
}

fn bench_perft(c: &mut Criterion) {
    let board = Board::start_pos();
    c.bench_function("perft_3", |b| {
        b.iter(|| perft(std::hint::black_box(&board), 3))
    });
}

fn bench_board_clone_apply(c: &mut Criterion) {
    let board = Board::start_pos();
    let moves = board.generate_moves();
    c.bench_function("copy_apply_all", |b| {
        b.iter(|| {
            let mut total = 0u64;
            for mv in moves.iter() {
                let mut copy = std::hint::black_box(&board).static_copy();
                if copy.do_pseudo_legal_move(*mv) {
                    total += 1;
                }
            }
            total
        })
    });
}

criterion_group!(benches, bench_movegen, bench_perft, bench_board_clone_apply);
criterion_main!(benches);

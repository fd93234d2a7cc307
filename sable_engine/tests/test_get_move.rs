extern crate sable_engine;

use std::sync::atomic::Ordering;
use std::sync::Mutex;
use std::time::Instant;

use sable::Board;
use sable_engine::consts;
use sable_engine::search::{Searcher, ThreadMemory};
use sable_engine::time::{TimeManagement, MAX_TIME};

// The searcher writes to process-global state (stop flags, counters), so
// end-to-end searches must not run concurrently.
static SEARCH_LOCK: Mutex<()> = Mutex::new(());

fn best_move_at_depth(fen: &str, depth: i64) -> (String, i32) {
    let _guard = SEARCH_LOCK.lock().unwrap();
    consts::init_globals();
    consts::TT_TABLE.clear();
    consts::EVAL_CACHE.clear();
    consts::NODES.store(0, Ordering::Relaxed);
    consts::IS_STOP.store(false, Ordering::Relaxed);
    consts::STOP_SIGNAL.store(false, Ordering::Relaxed);

    let board = Board::from_fen(fen).unwrap();
    let legal = board.generate_legal_moves();
    assert!(!legal.is_empty(), "no legal moves in {}", fen);

    let mut mem = ThreadMemory::new();
    let mut searcher = Searcher::new(
        0,
        &mut mem,
        TimeManagement::depth(depth),
        Instant::now(),
        MAX_TIME,
        0,
    );
    let result = searcher.iterative_deepening(&board, legal, 0, false);

    consts::IS_STOP.store(true, Ordering::Relaxed);
    consts::STOP_SIGNAL.store(true, Ordering::Relaxed);
    (result.best_move.stringify(), result.score)
}

#[test]
fn start_position_picks_a_main_line_move() {
    let (best, score) = best_move_at_depth(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        1,
    );
    let reasonable = ["e2e4", "d2d4", "g1f3", "c2c4"];
    assert!(
        reasonable.contains(&best.as_str()),
        "unexpected opening move {}",
        best
    );
    // Internal centipawns: the first move is worth well under a pawn.
    assert!(score.abs() <= 70, "score {} too large", score);
}

#[test]
fn kp_endgame_pushes_the_pawn() {
    let (best, score) = best_move_at_depth("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1", 8);
    assert_eq!(best, "e2e4");
    assert!(score > 0, "KPvK should be winning for white");
}

#[test]
fn kr_endgame_finds_mate() {
    let (_, score) = best_move_at_depth("8/2k5/8/8/8/8/4R3/4K3 w - - 0 1", 10);
    // Mate in at most 16 plies from here.
    assert!(
        score >= consts::MATE_SCORE - 16,
        "no mate found, score {}",
        score
    );
}

#[test]
fn mate_in_one_is_found() {
    // Back-rank mate: Ra1-a8.
    let (best, score) = best_move_at_depth("6k1/5ppp/8/8/8/8/8/R3K3 w - - 0 1", 4);
    assert_eq!(best, "a1a8");
    assert_eq!(score, consts::MATE_SCORE - 1);
}

#[test]
fn avoids_losing_the_queen() {
    // The queen is attacked by a pawn; depth 3 should move or defend it
    // rather than shed material.
    let (_, score) = best_move_at_depth(
        "rnb1kbnr/pppp1ppp/8/4p3/3PP2q/8/PPP2PPP/RNBQKBNR b KQkq - 0 3",
        3,
    );
    assert!(score > -300, "black needlessly loses material: {}", score);
}

//! Lazy-SMP search coordination.
//!
//! A "go" command spawns one detached launcher thread. The launcher
//! spawns the helper workers in a scope, runs the primary worker inline,
//! and emits `bestmove` after every helper has wound down. Workers share
//! the transposition table and eval cache; everything else (histories,
//! stacks) is per-thread memory that persists between searches.

use std::sync::atomic::Ordering;
use std::sync::Mutex;
use std::time::Instant;

use sable::{BitMove, Board, MoveList};

use crate::consts::*;
use crate::search::{SearchResult, Searcher, ThreadMemory};
use crate::tablebases;
use crate::time::{SearchMode, TimeManagement, ONE_SECOND};

lazy_static! {
    /// Per-thread persistent memory, grown on demand when the Threads
    /// option rises.
    static ref THREAD_MEMORY: Mutex<Vec<ThreadMemory>> = Mutex::new(vec![ThreadMemory::new()]);
}

/// Ensures one `ThreadMemory` exists per configured thread.
pub fn set_num_threads(n: usize) {
    let n = n.clamp(MIN_THREADS, MAX_THREADS);
    NUM_THREADS.store(n, Ordering::Relaxed);
    let mut memory = THREAD_MEMORY.lock().unwrap();
    while memory.len() < n {
        memory.push(ThreadMemory::new());
    }
    memory.truncate(n);
}

/// Zeroes every thread's history tables, for "ucinewgame".
pub fn reset_histories() {
    let mut memory = THREAD_MEMORY.lock().unwrap();
    for mem in memory.iter_mut() {
        mem.search_params.reset_histories();
        mem.two_fold.clear();
    }
}

/// Runs a closure against the primary thread's repetition stack; used by
/// the UCI layer when replaying the game's move list.
pub fn with_game_history<F: FnOnce(&mut crate::search::TwoFoldStack)>(f: F) {
    let mut memory = THREAD_MEMORY.lock().unwrap();
    f(&mut memory[0].two_fold);
}

/// The search entry point, run on its own thread per "go" command.
///
/// Spawns the configured number of workers, runs the primary inline, and
/// prints the final `bestmove` line once every worker has stopped.
pub fn launch(board: Board, time_params: TimeManagement, moves_to_search: MoveList) {
    let num_threads = NUM_THREADS.load(Ordering::Relaxed);

    let mut legal_moves = board.generate_legal_moves();

    // Mate or stalemate on arrival.
    if legal_moves.is_empty() {
        STOP_SIGNAL.store(true, Ordering::Relaxed);
        IS_STOP.store(true, Ordering::Relaxed);
        println!("bestmove none");
        return;
    }

    NODES.store(0, Ordering::Relaxed);
    TB_HITS.store(0, Ordering::Relaxed);
    SEL_DEPTH.store(0, Ordering::Relaxed);
    TT_TABLE.new_search();

    let mut memory = THREAD_MEMORY.lock().unwrap();

    // Reset per-search state and seed every helper's repetition stack
    // from the primary's game history.
    let game_history = memory[0].two_fold.clone();
    for (i, mem) in memory.iter_mut().enumerate() {
        mem.search_params.reset();
        mem.search_params.selective_depth = 0;
        if i != 0 {
            mem.two_fold = game_history.clone();
        }
    }

    // Root tablebase probe: DTZ first, then WDL. A successful probe
    // filters the root move list and biases the displayed score.
    let mut probe_limit = tablebases::tb_largest();
    let mut tb_score = 0;
    let mut tb_probe_success = false;
    let prev_lm_size = legal_moves.len() as u64;
    if probe_limit > 0 && board.occupied().count_bits() as u32 <= probe_limit {
        if let Some(score) = tablebases::root_probe(&board, &mut legal_moves) {
            // DTZ filtering already guarantees the outcome; stop probing
            // in search.
            probe_limit = 0;
            tb_score = score;
            tb_probe_success = true;
            TB_HITS.fetch_add(prev_lm_size, Ordering::Relaxed);
        } else if let Some(score) = tablebases::root_probe_wdl(&board, &mut legal_moves) {
            tb_score = score;
            tb_probe_success = true;
            TB_HITS.fetch_add(prev_lm_size, Ordering::Relaxed);
            // Only keep probing to preserve a win.
            if tb_score <= 0 {
                probe_limit = 0;
            }
        }
    }

    // Restrict to "searchmoves" when given.
    if !moves_to_search.is_empty() {
        let mut filtered = MoveList::new();
        for m in legal_moves.iter() {
            if moves_to_search.contains(*m) {
                filtered.push(*m);
            }
        }
        if !filtered.is_empty() {
            legal_moves = filtered;
        }
    }

    // Set up timing.
    let mut time_limit = time_params.hard_limit();
    let start_time = Instant::now();

    // One legal reply: answer quickly, just get a rough score for the
    // ponder move.
    if legal_moves.len() == 1 && time_params.mode == SearchMode::Time {
        time_limit = (time_limit / 32).min(ONE_SECOND);
    }

    THREADS_RUNNING.store(num_threads as i32, Ordering::SeqCst);

    let (split_first, split_rest) = memory.split_at_mut(1);
    let primary_mem = &mut split_first[0];

    let mut result = SearchResult {
        best_move: BitMove::NULL,
        ponder: BitMove::NULL,
        score: 0,
    };
    crossbeam_utils::thread::scope(|scope| {
        for (offset, mem) in split_rest.iter_mut().enumerate() {
            let id = offset + 1;
            let helper_board = board;
            let helper_moves = legal_moves.clone();
            scope.spawn(move |_| {
                let mut searcher =
                    Searcher::new(id, mem, time_params, start_time, time_limit, probe_limit);
                searcher.iterative_deepening(&helper_board, helper_moves, tb_score, tb_probe_success);
                THREADS_RUNNING.fetch_sub(1, Ordering::SeqCst);
            });
        }

        let mut primary = Searcher::new(
            0,
            primary_mem,
            time_params,
            start_time,
            time_limit,
            probe_limit,
        );
        result = primary.iterative_deepening(&board, legal_moves, tb_score, tb_probe_success);

        // Wind the helpers down; the scope join below waits for each to
        // acknowledge.
        STOP_SIGNAL.store(true, Ordering::SeqCst);
        IS_STOP.store(true, Ordering::SeqCst);
        THREADS_RUNNING.fetch_sub(1, Ordering::SeqCst);
    })
    .unwrap();

    if !result.ponder.is_null() {
        println!("bestmove {} ponder {}", result.best_move, result.ponder);
    } else {
        println!("bestmove {}", result.best_move);
    }
}

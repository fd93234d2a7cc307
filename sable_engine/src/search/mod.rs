//! The fail-soft principal variation search.
//!
//! Each worker thread runs iterative deepening from the root with
//! aspiration windows, probing the shared transposition table and eval
//! cache. Inside the tree the search stacks the usual set of selectivity
//! devices: transposition cutoffs, reverse futility, razoring, null-move
//! pruning with verification, internal iterative deepening, late move
//! reductions and pruning, continuation-history and static-exchange
//! pruning, and check / singular extensions, with quiescence settling
//! tactics at the leaves.

use std::sync::atomic::Ordering;
use std::time::Instant;

use sable::{BitMove, Board, MoveList, Player};

use crate::consts::*;
use crate::eval;
use crate::movepick::MovePicker;
use crate::tablebases;
use crate::tables::history::{ContKey, SearchParams};
use crate::time::{elapsed_ms, SearchMode, TimeManagement, ONE_SECOND, TIME_FACTOR};
use crate::tt::{
    adjust_hash_score, hash_depth, hash_move, hash_node_type, hash_score, pack_hash_data,
    ALL_NODE, CUT_NODE, NO_NODE_INFO, PV_NODE,
};

/// If static eval is this far below alpha, use a qsearch to confirm the
/// fail low.
const RAZOR_MARGIN: i32 = 300;

/// Margin for confirming an "easy" move and cutting the search short.
const EASYMOVE_MARGIN: i32 = 150;

/// Lazy-SMP skip schedules: helper thread `t` skips ahead by
/// `SMP_SKIP_AMOUNT[t % 16]` whenever the depth hits its cycle.
const SMP_SKIP_DEPTHS: [i32; 16] = [1, 2, 2, 4, 4, 3, 2, 5, 4, 3, 2, 6, 5, 4, 3, 2];
const SMP_SKIP_AMOUNT: [i32; 16] = [1, 1, 1, 2, 2, 2, 1, 3, 2, 2, 1, 3, 3, 2, 2, 1];

/// Move-count pruning bounds by [eval improving][depth].
const LMP_MOVE_COUNTS: [[i32; 13]; 2] = [
    [0, 2, 4, 7, 11, 16, 22, 29, 37, 46, 56, 67, 79],
    [0, 5, 8, 13, 21, 31, 43, 57, 74, 93, 114, 137, 162],
];

lazy_static! {
    /// Late-move-reduction amounts by depth and moves searched.
    static ref LMR_REDUCTIONS: [[i32; 64]; 64] = {
        let mut t = [[0i32; 64]; 64];
        for depth in 1..64 {
            for moves in 1..64 {
                t[depth][moves] =
                    (0.5 + (depth as f64).ln() * (moves as f64).ln() / 2.1) as i32;
            }
        }
        // Depth 1 with many moves searched still counts as a one-ply
        // reduction for the lmr-depth based pruning decisions.
        for moves in 7..64 {
            t[1][moves] = 1;
        }
        t
    };
}

#[cold]
pub fn init_reduction_table() {
    lazy_static::initialize(&LMR_REDUCTIONS);
}

/// A stack of zobrist keys for two-fold repetition detection. The
/// `root_end` index marks where game history stops and search-tree
/// history begins: repetitions entirely inside the tree count at two
/// occurrences, game-history repetitions need a third.
pub struct TwoFoldStack {
    keys: [u64; 256],
    root_end: usize,
    len: usize,
}

impl Default for TwoFoldStack {
    fn default() -> Self {
        TwoFoldStack::new()
    }
}

impl Clone for TwoFoldStack {
    fn clone(&self) -> Self {
        TwoFoldStack {
            keys: self.keys,
            root_end: self.root_end,
            len: self.len,
        }
    }
}

impl TwoFoldStack {
    pub fn new() -> TwoFoldStack {
        TwoFoldStack {
            keys: [0; 256],
            root_end: 0,
            len: 0,
        }
    }

    #[inline(always)]
    pub fn push(&mut self, key: u64) {
        if self.len < self.keys.len() {
            self.keys[self.len] = key;
            self.len += 1;
        }
    }

    #[inline(always)]
    pub fn pop(&mut self) {
        self.len = self.len.saturating_sub(1);
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.root_end = 0;
    }

    /// Marks the current top as the end of actual game history.
    pub fn set_root_end(&mut self) {
        self.root_end = self.len.saturating_sub(1);
    }

    /// Looks for a repetition of `key`. The first repeat from the top
    /// suffices inside the search tree; a repeat within game history
    /// requires a third occurrence.
    pub fn find(&self, key: u64) -> bool {
        for i in (0..self.len).rev() {
            if self.keys[i] == key {
                if i <= self.root_end {
                    for j in (0..i).rev() {
                        if self.keys[j] == key {
                            return true;
                        }
                    }
                } else {
                    return true;
                }
            }
        }
        false
    }
}

/// Records the principal variation found by the search.
#[derive(Clone)]
pub struct SearchPV {
    pub len: usize,
    pub line: [BitMove; (MAX_DEPTH + 1) as usize],
}

impl Default for SearchPV {
    fn default() -> Self {
        SearchPV::new()
    }
}

impl SearchPV {
    pub fn new() -> SearchPV {
        SearchPV {
            len: 0,
            line: [BitMove::NULL; (MAX_DEPTH + 1) as usize],
        }
    }

    fn to_string(&self) -> String {
        let mut s = String::new();
        for i in 0..self.len {
            if i > 0 {
                s.push(' ');
            }
            s.push_str(&self.line[i].stringify());
        }
        s
    }
}

/// Prepends `best` to the child's line, forming this node's line.
fn change_pv(best: BitMove, parent: &mut SearchPV, child: &SearchPV) {
    parent.line[0] = best;
    for i in 0..child.len {
        parent.line[i + 1] = child.line[i];
    }
    parent.len = child.len + 1;
}

/// One preallocated frame per ply.
#[derive(Copy, Clone)]
pub struct SearchStackInfo {
    pub ply: i32,
    pub static_eval: i32,
    /// (piece, to) of the move leading to this node; keys the countermove
    /// history of child moves.
    pub counter_key: Option<ContKey>,
    /// (piece, to) of the move two plies up; keys the follow-up history.
    pub followup_key: Option<ContKey>,
}

/// Per-thread search state that persists across searches.
pub struct ThreadMemory {
    pub search_params: SearchParams,
    pub two_fold: TwoFoldStack,
}

impl Default for ThreadMemory {
    fn default() -> Self {
        ThreadMemory::new()
    }
}

impl ThreadMemory {
    pub fn new() -> ThreadMemory {
        ThreadMemory {
            search_params: SearchParams::new(),
            two_fold: TwoFoldStack::new(),
        }
    }
}

/// What a finished (or stopped) search hands back to the coordinator.
pub struct SearchResult {
    pub best_move: BitMove,
    pub ponder: BitMove,
    pub score: i32,
}

/// Returns the score for a side that has run out of legal moves.
fn score_mate(in_check: bool, plies: i32) -> i32 {
    if in_check {
        // Quicker mates are better.
        -MATE_SCORE + plies
    } else {
        0
    }
}

fn is_stopped() -> bool {
    STOP_SIGNAL.load(Ordering::Relaxed)
}

/// A single search worker. The primary worker (id 0) owns time control
/// and all output.
pub struct Searcher<'a> {
    pub id: usize,
    pub mem: &'a mut ThreadMemory,
    ssi: Vec<SearchStackInfo>,
    nodes: u64,
    start_time: Instant,
    time_limit: i64,
    time_params: TimeManagement,
    probe_limit: u32,
}

impl<'a> Searcher<'a> {
    pub fn new(
        id: usize,
        mem: &'a mut ThreadMemory,
        time_params: TimeManagement,
        start_time: Instant,
        time_limit: i64,
        probe_limit: u32,
    ) -> Searcher<'a> {
        let mut ssi = vec![
            SearchStackInfo {
                ply: 0,
                static_eval: INFTY,
                counter_key: None,
                followup_key: None,
            };
            (MAX_DEPTH + 3) as usize
        ];
        for (i, frame) in ssi.iter_mut().enumerate() {
            frame.ply = i as i32;
        }
        Searcher {
            id,
            mem,
            ssi,
            nodes: 0,
            start_time,
            time_limit,
            time_params,
            probe_limit,
        }
    }

    #[inline(always)]
    fn count_node(&mut self) {
        self.nodes += 1;
        NODES.fetch_add(1, Ordering::Relaxed);
    }

    //------------------------------------------------------------------
    // Iterative deepening

    /// Runs the iterative deepening loop and returns the best move, the
    /// ponder move and the last complete score. The primary thread prints
    /// progress and decides when time is up; helpers run until the stop
    /// signal.
    pub fn iterative_deepening(
        &mut self,
        b: &Board,
        mut legal_moves: MoveList,
        tb_score: i32,
        tb_probe_success: bool,
    ) -> SearchResult {
        let multi_pv = MULTI_PV.load(Ordering::Relaxed);
        let mut ponder = BitMove::NULL;
        let mut best_move = legal_moves[0];
        let mut time_so_far: i64 = 1;

        let mut best_score = -INFTY;
        let mut root_depth: i32 = 1;
        let mut prev_best = BitMove::NULL;
        let mut prev_score = -INFTY;
        let mut pv_streak: i32 = 0;
        let mut time_change_factor: f64 = 1.0;

        loop {
            let mut pv_line = SearchPV::new();
            // Decay the time change factor toward one.
            time_change_factor = (2.0 * time_change_factor + 1.0) / 3.0;

            let mut best_move_index: i32 = -1;
            let mut multi_pv_num = 1;
            while multi_pv_num <= multi_pv && multi_pv_num <= legal_moves.len() {
                // Initial aspiration window based on depth and score.
                let mut delta_alpha = 20 - (root_depth / 3).min(10) + best_score.abs() / 20;
                let mut delta_beta = delta_alpha;

                let mut asp_alpha = -MATE_SCORE;
                let mut asp_beta = MATE_SCORE;
                if root_depth >= 6 && multi_pv == 1 && best_score.abs() < NEAR_MATE_SCORE {
                    asp_alpha = best_score - delta_alpha;
                    asp_beta = best_score + delta_beta;
                }
                prev_score = best_score;

                // Aspiration loop.
                while !IS_STOP.load(Ordering::Relaxed) {
                    self.mem.search_params.reset();
                    pv_line.len = 0;

                    let (index, score) = self.root_search(
                        b,
                        &mut legal_moves,
                        root_depth,
                        asp_alpha,
                        asp_beta,
                        multi_pv_num - 1,
                        &mut pv_line,
                    );
                    best_move_index = index;
                    best_score = score;

                    time_so_far = elapsed_ms(self.start_time);
                    if pv_line.len > 1 {
                        ponder = pv_line.line[1];
                    } else if best_move_index != 0 {
                        ponder = BitMove::NULL;
                    }

                    // Fail low: no move beat alpha.
                    if best_move_index == -1 && !IS_STOP.load(Ordering::Relaxed) {
                        if self.id == 0 {
                            self.print_info_bound(
                                root_depth,
                                best_score,
                                tb_score,
                                tb_probe_success,
                                time_so_far,
                                &pv_line,
                                "upperbound",
                            );
                        }
                        asp_alpha = best_score - delta_alpha;
                        delta_alpha = 3 * delta_alpha / 2;
                        if asp_alpha < -NEAR_MATE_SCORE {
                            asp_alpha = -MATE_SCORE;
                        }
                        time_change_factor *= 1.1;
                    }
                    // Fail high: best score is at least beta.
                    else if best_score >= asp_beta {
                        if self.id == 0 {
                            self.print_info_bound(
                                root_depth,
                                best_score,
                                tb_score,
                                tb_probe_success,
                                time_so_far,
                                &pv_line,
                                "lowerbound",
                            );
                        }
                        asp_beta = best_score + delta_beta;
                        delta_beta = 3 * delta_beta / 2;
                        if asp_beta > NEAR_MATE_SCORE {
                            asp_beta = MATE_SCORE;
                        }

                        // A stable best move may be allowed to keep the
                        // unresolved fail high when time is short.
                        if self.id == 0
                            && best_move_index == multi_pv_num as i32 - 1
                            && best_move == prev_best
                            && self.time_params.mode == SearchMode::Time
                            && time_so_far
                                >= (self.time_params.allotment as f64 * TIME_FACTOR) as i64
                        {
                            break;
                        }

                        legal_moves.swap(multi_pv_num - 1, best_move_index as usize);
                        best_move = legal_moves[0];
                    } else {
                        break;
                    }
                }
                // End aspiration loop.

                time_so_far = elapsed_ms(self.start_time);

                // If we broke out before getting any new result, end the
                // search.
                if best_move_index == -1 {
                    if self.id == 0 {
                        let nodes = NODES.load(Ordering::Relaxed);
                        println!(
                            "info depth {} seldepth {} time {} nodes {} nps {} tbhits {} hashfull {}",
                            root_depth - 1,
                            SEL_DEPTH.load(Ordering::Relaxed),
                            time_so_far,
                            nodes,
                            1000 * nodes / time_so_far.max(1) as u64,
                            TB_HITS.load(Ordering::Relaxed),
                            TT_TABLE.hashfull(),
                        );
                    }
                    break;
                }

                // Swap the PV to the front for the next iteration.
                legal_moves.swap(multi_pv_num - 1, best_move_index as usize);
                best_move = legal_moves[0];

                if self.id == 0 {
                    self.print_info(
                        root_depth,
                        multi_pv,
                        multi_pv_num,
                        best_score,
                        tb_score,
                        tb_probe_success,
                        time_so_far,
                        &pv_line,
                    );
                }

                multi_pv_num += 1;
            }
            // End multiPV loop.

            if best_move == prev_best {
                pv_streak += 1;
                time_change_factor *= 0.94;
            } else {
                prev_best = best_move;
                pv_streak = 1;
                if time_change_factor < 1.0 {
                    time_change_factor = 1.0;
                }
                time_change_factor *= 1.25;
            }

            // Elongate the budget on score instability, shorten on a
            // stable PV.
            if self.id == 0 && self.time_params.mode == SearchMode::Time {
                time_change_factor *=
                    0.92 + (((prev_score - best_score).abs() as f64).sqrt()).min(7.0) / 28.0;
            } else {
                time_change_factor = 1.0;
            }

            // Easymove confirmation: a long-stable PV move may end the
            // search early if the second-best alternative is far below.
            if self.id == 0
                && !IS_PONDERING.load(Ordering::Relaxed)
                && self.time_params.mode == SearchMode::Time
                && multi_pv == 1
                && pv_streak >= 8 + root_depth / 5
                && time_so_far > self.time_params.allotment / 16
                && time_so_far < self.time_params.allotment / 2
                && best_score.abs() < NEAR_MATE_SCORE
            {
                let easymove_window =
                    best_score - EASYMOVE_MARGIN - root_depth - best_score.abs() / 3;
                let easymove_depth = root_depth - 4 - root_depth / 8;

                let mut line = SearchPV::new();
                let (_, second_best_score) = self.root_search(
                    b,
                    &mut legal_moves,
                    easymove_depth,
                    easymove_window - 1,
                    easymove_window,
                    1,
                    &mut line,
                );

                if second_best_score < easymove_window {
                    break;
                } else {
                    pv_streak = -128;
                }
            }

            root_depth += 1;
            if self.id != 0 {
                let cycle = self.id % 16;
                if (root_depth + cycle as i32) % SMP_SKIP_DEPTHS[cycle] == 0 {
                    root_depth += SMP_SKIP_AMOUNT[cycle];
                }
                // Helpers loop until told to stop; pin them at the
                // ceiling rather than running the depth counter away.
                root_depth = root_depth.min(MAX_DEPTH);
            }

            // Conditions for continuing to deepen.
            if IS_STOP.load(Ordering::Relaxed) {
                break;
            }
            if self.id != 0 {
                continue;
            }
            let keep_going = match self.time_params.mode {
                SearchMode::Time => {
                    (time_so_far
                        < (self.time_params.allotment as f64 * TIME_FACTOR * time_change_factor)
                            as i64
                        || IS_PONDERING.load(Ordering::Relaxed))
                        && root_depth <= MAX_DEPTH
                }
                SearchMode::MoveTime => {
                    time_so_far < self.time_params.allotment && root_depth <= MAX_DEPTH
                }
                SearchMode::Depth => root_depth <= self.time_params.allotment as i32,
            };
            if !keep_going {
                break;
            }
        }

        // When pondering, keep "searching" until a stop or ponderhit.
        while IS_PONDERING.load(Ordering::Relaxed) && !IS_STOP.load(Ordering::Relaxed) {
            std::thread::sleep(std::time::Duration::from_millis(50));
        }

        SearchResult {
            best_move,
            ponder,
            score: best_score,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn print_info_bound(
        &self,
        depth: i32,
        score: i32,
        tb_score: i32,
        tb_success: bool,
        time_so_far: i64,
        pv_line: &SearchPV,
        bound: &str,
    ) {
        let nodes = NODES.load(Ordering::Relaxed);
        println!(
            "info depth {} seldepth {} score cp {} {} time {} nodes {} nps {} tbhits {} hashfull {} pv {}",
            depth,
            SEL_DEPTH.load(Ordering::Relaxed),
            display_cp(score, tb_score, tb_success),
            bound,
            time_so_far,
            nodes,
            1000 * nodes / time_so_far.max(1) as u64,
            TB_HITS.load(Ordering::Relaxed),
            TT_TABLE.hashfull(),
            pv_line.to_string(),
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn print_info(
        &self,
        depth: i32,
        multi_pv: usize,
        multi_pv_num: usize,
        score: i32,
        tb_score: i32,
        tb_success: bool,
        time_so_far: i64,
        pv_line: &SearchPV,
    ) {
        let nodes = NODES.load(Ordering::Relaxed);
        let mut out = format!("info depth {} seldepth {}", depth, SEL_DEPTH.load(Ordering::Relaxed));
        if multi_pv > 1 {
            out.push_str(&format!(" multipv {}", multi_pv_num));
        }
        if score >= MAX_PLY_MATE_SCORE {
            // Our move ends the game, so plies / 2 + 1 moves.
            out.push_str(&format!(" score mate {}", (MATE_SCORE - score) / 2 + 1));
        } else if score <= -MAX_PLY_MATE_SCORE {
            out.push_str(&format!(" score mate {}", (-MATE_SCORE - score) / 2));
        } else {
            out.push_str(&format!(" score cp {}", display_cp(score, tb_score, tb_success)));
        }
        out.push_str(&format!(
            " time {} nodes {} nps {} tbhits {} hashfull {} pv {}",
            time_so_far,
            nodes,
            1000 * nodes / time_so_far.max(1) as u64,
            TB_HITS.load(Ordering::Relaxed),
            TT_TABLE.hashfull(),
            pv_line.to_string(),
        ));
        println!("{}", out);
    }

    //------------------------------------------------------------------
    // Root search

    /// Searches the root move list at a fixed depth, returning the index
    /// of the best move (or -1 on a fail low) and its score.
    #[allow(clippy::too_many_arguments)]
    fn root_search(
        &mut self,
        b: &Board,
        legal_moves: &mut MoveList,
        depth: i32,
        mut alpha: i32,
        beta: i32,
        start_move: usize,
        pv_line: &mut SearchPV,
    ) -> (i32, i32) {
        let color = b.turn();
        let mut line = SearchPV::new();
        let mut temp_move: i32 = -1;
        let mut best_score = -INFTY;

        self.mem.two_fold.push(b.zobrist());

        // Let detached helpers get going before the primary floods the
        // table.
        std::thread::yield_now();

        let mut i = start_move;
        while i < legal_moves.len() {
            let m = legal_moves[i];

            // Report the move under consideration once the search has
            // been running a while.
            let time_so_far = elapsed_ms(self.start_time);
            if self.id == 0 && time_so_far > 5 * ONE_SECOND {
                let nodes = NODES.load(Ordering::Relaxed);
                println!(
                    "info depth {} currmove {} currmovenumber {} nodes {} nps {}",
                    depth,
                    m,
                    i + 1,
                    nodes,
                    1000 * nodes / time_so_far.max(1) as u64
                );
            }

            let mut copy = b.static_copy();
            copy.do_move(m);
            self.count_node();

            let piece = b.piece_on_sq(color, m.get_src());
            self.ssi[1].counter_key = piece.map(|p| (p, m.get_dest()));
            self.ssi[1].followup_key = None;
            self.ssi[2].followup_key = piece.map(|p| (p, m.get_dest()));

            let score = if i != start_move {
                let mut score =
                    -self.pvs(&copy, depth - 1, -alpha - 1, -alpha, true, 1, &mut line);
                if alpha < score && score < beta {
                    score = -self.pvs(&copy, depth - 1, -beta, -alpha, false, 1, &mut line);
                }
                score
            } else {
                -self.pvs(&copy, depth - 1, -beta, -alpha, false, 1, &mut line)
            };

            // If stopping, return results from the incomplete search, if
            // any.
            if STOP_SIGNAL.load(Ordering::SeqCst) {
                break;
            }

            if score > best_score {
                best_score = score;
                if score > alpha {
                    alpha = score;
                    temp_move = i as i32;
                    change_pv(m, pv_line, &line);
                } else if i == start_move {
                    // Keep a PV even when failing low.
                    change_pv(m, pv_line, &line);
                }
            }

            if score >= beta {
                break;
            }
            i += 1;
        }

        self.mem.two_fold.pop();
        (temp_move, best_score)
    }

    //------------------------------------------------------------------
    // PVS

    #[allow(clippy::too_many_arguments)]
    fn pvs(
        &mut self,
        b: &Board,
        depth: i32,
        mut alpha: i32,
        mut beta: i32,
        is_cut_node: bool,
        ply: usize,
        pv_line: &mut SearchPV,
    ) -> i32 {
        pv_line.len = 0;

        // At the horizon, enter quiescence.
        if depth <= 0 || ply as i32 >= MAX_DEPTH {
            if ply as i32 > self.mem.search_params.selective_depth {
                self.mem.search_params.selective_depth = ply as i32;
                SEL_DEPTH.fetch_max(ply as u16, Ordering::Relaxed);
            }
            self.mem.search_params.ply = ply as i32;
            return self.quiescence(b, 0, alpha, beta);
        }

        // Draw checks.
        if b.is_draw() {
            return 0;
        }
        if self.mem.two_fold.find(b.zobrist()) {
            return 0;
        }

        // Mate distance pruning.
        let mating_score = MATE_SCORE - ply as i32;
        if mating_score < beta {
            beta = mating_score;
            if alpha >= mating_score {
                return alpha;
            }
        }
        let mated_score = -MATE_SCORE + ply as i32;
        if mated_score > alpha {
            alpha = mated_score;
            if beta <= mated_score {
                return beta;
            }
        }

        // Periodic timeout check, primary thread only.
        if self.id == 0
            && (self.nodes & 1023) == 1023
            && !IS_PONDERING.load(Ordering::Relaxed)
            && elapsed_ms(self.start_time) > self.time_limit
        {
            IS_STOP.store(true, Ordering::Relaxed);
            STOP_SIGNAL.store(true, Ordering::Relaxed);
        }
        if is_stopped() {
            return 0;
        }

        let prev_alpha = alpha;
        let color = b.turn();
        // A null window means a non-PV node; most pruning is reserved for
        // those.
        let is_pv_node = beta - alpha != 1;

        // Transposition table probe.
        let mut hashed = BitMove::NULL;
        let mut hash_scored = -INFTY;
        let mut hash_dep = 0;
        let mut node_type = NO_NODE_INFO;

        let hash_entry = TT_TABLE.probe(b.zobrist());
        if hash_entry != 0 {
            hash_scored = hash_score(hash_entry);
            node_type = hash_node_type(hash_entry);
            hash_dep = hash_depth(hash_entry);
            hashed = hash_move(hash_entry);

            // Grafted tablebase results carry a PV tag and no move.
            if node_type == PV_NODE && hashed.is_null() {
                TB_HITS.fetch_add(1, Ordering::Relaxed);
            }

            // Mate scores come back as distance from this node.
            if hash_scored >= MAX_PLY_MATE_SCORE {
                hash_scored -= ply as i32;
            } else if hash_scored <= -MAX_PLY_MATE_SCORE {
                hash_scored += ply as i32;
            }

            // Return the hash score failing soft when the depth and the
            // bound allow it. Full-window PV nodes keep searching so the
            // PV line is not cut short.
            if !is_pv_node
                && hash_dep >= depth
                && ((node_type == ALL_NODE && hash_scored <= alpha)
                    || (node_type == CUT_NODE && hash_scored >= beta)
                    || node_type == PV_NODE)
            {
                return hash_scored;
            }
        }

        // Tablebase probe: WDL only, inside the piece-count limit.
        if self.probe_limit > 0 && tablebases::can_probe(b, self.probe_limit) {
            if let Some(wdl) = tablebases::probe_wdl(b) {
                TB_HITS.fetch_add(1, Ordering::Relaxed);

                let wdl_val = wdl as i32;
                let tb_score = if wdl_val < -1 {
                    -eval::params::TB_WIN - MAX_DEPTH + ply as i32
                } else if wdl_val > 1 {
                    eval::params::TB_WIN + MAX_DEPTH - ply as i32
                } else {
                    2 * wdl_val
                };

                // Graft the result into the table as a pseudo-PV entry.
                let tb_depth = (depth + 4).min(MAX_DEPTH);
                let data = pack_hash_data(
                    tb_depth,
                    BitMove::NULL,
                    adjust_hash_score(tb_score, ply as i32),
                    0,
                    PV_NODE,
                    TT_TABLE.age(),
                );
                TT_TABLE.store(b.zobrist(), data, tb_depth);

                return tb_score;
            }
        }

        let mut line = SearchPV::new();
        let in_check = b.in_check(color);

        // Static evaluation, memoized across transpositions.
        let mut static_eval = INFTY;
        self.ssi[ply].static_eval = INFTY;
        if !in_check {
            static_eval = match EVAL_CACHE.get(b.zobrist()) {
                Some(cached) => cached,
                None => {
                    let e = if color == Player::White {
                        eval::evaluate(b)
                    } else {
                        -eval::evaluate(b)
                    };
                    EVAL_CACHE.add(b.zobrist(), e);
                    e
                }
            };
            self.ssi[ply].static_eval = static_eval;
        }

        // The TT score is a tighter bound when compatible.
        if hash_scored != -INFTY
            && static_eval != INFTY
            && ((node_type == ALL_NODE && hash_scored < static_eval)
                || (node_type == CUT_NODE && hash_scored > static_eval)
                || node_type == PV_NODE)
        {
            static_eval = hash_scored;
        }

        // Is the static eval improving across our last two plies?
        let eval_improving = ply >= 3
            && !in_check
            && (self.ssi[ply].static_eval >= self.ssi[ply - 2].static_eval
                || self.ssi[ply - 2].static_eval == INFTY);

        // Reverse futility pruning: if we are doing so well that a
        // generous margin per ply still beats beta, trust the eval.
        if !is_pv_node
            && !in_check
            && depth <= 6
            && static_eval - 70 * depth >= beta
            && b.non_pawn_material(color).is_not_empty()
        {
            return static_eval;
        }

        // Razoring: a static eval far below alpha at the lowest depths is
        // verified with a quiescence search.
        if !is_pv_node && !in_check && depth <= 2 && static_eval <= alpha - RAZOR_MARGIN {
            self.mem.search_params.ply = ply as i32;
            if depth == 1 {
                return self.quiescence(b, 0, alpha, beta);
            }
            let r_window = alpha - RAZOR_MARGIN;
            let value = self.quiescence(b, 0, r_window, r_window + 1);
            if value <= r_window {
                return value;
            }
        }

        // Null move pruning: give the opponent a free move; if we still
        // beat beta the subtree is almost certainly a cutoff. Never with
        // only pawns (zugzwang), never three times in a row.
        if !is_pv_node
            && !in_check
            && depth >= 2
            && static_eval >= beta
            && self.mem.search_params.null_move_count < 2
            && b.non_pawn_material(color).is_not_empty()
        {
            // Reduce more when further above beta.
            let reduction = 2 + (32 * depth + (static_eval - beta).min(384)) / 128;

            let mut null_board = b.static_copy();
            null_board.do_null_move();
            self.mem.search_params.null_move_count += 1;
            self.ssi[ply + 1].counter_key = None;
            self.ssi[ply + 2].followup_key = None;
            let null_score = -self.pvs(
                &null_board,
                depth - 1 - reduction,
                -beta,
                -alpha,
                !is_cut_node,
                ply + 1,
                &mut line,
            );
            self.mem.search_params.null_move_count = 0;

            if null_score >= beta {
                if depth >= 10 {
                    // Verify at high depth with a real reduced search.
                    let verify_score =
                        self.pvs(b, depth - 1 - reduction, alpha, beta, false, ply, &mut line);
                    if verify_score >= beta {
                        return verify_score;
                    }
                } else {
                    return null_score;
                }
            }
        }

        // Internal iterative deepening: no hash move, but a shallow
        // search will usually find a good one.
        if hashed.is_null()
            && !in_check
            && ((is_pv_node && depth >= 6) || (!is_pv_node && depth >= 8))
        {
            let iid_depth = if is_pv_node {
                depth - depth / 4 - 1
            } else {
                (depth - 5) / 2
            };
            self.pvs(b, iid_depth, alpha, beta, is_cut_node, ply, &mut line);

            let iid_entry = TT_TABLE.probe(b.zobrist());
            if iid_entry != 0 {
                hash_scored = hash_score(iid_entry);
                node_type = hash_node_type(iid_entry);
                hash_dep = hash_depth(iid_entry);
                hashed = hash_move(iid_entry);
            }
        }

        // Generate the move list: evasions when in check.
        let legal_moves = if in_check {
            let mut evasions = MoveList::new();
            b.generate_check_evasions(&mut evasions);
            evasions
        } else {
            b.generate_moves()
        };

        let counter_key = self.ssi[ply].counter_key;
        let followup_key = self.ssi[ply].followup_key;
        let mut picker = MovePicker::new(
            depth,
            ply,
            hashed,
            legal_moves.clone(),
            counter_key,
            followup_key,
        );
        picker.generate_moves(b, &self.mem.search_params);

        let mut to_hash = BitMove::NULL;
        let mut moves_searched: u32 = 0;
        let mut best_score = -INFTY;

        //---------------------------- Move loop ----------------------------
        loop {
            let m = picker.next_move(b, &self.mem.search_params);
            if m.is_null() {
                break;
            }

            let is_check_move = b.is_check_move(m);
            let move_is_prunable = !m.is_capture()
                && !m.is_promo()
                && m != hashed
                && best_score > -MAX_PLY_MATE_SCORE
                && !is_check_move;

            let end_sq = m.get_dest();
            let piece = b.piece_on_sq(color, m.get_src());

            // Late-move reduction sizing; also drives several pruning
            // depths.
            let lmr_reduction = LMR_REDUCTIONS[depth.min(63) as usize]
                [(moves_searched.clamp(1, 63)) as usize];
            let lmr_depth = (depth - lmr_reduction).max(0);
            let prune_depth = if is_pv_node { lmr_depth + 1 } else { lmr_depth };

            // Futility pruning: quiet moves well below alpha are skipped.
            if move_is_prunable
                && !in_check
                && prune_depth <= 6
                && static_eval <= alpha - 80 * (prune_depth + 1)
            {
                continue;
            }

            // Move-count based pruning: late moves with poor history.
            let do_move_count_pruning = depth <= 12
                && moves_searched as i32
                    > LMP_MOVE_COUNTS[eval_improving as usize][depth as usize]
                        + if is_pv_node { depth } else { 0 };
            if move_is_prunable && do_move_count_pruning {
                continue;
            }

            // Continuation-history pruning.
            if move_is_prunable && prune_depth <= 2 {
                if let Some(p) = piece {
                    let cmh = counter_key
                        .map(|k| {
                            self.mem
                                .search_params
                                .counter_move_history
                                .get(k, p, end_sq)
                        })
                        .unwrap_or(0);
                    let fmh = followup_key
                        .map(|k| self.mem.search_params.followup_history.get(k, p, end_sq))
                        .unwrap_or(0);
                    if cmh < 0 && fmh < 0 {
                        continue;
                    }
                }
            }

            // Static-exchange pruning, tighter for quiets, looser for
            // everything at shallow depth.
            if move_is_prunable
                && prune_depth <= 6
                && !b.see_ge(m, -20 * prune_depth * prune_depth)
            {
                continue;
            }
            if !is_pv_node
                && best_score > -MAX_PLY_MATE_SCORE
                && depth <= 5
                && !b.see_ge(m, -100 * depth)
            {
                continue;
            }

            // Copy the board and make the move. The hash move needs the
            // extra verification in case of a key collision.
            let mut copy = b.static_copy();
            if m == hashed {
                if !copy.do_hash_move(m) {
                    hashed = BitMove::NULL;
                    picker.hashed = BitMove::NULL;
                    picker.generate_moves(b, &self.mem.search_params);
                    continue;
                }
                picker.generate_moves(b, &self.mem.search_params);
            } else if !copy.do_pseudo_legal_move(m) {
                continue;
            }
            self.count_node();

            let mut reduction = 0;
            // Late move reduction: with decent ordering, later quiets
            // rarely raise alpha; search them shallower first.
            if depth >= 3 && moves_searched > 2 && !m.is_capture() && !m.is_promo() {
                reduction = lmr_reduction;
                if m == self.mem.search_params.killers[ply][0]
                    || m == self.mem.search_params.killers[ply][1]
                {
                    reduction -= 1;
                }
                if let Some(p) = piece {
                    let mut history_value =
                        self.mem.search_params.history.get(color, p, end_sq) - 120;
                    if let Some(k) = counter_key {
                        history_value +=
                            self.mem.search_params.counter_move_history.get(k, p, end_sq);
                    }
                    if let Some(k) = followup_key {
                        history_value +=
                            self.mem.search_params.followup_history.get(k, p, end_sq);
                    }
                    reduction -= history_value / 512;
                }
                if is_cut_node {
                    reduction += 1;
                }
                if is_pv_node {
                    reduction -= 1;
                } else if !eval_improving {
                    reduction += 1;
                }

                // Never reduce straight into the quiescence search.
                reduction = reduction.clamp(0, (depth - 2).max(0));
            }

            let mut extension = 0;
            // Check extension for non-losing checking moves.
            if !do_move_count_pruning && is_check_move && b.see_ge(m, 0) {
                extension += 1;
            }

            // The singular-extension verification searches run from this
            // node, so its key must be on the repetition stack.
            self.mem.two_fold.push(b.zobrist());

            // Singular extension: if the hash move looks far better than
            // every alternative, extend it.
            if depth >= 7
                && reduction == 0
                && extension == 0
                && m == hashed
                && hash_scored.abs() < NEAR_MATE_SCORE
                && (node_type == CUT_NODE || node_type == PV_NODE)
                && hash_dep >= depth - 3
            {
                let mut is_singular = true;
                let se_window = hash_scored - 10 - depth;
                let se_depth = depth / 2 - 1;

                for i in 0..legal_moves.len() {
                    let se_move = legal_moves[i];
                    if se_move == hashed {
                        continue;
                    }
                    let mut se_copy = b.static_copy();
                    if !se_copy.do_pseudo_legal_move(se_move) {
                        continue;
                    }

                    let se_piece = b.piece_on_sq(color, se_move.get_src());
                    self.ssi[ply + 1].counter_key =
                        se_piece.map(|p| (p, se_move.get_dest()));
                    self.ssi[ply + 2].followup_key =
                        se_piece.map(|p| (p, se_move.get_dest()));

                    let score = -self.pvs(
                        &se_copy,
                        se_depth,
                        -se_window - 1,
                        -se_window,
                        !is_cut_node,
                        ply + 1,
                        &mut line,
                    );

                    if score > se_window {
                        is_singular = false;
                        break;
                    }
                }

                if is_singular {
                    extension += 1;
                }
            }

            self.ssi[ply + 1].counter_key = piece.map(|p| (p, end_sq));
            self.ssi[ply + 2].followup_key = piece.map(|p| (p, end_sq));

            let mut score;
            if moves_searched != 0 {
                // Null-window search with re-searches as needed.
                score = -self.pvs(
                    &copy,
                    depth - 1 - reduction + extension,
                    -alpha - 1,
                    -alpha,
                    true,
                    ply + 1,
                    &mut line,
                );

                if reduction > 0 && score > alpha {
                    score = -self.pvs(
                        &copy,
                        depth - 1 + extension,
                        -alpha - 1,
                        -alpha,
                        !is_cut_node,
                        ply + 1,
                        &mut line,
                    );
                }

                if alpha < score && score < beta {
                    score = -self.pvs(
                        &copy,
                        depth - 1 + extension,
                        -beta,
                        -alpha,
                        false,
                        ply + 1,
                        &mut line,
                    );
                }
            } else {
                // The first move always gets the full window and depth.
                score = -self.pvs(
                    &copy,
                    depth - 1 + extension,
                    -beta,
                    -alpha,
                    if is_pv_node { false } else { !is_cut_node },
                    ply + 1,
                    &mut line,
                );
            }

            self.mem.two_fold.pop();

            if is_stopped() {
                return 0;
            }

            // Beta cutoff.
            if score >= beta {
                let data = pack_hash_data(
                    depth,
                    m,
                    adjust_hash_score(score, ply as i32),
                    self.ssi[ply].static_eval,
                    CUT_NODE,
                    TT_TABLE.age(),
                );
                TT_TABLE.store(b.zobrist(), data, depth);

                if !m.is_capture() {
                    // Shift the previous killer down a slot.
                    if m != self.mem.search_params.killers[ply][0] {
                        self.mem.search_params.killers[ply][1] =
                            self.mem.search_params.killers[ply][0];
                        self.mem.search_params.killers[ply][0] = m;
                    }
                    picker.update_histories(b, &mut self.mem.search_params, m);
                } else {
                    picker.update_capture_histories(b, &mut self.mem.search_params, m);
                }

                change_pv(m, pv_line, &line);
                return score;
            }

            if score > best_score {
                best_score = score;
                if score > alpha {
                    alpha = score;
                    to_hash = m;
                    change_pv(m, pv_line, &line);
                }
            }

            moves_searched += 1;
        }
        // End move loop.

        // No legal moves: mate or stalemate.
        if best_score == -INFTY && moves_searched == 0 {
            return score_mate(in_check, ply as i32);
        }

        if prev_alpha < alpha && alpha < beta {
            // Exact score: a principal variation runs through this node.
            let data = pack_hash_data(
                depth,
                to_hash,
                adjust_hash_score(alpha, ply as i32),
                self.ssi[ply].static_eval,
                PV_NODE,
                TT_TABLE.age(),
            );
            TT_TABLE.store(b.zobrist(), data, depth);

            if !to_hash.is_capture() {
                picker.update_histories(b, &mut self.mem.search_params, to_hash);
            }
        } else if alpha <= prev_alpha {
            // Fail low: remember the prior hash move in case this node
            // turns into a PV or cut node later.
            let stored_move = if !is_pv_node && !hashed.is_null() {
                hashed
            } else {
                BitMove::NULL
            };
            let data = pack_hash_data(
                depth,
                stored_move,
                adjust_hash_score(best_score, ply as i32),
                self.ssi[ply].static_eval,
                ALL_NODE,
                TT_TABLE.age(),
            );
            TT_TABLE.store(b.zobrist(), data, depth);
        }

        best_score
    }

    //------------------------------------------------------------------
    // Quiescence

    /// Settles captures, promotions and first-ply checks so the static
    /// evaluation only ever runs on quiet positions.
    fn quiescence(&mut self, b: &Board, plies: i32, mut alpha: i32, beta: i32) -> i32 {
        let color = b.turn();
        if b.in_check(color) {
            return self.check_quiescence(b, plies, alpha, beta);
        }

        if b.is_insufficient_material() {
            return 0;
        }
        if b.fifty_move_counter() >= 2 && self.mem.two_fold.find(b.zobrist()) {
            return 0;
        }
        if is_stopped() {
            return 0;
        }

        // Probe the table at quiescence depth.
        let mut hash_scored = -INFTY;
        let mut node_type = NO_NODE_INFO;
        let hash_entry = TT_TABLE.probe(b.zobrist());
        if hash_entry != 0 {
            hash_scored = hash_score(hash_entry);
            if hash_scored >= MAX_PLY_MATE_SCORE {
                hash_scored -= self.mem.search_params.ply + plies;
            } else if hash_scored <= -MAX_PLY_MATE_SCORE {
                hash_scored += self.mem.search_params.ply + plies;
            }
            node_type = hash_node_type(hash_entry);
            if hash_depth(hash_entry) >= -plies
                && ((node_type == ALL_NODE && hash_scored <= alpha)
                    || (node_type == CUT_NODE && hash_scored >= beta)
                    || node_type == PV_NODE)
            {
                return hash_scored;
            }
        }

        // Stand pat.
        let mut stand_pat = match EVAL_CACHE.get(b.zobrist()) {
            Some(cached) => cached,
            None => {
                let e = if color == Player::White {
                    eval::evaluate(b)
                } else {
                    -eval::evaluate(b)
                };
                EVAL_CACHE.add(b.zobrist(), e);
                e
            }
        };
        if hash_scored != -INFTY
            && ((node_type == ALL_NODE && hash_scored < stand_pat)
                || (node_type == CUT_NODE && hash_scored > stand_pat)
                || node_type == PV_NODE)
        {
            stand_pat = hash_scored;
        }

        if stand_pat >= beta {
            return stand_pat;
        }
        if alpha < stand_pat {
            alpha = stand_pat;
        }
        let mut best_score = stand_pat;

        let mut picker = MovePicker::new_quiescence(plies);
        loop {
            let m = picker.next_move(b, &self.mem.search_params);
            if m.is_null() {
                break;
            }

            let is_quiet_check = !m.is_capture() && !m.is_promo();
            if m.is_capture() && !m.is_promo() {
                // Delta pruning: even capturing the victim for free falls
                // well short of alpha.
                let potential =
                    stand_pat + Board::value_of_piece(b.piece_on_sq(!color, m.get_dest()));
                if potential < alpha - 130 {
                    best_score = best_score.max(potential + 130);
                    continue;
                }
                // Futility: an even exchange cannot save a bad position.
                if stand_pat < alpha - 80 && !b.see_ge(m, 1) {
                    best_score = best_score.max(stand_pat + 80);
                    continue;
                }
                // Skip captures that lose material outright.
                if b.exchange_score(m) < 0 && !b.see_ge(m, 0) {
                    continue;
                }
            } else if m.is_promo() && !m.is_capture() {
                if !b.see_ge(m, 0) {
                    continue;
                }
            } else if is_quiet_check && !b.see_ge(m, 0) {
                continue;
            }

            let mut copy = b.static_copy();
            if !copy.do_pseudo_legal_move(m) {
                continue;
            }
            self.count_node();

            let score = if is_quiet_check {
                // A checking move makes the line reversible again; track
                // it for repetitions.
                self.mem.two_fold.push(b.zobrist());
                let s = -self.quiescence(&copy, plies + 1, -beta, -alpha);
                self.mem.two_fold.pop();
                s
            } else {
                -self.quiescence(&copy, plies + 1, -beta, -alpha)
            };

            if score >= beta {
                let data = pack_hash_data(
                    -plies,
                    m,
                    adjust_hash_score(score, self.mem.search_params.ply + plies),
                    stand_pat,
                    CUT_NODE,
                    TT_TABLE.age(),
                );
                TT_TABLE.store(b.zobrist(), data, -plies);
                return score;
            }

            if score > best_score {
                best_score = score;
                if score > alpha {
                    alpha = score;
                }
            }
        }

        best_score
    }

    /// Quiescence when in check: every evasion is considered, not just
    /// captures.
    fn check_quiescence(&mut self, b: &Board, plies: i32, mut alpha: i32, beta: i32) -> i32 {
        if b.fifty_move_counter() >= 2 && self.mem.two_fold.find(b.zobrist()) {
            return 0;
        }

        let mut escapes = MoveList::new();
        b.generate_check_evasions(&mut escapes);

        let mut best_score = -INFTY;
        for i in 0..escapes.len() {
            let m = escapes[i];

            if best_score > -MAX_PLY_MATE_SCORE && !m.is_capture() && !b.see_ge(m, 0) {
                continue;
            }

            let mut copy = b.static_copy();
            if !copy.do_pseudo_legal_move(m) {
                continue;
            }
            self.count_node();

            self.mem.two_fold.push(b.zobrist());
            let score = -self.quiescence(&copy, plies + 1, -beta, -alpha);
            self.mem.two_fold.pop();

            if score >= beta {
                return score;
            }
            if score > best_score {
                best_score = score;
                if score > alpha {
                    alpha = score;
                }
            }
        }

        // No legal evasion: we are already in check, so it is checkmate.
        if best_score == -INFTY {
            return -MATE_SCORE + self.mem.search_params.ply + plies;
        }

        best_score
    }
}

/// Scales an internal score into UCI centipawns, folding in the
/// tablebase bias when the root probe succeeded.
fn display_cp(score: i32, tb_score: i32, tb_success: bool) -> i32 {
    let adjusted = if tb_success {
        if tb_score == 0 {
            0
        } else {
            score / 10 + tb_score
        }
    } else {
        score
    };
    adjusted * 100 / eval::params::PIECE_VALUES[eval::params::EG][0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_fold_stack_semantics() {
        let mut stack = TwoFoldStack::new();
        // Game history: position A occurs once.
        stack.push(0xA);
        stack.push(0xB);
        stack.set_root_end();

        // A repetition of a game position needs a third occurrence.
        assert!(!stack.find(0xA));
        stack.push(0xA);
        assert!(stack.find(0xA));

        // A pure in-tree repetition triggers at the second occurrence.
        stack.push(0xC);
        assert!(stack.find(0xC));
        stack.pop();
        assert!(!stack.find(0xC));
    }

    #[test]
    fn mate_scores() {
        assert_eq!(score_mate(true, 5), -MATE_SCORE + 5);
        assert_eq!(score_mate(false, 5), 0);
    }

    #[test]
    fn lmr_table_shape() {
        init_reduction_table();
        assert_eq!(LMR_REDUCTIONS[1][2], 0);
        assert_eq!(LMR_REDUCTIONS[1][10], 1);
        // Reductions grow with both depth and move count.
        assert!(LMR_REDUCTIONS[20][30] >= LMR_REDUCTIONS[10][10]);
        assert!(LMR_REDUCTIONS[63][63] >= 3);
    }

    #[test]
    fn pv_threading() {
        let mut parent = SearchPV::new();
        let mut child = SearchPV::new();
        child.line[0] = BitMove::new(1);
        child.line[1] = BitMove::new(2);
        child.len = 2;
        change_pv(BitMove::new(3), &mut parent, &child);
        assert_eq!(parent.len, 3);
        assert_eq!(parent.line[0], BitMove::new(3));
        assert_eq!(parent.line[2], BitMove::new(2));
    }
}

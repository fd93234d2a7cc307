//! Staged move ordering.
//!
//! Work is deferred until a stage is actually reached: the hash move goes
//! out before anything is generated or scored, captures are scored by
//! MVV/LVA plus capture history with static-exchange losers pushed behind
//! the quiets, and quiets are scored by killers, promotion and the three
//! quiet history tables. A partial selection sort hands out one move at a
//! time so an early cutoff never pays for a full sort.

use sable::core::masks::MAX_MOVES;
use sable::{BitMove, Board, MoveList, PieceType};

use crate::tables::history::{history_change, ContKey, SearchParams};

const SCORE_QUEEN_PROMO: i32 = 1 << 11;
const SCORE_QUIET_MOVE: i32 = -(1 << 12);
const SCORE_LOSING_CAPTURE: i32 = -(1 << 14);

/// History updates are skipped beyond this depth; the huge bonuses would
/// swamp the tables.
const HISTORY_MAX_DEPTH: i32 = 18;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Stage {
    Start,
    HashMove,
    Captures,
    Quiets,
    QsCaptures,
    QsPromotions,
    QsChecks,
    QsDone,
}

#[derive(Copy, Clone)]
struct ScoredMove {
    m: BitMove,
    score: i32,
}

/// Staged generator for one node's moves.
pub struct MovePicker {
    stage: Stage,
    depth: i32,
    ply: usize,
    /// The hash move, returned first when present. Cleared by the search
    /// if `Board::do_hash_move` rejects it.
    pub hashed: BitMove,
    /// Pre-generated pseudo-legal moves (main search only).
    moves: MoveList,
    scores: [ScoredMove; MAX_MOVES],
    /// Total scored entries, deferred captures included.
    scored_len: usize,
    /// End of the active selection window; deferred captures sit between
    /// here and `scored_len` until a later stage re-expands the window.
    score_size: usize,
    index: usize,
    quiet_start: usize,
    counter_key: Option<ContKey>,
    followup_key: Option<ContKey>,
}

impl MovePicker {
    /// A picker for the main search over a pre-generated move list.
    pub fn new(
        depth: i32,
        ply: usize,
        hashed: BitMove,
        moves: MoveList,
        counter_key: Option<ContKey>,
        followup_key: Option<ContKey>,
    ) -> MovePicker {
        MovePicker {
            stage: Stage::Start,
            depth,
            ply,
            hashed,
            moves,
            scores: [ScoredMove {
                m: BitMove::NULL,
                score: 0,
            }; MAX_MOVES],
            scored_len: 0,
            score_size: 0,
            index: 0,
            quiet_start: 0,
            counter_key,
            followup_key,
        }
    }

    /// A picker for quiescence: captures, then queen promotions, then (at
    /// the first quiescence ply only) quiet checks.
    pub fn new_quiescence(qs_ply: i32) -> MovePicker {
        MovePicker {
            stage: Stage::QsCaptures,
            depth: qs_ply,
            ply: 0,
            hashed: BitMove::NULL,
            moves: MoveList::new(),
            scores: [ScoredMove {
                m: BitMove::NULL,
                score: 0,
            }; MAX_MOVES],
            scored_len: 0,
            score_size: 0,
            index: 0,
            quiet_start: 0,
            counter_key: None,
            followup_key: None,
        }
    }

    /// Advances the staged generation. Called internally when the scored
    /// moves run out, and by the search right after the hash move has
    /// been applied (or rejected).
    pub fn generate_moves(&mut self, b: &Board, hist: &SearchParams) {
        match self.stage {
            Stage::Start => {
                if !self.hashed.is_null() {
                    self.stage = Stage::HashMove;
                    // The hash move is handled separately; drop it from
                    // the list so it is not searched twice.
                    for i in 0..self.moves.len() {
                        if self.moves[i] == self.hashed {
                            self.moves.remove(i);
                            break;
                        }
                    }
                } else {
                    self.stage = Stage::HashMove;
                    self.generate_moves(b, hist);
                }
            }
            Stage::HashMove => {
                self.find_quiet_start();
                self.stage = Stage::Captures;
                self.score_captures(b, hist);
            }
            Stage::Captures => {
                self.stage = Stage::Quiets;
                self.score_quiets(b, hist);
            }
            Stage::Quiets => {}

            Stage::QsCaptures => {
                self.stage = Stage::QsPromotions;
                b.generate_captures(&mut self.moves, false);
                for i in 0..self.moves.len() {
                    let m = self.moves[i];
                    self.push_scored(ScoredMove {
                        m,
                        score: b.mvv_lva(m),
                    });
                }
                self.score_size = self.scored_len;
            }
            Stage::QsPromotions => {
                self.stage = Stage::QsChecks;
                let before = self.moves.len();
                b.generate_queen_promotions(&mut self.moves);
                for i in before..self.moves.len() {
                    let m = self.moves[i];
                    self.push_scored(ScoredMove { m, score: 0 });
                }
                self.score_size = self.scored_len;
            }
            Stage::QsChecks => {
                self.stage = Stage::QsDone;
                if self.depth == 0 {
                    let before = self.moves.len();
                    b.generate_checks(&mut self.moves);
                    for i in before..self.moves.len() {
                        let m = self.moves[i];
                        self.push_scored(ScoredMove { m, score: 0 });
                    }
                    self.score_size = self.scored_len;
                }
            }
            Stage::QsDone => {}
        }
    }

    /// Retrieves the next move with the highest score using a partial
    /// selection sort, or the null move when none remain.
    pub fn next_move(&mut self, b: &Board, hist: &SearchParams) -> BitMove {
        if self.stage == Stage::HashMove {
            return self.hashed;
        }

        loop {
            while self.index >= self.score_size {
                if self.stage == Stage::Quiets || self.stage == Stage::QsDone {
                    return BitMove::NULL;
                }
                self.generate_moves(b, hist);
            }

            let mut best_index = self.index;
            for i in (self.index + 1)..self.score_size {
                if self.scores[i].score > self.scores[best_index].score {
                    best_index = i;
                }
            }

            // Losing captures wait until the quiets have been tried.
            if self.stage == Stage::Captures
                && self.scores[best_index].m.is_capture()
                && !b.see_ge(self.scores[best_index].m, 0)
            {
                self.score_size -= 1;
                self.scores.swap(best_index, self.score_size);
                continue;
            }

            self.scores.swap(best_index, self.index);
            self.index += 1;
            return self.scores[self.index - 1].m;
        }
    }

    #[inline(always)]
    fn push_scored(&mut self, sm: ScoredMove) {
        self.scores[self.scored_len] = sm;
        self.scored_len += 1;
    }

    fn find_quiet_start(&mut self) {
        for i in 0..self.moves.len() {
            if !self.moves[i].is_capture() {
                self.quiet_start = i;
                return;
            }
        }
        self.quiet_start = self.moves.len();
    }

    /// Scores captures by depth-adjusted MVV/LVA plus capture history.
    fn score_captures(&mut self, b: &Board, hist: &SearchParams) {
        let color = b.turn();
        for i in 0..self.quiet_start {
            let m = self.moves[i];
            let piece = b
                .piece_on_sq(color, m.get_src())
                .unwrap_or(PieceType::P);
            let captured = b
                .piece_on_sq(!color, m.get_dest())
                .unwrap_or(PieceType::P);

            let adjusted_mvv_lva = 8 * b.mvv_lva(m) / (4 + self.depth);
            self.push_scored(ScoredMove {
                m,
                score: SCORE_LOSING_CAPTURE
                    + adjusted_mvv_lva
                    + hist
                        .capture_history
                        .get(color, piece, captured, m.get_dest()),
            });
        }
        self.score_size = self.scored_len;
    }

    /// Scores quiets: killers just below a queen promotion, everything
    /// else by the summed history tables.
    fn score_quiets(&mut self, b: &Board, hist: &SearchParams) {
        let color = b.turn();
        for i in self.quiet_start..self.moves.len() {
            let m = self.moves[i];

            let score = if m == hist.killers[self.ply][0] {
                SCORE_QUEEN_PROMO - 1
            } else if m == hist.killers[self.ply][1] {
                SCORE_QUEEN_PROMO - 2
            } else if m.is_promo() && m.promo_piece() == PieceType::Q {
                SCORE_QUEEN_PROMO
            } else {
                let piece = b
                    .piece_on_sq(color, m.get_src())
                    .unwrap_or(PieceType::P);
                let to = m.get_dest();
                let mut total = hist.history.get(color, piece, to);
                if let Some(key) = self.counter_key {
                    total += hist.counter_move_history.get(key, piece, to);
                }
                if let Some(key) = self.followup_key {
                    total += hist.followup_history.get(key, piece, to);
                }
                SCORE_QUIET_MOVE + total
            };
            self.push_scored(ScoredMove { m, score });
        }
        self.score_size = self.scored_len;
    }

    /// Rewards the cut (or best) quiet move and punishes every quiet
    /// searched before it; captures tried on the way get their capture
    /// history pushed down.
    pub fn update_histories(&self, b: &Board, hist: &mut SearchParams, best: BitMove) {
        if self.depth > HISTORY_MAX_DEPTH {
            return;
        }
        let change = history_change(self.depth);
        let color = b.turn();

        if let Some(piece) = b.piece_on_sq(color, best.get_src()) {
            let to = best.get_dest();
            hist.history.update(color, piece, to, change, change);
            if let Some(key) = self.counter_key {
                hist.counter_move_history.update(key, piece, to, change, change);
            }
            if let Some(key) = self.followup_key {
                hist.followup_history.update(key, piece, to, change, change);
            }
        }

        // Only the hash move was searched: nothing to punish.
        if self.index == 0 {
            return;
        }
        for i in 0..self.index - 1 {
            let m = self.scores[i].m;
            if m == best {
                break;
            }
            let piece = match b.piece_on_sq(color, m.get_src()) {
                Some(p) => p,
                None => continue,
            };
            let to = m.get_dest();
            if m.is_capture() {
                let captured = b.piece_on_sq(!color, to).unwrap_or(PieceType::P);
                hist.capture_history
                    .update(color, piece, captured, to, change, -change);
            } else {
                hist.history.update(color, piece, to, change, -change);
                if let Some(key) = self.counter_key {
                    hist.counter_move_history.update(key, piece, to, change, -change);
                }
                if let Some(key) = self.followup_key {
                    hist.followup_history.update(key, piece, to, change, -change);
                }
            }
        }
    }

    /// The capture-move twin of [`MovePicker::update_histories`].
    pub fn update_capture_histories(&self, b: &Board, hist: &mut SearchParams, best: BitMove) {
        if self.depth > HISTORY_MAX_DEPTH {
            return;
        }
        let change = history_change(self.depth);
        let color = b.turn();

        if let Some(piece) = b.piece_on_sq(color, best.get_src()) {
            let captured = b.piece_on_sq(!color, best.get_dest()).unwrap_or(PieceType::P);
            hist.capture_history
                .update(color, piece, captured, best.get_dest(), change, change);
        }

        if self.index == 0 {
            return;
        }
        for i in 0..self.index - 1 {
            let m = self.scores[i].m;
            if m == best {
                break;
            }
            if !m.is_capture() {
                continue;
            }
            let piece = match b.piece_on_sq(color, m.get_src()) {
                Some(p) => p,
                None => continue,
            };
            let captured = b.piece_on_sq(!color, m.get_dest()).unwrap_or(PieceType::P);
            hist.capture_history
                .update(color, piece, captured, m.get_dest(), change, -change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable::Board;

    fn drain(picker: &mut MovePicker, b: &Board, hist: &SearchParams) -> Vec<BitMove> {
        let mut out = Vec::new();
        loop {
            let m = picker.next_move(b, hist);
            if m.is_null() {
                break;
            }
            if picker.hashed == m && out.is_empty() {
                // Consume the hash stage the way the search would.
                picker.generate_moves(b, hist);
            }
            out.push(m);
        }
        out
    }

    #[test]
    fn hash_move_comes_first_and_once() {
        let board = Board::start_pos();
        let moves = board.generate_moves();
        let hashed = moves[5];
        let hist = SearchParams::new();
        let mut picker = MovePicker::new(4, 0, hashed, moves.clone(), None, None);
        picker.generate_moves(&board, &hist);

        let order = drain(&mut picker, &board, &hist);
        assert_eq!(order[0], hashed);
        assert_eq!(order.iter().filter(|m| **m == hashed).count(), 1);
        assert_eq!(order.len(), moves.len());
    }

    #[test]
    fn winning_captures_precede_quiets_and_losers() {
        // Nxa4 wins a pawn; Nxd5 and Bxd5 walk into the e6 pawn.
        let board =
            Board::from_fen("rnbqkbnr/1pp2ppp/4p3/3p4/p1B5/2N5/PPPP1PPP/R1BQK1NR w KQkq - 0 1")
                .unwrap();
        let moves = board.generate_moves();
        let hist = SearchParams::new();
        let mut picker = MovePicker::new(4, 0, BitMove::NULL, moves, None, None);
        picker.generate_moves(&board, &hist);
        let order = drain(&mut picker, &board, &hist);

        let first_quiet = order.iter().position(|m| !m.is_capture()).unwrap();
        // Every capture after the first quiet move must be a SEE loser.
        for m in order[first_quiet..].iter().filter(|m| m.is_capture()) {
            assert!(!board.see_ge(*m, 0), "{} should have been deferred", m);
        }
        // And every capture before it must not be.
        for m in order[..first_quiet].iter().filter(|m| m.is_capture()) {
            assert!(board.see_ge(*m, 0), "{} should not be first", m);
        }
    }

    #[test]
    fn killers_sort_above_plain_quiets() {
        let board = Board::start_pos();
        let moves = board.generate_moves();
        let mut hist = SearchParams::new();
        let killer = moves
            .iter()
            .copied()
            .find(|m| !m.is_capture() && m.stringify() == "b1c3")
            .unwrap();
        hist.killers[0][0] = killer;

        let mut picker = MovePicker::new(4, 0, BitMove::NULL, moves, None, None);
        picker.generate_moves(&board, &hist);
        let order = drain(&mut picker, &board, &hist);
        assert_eq!(order[0], killer);
    }

    #[test]
    fn quiescence_stages() {
        let board =
            Board::from_fen("rnbqkbnr/1pp2ppp/4p3/3p4/p1B5/2N5/PPPP1PPP/R1BQK1NR w KQkq - 0 1")
                .unwrap();
        let hist = SearchParams::new();
        let mut picker = MovePicker::new_quiescence(1);
        let order = drain(&mut picker, &board, &hist);
        // At quiescence plies beyond the first, only captures appear.
        assert!(order.iter().all(|m| m.is_capture()));
        assert!(!order.is_empty());
    }
}

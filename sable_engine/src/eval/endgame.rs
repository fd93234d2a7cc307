//! Special endgame scoring: positions where a forced mate is known, or
//! where no mate can be forced at all.

use sable::{BitBoard, Player, SQ};

use super::params::{KNOWN_WIN, PIECE_VALUES, EG};
use super::Evaluator;

const W: usize = 0;
const B: usize = 1;
const P: usize = 0;
const N: usize = 1;
const BSHP: usize = 2;
const R: usize = 3;
const Q: usize = 4;
const K: usize = 5;

impl Evaluator {
    /// Scores endgames the evaluator knows outright. Returns `None` when
    /// the position is not one of the handled cases and the normal
    /// evaluation should proceed.
    pub(super) fn check_endgame_cases(&self) -> Option<i32> {
        let num_w = self.all_pieces[W].count_bits() as i32 - 1;
        let num_b = self.all_pieces[B].count_bits() as i32 - 1;
        let num_pieces = num_w + num_b;

        // Rook or queen plus anything against a lone king is a forced win.
        if num_b == 0 && (self.pieces[W][R] | self.pieces[W][Q]).is_not_empty() {
            return Some(self.score_simple_known_win(Player::White));
        }
        if num_w == 0 && (self.pieces[B][R] | self.pieces[B][Q]).is_not_empty() {
            return Some(self.score_simple_known_win(Player::Black));
        }

        if num_pieces == 1 {
            // King and pawn versus king: probably winning, more so the
            // further the pawn has run.
            if self.pieces[W][P].is_not_empty() {
                let r = (self.pieces[W][P].bit_scan_forward().0 >> 3) as i32;
                return Some(3 * PIECE_VALUES[EG][P] / 2 + 5 * (r - 1) * (r - 2));
            }
            if self.pieces[B][P].is_not_empty() {
                let r = 7 - (self.pieces[B][P].bit_scan_forward().0 >> 3) as i32;
                return Some(-3 * PIECE_VALUES[EG][P] / 2 - 5 * (r - 1) * (r - 2));
            }
        } else if num_pieces == 2 {
            if num_w == 1 {
                // One piece each: minor vs minor, rook vs rook and queen
                // vs queen are all dead draws.
                if (self.pieces[W][N] | self.pieces[W][BSHP]).is_not_empty()
                    && (self.pieces[B][N] | self.pieces[B][BSHP]).is_not_empty()
                {
                    return Some(0);
                }
                if self.pieces[W][R].is_not_empty() && self.pieces[B][R].is_not_empty() {
                    return Some(0);
                }
                if self.pieces[W][Q].is_not_empty() && self.pieces[B][Q].is_not_empty() {
                    return Some(0);
                }
            } else {
                // Both extra pieces belong to one side.
                if self.pieces[W][P].is_not_empty() {
                    return Some(self.score_pawn_plus_piece(Player::White));
                }
                if self.pieces[B][P].is_not_empty() {
                    return Some(self.score_pawn_plus_piece(Player::Black));
                }
                // Two knights cannot force mate.
                if self.pieces[W][N].count_bits() == 2 || self.pieces[B][N].count_bits() == 2 {
                    return Some(0);
                }
                // Two bishops win.
                if self.pieces[W][BSHP].count_bits() == 2 {
                    return Some(self.score_simple_known_win(Player::White));
                }
                if self.pieces[B][BSHP].count_bits() == 2 {
                    return Some(self.score_simple_known_win(Player::Black));
                }
                // Knight and bishop force mate in the corner of the
                // bishop's color.
                if self.pieces[W][N].is_not_empty() && self.pieces[W][BSHP].is_not_empty() {
                    let w_king = self.king(W);
                    let b_king = self.king(B);
                    let mut value = KNOWN_WIN
                        + score_corner_distance(Player::White, w_king, b_king);
                    value -= 20 * self.distance_to_bishop_corner(self.pieces[W][BSHP], b_king);
                    return Some(value);
                }
                if self.pieces[B][N].is_not_empty() && self.pieces[B][BSHP].is_not_empty() {
                    let w_king = self.king(W);
                    let b_king = self.king(B);
                    let mut value = -KNOWN_WIN
                        + score_corner_distance(Player::Black, w_king, b_king);
                    value += 20 * self.distance_to_bishop_corner(self.pieces[B][BSHP], w_king);
                    return Some(value);
                }
            }
        }

        None
    }

    #[inline]
    fn king(&self, color: usize) -> SQ {
        self.pieces[color][K].bit_scan_forward()
    }

    /// Manhattan distance from the losing king to the nearest corner of
    /// the mating bishop's color.
    fn distance_to_bishop_corner(&self, bishop: BitBoard, losing_king: SQ) -> i32 {
        let corners: [SQ; 2] = if (bishop & BitBoard::LIGHT_SQUARES).is_not_empty() {
            // Light-squared corners are h1 and a8.
            [SQ::H1, SQ::A8]
        } else {
            [SQ::A1, SQ::H8]
        };
        corners
            .iter()
            .map(|&c| sable::helper::manhattan_distance(losing_king, c) as i32)
            .min()
            .unwrap()
    }

    /// Pawn plus another piece against a bare king. Winning, except for
    /// the rook pawn guarded by the wrong-colored bishop when the
    /// defending king reaches the corner first.
    fn score_pawn_plus_piece(&self, winner: Player) -> i32 {
        let w_king = self.king(W);
        let b_king = self.king(B);

        if winner == Player::White {
            let pawn_sq = self.pieces[W][P].bit_scan_forward();
            let (pf, pr) = ((pawn_sq.0 & 7) as i32, (pawn_sq.0 >> 3) as i32);
            if self.pieces[W][BSHP].is_not_empty()
                && ((pf == 0 && (self.pieces[W][BSHP] & BitBoard::DARK_SQUARES).is_not_empty())
                    || (pf == 7
                        && (self.pieces[W][BSHP] & BitBoard::LIGHT_SQUARES).is_not_empty()))
            {
                // Race for the queening corner.
                let w_dist = (7 - (w_king.0 >> 3) as i32).max(((w_king.0 & 7) as i32 - pf).abs());
                let mut b_dist =
                    (7 - (b_king.0 >> 3) as i32).max(((b_king.0 & 7) as i32 - pf).abs());
                let queen_dist = (7 - pr).min(5) + 1;
                if self.player_to_move == Player::Black {
                    b_dist -= 1;
                }
                if b_dist < w_dist.min(queen_dist) {
                    return 0;
                }
            }
            KNOWN_WIN / 2 + 8 * pr * pr + score_corner_distance(Player::White, w_king, b_king)
        } else {
            let pawn_sq = self.pieces[B][P].bit_scan_forward();
            let (pf, pr) = ((pawn_sq.0 & 7) as i32, (pawn_sq.0 >> 3) as i32);
            if self.pieces[B][BSHP].is_not_empty()
                && ((pf == 0 && (self.pieces[B][BSHP] & BitBoard::LIGHT_SQUARES).is_not_empty())
                    || (pf == 7
                        && (self.pieces[B][BSHP] & BitBoard::DARK_SQUARES).is_not_empty()))
            {
                let mut w_dist = ((w_king.0 >> 3) as i32).max(((w_king.0 & 7) as i32 - pf).abs());
                let b_dist = ((b_king.0 >> 3) as i32).max(((b_king.0 & 7) as i32 - pf).abs());
                let queen_dist = pr.min(5) + 1;
                if self.player_to_move == Player::White {
                    w_dist -= 1;
                }
                if w_dist < b_dist.min(queen_dist) {
                    return 0;
                }
            }
            -KNOWN_WIN / 2 - 8 * pr * pr + score_corner_distance(Player::White, w_king, b_king)
        }
    }

    pub(super) fn score_simple_known_win(&self, winner: Player) -> i32 {
        let w_king = self.king(W);
        let b_king = self.king(B);
        let win_score = if winner == Player::White {
            KNOWN_WIN
        } else {
            -KNOWN_WIN
        };
        win_score + score_corner_distance(winner, w_king, b_king)
    }
}

/// Drives the losing king toward the board edge and the winning king
/// toward it.
fn score_corner_distance(winner: Player, w_king: SQ, b_king: SQ) -> i32 {
    let (wf, wr) = ((w_king.0 & 7) as i32, (w_king.0 >> 3) as i32);
    let (bf, br) = ((b_king.0 & 7) as i32, (b_king.0 >> 3) as i32);
    let w_dist = wf.min(7 - wf) + wr.min(7 - wr);
    let b_dist = bf.min(7 - bf) + br.min(7 - br);
    if winner == Player::White {
        w_dist - 2 * b_dist
    } else {
        2 * w_dist - b_dist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable::Board;

    fn eval_of(fen: &str) -> i32 {
        crate::eval::evaluate(&Board::from_fen(fen).unwrap())
    }

    #[test]
    fn rook_endings_are_known_wins() {
        assert!(eval_of("8/2k5/8/8/8/8/4R3/4K3 w - - 0 1") > KNOWN_WIN / 2);
        assert!(eval_of("8/2k5/8/8/8/8/4r3/4K3 w - - 0 1") < -(KNOWN_WIN / 2));
        assert!(eval_of("8/2k5/8/8/8/8/4Q3/4K3 w - - 0 1") > KNOWN_WIN / 2);
    }

    #[test]
    fn bare_minor_endings_draw() {
        assert_eq!(eval_of("4k3/8/8/8/3n4/8/8/2B1K3 w - - 0 1"), 0);
        assert_eq!(eval_of("4k3/8/8/8/3r4/8/8/3RK3 w - - 0 1"), 0);
        assert_eq!(eval_of("4k3/8/8/8/8/8/8/NN2K3 w - - 0 1"), 0);
    }

    #[test]
    fn kp_vs_k_prefers_advanced_pawns() {
        let far = eval_of("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1");
        let near = eval_of("4k3/8/8/8/4P3/8/8/4K3 w - - 0 1");
        assert!(far > 0);
        assert!(near > far);
    }

    #[test]
    fn wrong_bishop_rook_pawn_is_drawn() {
        // Black king sits in the corner against a dark-squared bishop and
        // an a-pawn that queens on a light square.
        assert_eq!(eval_of("k7/8/8/8/8/P7/8/K1B5 w - - 0 1"), 0);
        // With the right-colored bishop it is winning.
        assert!(eval_of("k7/8/8/8/8/P7/8/K2B4 w - - 0 1") > KNOWN_WIN / 4);
    }

    #[test]
    fn knight_bishop_mate_drives_to_corner() {
        let far_corner = eval_of("4k3/8/8/8/8/8/8/1NB1K3 w - - 0 1");
        let near_corner = eval_of("7k/8/8/8/8/8/8/1NB1K3 w - - 0 1");
        // h8 is the dark corner for a c1 bishop, so the cornered king is
        // worse for black.
        assert!(near_corner > far_corner);
        assert!(far_corner > KNOWN_WIN / 2);
    }
}

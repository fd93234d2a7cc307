//! Pseudo-legal move generation.
//!
//! Pseudo-legal moves disregard whether the player's king is left in
//! check. The generators bitscan each piece bitboard, look up the attack
//! set, and intersect with the destination filter (enemy occupancy for
//! captures, empty squares for quiets).
//!
//! Pawn moves are generated in parallel over whole bitboards: since the
//! start square of a pawn move is determined by its end square, a single
//! shift handles every pawn at once.

use crate::core::bitboard::BitBoard;
use crate::core::masks::*;
use crate::core::move_list::MoveList;
use crate::core::piece_move::BitMove;
use crate::core::sq::SQ;
use crate::core::{PieceType, Player};
use crate::helper;

use super::Board;

const MOVEGEN_CAPTURES: bool = true;
const MOVEGEN_QUIETS: bool = false;

impl Board {
    /// Generates every pseudo-legal move for the side to move: captures
    /// and promotions first, quiets second.
    pub fn generate_moves(&self) -> MoveList {
        let mut moves = MoveList::new();
        self.generate_captures(&mut moves, true);
        self.generate_quiets(&mut moves);
        moves
    }

    /// Generates all strictly legal moves for the side to move.
    pub fn generate_legal_moves(&self) -> MoveList {
        let pseudo = if self.in_check(self.turn()) {
            let mut escapes = MoveList::new();
            self.generate_check_evasions(&mut escapes);
            pseudo_filter(self, escapes)
        } else {
            pseudo_filter(self, self.generate_moves())
        };
        pseudo
    }

    /// Generates pseudo-legal captures, with promotions when
    /// `include_promotions` is set. Emission order: king captures, pawn
    /// captures, then knight through queen captures.
    pub fn generate_captures(&self, captures: &mut MoveList, include_promotions: bool) {
        let color = self.turn();
        let other_pieces = self.get_occupied_player(!color);

        let king_sq = self.king_sq(color);
        self.add_moves_to_list::<{ MOVEGEN_CAPTURES }>(
            captures,
            king_sq,
            helper::king_attacks(king_sq),
            other_pieces,
        );

        self.add_pawn_captures_to_list(captures, other_pieces, include_promotions);

        self.add_piece_moves_to_list::<{ MOVEGEN_CAPTURES }>(captures, other_pieces);
    }

    /// Generates pseudo-legal quiet moves. Emission order: castles,
    /// knight through queen moves, pawn pushes (promotions included),
    /// king moves.
    pub fn generate_quiets(&self, quiets: &mut MoveList) {
        let color = self.turn();

        self.add_castles_to_list(quiets);

        self.add_piece_moves_to_list::<{ MOVEGEN_QUIETS }>(quiets, BitBoard::EMPTY);

        self.add_pawn_moves_to_list(quiets);

        let king_sq = self.king_sq(color);
        self.add_moves_to_list::<{ MOVEGEN_QUIETS }>(
            quiets,
            king_sq,
            helper::king_attacks(king_sq),
            BitBoard::EMPTY,
        );
    }

    /// Generates queen promotions only, captures included. Used by the
    /// quiescence search.
    pub fn generate_queen_promotions(&self, moves: &mut MoveList) {
        let color = self.turn();
        let other_pieces = self.get_occupied_player(!color);
        let pawns = self.piece_bb(color, PieceType::P);
        let final_rank = color.promotion_rank_bb();

        let (left_diff, right_diff): (i8, i8) = match color {
            Player::White => (-7, -9),
            Player::Black => (9, 7),
        };

        let mut promotions = self.pawn_left_captures(pawns) & other_pieces & final_rank;
        while let Some(dst) = promotions.pop_some_lsb() {
            let src = SQ((dst.0 as i8 + left_diff) as u8);
            moves.push(BitMove::make_promotion(src, dst, PieceType::Q, true));
        }

        promotions = self.pawn_right_captures(pawns) & other_pieces & final_rank;
        while let Some(dst) = promotions.pop_some_lsb() {
            let src = SQ((dst.0 as i8 + right_diff) as u8);
            moves.push(BitMove::make_promotion(src, dst, PieceType::Q, true));
        }

        let sq_diff: i8 = match color {
            Player::White => -8,
            Player::Black => 8,
        };
        promotions = self.pawn_single_pushes(pawns) & final_rank;
        while let Some(dst) = promotions.pop_some_lsb() {
            let src = SQ((dst.0 as i8 + sq_diff) as u8);
            moves.push(BitMove::make_promotion(src, dst, PieceType::Q, false));
        }
    }

    /// Generates pseudo-legal quiet moves that give check, direct or
    /// discovered. Promotions and en passant are left out; double pawn
    /// pushes are included.
    ///
    /// For each piece we intersect its quiet destinations with the attack
    /// map from the opposing king square; pieces whose removal uncovers an
    /// x-ray attacker contribute every quiet move instead.
    pub fn generate_checks(&self, checks: &mut MoveList) {
        let color = self.turn();
        let king_sq = self.king_sq(!color);
        // Knights and bishops can only reach the king from squares of the
        // king's color complex.
        let king_parity = if (self.piece_bb(!color, PieceType::K) & BitBoard::LIGHT_SQUARES)
            .is_not_empty()
        {
            BitBoard::LIGHT_SQUARES
        } else {
            BitBoard::DARK_SQUARES
        };
        let potential_xray = self.piece_bb(color, PieceType::B)
            | self.piece_bb(color, PieceType::R)
            | self.piece_bb(color, PieceType::Q);

        let pawns = self.piece_bb(color, PieceType::P);
        let p_attack_map = BitBoard(helper::pawn_attacks_from(!color, king_sq));
        let final_rank = color.promotion_rank_bb();
        let sq_diff: i8 = match color {
            Player::White => -8,
            Player::Black => 8,
        };

        let mut p_legal = self.pawn_single_pushes(pawns);
        // Remove promotions.
        p_legal ^= p_legal & final_rank;
        p_legal &= p_attack_map;
        while let Some(dst) = p_legal.pop_some_lsb() {
            checks.push(BitMove::make_quiet(SQ((dst.0 as i8 + sq_diff) as u8), dst));
        }

        p_legal = self.pawn_double_pushes(pawns) & p_attack_map;
        while let Some(dst) = p_legal.pop_some_lsb() {
            checks.push(BitMove::make_pawn_push(
                SQ((dst.0 as i8 + 2 * sq_diff) as u8),
                dst,
            ));
        }

        let occ = self.occupied();

        let mut knights = self.piece_bb(color, PieceType::N) & king_parity;
        let n_attack_map = helper::knight_attacks(king_sq);
        while let Some(src) = knights.pop_some_lsb() {
            let mut targets = helper::knight_attacks(src);
            let xrays = self.xray_piece_map(color, king_sq, occ ^ src.to_bb());
            if (xrays & potential_xray).is_empty() {
                targets &= n_attack_map;
            }
            self.add_moves_to_list::<{ MOVEGEN_QUIETS }>(checks, src, targets, BitBoard::EMPTY);
        }

        let mut bishops = self.piece_bb(color, PieceType::B) & king_parity;
        let b_attack_map = helper::bishop_attacks(occ, king_sq);
        while let Some(src) = bishops.pop_some_lsb() {
            let mut targets = helper::bishop_attacks(occ, src);
            let xrays = self.xray_piece_map(color, king_sq, occ ^ src.to_bb());
            if (xrays & potential_xray).is_empty() {
                targets &= b_attack_map;
            }
            self.add_moves_to_list::<{ MOVEGEN_QUIETS }>(checks, src, targets, BitBoard::EMPTY);
        }

        let mut rooks = self.piece_bb(color, PieceType::R);
        let r_attack_map = helper::rook_attacks(occ, king_sq);
        while let Some(src) = rooks.pop_some_lsb() {
            let mut targets = helper::rook_attacks(occ, src);
            let xrays = self.xray_piece_map(color, king_sq, occ ^ src.to_bb());
            if (xrays & potential_xray).is_empty() {
                targets &= r_attack_map;
            }
            self.add_moves_to_list::<{ MOVEGEN_QUIETS }>(checks, src, targets, BitBoard::EMPTY);
        }

        let mut queens = self.piece_bb(color, PieceType::Q);
        let q_attack_map = helper::queen_attacks(occ, king_sq);
        while let Some(src) = queens.pop_some_lsb() {
            let targets = helper::queen_attacks(occ, src) & q_attack_map;
            self.add_moves_to_list::<{ MOVEGEN_QUIETS }>(checks, src, targets, BitBoard::EMPTY);
        }
    }

    /// Generates moves that try to get out of check. Only valid when the
    /// side to move is in check. With a double check only king moves are
    /// produced; with a single checker we add captures of the checker and
    /// blocks of its ray.
    pub fn generate_check_evasions(&self, escapes: &mut MoveList) {
        let color = self.turn();
        let king_sq = self.king_sq(color);
        let attack_map = self.attack_map(!color, king_sq);
        // Consider only captures of pieces giving check.
        let checkers = self.get_occupied_player(!color) & attack_map;

        if checkers.count_bits() >= 2 {
            let king_moves = helper::king_attacks(king_sq);
            self.add_moves_to_list::<{ MOVEGEN_CAPTURES }>(
                escapes,
                king_sq,
                king_moves,
                self.get_occupied_player(!color),
            );
            self.add_moves_to_list::<{ MOVEGEN_QUIETS }>(
                escapes,
                king_sq,
                king_moves,
                BitBoard::EMPTY,
            );
            return;
        }

        self.add_pawn_captures_to_list(escapes, checkers, true);

        let occ = self.occupied();
        // For a sliding checker, the squares between it and the king can
        // be blocked.
        let checker_sq = checkers.bit_scan_forward();
        let xray_sqs = match self.piece_on_sq(!color, checker_sq) {
            Some(PieceType::B) => helper::bishop_attacks(occ, checker_sq),
            Some(PieceType::R) => helper::rook_attacks(occ, checker_sq),
            Some(PieceType::Q) => helper::queen_attacks(occ, checker_sq),
            _ => BitBoard::EMPTY,
        };

        self.add_piece_moves_to_list::<{ MOVEGEN_CAPTURES }>(escapes, checkers);

        let king_moves = helper::king_attacks(king_sq);
        self.add_moves_to_list::<{ MOVEGEN_CAPTURES }>(
            escapes,
            king_sq,
            king_moves,
            self.get_occupied_player(!color),
        );

        self.add_pawn_block_moves_to_list(escapes, xray_sqs);

        let mut knights = self.piece_bb(color, PieceType::N);
        while let Some(src) = knights.pop_some_lsb() {
            self.add_moves_to_list::<{ MOVEGEN_QUIETS }>(
                escapes,
                src,
                helper::knight_attacks(src) & xray_sqs,
                BitBoard::EMPTY,
            );
        }

        let mut bishops = self.piece_bb(color, PieceType::B);
        while let Some(src) = bishops.pop_some_lsb() {
            self.add_moves_to_list::<{ MOVEGEN_QUIETS }>(
                escapes,
                src,
                helper::bishop_attacks(occ, src) & xray_sqs,
                BitBoard::EMPTY,
            );
        }

        let mut rooks = self.piece_bb(color, PieceType::R);
        while let Some(src) = rooks.pop_some_lsb() {
            self.add_moves_to_list::<{ MOVEGEN_QUIETS }>(
                escapes,
                src,
                helper::rook_attacks(occ, src) & xray_sqs,
                BitBoard::EMPTY,
            );
        }

        let mut queens = self.piece_bb(color, PieceType::Q);
        while let Some(src) = queens.pop_some_lsb() {
            self.add_moves_to_list::<{ MOVEGEN_QUIETS }>(
                escapes,
                src,
                helper::queen_attacks(occ, src) & xray_sqs,
                BitBoard::EMPTY,
            );
        }

        self.add_moves_to_list::<{ MOVEGEN_QUIETS }>(
            escapes,
            king_sq,
            king_moves,
            BitBoard::EMPTY,
        );
    }

    //------------------------------------------------------------------
    // Pawn shift helpers

    #[inline]
    pub(crate) fn pawn_single_pushes(&self, pawns: BitBoard) -> BitBoard {
        match self.turn() {
            Player::White => (pawns << 8u64) & !self.occupied(),
            Player::Black => (pawns >> 8u64) & !self.occupied(),
        }
    }

    #[inline]
    pub(crate) fn pawn_double_pushes(&self, pawns: BitBoard) -> BitBoard {
        let open = !self.occupied();
        match self.turn() {
            Player::White => (((pawns << 8u64) & open) << 8u64) & open & BitBoard::RANK_4,
            Player::Black => (((pawns >> 8u64) & open) >> 8u64) & open & BitBoard::RANK_5,
        }
    }

    #[inline]
    pub(crate) fn pawn_left_captures(&self, pawns: BitBoard) -> BitBoard {
        match self.turn() {
            Player::White => (pawns << 7u64) & BitBoard(NOT_FILE_H),
            Player::Black => (pawns >> 9u64) & BitBoard(NOT_FILE_H),
        }
    }

    #[inline]
    pub(crate) fn pawn_right_captures(&self, pawns: BitBoard) -> BitBoard {
        match self.turn() {
            Player::White => (pawns << 9u64) & BitBoard(NOT_FILE_A),
            Player::Black => (pawns >> 7u64) & BitBoard(NOT_FILE_A),
        }
    }

    //------------------------------------------------------------------
    // List-building helpers

    /// Adds quiet pawn pushes: promotions, single pushes, double pushes.
    fn add_pawn_moves_to_list(&self, quiets: &mut MoveList) {
        let color = self.turn();
        let pawns = self.piece_bb(color, PieceType::P);
        let final_rank = color.promotion_rank_bb();
        let sq_diff: i8 = match color {
            Player::White => -8,
            Player::Black => 8,
        };

        let mut p_legal = self.pawn_single_pushes(pawns);
        let mut promotions = p_legal & final_rank;
        p_legal ^= promotions;

        while let Some(dst) = promotions.pop_some_lsb() {
            let src = SQ((dst.0 as i8 + sq_diff) as u8);
            self.add_promotions_to_list::<{ MOVEGEN_QUIETS }>(quiets, src, dst);
        }
        while let Some(dst) = p_legal.pop_some_lsb() {
            quiets.push(BitMove::make_quiet(SQ((dst.0 as i8 + sq_diff) as u8), dst));
        }

        let mut doubles = self.pawn_double_pushes(pawns);
        while let Some(dst) = doubles.pop_some_lsb() {
            quiets.push(BitMove::make_pawn_push(
                SQ((dst.0 as i8 + 2 * sq_diff) as u8),
                dst,
            ));
        }
    }

    /// Adds quiet pawn pushes restricted to a target mask. Used for
    /// blocking a checker's ray.
    fn add_pawn_block_moves_to_list(&self, moves: &mut MoveList, targets: BitBoard) {
        let color = self.turn();
        let pawns = self.piece_bb(color, PieceType::P);
        let final_rank = color.promotion_rank_bb();
        let sq_diff: i8 = match color {
            Player::White => -8,
            Player::Black => 8,
        };

        let mut p_legal = self.pawn_single_pushes(pawns);
        let mut promotions = p_legal & final_rank & targets;
        p_legal &= targets & !final_rank;

        while let Some(dst) = promotions.pop_some_lsb() {
            let src = SQ((dst.0 as i8 + sq_diff) as u8);
            self.add_promotions_to_list::<{ MOVEGEN_QUIETS }>(moves, src, dst);
        }
        while let Some(dst) = p_legal.pop_some_lsb() {
            moves.push(BitMove::make_quiet(SQ((dst.0 as i8 + sq_diff) as u8), dst));
        }

        let mut doubles = self.pawn_double_pushes(pawns) & targets;
        while let Some(dst) = doubles.pop_some_lsb() {
            moves.push(BitMove::make_pawn_push(
                SQ((dst.0 as i8 + 2 * sq_diff) as u8),
                dst,
            ));
        }
    }

    /// Adds pawn captures onto `other_pieces`. Left-hand and right-hand
    /// captures are shifted separately so the capturing pawn can be
    /// recovered from the destination square. En passant is synthesized
    /// from the capture file when it is set.
    fn add_pawn_captures_to_list(
        &self,
        captures: &mut MoveList,
        other_pieces: BitBoard,
        include_promotions: bool,
    ) {
        let color = self.turn();
        let pawns = self.piece_bb(color, PieceType::P);
        let final_rank = color.promotion_rank_bb();
        let (left_diff, right_diff): (i8, i8) = match color {
            Player::White => (-7, -9),
            Player::Black => (9, 7),
        };

        let mut legal = self.pawn_left_captures(pawns) & other_pieces;
        let mut promotions = legal & final_rank;
        legal ^= promotions;

        if include_promotions {
            while let Some(dst) = promotions.pop_some_lsb() {
                let src = SQ((dst.0 as i8 + left_diff) as u8);
                self.add_promotions_to_list::<{ MOVEGEN_CAPTURES }>(captures, src, dst);
            }
        }
        while let Some(dst) = legal.pop_some_lsb() {
            captures.push(BitMove::make_capture(
                SQ((dst.0 as i8 + left_diff) as u8),
                dst,
            ));
        }

        legal = self.pawn_right_captures(pawns) & other_pieces;
        promotions = legal & final_rank;
        legal ^= promotions;

        if include_promotions {
            while let Some(dst) = promotions.pop_some_lsb() {
                let src = SQ((dst.0 as i8 + right_diff) as u8);
                self.add_promotions_to_list::<{ MOVEGEN_CAPTURES }>(captures, src, dst);
            }
        }
        while let Some(dst) = legal.pop_some_lsb() {
            captures.push(BitMove::make_capture(
                SQ((dst.0 as i8 + right_diff) as u8),
                dst,
            ));
        }

        if self.ep_capture_file() != NO_EP_FILE {
            let victim_sq = self.ep_victim_square(!color, self.ep_capture_file());
            // The capturer's destination is one rank beyond the victim.
            let rank_diff: i8 = match color {
                Player::White => 8,
                Player::Black => -8,
            };
            let dst = SQ((victim_sq.0 as i8 + rank_diff) as u8);
            if ((victim_sq.to_bb() << 1u64) & BitBoard(NOT_FILE_A) & pawns).is_not_empty() {
                captures.push(BitMove::make_ep_capture(SQ(victim_sq.0 + 1), dst));
            }
            if ((victim_sq.to_bb() >> 1u64) & BitBoard(NOT_FILE_H) & pawns).is_not_empty() {
                captures.push(BitMove::make_ep_capture(SQ(victim_sq.0 - 1), dst));
            }
        }
    }

    /// Adds knight, bishop, rook and queen moves, captures or quiets by
    /// the const parameter.
    fn add_piece_moves_to_list<const IS_CAPTURE: bool>(
        &self,
        moves: &mut MoveList,
        other_pieces: BitBoard,
    ) {
        let color = self.turn();

        let mut knights = self.piece_bb(color, PieceType::N);
        while let Some(src) = knights.pop_some_lsb() {
            self.add_moves_to_list::<IS_CAPTURE>(
                moves,
                src,
                helper::knight_attacks(src),
                other_pieces,
            );
        }

        let occ = self.occupied();
        let mut bishops = self.piece_bb(color, PieceType::B);
        while let Some(src) = bishops.pop_some_lsb() {
            self.add_moves_to_list::<IS_CAPTURE>(
                moves,
                src,
                helper::bishop_attacks(occ, src),
                other_pieces,
            );
        }

        let mut rooks = self.piece_bb(color, PieceType::R);
        while let Some(src) = rooks.pop_some_lsb() {
            self.add_moves_to_list::<IS_CAPTURE>(
                moves,
                src,
                helper::rook_attacks(occ, src),
                other_pieces,
            );
        }

        let mut queens = self.piece_bb(color, PieceType::Q);
        while let Some(src) = queens.pop_some_lsb() {
            self.add_moves_to_list::<IS_CAPTURE>(
                moves,
                src,
                helper::queen_attacks(occ, src),
                other_pieces,
            );
        }
    }

    /// Processes a bitboard of destinations into the list, setting the
    /// capture flag when generating captures.
    fn add_moves_to_list<const IS_CAPTURE: bool>(
        &self,
        moves: &mut MoveList,
        src: SQ,
        dests: BitBoard,
        other_pieces: BitBoard,
    ) {
        let intersect = if IS_CAPTURE {
            other_pieces
        } else {
            !self.occupied()
        };
        let mut legal = dests & intersect;
        while let Some(dst) = legal.pop_some_lsb() {
            if IS_CAPTURE {
                moves.push(BitMove::make_capture(src, dst));
            } else {
                moves.push(BitMove::make_quiet(src, dst));
            }
        }
    }

    /// Adds the four promotions of a pawn stepping (or capturing) onto the
    /// final rank, strongest first: queen, knight, rook, bishop.
    fn add_promotions_to_list<const IS_CAPTURE: bool>(
        &self,
        moves: &mut MoveList,
        src: SQ,
        dst: SQ,
    ) {
        moves.push(BitMove::make_promotion(src, dst, PieceType::Q, IS_CAPTURE));
        moves.push(BitMove::make_promotion(src, dst, PieceType::N, IS_CAPTURE));
        moves.push(BitMove::make_promotion(src, dst, PieceType::R, IS_CAPTURE));
        moves.push(BitMove::make_promotion(src, dst, PieceType::B, IS_CAPTURE));
    }

    /// Adds the available castles. A castle is emitted only when the
    /// rights bit is set, the in-between squares are empty, the king is
    /// not in check, and the square the king passes through is not
    /// attacked. The destination square is checked later by the legality
    /// filter.
    fn add_castles_to_list(&self, moves: &mut MoveList) {
        let color = self.turn();
        match color {
            Player::White => {
                if self.can_castle(Player::White, crate::core::CastleType::KingSide)
                    && (self.occupied() & BitBoard(WHITE_KSIDE_PASSTHROUGH)).is_empty()
                    && !self.in_check(Player::White)
                    && self.attack_map(Player::Black, SQ::F1).is_empty()
                {
                    moves.push(BitMove::make_castle(SQ::E1, SQ::G1));
                }
                if self.can_castle(Player::White, crate::core::CastleType::QueenSide)
                    && (self.occupied() & BitBoard(WHITE_QSIDE_PASSTHROUGH)).is_empty()
                    && !self.in_check(Player::White)
                    && self.attack_map(Player::Black, SQ::D1).is_empty()
                {
                    moves.push(BitMove::make_castle(SQ::E1, SQ::C1));
                }
            }
            Player::Black => {
                if self.can_castle(Player::Black, crate::core::CastleType::KingSide)
                    && (self.occupied() & BitBoard(BLACK_KSIDE_PASSTHROUGH)).is_empty()
                    && !self.in_check(Player::Black)
                    && self.attack_map(Player::White, SQ::F8).is_empty()
                {
                    moves.push(BitMove::make_castle(SQ::E8, SQ::G8));
                }
                if self.can_castle(Player::Black, crate::core::CastleType::QueenSide)
                    && (self.occupied() & BitBoard(BLACK_QSIDE_PASSTHROUGH)).is_empty()
                    && !self.in_check(Player::Black)
                    && self.attack_map(Player::White, SQ::D8).is_empty()
                {
                    moves.push(BitMove::make_castle(SQ::E8, SQ::C8));
                }
            }
        }
    }
}

/// Filters a pseudo-legal list down to the legal subset by applying each
/// move to a copy.
fn pseudo_filter(board: &Board, pseudo: MoveList) -> MoveList {
    let mut legal = MoveList::new();
    for mv in pseudo.iter() {
        let mut copy = board.static_copy();
        if copy.do_pseudo_legal_move(*mv) {
            legal.push(*mv);
        }
    }
    legal
}

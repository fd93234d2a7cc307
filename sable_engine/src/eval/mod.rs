//! Static evaluation: a tapered midgame/endgame score built from
//! material, piece placement, mobility, king safety, threats, pawn
//! structure and endgame knowledge.
//!
//! [`evaluate`] returns the score in internal centipawns from white's
//! perspective; the search negates it for black.

pub mod endgame;
pub mod params;

use std::sync::atomic::{AtomicI32, Ordering};

use sable::core::masks::*;
use sable::{BitBoard, Board, PieceType, Player, Score, SQ};

use self::params::*;
use crate::consts::DEFAULT_EVAL_SCALE;

/// Percentage applied to material terms.
static MATERIAL_SCALE: AtomicI32 = AtomicI32::new(DEFAULT_EVAL_SCALE);
/// Percentage applied to king safety.
static KING_SAFETY_SCALE: AtomicI32 = AtomicI32::new(DEFAULT_EVAL_SCALE);

pub fn set_material_scale(scale: i32) {
    MATERIAL_SCALE.store(scale, Ordering::Relaxed);
}

pub fn set_king_safety_scale(scale: i32) {
    KING_SAFETY_SCALE.store(scale, Ordering::Relaxed);
}

// Ranks the defending side can reasonably hold against a king attack.
const KING_ZONE_DEFENDER: [u64; 2] = [HALF[0] | RANK_5, RANK_4 | HALF[1]];
const KING_ZONE_FLANK: [u64; 8] = [
    QSIDE,
    QSIDE,
    QSIDE,
    CENTER_FILES,
    CENTER_FILES,
    KSIDE,
    KSIDE,
    KSIDE,
];
const KING_DEFENSE_ZONE: [u64; 8] = [
    QSIDE ^ FILE_D,
    QSIDE ^ FILE_D,
    QSIDE ^ FILE_D,
    FILE_D | FILE_E,
    FILE_D | FILE_E,
    KSIDE ^ FILE_E,
    KSIDE ^ FILE_E,
    KSIDE ^ FILE_E,
];

lazy_static! {
    /// Full-board piece-square tables expanded from the mirrored
    /// half-board source data.
    static ref PSQT: [[[Score; SQ_CNT]; PIECE_TYPE_CNT]; PLAYER_CNT] = {
        let mut t = [[[Score::ZERO; SQ_CNT]; PIECE_TYPE_CNT]; PLAYER_CNT];
        for piece in 0..PIECE_TYPE_CNT {
            for sq in 0..32 {
                let r = sq / 4;
                let f = sq & 0x3;
                let sc = Score(
                    PIECE_SQUARE_TABLE[MG][piece][sq],
                    PIECE_SQUARE_TABLE[EG][piece][sq],
                );
                t[0][piece][8 * (7 - r) + f] = sc;
                t[0][piece][8 * (7 - r) + (7 - f)] = sc;
                t[1][piece][8 * r + f] = sc;
                t[1][piece][8 * r + (7 - f)] = sc;
            }
        }
        t
    };

    /// Mobility scores packed from the per-phase tables.
    static ref MOBILITY: [[Score; 28]; 5] = {
        let mut t = [[Score::ZERO; 28]; 5];
        for piece in 0..5 {
            for count in 0..28 {
                t[piece][count] = Score(
                    MOBILITY_TABLE[MG][piece][count],
                    MOBILITY_TABLE[EG][piece][count],
                );
            }
        }
        t
    };
}

/// Forces the lazily-built tables to exist.
#[cold]
pub fn init_eval_tables() {
    lazy_static::initialize(&PSQT);
    lazy_static::initialize(&MOBILITY);
}

/// Attack maps and other board geography shared by the evaluation terms.
#[derive(Default)]
struct EvalInfo {
    /// Per piece type (pawns through queens) attack maps.
    attack_maps: [[BitBoard; 5]; PLAYER_CNT],
    full_attack_maps: [BitBoard; PLAYER_CNT],
    double_attack_maps: [BitBoard; PLAYER_CNT],
    rammed_pawns: [BitBoard; PLAYER_CNT],
    open_files: BitBoard,
}

/// One evaluation pass over a position.
pub struct Evaluator {
    ei: EvalInfo,
    pub(super) pieces: [[BitBoard; PIECE_TYPE_CNT]; PLAYER_CNT],
    pub(super) piece_counts: [[i32; PIECE_TYPE_CNT]; PLAYER_CNT],
    pub(super) all_pieces: [BitBoard; PLAYER_CNT],
    pub(super) player_to_move: Player,
}

/// Evaluates the board in internal centipawns, white-positive.
pub fn evaluate(board: &Board) -> i32 {
    Evaluator::new(board).evaluate(board)
}

impl Evaluator {
    fn new(board: &Board) -> Evaluator {
        let mut ev = Evaluator {
            ei: EvalInfo::default(),
            pieces: [[BitBoard::EMPTY; PIECE_TYPE_CNT]; PLAYER_CNT],
            piece_counts: [[0; PIECE_TYPE_CNT]; PLAYER_CNT],
            all_pieces: [BitBoard::EMPTY; PLAYER_CNT],
            player_to_move: board.turn(),
        };
        for &color in sable::core::ALL_PLAYERS.iter() {
            for &piece in sable::core::ALL_PIECE_TYPES.iter() {
                let bb = board.piece_bb(color, piece);
                ev.pieces[color as usize][piece as usize] = bb;
                ev.piece_counts[color as usize][piece as usize] = bb.count_bits() as i32;
            }
            ev.all_pieces[color as usize] = board.get_occupied_player(color);
        }
        ev
    }

    #[inline(always)]
    fn bb(&self, color: usize, piece: PieceType) -> BitBoard {
        self.pieces[color][piece as usize]
    }

    fn evaluate(&mut self, b: &Board) -> i32 {
        const W: usize = 0;
        const B: usize = 1;
        const P: PieceType = PieceType::P;
        const N: PieceType = PieceType::N;
        const BSP: PieceType = PieceType::B;
        const R: PieceType = PieceType::R;
        const Q: PieceType = PieceType::Q;
        const K: PieceType = PieceType::K;

        let material_scale = MATERIAL_SCALE.load(Ordering::Relaxed);
        let ks_scale = KING_SAFETY_SCALE.load(Ordering::Relaxed);

        // Material totals and the endgame factor.
        let mut material = [[0i32; 2]; 2]; // [phase][color]
        let mut eg_factor_material = 0i32;
        for color in 0..PLAYER_CNT {
            for piece in 0..5 {
                let cnt = self.piece_counts[color][piece];
                material[MG][color] += PIECE_VALUES[MG][piece] * cnt;
                material[EG][color] += PIECE_VALUES[EG][piece] * cnt;
                eg_factor_material += EG_FACTOR_PIECE_VALS[piece] * cnt;
            }
        }
        let eg_factor = (EG_FACTOR_RES
            - (eg_factor_material - EG_FACTOR_ALPHA) * EG_FACTOR_RES / EG_FACTOR_BETA)
            .clamp(0, EG_FACTOR_RES);

        let king_sq = [b.king_sq(Player::White), b.king_sq(Player::Black)];

        // Special endgames are scored directly.
        if eg_factor == EG_FACTOR_RES {
            if let Some(endgame_score) = self.check_endgame_cases() {
                return endgame_score;
            }
        }

        // Attack maps. The double-attack map records squares covered
        // twice, counting the pawn map as the first cover.
        let pml_white = b.piece_move_list(Player::White);
        let pml_black = b.piece_move_list(Player::Black);

        self.ei.attack_maps[W][P as usize] =
            BitBoard(sable::helper::pawn_attacks(Player::White, self.bb(W, P).0));
        self.ei.attack_maps[B][P as usize] =
            BitBoard(sable::helper::pawn_attacks(Player::Black, self.bb(B, P).0));
        for info in pml_white.iter() {
            let legal = info.attacks;
            self.ei.double_attack_maps[W] |=
                legal & (self.ei.full_attack_maps[W] | self.ei.attack_maps[W][P as usize]);
            self.ei.attack_maps[W][info.piece as usize] |= legal;
            self.ei.full_attack_maps[W] |= legal;
        }
        for info in pml_black.iter() {
            let legal = info.attacks;
            self.ei.double_attack_maps[B] |=
                legal & (self.ei.full_attack_maps[B] | self.ei.attack_maps[B][P as usize]);
            self.ei.attack_maps[B][info.piece as usize] |= legal;
            self.ei.full_attack_maps[B] |= legal;
        }

        self.ei.rammed_pawns[W] = self.bb(W, P) & (self.bb(B, P) >> 8u64);
        self.ei.rammed_pawns[B] = self.bb(B, P) & (self.bb(W, P) << 8u64);

        let mut open = self.bb(W, P) | self.bb(B, P);
        open |= open >> 8u64;
        open |= open >> 16u64;
        open |= open >> 32u64;
        open |= open << 8u64;
        open |= open << 16u64;
        open |= open << 32u64;
        self.ei.open_files = !open;

        //--------------------------- Material ------------------------------
        let mut value_mg = material[MG][W] - material[MG][B];
        let mut value_eg = material[EG][W] - material[EG][B];

        if (self.bb(W, BSP) & BitBoard::LIGHT_SQUARES).is_not_empty()
            && (self.bb(W, BSP) & BitBoard::DARK_SQUARES).is_not_empty()
        {
            material[MG][W] += BISHOP_PAIR_VALUE;
            value_mg += BISHOP_PAIR_VALUE;
            value_eg += BISHOP_PAIR_VALUE;
        }
        if (self.bb(B, BSP) & BitBoard::LIGHT_SQUARES).is_not_empty()
            && (self.bb(B, BSP) & BitBoard::DARK_SQUARES).is_not_empty()
        {
            material[MG][B] += BISHOP_PAIR_VALUE;
            value_mg -= BISHOP_PAIR_VALUE;
            value_eg -= BISHOP_PAIR_VALUE;
        }

        value_mg += if self.player_to_move == Player::White {
            TEMPO_VALUE
        } else {
            -TEMPO_VALUE
        };

        value_mg = value_mg * material_scale / DEFAULT_EVAL_SCALE;
        value_eg = value_eg * material_scale / DEFAULT_EVAL_SCALE;

        // Imbalance: each own piece gains per opposing piece of each
        // lesser kind.
        let mut imbalance = [0i32; 2];
        for own in 1..5 {
            for opp in 0..own {
                for phase in 0..2 {
                    imbalance[phase] += OWN_OPP_IMBALANCE[phase][own][opp]
                        * self.piece_counts[W][own]
                        * self.piece_counts[B][opp];
                    imbalance[phase] -= OWN_OPP_IMBALANCE[phase][own][opp]
                        * self.piece_counts[B][own]
                        * self.piece_counts[W][opp];
                }
            }
        }
        value_mg += imbalance[MG] * material_scale / DEFAULT_EVAL_SCALE;
        value_eg += imbalance[EG] * material_scale / DEFAULT_EVAL_SCALE;

        // Knights are better in closed positions.
        let rammed = self.ei.rammed_pawns[W].count_bits() as i32;
        let closed = rammed * rammed / 4;
        value_mg += KNIGHT_CLOSED_BONUS[MG] * (self.piece_counts[W][N as usize]
            - self.piece_counts[B][N as usize])
            * closed;
        value_eg += KNIGHT_CLOSED_BONUS[EG] * (self.piece_counts[W][N as usize]
            - self.piece_counts[B][N as usize])
            * closed;

        //--------------------------- Positional ----------------------------
        let mut psqt_scores = [Score::ZERO; 2];
        for color in 0..PLAYER_CNT {
            let mut pawns = self.bb(color, P);
            while let Some(sq) = pawns.pop_some_lsb() {
                psqt_scores[color] += PSQT[color][P as usize][sq.0 as usize];
            }
        }

        //--------------------------- Space ---------------------------------
        let all_pawns = self.bb(W, P) | self.bb(B, P);
        let open_file_count = (self.ei.open_files & BitBoard(0xFF)).count_bits() as i32;
        let space_weight = [
            (self.all_pieces[W].count_bits() as i32 - open_file_count).max(0),
            (self.all_pieces[B].count_bits() as i32 - open_file_count).max(0),
        ];

        // Safe space excludes squares attacked by enemy pawns or doubly
        // attacked without compensation. Two regions count: up to three
        // squares behind an own pawn, and up to three in front of an
        // opposing pawn.
        {
            let safe = !(self.ei.attack_maps[B][P as usize]
                | (self.ei.double_attack_maps[B] & !self.ei.double_attack_maps[W]));
            let mut behind = self.bb(W, P) >> 8u64;
            behind |= behind >> 8u64;
            behind |= behind >> 16u64;
            let behind = behind & safe & !all_pawns;
            let mut front = self.bb(B, P) >> 8u64;
            front |= front >> 8u64;
            front |= front >> 16u64;
            let front = front & safe & !behind & !all_pawns;
            let score = (SPACE_BONUS[0][1] * (behind & BitBoard(CENTER_FILES)).count_bits() as i32
                + SPACE_BONUS[0][0] * (behind & !BitBoard(CENTER_FILES)).count_bits() as i32
                + SPACE_BONUS[1][1] * (front & BitBoard(CENTER_FILES)).count_bits() as i32
                + SPACE_BONUS[1][0] * (front & !BitBoard(CENTER_FILES)).count_bits() as i32)
                * space_weight[W]
                * space_weight[W]
                / 512;
            value_mg += score;
            value_eg += score / 2;
        }
        {
            let safe = !(self.ei.attack_maps[W][P as usize]
                | (self.ei.double_attack_maps[W] & !self.ei.double_attack_maps[B]));
            let mut behind = self.bb(B, P) << 8u64;
            behind |= behind << 8u64;
            behind |= behind << 16u64;
            let behind = behind & safe & !all_pawns;
            let mut front = self.bb(W, P) << 8u64;
            front |= front << 8u64;
            front |= front << 16u64;
            let front = front & safe & !behind & !all_pawns;
            let score = (SPACE_BONUS[0][1] * (behind & BitBoard(CENTER_FILES)).count_bits() as i32
                + SPACE_BONUS[0][0] * (behind & !BitBoard(CENTER_FILES)).count_bits() as i32
                + SPACE_BONUS[1][1] * (front & BitBoard(CENTER_FILES)).count_bits() as i32
                + SPACE_BONUS[1][0] * (front & !BitBoard(CENTER_FILES)).count_bits() as i32)
                * space_weight[B]
                * space_weight[B]
                / 512;
            value_mg -= score;
            value_eg -= score / 2;
        }

        //--------------------------- King safety ---------------------------
        let king_neighborhood = [
            sable::helper::king_attacks(king_sq[W]),
            sable::helper::king_attacks(king_sq[B]),
        ];

        psqt_scores[W] += PSQT[W][K as usize][king_sq[W].0 as usize];
        psqt_scores[B] += PSQT[B][K as usize][king_sq[B].0 as usize];

        let mut ks_value = [0i32; 2];

        // All king safety terms are midgame only.
        if eg_factor < EG_FACTOR_RES {
            for color in 0..PLAYER_CNT {
                let player = if color == W { Player::White } else { Player::Black };
                let king_file = (king_sq[color].0 & 7) as i32;
                let king_rank = (king_sq[color].0 >> 3) as i32;
                let file_range = king_file.clamp(1, 6);
                for i in (file_range - 1)..=(file_range + 1) {
                    let f = i.min(7 - i) as usize;
                    let file_bb = BitBoard(FILE_BB[i as usize]);

                    let shield = self.bb(color, P) & file_bb;
                    if shield.is_not_empty() {
                        let pawn_sq = if player == Player::White {
                            shield.bit_scan_forward()
                        } else {
                            shield.bit_scan_reverse()
                        };
                        let r = pawn_sq.relative_rank_idx(player) as usize;
                        ks_value[color] += PAWN_SHIELD_VALUE[f][r];
                    } else {
                        ks_value[color] += PAWN_SHIELD_VALUE[f][0];
                    }

                    let storm = self.bb(color ^ 1, P) & file_bb;
                    if storm.is_not_empty() {
                        let pawn_sq = if player == Player::White {
                            storm.bit_scan_forward()
                        } else {
                            storm.bit_scan_reverse()
                        };
                        let r = pawn_sq.relative_rank_idx(player) as usize;
                        let stop_sq = SQ((pawn_sq.0 as i8
                            + if player == Player::White { -8 } else { 8 })
                            as u8);
                        let blocked_idx = if (self.bb(color, P) & file_bb).is_empty() {
                            0
                        } else if (self.bb(color, P) & stop_sq.to_bb()).is_not_empty() {
                            1
                        } else {
                            2
                        };
                        ks_value[color] -= PAWN_STORM_VALUE[blocked_idx][f][r];

                        // A rim storm pawn can shield the defending king
                        // itself.
                        let rel_king_rank = player.relative_rank_idx(king_rank as u8) as usize;
                        if f == 0
                            && (king_file == 0 || king_file == 7)
                            && (r == 1 || r == 2)
                            && rel_king_rank + 1 == r
                        {
                            ks_value[color] -= PAWN_STORM_SHIELDING_KING;
                        }
                    } else {
                        ks_value[color] -= PAWN_STORM_VALUE[0][f][0];
                    }
                }
            }

            // Piece attack pressure, each direction.
            ks_value[B] -= self.king_safety(
                b,
                Player::White,
                &pml_white,
                king_neighborhood[B],
                ks_value[B],
                (king_sq[B].0 & 7) as i32,
            );
            ks_value[W] -= self.king_safety(
                b,
                Player::Black,
                &pml_black,
                king_neighborhood[W],
                ks_value[W],
                (king_sq[W].0 & 7) as i32,
            );

            // Retained castling rights keep some worth.
            ks_value[W] += CASTLING_RIGHTS_VALUE
                [b.castling_rights().count_player(Player::White) as usize];
            ks_value[B] += CASTLING_RIGHTS_VALUE
                [b.castling_rights().count_player(Player::Black) as usize];
        }

        ks_value[W] = ks_value[W] * ks_scale / DEFAULT_EVAL_SCALE;
        ks_value[B] = ks_value[B] * ks_scale / DEFAULT_EVAL_SCALE;
        value_mg += ks_value[W] - ks_value[B];

        // Squares attackable by pawns sometime in the future, for outposts
        // and backward pawns.
        let mut w_front_span = self.bb(W, P) << 8u64;
        let mut b_front_span = self.bb(B, P) >> 8u64;
        for _ in 0..5 {
            w_front_span |= w_front_span << 8u64;
            b_front_span |= b_front_span >> 8u64;
        }
        let pawn_stop_att = [
            ((w_front_span >> 1u64) & BitBoard(NOT_FILE_H))
                | ((w_front_span << 1u64) & BitBoard(NOT_FILE_A)),
            ((b_front_span >> 1u64) & BitBoard(NOT_FILE_H))
                | ((b_front_span << 1u64) & BitBoard(NOT_FILE_A)),
        ];

        //--------------------- Minor pieces and mobility --------------------
        let mut piece_score = [Score::ZERO; 2];
        let mut mobility_score = [Score::ZERO; 2];

        // Bishops are worse with many own pawns on their color.
        for color in 0..PLAYER_CNT {
            for &squares in [BitBoard::LIGHT_SQUARES, BitBoard::DARK_SQUARES].iter() {
                if (self.bb(color, BSP) & squares).is_not_empty() {
                    piece_score[color] += BISHOP_PAWN_COLOR_PENALTY
                        * (self.bb(color, P) & squares).count_bits() as i32;
                    piece_score[color] += BISHOP_RAMMED_PAWN_COLOR_PENALTY
                        * (self.ei.rammed_pawns[color] & squares).count_bits() as i32;
                }
            }
        }

        // Minors tucked behind their own pawns.
        piece_score[W] += SHIELDED_MINOR_BONUS
            * ((self.bb(W, P) >> 8u64)
                & (self.bb(W, N) | self.bb(W, BSP))
                & BitBoard(RANK_2 | RANK_3 | RANK_4))
            .count_bits() as i32;
        piece_score[B] += SHIELDED_MINOR_BONUS
            * ((self.bb(B, P) << 8u64)
                & (self.bb(B, N) | self.bb(B, BSP))
                & BitBoard(RANK_7 | RANK_6 | RANK_5))
            .count_bits() as i32;

        const OUTPOST_SQS: [u64; 2] = [
            (CENTER_FILES & (RANK_4 | RANK_5 | RANK_6)) | ((FILE_B | FILE_G) & (RANK_5 | RANK_6)),
            (CENTER_FILES & (RANK_5 | RANK_4 | RANK_3)) | ((FILE_B | FILE_G) & (RANK_4 | RANK_3)),
        ];

        let occ = self.all_pieces[W] | self.all_pieces[B];
        let piece_rammed_pawns = [
            self.bb(W, P) & (occ >> 8u64),
            self.bb(B, P) & (occ << 8u64),
        ];

        for color in 0..PLAYER_CNT {
            let opp = color ^ 1;
            let pml = if color == W { &pml_white } else { &pml_black };
            // Mobility ignores squares occupied by own blocked pawns or
            // king, attacked by enemy pawns, or doubly attacked without a
            // defender.
            let mobility_safe = !(piece_rammed_pawns[color]
                | self.bb(color, K)
                | self.ei.attack_maps[opp][P as usize]
                | (self.ei.double_attack_maps[opp] & !self.ei.double_attack_maps[color]));

            let outposts = BitBoard(OUTPOST_SQS[color]) & !pawn_stop_att[opp];

            for i in 0..pml.starts[BSP as usize] {
                let info = pml.get(i);
                let bit = info.sq.to_bb();
                let mobility_map = info.attacks & mobility_safe;

                psqt_scores[color] += PSQT[color][N as usize][info.sq.0 as usize];
                mobility_score[color] += MOBILITY[0][mobility_map.count_bits() as usize]
                    + EXTENDED_CENTER_VAL
                        * (mobility_map & BitBoard(EXTENDED_CENTER_SQS)).count_bits() as i32
                    + CENTER_BONUS * (mobility_map & BitBoard(CENTER_SQS)).count_bits() as i32;

                if (bit & outposts).is_not_empty() {
                    piece_score[color] += KNIGHT_OUTPOST_BONUS;
                    if (bit & self.ei.attack_maps[color][P as usize]).is_not_empty() {
                        piece_score[color] += KNIGHT_OUTPOST_PAWN_DEF_BONUS;
                    }
                } else {
                    let potential = info.attacks & outposts & !self.all_pieces[color];
                    if potential.is_not_empty() {
                        piece_score[color] += KNIGHT_POTENTIAL_OUTPOST_BONUS;
                        if (potential & self.ei.attack_maps[color][P as usize]).is_not_empty() {
                            piece_score[color] += KNIGHT_POTENTIAL_OUTPOST_PAWN_DEF_BONUS;
                        }
                    }
                }
            }

            for i in pml.starts[BSP as usize]..pml.starts[R as usize] {
                let info = pml.get(i);
                let bit = info.sq.to_bb();
                let mobility_map = info.attacks & mobility_safe;

                psqt_scores[color] += PSQT[color][BSP as usize][info.sq.0 as usize];
                mobility_score[color] += MOBILITY[1][mobility_map.count_bits() as usize]
                    + EXTENDED_CENTER_VAL
                        * (mobility_map & BitBoard(EXTENDED_CENTER_SQS)).count_bits() as i32
                    + CENTER_BONUS * (mobility_map & BitBoard(CENTER_SQS)).count_bits() as i32;

                if (bit & outposts).is_not_empty() {
                    piece_score[color] += BISHOP_OUTPOST_BONUS;
                    if (bit & self.ei.attack_maps[color][P as usize]).is_not_empty() {
                        piece_score[color] += BISHOP_OUTPOST_PAWN_DEF_BONUS;
                    }
                } else {
                    let potential = info.attacks & outposts & !self.all_pieces[color];
                    if potential.is_not_empty() {
                        piece_score[color] += BISHOP_POTENTIAL_OUTPOST_BONUS;
                        if (potential & self.ei.attack_maps[color][P as usize]).is_not_empty() {
                            piece_score[color] += BISHOP_POTENTIAL_OUTPOST_PAWN_DEF_BONUS;
                        }
                    }
                }

                // A fianchettoed bishop sees two center squares at once
                // through the pawns.
                let fianchetto = sable::helper::bishop_attacks(all_pawns, info.sq)
                    & BitBoard(CENTER_SQS);
                if fianchetto.more_than_one() {
                    piece_score[color] += BISHOP_FIANCHETTO_BONUS;
                }
            }

            for i in pml.starts[R as usize]..pml.starts[Q as usize] {
                let info = pml.get(i);
                let file = (info.sq.0 & 7) as usize;
                let rank = (info.sq.0 >> 3) as usize;
                let mobility_map = info.attacks & mobility_safe;

                psqt_scores[color] += PSQT[color][R as usize][info.sq.0 as usize];
                mobility_score[color] += MOBILITY[2][mobility_map.count_bits() as usize]
                    + EXTENDED_CENTER_VAL
                        * (mobility_map & BitBoard(EXTENDED_CENTER_SQS)).count_bits() as i32
                    + CENTER_BONUS * (mobility_map & BitBoard(CENTER_SQS)).count_bits() as i32;

                if (BitBoard(FILE_BB[file]) & self.ei.open_files).is_not_empty() {
                    piece_score[color] += ROOK_OPEN_FILE_BONUS;
                } else if (BitBoard(FILE_BB[file]) & self.bb(color, P)).is_empty() {
                    piece_score[color] += ROOK_SEMIOPEN_FILE_BONUS;
                }
                let player = if color == W { Player::White } else { Player::Black };
                if player.relative_rank_idx(rank as u8) >= 4 {
                    piece_score[color] += ROOK_PAWN_RANK_THREAT
                        * (BitBoard(RANK_BB[rank]) & self.bb(opp, P)).count_bits() as i32;
                }
            }

            // Queens also avoid squares controlled by enemy minors and
            // rooks.
            let queen_safe = !(self.ei.attack_maps[opp][N as usize]
                | self.ei.attack_maps[opp][BSP as usize]
                | self.ei.attack_maps[opp][R as usize]);
            for i in pml.starts[Q as usize]..pml.len() {
                let info = pml.get(i);
                let mobility_map = info.attacks & mobility_safe & queen_safe;

                psqt_scores[color] += PSQT[color][Q as usize][info.sq.0 as usize];
                mobility_score[color] += MOBILITY[3][mobility_map.count_bits() as usize];

                if (self.ei.attack_maps[opp][N as usize]
                    & sable::helper::knight_attacks(info.sq)
                    & !self.ei.attack_maps[color][P as usize]
                    & !(self.ei.double_attack_maps[color] & !self.ei.double_attack_maps[opp]))
                    .is_not_empty()
                {
                    piece_score[color] += KNIGHT_QUEEN_POTENTIAL_THREAT;
                }
            }

            let king_mobility =
                king_neighborhood[color] & mobility_safe & !self.ei.full_attack_maps[opp];
            mobility_score[color] += MOBILITY[4][king_mobility.count_bits() as usize];
        }

        value_mg += piece_score[W].mg() - piece_score[B].mg();
        value_eg += piece_score[W].eg() - piece_score[B].eg();
        value_mg += psqt_scores[W].mg() - psqt_scores[B].mg();
        value_eg += psqt_scores[W].eg() - psqt_scores[B].eg();
        value_mg += mobility_score[W].mg() - mobility_score[B].mg();
        value_eg += mobility_score[W].eg() - mobility_score[B].eg();

        //--------------------------- Threats --------------------------------
        let mut threat_score = [Score::ZERO; 2];
        for color in 0..PLAYER_CNT {
            let opp = color ^ 1;
            let weak = !self.ei.attack_maps[color][P as usize]
                & (self.ei.double_attack_maps[opp] | !self.ei.double_attack_maps[color]);

            let upawns = self.bb(color, P) & self.ei.full_attack_maps[opp] & weak;
            if upawns.is_not_empty() {
                threat_score[color] += UNDEFENDED_PAWN * upawns.count_bits() as i32;
            }
            let minors =
                (self.bb(color, N) | self.bb(color, BSP)) & self.ei.full_attack_maps[opp] & weak;
            if minors.is_not_empty() {
                threat_score[color] += UNDEFENDED_MINOR * minors.count_bits() as i32;
            }
            let rooks = self.bb(color, R)
                & (self.ei.attack_maps[opp][N as usize] | self.ei.attack_maps[opp][BSP as usize]);
            if rooks.is_not_empty() {
                threat_score[color] += MINOR_ROOK_THREAT * rooks.count_bits() as i32;
            }
            let queens = self.bb(color, Q)
                & (self.ei.attack_maps[opp][N as usize] | self.ei.attack_maps[opp][BSP as usize]);
            if queens.is_not_empty() {
                threat_score[color] += MINOR_QUEEN_THREAT * queens.count_bits() as i32;
            }
            let queens_by_rooks = self.bb(color, Q) & self.ei.attack_maps[opp][R as usize];
            if queens_by_rooks.is_not_empty() {
                threat_score[color] += ROOK_QUEEN_THREAT * queens_by_rooks.count_bits() as i32;
            }
            let pieces_by_pawns = (self.bb(color, N)
                | self.bb(color, BSP)
                | self.bb(color, R)
                | self.bb(color, Q))
                & self.ei.attack_maps[opp][P as usize];
            if pieces_by_pawns.is_not_empty() {
                threat_score[color] += PAWN_PIECE_THREAT * pieces_by_pawns.count_bits() as i32;
            }
            let loose_pawns = self.bb(color, P)
                & BitBoard(HALF[opp])
                & !(self.ei.full_attack_maps[color] | self.ei.attack_maps[color][P as usize]);
            if loose_pawns.is_not_empty() {
                threat_score[color] += LOOSE_PAWN * loose_pawns.count_bits() as i32;
            }
            let loose_minors = (self.bb(color, N) | self.bb(color, BSP))
                & BitBoard(HALF[opp])
                & !(self.ei.full_attack_maps[color] | self.ei.attack_maps[color][P as usize]);
            if loose_minors.is_not_empty() {
                threat_score[color] += LOOSE_MINOR * loose_minors.count_bits() as i32;
            }
        }
        value_mg += threat_score[W].mg() - threat_score[B].mg();
        value_eg += threat_score[W].eg() - threat_score[B].eg();

        //--------------------------- Pawn structure -------------------------
        let (pawn_w, pawn_b) = self.pawn_structure(king_sq, pawn_stop_att);
        value_mg += pawn_w.mg() - pawn_b.mg();
        value_eg += pawn_w.eg() - pawn_b.eg();

        //--------------------------- King-pawn tropism ----------------------
        if eg_factor > 0 {
            let mut pawn_bits = all_pawns;
            let mut w_total = 0i32;
            let mut b_total = 0i32;
            let mut pawn_weight = 0i32;
            while let Some(sq) = pawn_bits.pop_some_lsb() {
                w_total += sable::helper::manhattan_distance(sq, king_sq[W]) as i32;
                b_total += sable::helper::manhattan_distance(sq, king_sq[B]) as i32;
                pawn_weight += 1;
            }
            if pawn_weight > 0 {
                value_eg += KING_TROPISM_VALUE * (b_total - w_total) / pawn_weight;
            }
        }

        // Probability of converting the endgame advantage to a win:
        // symmetric pawn structures and close kings are harder to win.
        if eg_factor > 0 {
            let files = |pawns: BitBoard| -> u64 {
                let mut b = pawns;
                b |= b >> 8u64;
                b |= b >> 16u64;
                b |= b >> 32u64;
                b.0 & 0xFF
            };
            let w_files = files(self.bb(W, P));
            let b_files = files(self.bb(B, P));
            let asymmetry = (w_files ^ b_files).count_ones() as i32;
            let opposition_distance = ((king_sq[W].0 & 7) as i32 - (king_sq[B].0 & 7) as i32)
                .abs()
                - ((king_sq[W].0 >> 3) as i32 - (king_sq[B].0 >> 3) as i32).abs();

            let adjustment = PAWN_ASYMMETRY_BONUS * asymmetry
                + PAWN_COUNT_BONUS
                    * (self.piece_counts[W][P as usize] + self.piece_counts[B][P as usize])
                + KING_OPPOSITION_DISTANCE_BONUS * opposition_distance
                + ENDGAME_BASE;
            if value_eg > 0 {
                value_eg = (value_eg + adjustment).max(0);
            } else if value_eg < 0 {
                value_eg = (value_eg - adjustment).min(0);
            }
        }

        let mut total =
            (value_mg * (EG_FACTOR_RES - eg_factor) + value_eg * eg_factor) / EG_FACTOR_RES;

        //--------------------------- Scale factors --------------------------
        let mut scale_factor = MAX_SCALE_FACTOR;
        // Opposite colored bishops drag toward a draw.
        if eg_factor > 3 * EG_FACTOR_RES / 4
            && self.piece_counts[W][BSP as usize] == 1
            && self.piece_counts[B][BSP as usize] == 1
            && (((self.bb(W, BSP) & BitBoard::LIGHT_SQUARES).is_not_empty()
                && (self.bb(B, BSP) & BitBoard::DARK_SQUARES).is_not_empty())
                || ((self.bb(W, BSP) & BitBoard::DARK_SQUARES).is_not_empty()
                    && (self.bb(B, BSP) & BitBoard::LIGHT_SQUARES).is_not_empty()))
        {
            if b.non_pawn_material(Player::White) == self.bb(W, BSP)
                && b.non_pawn_material(Player::Black) == self.bb(B, BSP)
            {
                scale_factor = OPPOSITE_BISHOP_SCALING[0];
            } else {
                scale_factor = OPPOSITE_BISHOP_SCALING[1];
            }
        }
        // A small material edge without pawns is hard to convert.
        for color in 0..PLAYER_CNT {
            let opp = color ^ 1;
            let lead = material[MG][color] - material[MG][opp];
            let sign = 1 - 2 * color as i32;
            if lead > 0
                && lead <= PIECE_VALUES[MG][N as usize]
                && self.piece_counts[color][P as usize] <= 1
                && total * sign > 0
            {
                if self.piece_counts[color][P as usize] == 0 {
                    if material[MG][color] < PIECE_VALUES[MG][BSP as usize] + 50 {
                        scale_factor = PAWNLESS_SCALING[0];
                    } else if material[MG][opp] <= PIECE_VALUES[MG][BSP as usize] {
                        scale_factor = PAWNLESS_SCALING[1];
                    } else {
                        scale_factor = PAWNLESS_SCALING[2];
                    }
                } else if scale_factor != OPPOSITE_BISHOP_SCALING[0] {
                    scale_factor = PAWNLESS_SCALING[3];
                }
            }
        }
        if scale_factor < MAX_SCALE_FACTOR {
            total = total * scale_factor / MAX_SCALE_FACTOR;
        }

        total
    }

    /// King safety points for `attacking_color` pressing the defender's
    /// king zone, converted into centipawns through a capped quadratic.
    fn king_safety(
        &mut self,
        b: &Board,
        attacking_color: Player,
        attackers: &sable::board::PieceMoveList,
        king_sqs: BitBoard,
        pawn_score: i32,
        king_file: i32,
    ) -> i32 {
        let atk = attacking_color as usize;
        let def = 1 - atk;
        const P_IDX: usize = 0;
        const Q_IDX: usize = 4;

        // Widen the zone away from the board edges the defending king
        // stands on.
        let mut king_neighborhood = if attacking_color == Player::White {
            if (self.pieces[def][PieceType::K as usize] & BitBoard(RANK_8)).is_not_empty() {
                king_sqs | (king_sqs >> 8u64)
            } else {
                king_sqs
            }
        } else if (self.pieces[def][PieceType::K as usize] & BitBoard(RANK_1)).is_not_empty() {
            king_sqs | (king_sqs << 8u64)
        } else {
            king_sqs
        };
        if king_file == 7 {
            king_neighborhood |= king_neighborhood >> 1u64;
        } else if king_file == 0 {
            king_neighborhood |= king_neighborhood << 1u64;
        }

        // Squares the defender covers at most once, not with a pawn,
        // unless only with the queen.
        let weak_map = !self.ei.double_attack_maps[def]
            & ((!self.ei.attack_maps[def][P_IDX] & !self.ei.full_attack_maps[def])
                | self.ei.attack_maps[def][Q_IDX]);
        let king_defenseless = king_sqs & weak_map;

        let mut king_safety_pts = KS_BASE;
        let mut king_attack_pts = 0;
        let mut king_attack_pieces =
            (self.ei.attack_maps[atk][P_IDX] & king_neighborhood).count_bits() as i32;

        let defender = if attacking_color == Player::White {
            Player::Black
        } else {
            Player::White
        };
        let check_maps = b.check_maps(defender);

        for info in attackers.iter() {
            let piece_index = info.piece as usize - 1;
            let legal = info.attacks;
            if (legal & king_neighborhood).is_not_empty() {
                king_attack_pieces += 1;
                king_attack_pts += KING_THREAT_MULTIPLIER[piece_index];
                king_safety_pts +=
                    KING_THREAT_SQUARE[piece_index] * (legal & king_sqs).count_bits() as i32;
                king_safety_pts +=
                    KING_DEFENSELESS_SQUARE * (legal & king_defenseless).count_bits() as i32;
            }
        }

        // Safe checks: a threat to give check from a weak square.
        for (i, &bonus) in SAFE_CHECK_BONUS.iter().enumerate() {
            let mut sqs =
                self.ei.attack_maps[atk][i + 1] & check_maps[i] & !king_sqs & weak_map;
            if i + 1 == Q_IDX {
                sqs &= !self.ei.attack_maps[def][Q_IDX];
            }
            if sqs.is_not_empty() {
                king_safety_pts += bonus;
            }
        }

        // Each additional attacker scales the whole attack.
        king_safety_pts += king_attack_pieces * king_attack_pts;

        // King pressure: attacks generally pointed at the king's flank.
        let king_zone = BitBoard(KING_ZONE_DEFENDER[def] & KING_ZONE_FLANK[king_file as usize]);
        let king_pressure = KING_PRESSURE
            * ((self.ei.full_attack_maps[atk] & king_zone).count_bits() as i32
                + (self.ei.double_attack_maps[atk]
                    & !self.ei.attack_maps[def][P_IDX]
                    & king_zone)
                    .count_bits() as i32);

        // Fold in the pawn shield/storm score and the general pressure.
        king_safety_pts += (-KS_PAWN_FACTOR * pawn_score + KS_KING_PRESSURE_FACTOR * king_pressure) / 32;

        // Reward missing minor defenders of the king's quadrant.
        let king_defense_zone =
            BitBoard(KING_DEFENSE_ZONE[king_file as usize] & HALF[def]);
        king_safety_pts += KS_NO_KNIGHT_DEFENDER
            * ((king_defense_zone & self.ei.attack_maps[def][1]).is_empty() as i32
                + (king_zone & self.ei.attack_maps[def][1]).is_empty() as i32)
            * self.piece_counts[atk ^ 1][1];
        king_safety_pts += KS_NO_BISHOP_DEFENDER
            * ((king_defense_zone & self.ei.attack_maps[def][2]).is_empty() as i32
                + (king_zone & self.ei.attack_maps[def][2]).is_empty() as i32)
            * self.piece_counts[atk ^ 1][2];

        // Central pawn chains that support a slider attack on the king.
        const QSIDE_DIAG_REGION: [u64; 2] = [
            FILE_F | ((FILE_E | FILE_D) & (RANK_3 | RANK_4 | RANK_5 | RANK_6)),
            FILE_F | FILE_E | FILE_D,
        ];
        const KSIDE_DIAG_REGION: [u64; 2] = [
            FILE_C | ((FILE_D | FILE_E) & (RANK_3 | RANK_4 | RANK_5 | RANK_6)),
            FILE_C | FILE_D | FILE_E,
        ];
        let attacker_bishop_factor = |ev: &Evaluator, diag_zone: BitBoard, diagonal: BitBoard| {
            let c = diagonal.count_bits() as i32;
            KS_BISHOP_PRESSURE
                * (c * (c + 1) / 2
                    + (diag_zone & ev.ei.attack_maps[atk][2]).is_not_empty() as i32
                    - 1)
        };
        let defender_bishop_factor = |diagonal: BitBoard| {
            let c = diagonal.count_bits() as i32;
            KS_BISHOP_PRESSURE * (c * (c + 1) / 2 - 1)
        };
        let w_pawns = self.pieces[0][P_IDX];
        let b_pawns = self.pieces[1][P_IDX];
        if king_file < 3 {
            if attacking_color == Player::White {
                let diagonal = ((w_pawns & BitBoard(QSIDE_DIAG_REGION[0])) << 7u64) & w_pawns;
                if diagonal.is_not_empty() {
                    king_safety_pts += attacker_bishop_factor(self, king_defense_zone, diagonal);
                }
                let diagonal = ((b_pawns & BitBoard(KSIDE_DIAG_REGION[1])) >> 7u64) & b_pawns;
                if diagonal.is_not_empty() {
                    king_safety_pts += defender_bishop_factor(diagonal);
                }
            } else {
                let diagonal = ((b_pawns & BitBoard(QSIDE_DIAG_REGION[0])) >> 9u64) & b_pawns;
                if diagonal.is_not_empty() {
                    king_safety_pts += attacker_bishop_factor(self, king_defense_zone, diagonal);
                }
                let diagonal = ((w_pawns & BitBoard(KSIDE_DIAG_REGION[1])) << 9u64) & w_pawns;
                if diagonal.is_not_empty() {
                    king_safety_pts += defender_bishop_factor(diagonal);
                }
            }
        } else if king_file > 4 {
            if attacking_color == Player::White {
                let diagonal = ((w_pawns & BitBoard(KSIDE_DIAG_REGION[0])) << 9u64) & w_pawns;
                if diagonal.is_not_empty() {
                    king_safety_pts += attacker_bishop_factor(self, king_defense_zone, diagonal);
                }
                let diagonal = ((b_pawns & BitBoard(QSIDE_DIAG_REGION[1])) >> 9u64) & b_pawns;
                if diagonal.is_not_empty() {
                    king_safety_pts += defender_bishop_factor(diagonal);
                }
            } else {
                let diagonal = ((b_pawns & BitBoard(KSIDE_DIAG_REGION[0])) >> 7u64) & b_pawns;
                if diagonal.is_not_empty() {
                    king_safety_pts += attacker_bishop_factor(self, king_defense_zone, diagonal);
                }
                let diagonal = ((w_pawns & BitBoard(QSIDE_DIAG_REGION[1])) << 7u64) & w_pawns;
                if diagonal.is_not_empty() {
                    king_safety_pts += defender_bishop_factor(diagonal);
                }
            }
        }

        // Without a queen the attack rarely lands.
        if self.pieces[atk][Q_IDX].is_empty() {
            king_safety_pts += KS_NO_QUEEN;
        }

        king_safety_pts = king_safety_pts.max(0);
        (king_safety_pts * king_safety_pts / KS_ARRAY_FACTOR).min(KS_CONVERSION_CAP)
            + king_pressure
    }

    /// Scores the pawn structure of both sides: passers, doubled,
    /// isolated, backward, undefended, phalanxes and connected pawns.
    fn pawn_structure(
        &self,
        king_sq: [SQ; 2],
        pawn_stop_att: [BitBoard; 2],
    ) -> (Score, Score) {
        const P_IDX: usize = 0;
        let w_pawns = self.pieces[0][P_IDX];
        let b_pawns = self.pieces[1][P_IDX];
        let all_pieces = self.all_pieces[0] | self.all_pieces[1];
        let mut white = Score::ZERO;
        let mut black = Score::ZERO;

        // Passed pawns: outside the opposing front spans, own pawns ahead
        // also block (doubled pawns are one passer at most).
        let mut w_blocker = b_pawns >> 8u64;
        let mut b_blocker = w_pawns << 8u64;
        w_blocker |= ((w_blocker >> 1u64) & BitBoard(NOT_FILE_H))
            | ((w_blocker << 1u64) & BitBoard(NOT_FILE_A));
        b_blocker |= ((b_blocker >> 1u64) & BitBoard(NOT_FILE_H))
            | ((b_blocker << 1u64) & BitBoard(NOT_FILE_A));
        w_blocker |= w_pawns >> 8u64;
        b_blocker |= b_pawns << 8u64;
        for _ in 0..4 {
            w_blocker |= w_blocker >> 8u64;
            b_blocker |= b_blocker << 8u64;
        }
        let w_passed = w_pawns & !w_blocker;
        let b_passed = b_pawns & !b_blocker;

        let mut passers = w_passed;
        while let Some(sq) = passers.pop_some_lsb() {
            let file = (sq.0 & 7) as usize;
            let rank = (sq.0 >> 3) as usize;
            white += PASSER_BONUS[rank];
            white += PASSER_FILE_BONUS[file];

            let r_factor = ((rank as i32 - 1) * (rank as i32 - 2)) / 2;
            if r_factor != 0 {
                let stop = SQ(sq.0 + 8);
                if (stop.to_bb() & self.all_pieces[1]).is_empty() {
                    let mut path = sq.to_bb();
                    path |= path << 8u64;
                    path |= path << 16u64;
                    path |= path << 32u64;

                    // A rook or queen behind the passer defends (or
                    // blocks) the whole path by x-ray.
                    let mut rook_behind = sq.to_bb();
                    for _ in 0..5 {
                        rook_behind |= (rook_behind >> 8u64) & !all_pieces;
                    }
                    rook_behind = rook_behind >> 8u64;
                    let mut block = self.all_pieces[1] | self.ei.full_attack_maps[1];
                    let mut defend =
                        self.ei.full_attack_maps[0] | self.ei.attack_maps[0][P_IDX];
                    if (rook_behind
                        & (self.pieces[0][3] | self.pieces[0][4]))
                        .is_not_empty()
                    {
                        defend |= path;
                    } else if (rook_behind
                        & (self.pieces[1][3] | self.pieces[1][4]))
                        .is_not_empty()
                    {
                        block |= path;
                    }

                    if (path & block).is_empty() {
                        white += FREE_PROMOTION_BONUS * r_factor;
                    } else if (stop.to_bb() & block).is_empty() {
                        white += FREE_STOP_BONUS * r_factor;
                    }
                    if (path & defend) == path {
                        white += FULLY_DEFENDED_PASSER_BONUS * r_factor;
                    } else if (stop.to_bb() & defend).is_not_empty() {
                        white += DEFENDED_PASSER_BONUS * r_factor;
                    }
                }

                white -= OWN_KING_DIST
                    * sable::helper::king_distance(stop, king_sq[0]) as i32
                    * r_factor;
                white += OPP_KING_DIST
                    * sable::helper::king_distance(stop, king_sq[1]) as i32
                    * r_factor;
            }
        }

        let mut passers = b_passed;
        while let Some(sq) = passers.pop_some_lsb() {
            let file = (sq.0 & 7) as usize;
            let rank = 7 - (sq.0 >> 3) as usize;
            black += PASSER_BONUS[rank];
            black += PASSER_FILE_BONUS[file];

            let r_factor = ((rank as i32 - 1) * (rank as i32 - 2)) / 2;
            if r_factor != 0 {
                let stop = SQ(sq.0 - 8);
                if (stop.to_bb() & self.all_pieces[0]).is_empty() {
                    let mut path = sq.to_bb();
                    path |= path >> 8u64;
                    path |= path >> 16u64;
                    path |= path >> 32u64;

                    let mut rook_behind = sq.to_bb();
                    for _ in 0..5 {
                        rook_behind |= (rook_behind << 8u64) & !all_pieces;
                    }
                    rook_behind = rook_behind << 8u64;
                    let mut block = self.all_pieces[0] | self.ei.full_attack_maps[0];
                    let mut defend =
                        self.ei.full_attack_maps[1] | self.ei.attack_maps[1][P_IDX];
                    if (rook_behind
                        & (self.pieces[1][3] | self.pieces[1][4]))
                        .is_not_empty()
                    {
                        defend |= path;
                    } else if (rook_behind
                        & (self.pieces[0][3] | self.pieces[0][4]))
                        .is_not_empty()
                    {
                        block |= path;
                    }

                    if (path & block).is_empty() {
                        black += FREE_PROMOTION_BONUS * r_factor;
                    } else if (stop.to_bb() & block).is_empty() {
                        black += FREE_STOP_BONUS * r_factor;
                    }
                    if (path & defend) == path {
                        black += FULLY_DEFENDED_PASSER_BONUS * r_factor;
                    } else if (stop.to_bb() & defend).is_not_empty() {
                        black += DEFENDED_PASSER_BONUS * r_factor;
                    }
                }

                black -= OWN_KING_DIST
                    * sable::helper::king_distance(stop, king_sq[1]) as i32
                    * r_factor;
                black += OPP_KING_DIST
                    * sable::helper::king_distance(stop, king_sq[0]) as i32
                    * r_factor;
            }
        }

        // Doubled pawns.
        white += DOUBLED_PENALTY * (w_pawns & (w_pawns << 8u64)).count_bits() as i32;
        black += DOUBLED_PENALTY * (b_pawns & (b_pawns >> 8u64)).count_bits() as i32;

        // Isolated pawns, via an eight-bit map of occupied files.
        let mut w_by_file = [0i32; 8];
        let mut b_by_file = [0i32; 8];
        for f in 0..8 {
            w_by_file[f] = (w_pawns & BitBoard(FILE_BB[f])).count_bits() as i32;
            b_by_file[f] = (b_pawns & BitBoard(FILE_BB[f])).count_bits() as i32;
        }
        let mut w_files: u32 = 0;
        let mut b_files: u32 = 0;
        for f in 0..8 {
            if w_by_file[f] > 0 {
                w_files |= 1 << f;
            }
            if b_by_file[f] > 0 {
                b_files |= 1 << f;
            }
        }
        let w_isolated = w_files & !((w_files >> 1) | (w_files << 1));
        let b_isolated = b_files & !((b_files >> 1) | (b_files << 1));

        let spread = |files: u32| -> BitBoard {
            let mut bb = BitBoard(files as u64);
            bb |= bb << 8u64;
            bb |= bb << 16u64;
            bb |= bb << 32u64;
            bb
        };
        let w_isolated_bb = spread(w_isolated);
        let b_isolated_bb = spread(b_isolated);

        for f in 0..8 {
            if w_isolated & (1 << f) != 0 {
                white += ISOLATED_PENALTY * w_by_file[f];
                if (BitBoard(FILE_BB[f]) & b_pawns).is_empty()
                    && (self.pieces[1][4] | self.pieces[1][3]).is_not_empty()
                {
                    white += ISOLATED_SEMIOPEN_PENALTY * w_by_file[f];
                }
            }
            if b_isolated & (1 << f) != 0 {
                black += ISOLATED_PENALTY * b_by_file[f];
                if (BitBoard(FILE_BB[f]) & w_pawns).is_empty()
                    && (self.pieces[0][4] | self.pieces[0][3]).is_not_empty()
                {
                    black += ISOLATED_SEMIOPEN_PENALTY * b_by_file[f];
                }
            }
        }

        // Backward pawns: stop square covered by an enemy pawn and never
        // coverable by our own.
        let mut w_bad_stops = !pawn_stop_att[0] & self.ei.attack_maps[1][P_IDX];
        let mut b_bad_stops = !pawn_stop_att[1] & self.ei.attack_maps[0][P_IDX];
        for _ in 0..6 {
            w_bad_stops |= w_bad_stops >> 8u64;
            b_bad_stops |= b_bad_stops << 8u64;
        }
        let w_backwards =
            w_bad_stops & w_pawns & !w_isolated_bb & !self.ei.attack_maps[1][P_IDX];
        let b_backwards =
            b_bad_stops & b_pawns & !b_isolated_bb & !self.ei.attack_maps[0][P_IDX];
        white += BACKWARD_PENALTY * w_backwards.count_bits() as i32;
        black += BACKWARD_PENALTY * b_backwards.count_bits() as i32;

        let mut bw = w_backwards;
        while let Some(sq) = bw.pop_some_lsb() {
            let f = (sq.0 & 7) as usize;
            if (BitBoard(FILE_BB[f]) & b_pawns).is_empty()
                && (self.pieces[1][4] | self.pieces[1][3]).is_not_empty()
            {
                white += BACKWARD_SEMIOPEN_PENALTY;
            }
        }
        let mut bb_ = b_backwards;
        while let Some(sq) = bb_.pop_some_lsb() {
            let f = (sq.0 & 7) as usize;
            if (BitBoard(FILE_BB[f]) & w_pawns).is_empty()
                && (self.pieces[0][4] | self.pieces[0][3]).is_not_empty()
            {
                black += BACKWARD_SEMIOPEN_PENALTY;
            }
        }

        // Remaining undefended pawns.
        let w_undefended =
            w_pawns & !self.ei.attack_maps[0][P_IDX] & !w_backwards & !w_isolated_bb;
        let b_undefended =
            b_pawns & !self.ei.attack_maps[1][P_IDX] & !b_backwards & !b_isolated_bb;
        white += UNDEFENDED_PAWN_PENALTY * w_undefended.count_bits() as i32;
        black += UNDEFENDED_PAWN_PENALTY * b_undefended.count_bits() as i32;

        // Phalanxes: side-by-side pawns, doubled bonus on open files.
        let mut w_phalanx = (w_pawns & (w_pawns << 1u64) & BitBoard(NOT_FILE_A))
            | (w_pawns & (w_pawns >> 1u64) & BitBoard(NOT_FILE_H));
        while let Some(sq) = w_phalanx.pop_some_lsb() {
            let bonus = PAWN_PHALANX_BONUS[(sq.0 >> 3) as usize];
            white += bonus;
            if (BitBoard(FILE_BB[(sq.0 & 7) as usize]) & b_pawns).is_empty() {
                white += bonus;
            }
        }
        let mut b_phalanx = (b_pawns & (b_pawns << 1u64) & BitBoard(NOT_FILE_A))
            | (b_pawns & (b_pawns >> 1u64) & BitBoard(NOT_FILE_H));
        while let Some(sq) = b_phalanx.pop_some_lsb() {
            let bonus = PAWN_PHALANX_BONUS[7 - (sq.0 >> 3) as usize];
            black += bonus;
            if (BitBoard(FILE_BB[(sq.0 & 7) as usize]) & w_pawns).is_empty() {
                black += bonus;
            }
        }

        // Pawns defended by a pawn.
        let mut w_connected = w_pawns & self.ei.attack_maps[0][P_IDX];
        while let Some(sq) = w_connected.pop_some_lsb() {
            let bonus = PAWN_CONNECTED_BONUS[(sq.0 >> 3) as usize];
            white += bonus;
            if (BitBoard(FILE_BB[(sq.0 & 7) as usize]) & b_pawns).is_empty() {
                white += bonus;
            }
        }
        let mut b_connected = b_pawns & self.ei.attack_maps[1][P_IDX];
        while let Some(sq) = b_connected.pop_some_lsb() {
            let bonus = PAWN_CONNECTED_BONUS[7 - (sq.0 >> 3) as usize];
            black += bonus;
            if (BitBoard(FILE_BB[(sq.0 & 7) as usize]) & w_pawns).is_empty() {
                black += bonus;
            }
        }

        (white, black)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mirror_fen(fen: &str) -> String {
        // Flip ranks and swap case to mirror the position.
        let parts: Vec<&str> = fen.split(' ').collect();
        let flipped: Vec<String> = parts[0]
            .split('/')
            .rev()
            .map(|rank| {
                rank.chars()
                    .map(|c| {
                        if c.is_ascii_uppercase() {
                            c.to_ascii_lowercase()
                        } else {
                            c.to_ascii_uppercase()
                        }
                    })
                    .collect()
            })
            .collect();
        let turn = if parts[1] == "w" { "b" } else { "w" };
        let castling: String = if parts[2] == "-" {
            "-".to_string()
        } else {
            let mut sw: Vec<char> = parts[2]
                .chars()
                .map(|c| {
                    if c.is_ascii_uppercase() {
                        c.to_ascii_lowercase()
                    } else {
                        c.to_ascii_uppercase()
                    }
                })
                .collect();
            sw.sort_by_key(|c| (c.is_ascii_lowercase(), *c));
            sw.into_iter().collect()
        };
        format!("{} {} {} - 0 1", flipped.join("/"), turn, castling)
    }

    #[test]
    fn start_pos_is_balanced() {
        init_eval_tables();
        let board = Board::start_pos();
        let score = evaluate(&board);
        // Only the tempo bonus separates the sides.
        assert!(score.abs() <= 2 * TEMPO_VALUE, "score was {}", score);
    }

    #[test]
    fn evaluation_is_symmetric() {
        init_eval_tables();
        let fens = [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "r1bqk2r/pppp1ppp/2n2n2/2b1p3/2B1P3/2N2N2/PPPP1PPP/R1BQK2R w KQkq - 0 1",
            "r4rk1/1pp2ppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP2PPP/R2Q1RK1 w - - 0 1",
            "8/2k5/3p4/8/3P4/8/2K5/8 w - - 0 1",
        ];
        for fen in fens.iter() {
            let board = Board::from_fen(fen).unwrap();
            let mirrored = Board::from_fen(&mirror_fen(fen)).unwrap();
            assert_eq!(
                evaluate(&board),
                -evaluate(&mirrored),
                "asymmetric eval for {}",
                fen
            );
        }
    }

    #[test]
    fn material_advantage_shows() {
        init_eval_tables();
        // White up a clean rook.
        let board = Board::from_fen("4k3/8/8/8/8/8/PPP5/R3K3 w - - 0 1").unwrap();
        assert!(evaluate(&board) > 300);
    }

    #[test]
    fn insufficient_material_is_drawn() {
        init_eval_tables();
        for fen in [
            "4k3/8/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/2N1K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/2B1K3 w - - 0 1",
        ]
        .iter()
        {
            let board = Board::from_fen(fen).unwrap();
            assert!(board.is_insufficient_material());
        }
    }
}

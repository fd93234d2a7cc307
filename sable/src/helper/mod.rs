//! Statically initialized lookup tables.
//!
//! Whenever a `Board` is created, these are initialized as well. Accessing
//! any of the functions below guarantees the tables exist, as they all go
//! through a single lazily-created instance. Call [`init_statics`] early
//! (e.g. at program start) to pay the initialization cost up front.
//!
//! [`init_statics`]: fn.init_statics.html

mod boards;
mod magic;
pub mod prng;
mod zobrist;

pub use self::boards::{pawn_attacks, pawn_attacks_from};

use crate::core::bitboard::BitBoard;
use crate::core::sq::SQ;
use crate::core::Player;

use self::boards::BoardTables;
use self::magic::MagicTables;
use self::zobrist::ZobristTables;

struct Statics {
    magics: MagicTables,
    boards: BoardTables,
    zobrist: ZobristTables,
}

lazy_static! {
    static ref STATICS: Statics = Statics {
        magics: MagicTables::new(),
        boards: BoardTables::new(),
        zobrist: ZobristTables::new(),
    };
}

/// Initializes the static lookup tables if they have not been already.
#[cold]
pub fn init_statics() {
    lazy_static::initialize(&STATICS);
}

/// Generate bishop attacks from a square and all occupied squares on the
/// board. The returned `BitBoard` includes blocker squares on both sides;
/// intersect with the complement of the moving player's pieces to get
/// moves.
#[inline(always)]
pub fn bishop_attacks(occupied: BitBoard, sq: SQ) -> BitBoard {
    BitBoard(STATICS.magics.bishop_attacks(occupied.0, sq.0))
}

/// Generate rook attacks from a square and all occupied squares on the
/// board.
#[inline(always)]
pub fn rook_attacks(occupied: BitBoard, sq: SQ) -> BitBoard {
    BitBoard(STATICS.magics.rook_attacks(occupied.0, sq.0))
}

/// Generate queen attacks from a square and all occupied squares on the
/// board.
#[inline(always)]
pub fn queen_attacks(occupied: BitBoard, sq: SQ) -> BitBoard {
    bishop_attacks(occupied, sq) | rook_attacks(occupied, sq)
}

/// Generate knight attacks from a square.
#[inline(always)]
pub fn knight_attacks(sq: SQ) -> BitBoard {
    BitBoard(STATICS.boards.knight_attacks[sq.0 as usize])
}

/// Generate king attacks from a square.
#[inline(always)]
pub fn king_attacks(sq: SQ) -> BitBoard {
    BitBoard(STATICS.boards.king_attacks[sq.0 as usize])
}

/// The squares strictly between two squares on a shared rank, file or
/// diagonal. Empty if the squares are not aligned.
#[inline(always)]
pub fn between_bb(s1: SQ, s2: SQ) -> BitBoard {
    BitBoard(STATICS.boards.between[s1.0 as usize][s2.0 as usize])
}

/// Chebyshev distance between two squares, capped at 5.
#[inline(always)]
pub fn king_distance(s1: SQ, s2: SQ) -> u8 {
    STATICS.boards.king_distance[s1.0 as usize][s2.0 as usize]
}

/// Manhattan distance between two squares.
#[inline(always)]
pub fn manhattan_distance(s1: SQ, s2: SQ) -> u8 {
    STATICS.boards.manhattan_distance[s1.0 as usize][s2.0 as usize]
}

/// Zobrist key of a player's piece sitting on a square.
#[inline(always)]
pub fn z_square(player: Player, piece: usize, sq: SQ) -> u64 {
    STATICS.zobrist.piece_square[player as usize][piece][sq.0 as usize]
}

/// Zobrist key of a castling-rights mask.
#[inline(always)]
pub fn z_castle(castling: u8) -> u64 {
    debug_assert!(castling < 16);
    STATICS.zobrist.castling[castling as usize]
}

/// Zobrist key of the en-passant capture file; index 8 means none.
#[inline(always)]
pub fn z_ep(file: u16) -> u64 {
    debug_assert!(file <= 8);
    STATICS.zobrist.en_passant[file as usize]
}

/// Zobrist key of the side to move being black.
#[inline(always)]
pub fn z_side() -> u64 {
    STATICS.zobrist.side
}

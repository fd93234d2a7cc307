//! Constant bit masks and counts used across the board representation.

/// Number of squares on a chessboard.
pub const SQ_CNT: usize = 64;
/// Number of players.
pub const PLAYER_CNT: usize = 2;
/// Number of piece types per player.
pub const PIECE_TYPE_CNT: usize = 6;
/// Number of files.
pub const FILE_CNT: usize = 8;
/// Number of ranks.
pub const RANK_CNT: usize = 8;
/// Number of distinct castling-rights masks.
pub const CASTLING_CNT: usize = 16;
/// Upper bound on the legal-move count of any position.
pub const MAX_MOVES: usize = 256;

/// En-passant file sentinel meaning "no en passant possible".
pub const NO_EP_FILE: u16 = 8;

pub const NORTH: i8 = 8;
pub const SOUTH: i8 = -8;

pub const FILE_A: u64 = 0x0101_0101_0101_0101;
pub const FILE_B: u64 = FILE_A << 1;
pub const FILE_C: u64 = FILE_A << 2;
pub const FILE_D: u64 = FILE_A << 3;
pub const FILE_E: u64 = FILE_A << 4;
pub const FILE_F: u64 = FILE_A << 5;
pub const FILE_G: u64 = FILE_A << 6;
pub const FILE_H: u64 = FILE_A << 7;

pub const RANK_1: u64 = 0x0000_0000_0000_00FF;
pub const RANK_2: u64 = RANK_1 << 8;
pub const RANK_3: u64 = RANK_1 << 16;
pub const RANK_4: u64 = RANK_1 << 24;
pub const RANK_5: u64 = RANK_1 << 32;
pub const RANK_6: u64 = RANK_1 << 40;
pub const RANK_7: u64 = RANK_1 << 48;
pub const RANK_8: u64 = RANK_1 << 56;

pub const FILE_BB: [u64; FILE_CNT] = [
    FILE_A, FILE_B, FILE_C, FILE_D, FILE_E, FILE_F, FILE_G, FILE_H,
];

pub const RANK_BB: [u64; RANK_CNT] = [
    RANK_1, RANK_2, RANK_3, RANK_4, RANK_5, RANK_6, RANK_7, RANK_8,
];

/// All squares except file A; masks wrap-around on westward shifts.
pub const NOT_FILE_A: u64 = !FILE_A;
/// All squares except file H; masks wrap-around on eastward shifts.
pub const NOT_FILE_H: u64 = !FILE_H;

pub const LIGHT_SQUARES: u64 = 0x55AA_55AA_55AA_55AA;
pub const DARK_SQUARES: u64 = 0xAA55_AA55_AA55_AA55;

/// The four center squares, d4/e4/d5/e5.
pub const CENTER_SQS: u64 = (FILE_D | FILE_E) & (RANK_4 | RANK_5);
/// The extended center, c3 through f6.
pub const EXTENDED_CENTER_SQS: u64 =
    (FILE_C | FILE_D | FILE_E | FILE_F) & (RANK_3 | RANK_4 | RANK_5 | RANK_6);
/// The four center files, c through f.
pub const CENTER_FILES: u64 = FILE_C | FILE_D | FILE_E | FILE_F;
/// Queenside and kingside halves by file.
pub const QSIDE: u64 = FILE_A | FILE_B | FILE_C | FILE_D;
pub const KSIDE: u64 = FILE_E | FILE_F | FILE_G | FILE_H;
/// Board halves by player: the four ranks nearest each player's back rank.
pub const HALF: [u64; PLAYER_CNT] = [
    RANK_1 | RANK_2 | RANK_3 | RANK_4,
    RANK_5 | RANK_6 | RANK_7 | RANK_8,
];

/// Squares that must be empty for each castle: between king and rook.
pub const WHITE_KSIDE_PASSTHROUGH: u64 = 0x0000_0000_0000_0060; // f1, g1
pub const WHITE_QSIDE_PASSTHROUGH: u64 = 0x0000_0000_0000_000E; // b1, c1, d1
pub const BLACK_KSIDE_PASSTHROUGH: u64 = 0x6000_0000_0000_0000; // f8, g8
pub const BLACK_QSIDE_PASSTHROUGH: u64 = 0x0E00_0000_0000_0000; // b8, c8, d8

/// Characters for each file, index by file.
pub const FILE_DISPLAYS: [char; FILE_CNT] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];
/// Characters for each rank, index by rank.
pub const RANK_DISPLAYS: [char; RANK_CNT] = ['1', '2', '3', '4', '5', '6', '7', '8'];

/// The starting position as a FEN string.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

//! Zobrist keys for incremental position hashing.
//!
//! A position's key is the XOR of: one entry per (color, piece, square)
//! for every occupied square, the side entry when black is to move, a
//! castling entry indexed by the four-bit rights mask, and an
//! en-passant-file entry indexed 0..8 where 8 is the "none" sentinel.

use crate::core::masks::*;

use super::prng::PRNG;

/// Seed for the zobrist table's pseudo-random number generator.
const ZOBRIST_SEED: u64 = 23_081;

pub struct ZobristTables {
    pub piece_square: [[[u64; SQ_CNT]; PIECE_TYPE_CNT]; PLAYER_CNT],
    pub castling: [u64; CASTLING_CNT],
    /// Nine entries: files a..h plus the "no en passant" sentinel.
    pub en_passant: [u64; (NO_EP_FILE + 1) as usize],
    pub side: u64,
}

impl ZobristTables {
    pub fn new() -> ZobristTables {
        let mut rng = PRNG::init(ZOBRIST_SEED);
        let mut t = ZobristTables {
            piece_square: [[[0; SQ_CNT]; PIECE_TYPE_CNT]; PLAYER_CNT],
            castling: [0; CASTLING_CNT],
            en_passant: [0; (NO_EP_FILE + 1) as usize],
            side: 0,
        };
        for color in t.piece_square.iter_mut() {
            for piece in color.iter_mut() {
                for sq in piece.iter_mut() {
                    *sq = rng.rand();
                }
            }
        }
        for entry in t.castling.iter_mut() {
            *entry = rng.rand();
        }
        for entry in t.en_passant.iter_mut() {
            *entry = rng.rand();
        }
        t.side = rng.rand();
        t
    }
}

impl Default for ZobristTables {
    fn default() -> Self {
        ZobristTables::new()
    }
}

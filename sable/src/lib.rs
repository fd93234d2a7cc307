//! Bitboard chess board representation for the Sable engine.
//!
//! This crate holds the board-side half of the engine: squares, bitboards,
//! 16-bit moves, fixed-capacity move lists, statically initialized attack
//! tables (magics included), and a copy-make [`Board`] with pseudo-legal
//! move generation.
//!
//! The board is a plain value type. Search code copies it before trying a
//! move and discards the copy instead of undoing:
//!
//! ```ignore
//! use sable::Board;
//!
//! let board = Board::start_pos();
//! for mv in board.generate_moves().iter() {
//!     let mut copy = board.static_copy();
//!     if copy.do_pseudo_legal_move(*mv) {
//!         // copy now holds the child position
//!     }
//! }
//! ```
//!
//! [`Board`]: board/struct.Board.html

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate lazy_static;

pub mod board;
pub mod core;
pub mod helper;

pub use crate::board::Board;
pub use crate::core::bitboard::BitBoard;
pub use crate::core::move_list::MoveList;
pub use crate::core::piece_move::BitMove;
pub use crate::core::score::{Score, Value};
pub use crate::core::sq::SQ;
pub use crate::core::{File, PieceType, Player, Rank};

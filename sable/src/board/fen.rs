//! FEN parsing and building for the `Board`.
//!
//! The six FEN fields are piece placement, side to move, castling rights,
//! en-passant square, halfmove clock and fullmove number.

use std::fmt;

use crate::core::bitboard::BitBoard;
use crate::core::masks::*;
use crate::core::sq::{SQ, NO_SQ};
use crate::core::{PieceType, Player};
use crate::helper;

use super::castle_rights::Castling;
use super::Board;

/// An error that may occur from an invalid FEN string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenBuildError {
    NotEnoughSections { sections: usize },
    IncorrectRankAmounts { ranks: usize },
    UnrecognizedPiece { piece: char },
    FileOverflow,
    UnrecognizedTurn { turn: String },
    EpSquareInvalid { ep: String },
    UnrecognizedCastling { castling: char },
    HalfMoveInvalid,
    FullMoveInvalid,
    MissingKing,
}

impl fmt::Display for FenBuildError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FenBuildError::NotEnoughSections { sections } => {
                write!(f, "invalid number of fen sections: {}", sections)
            }
            FenBuildError::IncorrectRankAmounts { ranks } => {
                write!(f, "invalid number of ranks: {}", ranks)
            }
            FenBuildError::UnrecognizedPiece { piece } => {
                write!(f, "unrecognized piece character: {}", piece)
            }
            FenBuildError::FileOverflow => write!(f, "rank describes more than eight files"),
            FenBuildError::UnrecognizedTurn { turn } => {
                write!(f, "unrecognized turn field: {}", turn)
            }
            FenBuildError::EpSquareInvalid { ep } => {
                write!(f, "invalid en passant field: {}", ep)
            }
            FenBuildError::UnrecognizedCastling { castling } => {
                write!(f, "unrecognized castling character: {}", castling)
            }
            FenBuildError::HalfMoveInvalid => write!(f, "invalid halfmove clock"),
            FenBuildError::FullMoveInvalid => write!(f, "invalid fullmove number"),
            FenBuildError::MissingKing => write!(f, "each side needs exactly one king"),
        }
    }
}

impl std::error::Error for FenBuildError {}

fn char_to_piece(c: char) -> Option<(Player, PieceType)> {
    let player = if c.is_ascii_uppercase() {
        Player::White
    } else {
        Player::Black
    };
    let piece = match c.to_ascii_lowercase() {
        'p' => PieceType::P,
        'n' => PieceType::N,
        'b' => PieceType::B,
        'r' => PieceType::R,
        'q' => PieceType::Q,
        'k' => PieceType::K,
        _ => return None,
    };
    Some((player, piece))
}

impl Board {
    /// Constructs a board from a FEN string. The halfmove and fullmove
    /// fields may be omitted and default to `0 1`.
    pub fn from_fen(fen: &str) -> Result<Board, FenBuildError> {
        helper::init_statics();

        let sections: Vec<&str> = fen.split_whitespace().collect();
        if sections.len() < 2 {
            return Err(FenBuildError::NotEnoughSections {
                sections: sections.len(),
            });
        }

        let mut pieces = [[BitBoard::EMPTY; PIECE_TYPE_CNT]; PLAYER_CNT];
        let mut occ = [BitBoard::EMPTY; PLAYER_CNT];

        let ranks: Vec<&str> = sections[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenBuildError::IncorrectRankAmounts { ranks: ranks.len() });
        }
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - i;
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as u8;
                } else {
                    let (player, piece) =
                        char_to_piece(c).ok_or(FenBuildError::UnrecognizedPiece { piece: c })?;
                    if file >= 8 {
                        return Err(FenBuildError::FileOverflow);
                    }
                    let sq = SQ((rank * 8) as u8 + file);
                    pieces[player as usize][piece as usize] |= sq.to_bb();
                    occ[player as usize] |= sq.to_bb();
                    file += 1;
                }
            }
            if file > 8 {
                return Err(FenBuildError::FileOverflow);
            }
        }

        let turn = match sections[1] {
            "w" => Player::White,
            "b" => Player::Black,
            other => {
                return Err(FenBuildError::UnrecognizedTurn {
                    turn: other.to_string(),
                })
            }
        };

        let mut castling = Castling::empty();
        if sections.len() > 2 {
            for c in sections[2].chars() {
                match c {
                    'K' => castling |= Castling::WHITE_K,
                    'Q' => castling |= Castling::WHITE_Q,
                    'k' => castling |= Castling::BLACK_K,
                    'q' => castling |= Castling::BLACK_Q,
                    '-' => {}
                    other => {
                        return Err(FenBuildError::UnrecognizedCastling { castling: other })
                    }
                }
            }
        }

        let mut ep_capture_file = NO_EP_FILE;
        if sections.len() > 3 && sections[3] != "-" {
            let bytes = sections[3].as_bytes();
            if bytes.len() != 2 || !(b'a'..=b'h').contains(&bytes[0]) {
                return Err(FenBuildError::EpSquareInvalid {
                    ep: sections[3].to_string(),
                });
            }
            ep_capture_file = (bytes[0] - b'a') as u16;
        }

        let fifty_move = if sections.len() > 4 {
            sections[4]
                .parse::<u8>()
                .map_err(|_| FenBuildError::HalfMoveInvalid)?
        } else {
            0
        };

        let move_number = if sections.len() > 5 {
            sections[5]
                .parse::<u16>()
                .map_err(|_| FenBuildError::FullMoveInvalid)?
        } else {
            1
        };

        let wk = pieces[Player::White as usize][PieceType::K as usize];
        let bk = pieces[Player::Black as usize][PieceType::K as usize];
        if wk.count_bits() != 1 || bk.count_bits() != 1 {
            return Err(FenBuildError::MissingKing);
        }

        let mut board = Board {
            pieces,
            occ,
            king_sqs: [wk.to_sq(), bk.to_sq()],
            turn,
            castling,
            ep_capture_file,
            fifty_move,
            move_number,
            zobrist: 0,
        };
        board.zobrist = board.compute_zobrist();
        Ok(board)
    }

    /// Creates a FEN string of the current position.
    pub fn fen(&self) -> String {
        let mut fen = String::with_capacity(64);
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                let sq = SQ(rank * 8 + file);
                let c = if let Some(p) = self.piece_on_sq(Player::White, sq) {
                    Some(p.char_upper())
                } else {
                    self.piece_on_sq(Player::Black, sq).map(|p| p.char_lower())
                };
                match c {
                    Some(c) => {
                        if empty > 0 {
                            fen.push(char::from_digit(empty, 10).unwrap());
                            empty = 0;
                        }
                        fen.push(c);
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push(char::from_digit(empty, 10).unwrap());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(if self.turn() == Player::White { 'w' } else { 'b' });
        fen.push(' ');
        fen.push_str(&self.castling_rights().to_string());
        fen.push(' ');
        match self.ep_square() {
            NO_SQ => fen.push('-'),
            sq => fen.push_str(&sq.to_string()),
        }
        fen.push_str(&format!(
            " {} {}",
            self.fifty_move_counter(),
            self.move_number()
        ));
        fen
    }

    /// The square a pawn could be captured onto en passant, or `NO_SQ`.
    pub fn ep_square(&self) -> SQ {
        if self.ep_capture_file() == NO_EP_FILE {
            return NO_SQ;
        }
        // The capture square is behind the pawn that just double-pushed.
        let victim = self.ep_victim_square(!self.turn(), self.ep_capture_file());
        match !self.turn() {
            Player::White => SQ(victim.0 - 8),
            Player::Black => SQ(victim.0 + 8),
        }
    }
}

//! Castling-rights flags for a `Board`.

use crate::core::{CastleType, Player};

bitflags! {
    /// The four independent castling rights. The bit layout doubles as the
    /// index into the zobrist castling table.
    #[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
    pub struct Castling: u8 {
        const WHITE_K = 0b0001;
        const WHITE_Q = 0b0010;
        const BLACK_K = 0b0100;
        const BLACK_Q = 0b1000;

        const WHITE_ALL = Self::WHITE_K.bits() | Self::WHITE_Q.bits();
        const BLACK_ALL = Self::BLACK_K.bits() | Self::BLACK_Q.bits();
    }
}

impl Castling {
    /// The single right of a player on one side.
    #[inline(always)]
    pub fn of(player: Player, side: CastleType) -> Castling {
        match (player, side) {
            (Player::White, CastleType::KingSide) => Castling::WHITE_K,
            (Player::White, CastleType::QueenSide) => Castling::WHITE_Q,
            (Player::Black, CastleType::KingSide) => Castling::BLACK_K,
            (Player::Black, CastleType::QueenSide) => Castling::BLACK_Q,
        }
    }

    /// Both rights of one player.
    #[inline(always)]
    pub fn player_all(player: Player) -> Castling {
        match player {
            Player::White => Castling::WHITE_ALL,
            Player::Black => Castling::BLACK_ALL,
        }
    }

    /// Number of rights the player retains, 0 through 2.
    #[inline(always)]
    pub fn count_player(self, player: Player) -> u32 {
        (self & Castling::player_all(player)).bits().count_ones()
    }
}

impl std::fmt::Display for Castling {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        if self.contains(Castling::WHITE_K) {
            write!(f, "K")?;
        }
        if self.contains(Castling::WHITE_Q) {
            write!(f, "Q")?;
        }
        if self.contains(Castling::BLACK_K) {
            write!(f, "k")?;
        }
        if self.contains(Castling::BLACK_Q) {
            write!(f, "q")?;
        }
        Ok(())
    }
}

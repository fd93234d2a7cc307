extern crate sable;

use sable::{Board, PieceType, Player};

#[test]
fn start_pos_is_sane() {
    let board = Board::start_pos();
    assert!(board.is_okay());
    assert_eq!(board.turn(), Player::White);
    assert_eq!(board.move_number(), 1);
    assert_eq!(board.fifty_move_counter(), 0);
    assert_eq!(board.occupied().count_bits(), 32);
    assert_eq!(board.piece_bb(Player::White, PieceType::P).count_bits(), 8);
    assert_eq!(board.piece_bb(Player::Black, PieceType::P).count_bits(), 8);
    assert_eq!(board.piece_bb(Player::White, PieceType::K).count_bits(), 1);
    assert!(board.any_can_castle());
}

#[test]
fn occupancy_invariants() {
    let fens = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1",
        "8/2k5/8/8/8/8/4R3/4K3 w - - 0 1",
        "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2",
    ];
    for fen in fens.iter() {
        let board = Board::from_fen(fen).unwrap();
        assert!(board.is_okay(), "invariants broken for {}", fen);
        assert!(
            (board.get_occupied_player(Player::White) & board.get_occupied_player(Player::Black))
                .is_empty()
        );
    }
}

#[test]
fn king_square_cache() {
    let board = Board::from_fen("8/2k5/8/8/8/8/4R3/4K3 w - - 0 1").unwrap();
    assert_eq!(board.king_sq(Player::White).to_string(), "e1");
    assert_eq!(board.king_sq(Player::Black).to_string(), "c7");
}

#[test]
fn fifty_move_rule() {
    let board = Board::from_fen("8/2k5/8/8/8/8/4R3/4K3 w - - 100 80").unwrap();
    assert!(board.is_draw());
    let board = Board::from_fen("8/2k5/8/8/8/8/4R3/4K3 w - - 99 80").unwrap();
    assert!(!board.is_draw());
}

extern crate sable;

use sable::{BitMove, Board, SQ};

fn find_move(board: &Board, s: &str) -> BitMove {
    board
        .generate_moves()
        .iter()
        .copied()
        .find(|m| m.stringify() == s)
        .unwrap_or_else(|| panic!("move {} not generated", s))
}

#[test]
fn queen_takes_defended_pawn_loses() {
    // Qd1xd5 where the d5 pawn is defended by the e6 pawn.
    let board = Board::from_fen("4k3/8/4p3/3p4/8/8/8/3QK3 w - - 0 1").unwrap();
    let m = find_move(&board, "d1d5");
    assert!(!board.see_ge(m, 0));
}

#[test]
fn queen_takes_undefended_pawn_wins() {
    let board = Board::from_fen("4k3/8/8/3p4/8/8/8/3QK3 w - - 0 1").unwrap();
    let m = find_move(&board, "d1d5");
    assert!(board.see_ge(m, 0));
    assert!(board.see_ge(m, 100));
    assert!(!board.see_ge(m, 101));
}

#[test]
fn pawn_takes_queen_always_wins() {
    // Even with the queen defended, pawn takes queen is winning.
    let board = Board::from_fen("4k3/2q5/3q4/4P3/8/8/8/4K3 w - - 0 1").unwrap();
    let m = find_move(&board, "e5d6");
    assert!(board.see_ge(m, 0));
    assert!(board.see_ge(m, 1000));
}

#[test]
fn rook_takes_defended_pawn_loses() {
    let board = Board::from_fen("4k3/4p3/3p4/8/8/8/8/3RK3 w - - 0 1").unwrap();
    let m = find_move(&board, "d1d6");
    assert!(!board.see_ge(m, 0));
}

#[test]
fn xray_recapture_counts() {
    // White Rd1 and Rd2 doubled against a defended d5 pawn: the second
    // rook's recapture makes the exchange playable.
    let board = Board::from_fen("3rk3/8/8/3p4/8/8/3R4/3RK3 w - - 0 1").unwrap();
    let m = find_move(&board, "d2d5");
    assert!(board.see_ge(m, 0));
}

#[test]
fn ep_and_castle_score_zero() {
    let board =
        Board::from_fen("rnbqkbnr/pppp1ppp/8/8/4pP2/8/PPPPP1PP/RNBQKBNR b KQkq f3 0 3").unwrap();
    let ep = BitMove::make_ep_capture(SQ(28), SQ(21));
    assert!(board.see_ge(ep, 0));
    assert!(!board.see_ge(ep, 1));

    let castle_pos = Board::from_fen("8/8/8/8/8/8/6k1/4K2R w K - 0 1").unwrap();
    let castle = BitMove::make_castle(SQ::E1, SQ::G1);
    assert!(castle_pos.see_ge(castle, 0));
    assert!(!castle_pos.see_ge(castle, 1));
}

extern crate sable;

use sable::{BitMove, Board, PieceType, Player, SQ};

// Applying a legal move must give the same piece bitboards, castling
// rights, ep file, hash and side to move as parsing the resulting FEN.
fn assert_matches_fen_reload(board: &Board) {
    let reloaded = Board::from_fen(&board.fen()).unwrap();
    for &player in [Player::White, Player::Black].iter() {
        for &piece in [
            PieceType::P,
            PieceType::N,
            PieceType::B,
            PieceType::R,
            PieceType::Q,
            PieceType::K,
        ]
        .iter()
        {
            assert_eq!(board.piece_bb(player, piece), reloaded.piece_bb(player, piece));
        }
    }
    assert_eq!(board.castling_rights(), reloaded.castling_rights());
    assert_eq!(board.ep_capture_file(), reloaded.ep_capture_file());
    assert_eq!(board.turn(), reloaded.turn());
    assert_eq!(board.zobrist(), reloaded.zobrist());
}

#[test]
fn every_legal_start_move_round_trips() {
    let board = Board::start_pos();
    for mv in board.generate_legal_moves().iter() {
        let mut copy = board.static_copy();
        copy.do_move(*mv);
        assert!(copy.is_okay(), "invariants broken after {}", mv);
        assert_matches_fen_reload(&copy);
    }
}

#[test]
fn move_number_increments_after_black() {
    let mut board = Board::start_pos();
    board.do_move(BitMove::make_pawn_push(SQ(12), SQ(28))); // e2e4
    assert_eq!(board.move_number(), 1);
    assert_eq!(board.turn(), Player::Black);
    board.do_move(BitMove::make_pawn_push(SQ(52), SQ(36))); // e7e5
    assert_eq!(board.move_number(), 2);
    assert_eq!(board.turn(), Player::White);
}

#[test]
fn null_move_round_trips() {
    let board =
        Board::from_fen("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2").unwrap();
    let mut copy = board.static_copy();
    let saved_ep = copy.do_null_move();
    assert_ne!(copy.zobrist(), board.zobrist());
    assert_eq!(copy.ep_capture_file(), 8);
    copy.undo_null_move(saved_ep);
    assert_eq!(copy.zobrist(), board.zobrist());
    assert_eq!(copy.ep_capture_file(), board.ep_capture_file());
    assert_eq!(copy.fen(), board.fen());
}

#[test]
fn kingside_castle_moves_rook() {
    let mut board = Board::from_fen("8/8/8/8/8/8/6k1/4K2R w K - 0 1").unwrap();
    let legal = board.generate_legal_moves();
    let castle = BitMove::make_castle(SQ::E1, SQ::G1);
    assert!(legal.contains(castle));

    board.do_move(castle);
    assert!(board.is_okay());
    assert_eq!(board.king_sq(Player::White), SQ::G1);
    assert!((board.piece_bb(Player::White, PieceType::R) & SQ::F1.to_bb()).is_not_empty());
    assert!(!board.any_can_castle());
}

#[test]
fn ep_capture_removes_victim() {
    let mut board =
        Board::from_fen("rnbqkbnr/pppp1ppp/8/8/4pP2/8/PPPPP1PP/RNBQKBNR b KQkq f3 0 3").unwrap();
    let ep = BitMove::make_ep_capture(SQ(28), SQ(21)); // e4xf3
    assert!(board.generate_legal_moves().contains(ep));
    board.do_move(ep);
    assert!(board.is_okay());
    // The f4 pawn is gone.
    assert!((board.piece_bb(Player::White, PieceType::P) & SQ(29).to_bb()).is_empty());
    assert_matches_fen_reload(&board);
}

#[test]
fn stale_ep_is_not_generated() {
    // After a second unrelated exchange the old ep file must be cleared.
    let mut board =
        Board::from_fen("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2").unwrap();
    assert_eq!(board.ep_capture_file(), 4);
    board.do_move(BitMove::make_pawn_push(SQ(11), SQ(27))); // d2d4
    assert_eq!(board.ep_capture_file(), 3);
    board.do_move(BitMove::make_capture(SQ(36), SQ(27))); // e5xd4
    assert_eq!(board.ep_capture_file(), 8);
    let moves = board.generate_legal_moves();
    assert!(!moves.iter().any(|m| m.is_en_passant()));
}

#[test]
fn hash_moves_are_verified() {
    let mut board = Board::start_pos();
    // Claims a capture onto an empty square.
    assert!(!board.do_hash_move(BitMove::make_capture(SQ(12), SQ(28))));
    // No piece on the source square.
    assert!(!board.do_hash_move(BitMove::make_quiet(SQ(32), SQ(40))));
    // A real move passes.
    assert!(board.do_hash_move(BitMove::make_quiet(SQ(12), SQ(20))));
}

#[test]
fn promotions_apply() {
    let mut board = Board::from_fen("5k2/4P3/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    let promo = BitMove::make_promotion(SQ(52), SQ(60), PieceType::Q, false);
    assert!(board.generate_legal_moves().contains(promo));
    board.do_move(promo);
    assert!(board.is_okay());
    assert!((board.piece_bb(Player::White, PieceType::Q) & SQ(60).to_bb()).is_not_empty());
    assert!(board.piece_bb(Player::White, PieceType::P).is_empty());
    assert_matches_fen_reload(&board);
}

extern crate sable;

use sable::{BitMove, Board, MoveList, SQ};

#[test]
fn start_pos_counts() {
    let board = Board::start_pos();
    let legal = board.generate_legal_moves();
    assert_eq!(legal.len(), 20);

    let mut captures = MoveList::new();
    board.generate_captures(&mut captures, true);
    assert_eq!(captures.len(), 0);
}

#[test]
fn all_four_castles_generated() {
    let board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let white_legal = board.generate_legal_moves();
    assert!(white_legal.contains(BitMove::make_castle(SQ::E1, SQ::G1)));
    assert!(white_legal.contains(BitMove::make_castle(SQ::E1, SQ::C1)));

    let mut copy = board.static_copy();
    copy.do_move(BitMove::make_quiet(SQ(4), SQ(12))); // e1e2
    let black_legal = copy.generate_legal_moves();
    assert!(black_legal.contains(BitMove::make_castle(SQ::E8, SQ::G8)));
    assert!(black_legal.contains(BitMove::make_castle(SQ::E8, SQ::C8)));
}

#[test]
fn castle_blocked_by_attack() {
    // Black rook on f8 covers f1; white may not castle kingside through it.
    let board = Board::from_fen("5r2/8/8/8/8/8/7k/R3K2R w KQ - 0 1").unwrap();
    let legal = board.generate_legal_moves();
    assert!(!legal.contains(BitMove::make_castle(SQ::E1, SQ::G1)));
    assert!(legal.contains(BitMove::make_castle(SQ::E1, SQ::C1)));
}

#[test]
fn evasions_equal_legal_moves() {
    // A handful of in-check positions: the evasion generator, filtered for
    // legality, must produce exactly the set of legal moves.
    let fens = [
        "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        "4k3/8/8/8/7b/8/8/4K3 w - - 0 1",
        "4k3/8/8/8/8/8/8/r3K2r w - - 0 1",
        "4k3/4r3/8/8/8/5n2/8/4K3 w - - 0 1", // double check
    ];
    for fen in fens.iter() {
        let board = Board::from_fen(fen).unwrap();
        assert!(board.in_check(board.turn()));

        let mut evasions = MoveList::new();
        board.generate_check_evasions(&mut evasions);
        let mut legal_evasions: Vec<BitMove> = evasions
            .iter()
            .copied()
            .filter(|m| {
                let mut copy = board.static_copy();
                copy.do_pseudo_legal_move(*m)
            })
            .collect();

        // Reference: filter every pseudo-legal move.
        let mut reference: Vec<BitMove> = board
            .generate_moves()
            .iter()
            .copied()
            .filter(|m| {
                let mut copy = board.static_copy();
                copy.do_pseudo_legal_move(*m)
            })
            .collect();

        legal_evasions.sort_by_key(|m| m.get_raw());
        legal_evasions.dedup();
        reference.sort_by_key(|m| m.get_raw());

        assert_eq!(legal_evasions, reference, "evasion mismatch for {}", fen);
    }
}

#[test]
fn queen_promotions_only() {
    let board = Board::from_fen("3r1k2/4P3/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    let mut moves = MoveList::new();
    board.generate_queen_promotions(&mut moves);
    // e8=Q and exd8=Q.
    assert_eq!(moves.len(), 2);
    assert!(moves.iter().all(|m| m.is_promo()));
    assert!(moves.iter().all(|m| m.promo_piece() == sable::PieceType::Q));
}

#[test]
fn promotion_emission_order() {
    let board = Board::from_fen("5k2/4P3/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    let moves = board.generate_moves();
    let promos: Vec<BitMove> = moves.iter().copied().filter(|m| m.is_promo()).collect();
    assert_eq!(promos.len(), 4);
    // Strongest first: queen, knight, rook, bishop.
    assert_eq!(promos[0].promo_piece(), sable::PieceType::Q);
    assert_eq!(promos[1].promo_piece(), sable::PieceType::N);
    assert_eq!(promos[2].promo_piece(), sable::PieceType::R);
    assert_eq!(promos[3].promo_piece(), sable::PieceType::B);
}

#[test]
fn pinned_pieces_detected() {
    use sable::Player;
    // The d2 knight is pinned by the a5 bishop; the e2 rook by the e8 rook.
    let board = Board::from_fen("4r3/8/8/b7/8/8/3NR3/4K3 w - - 0 1").unwrap();
    let pinned = board.pinned_map(Player::White);
    assert!((pinned & SQ(11).to_bb()).is_not_empty()); // d2
    assert!((pinned & SQ(12).to_bb()).is_not_empty()); // e2
    assert_eq!(pinned.count_bits(), 2);

    // Two own pieces on the ray mean no pin.
    let board = Board::from_fen("4r3/8/8/8/8/4N3/4R3/4K3 w - - 0 1").unwrap();
    assert!(board.pinned_map(Player::White).is_empty());
}

#[test]
fn quiet_checks_give_check() {
    let fens = [
        "4k3/8/8/8/8/8/8/R3K3 w - - 0 1",
        "4k3/8/8/8/8/5N2/8/4K3 w - - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    ];
    for fen in fens.iter() {
        let board = Board::from_fen(fen).unwrap();
        let mut checks = MoveList::new();
        board.generate_checks(&mut checks);
        for m in checks.iter() {
            assert!(!m.is_capture(), "{} generated as quiet check in {}", m, fen);
            let mut copy = board.static_copy();
            if copy.do_pseudo_legal_move(*m) {
                assert!(
                    copy.in_check(copy.turn()),
                    "{} does not give check in {}",
                    m,
                    fen
                );
            }
        }
    }
}

extern crate sable;

use sable::board::fen::FenBuildError;
use sable::Board;

#[test]
fn round_trips() {
    let fens = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2",
        "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1",
        "8/8/8/8/8/8/6k1/4K2R w K - 0 1",
        "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1",
        "r1bqkb1r/pp1n1ppp/2p1pn2/3p4/2PP4/2N2N2/PP2PPPP/R1BQKB1R w KQkq - 2 6",
    ];
    for fen in fens.iter() {
        let board = Board::from_fen(fen).unwrap();
        assert_eq!(&board.fen(), fen);
    }
}

#[test]
fn rejects_bad_input() {
    assert!(matches!(
        Board::from_fen("not a fen"),
        Err(FenBuildError::NotEnoughSections { .. })
    ));
    assert!(matches!(
        Board::from_fen("8/8/8/8/8/8/8 w - - 0 1"),
        Err(FenBuildError::IncorrectRankAmounts { ranks: 7 })
    ));
    assert!(matches!(
        Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNX w KQkq - 0 1"),
        Err(FenBuildError::UnrecognizedPiece { piece: 'X' })
    ));
    assert!(matches!(
        Board::from_fen("8/8/8/8/8/8/8/8 w - - 0 1"),
        Err(FenBuildError::MissingKing)
    ));
    assert!(matches!(
        Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1"),
        Err(FenBuildError::UnrecognizedTurn { .. })
    ));
}

#[test]
fn ep_file_parses() {
    let board =
        Board::from_fen("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2").unwrap();
    assert_eq!(board.ep_capture_file(), 4);
    assert_eq!(board.ep_square().to_string(), "e6");
}

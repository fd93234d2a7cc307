extern crate sable;

use sable::board::perft::perft;
use sable::Board;

#[test]
fn start_pos_reference_counts() {
    let board = Board::start_pos();
    assert_eq!(perft(&board, 1), 20);
    assert_eq!(perft(&board, 2), 400);
    assert_eq!(perft(&board, 3), 8_902);
    assert_eq!(perft(&board, 4), 197_281);
    assert_eq!(perft(&board, 5), 4_865_609);
}

#[test]
#[ignore] // ~2 minutes unoptimized; run with `cargo test --release -- --ignored`
fn start_pos_depth_six() {
    let board = Board::start_pos();
    assert_eq!(perft(&board, 6), 119_060_324);
}

#[test]
fn kiwipete_counts() {
    let board =
        Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();
    assert_eq!(perft(&board, 1), 48);
    assert_eq!(perft(&board, 2), 2_039);
    assert_eq!(perft(&board, 3), 97_862);
    assert_eq!(perft(&board, 4), 4_085_603);
}

#[test]
fn en_passant_pins_position() {
    // Position 3 from the standard perft suite, full of ep edge cases.
    let board = Board::from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1").unwrap();
    assert_eq!(perft(&board, 1), 14);
    assert_eq!(perft(&board, 2), 191);
    assert_eq!(perft(&board, 3), 2_812);
    assert_eq!(perft(&board, 4), 43_238);
    assert_eq!(perft(&board, 5), 674_624);
}

#[test]
fn promotion_position() {
    // Position 4: promotions, underpromotions and castling interplay.
    let board =
        Board::from_fen("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1")
            .unwrap();
    assert_eq!(perft(&board, 1), 6);
    assert_eq!(perft(&board, 2), 264);
    assert_eq!(perft(&board, 3), 9_467);
    assert_eq!(perft(&board, 4), 422_333);
}

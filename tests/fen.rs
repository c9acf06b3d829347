//! FEN parsing, rendering, and round-tripping through the public API.

use mailbox_chess_core::Board;

#[test]
fn startpos_round_trips() {
    let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    let board = Board::from_fen(fen).unwrap();
    assert_eq!(board.to_fen(), fen);
}

#[test]
fn halfmove_and_fullmove_counters_survive_a_round_trip() {
    let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 3 3";
    let board = Board::from_fen(fen).unwrap();
    assert_eq!(board.halfmove_clock(), 3);
    assert_eq!(board.fullmove_number(), 3);
    assert_eq!(board.to_fen(), fen);
}

#[test]
fn missing_king_is_rejected() {
    assert!(Board::from_fen("8/8/8/8/8/8/8/7k w - - 0 1").is_err());
}

#[test]
fn malformed_rank_count_is_rejected() {
    assert!(Board::from_fen("8/8/8/8/8/8/8 w - - 0 1").is_err());
}

#[test]
fn too_few_fields_is_rejected() {
    assert!(Board::from_fen("8/8/8/8/8/8/8/8").is_err());
}

#[test]
fn long_algebraic_display_matches_uci_conventions() {
    let mut board = Board::new();
    let mv = *board
        .moves_for("e2".parse().unwrap())
        .iter()
        .find(|m| m.to.to_string() == "e4")
        .unwrap();
    assert_eq!(mv.to_string(), "e2e4");
}

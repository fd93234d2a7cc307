//! The UCI protocol loop.
//!
//! Newline-delimited commands arrive on standard input; search progress
//! and results leave on standard output. Inputs that make no sense are
//! ignored, per the protocol. While a search runs, only `stop`,
//! `ponderhit` and `quit` are acted upon.

use std::io::BufRead;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;
use std::time::Instant;

use sable::board::perft::perft;
use sable::core::masks::START_FEN;
use sable::{BitMove, Board, MoveList};

use crate::consts::*;
use crate::eval;
use crate::search::ThreadMemory;
use crate::tablebases;
use crate::threads;
use crate::time::{elapsed_ms, TimeManagement};

const ENGINE_NAME: &str = "Sable 0.1.0";
const ENGINE_AUTHORS: &str = "The Sable Authors";

/// Positions exercised by the "bench" command.
const BENCH_FENS: [&str; 8] = [
    START_FEN,
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1",
    "8/2k5/8/8/8/8/4R3/4K3 w - - 0 1",
];

/// The engine side of the text protocol: the current position, the
/// running search thread, and any "searchmoves" restriction.
pub struct Uci {
    board: Board,
    search_thread: Option<JoinHandle<()>>,
    moves_to_search: MoveList,
}

impl Default for Uci {
    fn default() -> Self {
        Uci::new()
    }
}

impl Uci {
    pub fn new() -> Uci {
        Uci {
            board: Board::start_pos(),
            search_thread: None,
            moves_to_search: MoveList::new(),
        }
    }

    /// Reads commands from standard input until "quit".
    pub fn main_loop(&mut self) {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };
            if !self.handle_command(&line) {
                break;
            }
        }
        // Treat a closed stdin like "quit".
        self.stop_search();
    }

    /// Handles one command line; returns false on "quit".
    pub fn handle_command(&mut self, line: &str) -> bool {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let command = match tokens.first() {
            Some(c) => c.to_ascii_lowercase(),
            None => return true,
        };

        // A running search only listens for its stop conditions.
        if !IS_STOP.load(Ordering::Relaxed)
            && command != "stop"
            && command != "quit"
            && command != "ponderhit"
        {
            return true;
        }

        match command.as_str() {
            "uci" => {
                println!("id name {}", ENGINE_NAME);
                println!("id author {}", ENGINE_AUTHORS);
                println!(
                    "option name Threads type spin default {} min {} max {}",
                    DEFAULT_THREADS, MIN_THREADS, MAX_THREADS
                );
                println!(
                    "option name Hash type spin default {} min {} max {}",
                    DEFAULT_HASH_MB, MIN_HASH_MB, MAX_HASH_MB
                );
                println!(
                    "option name EvalCache type spin default {} min {} max {}",
                    DEFAULT_HASH_MB, MIN_HASH_MB, MAX_HASH_MB
                );
                println!("option name Ponder type check default false");
                println!(
                    "option name MultiPV type spin default {} min {} max {}",
                    DEFAULT_MULTI_PV, MIN_MULTI_PV, MAX_MULTI_PV
                );
                println!(
                    "option name BufferTime type spin default {} min {} max {}",
                    DEFAULT_BUFFER_TIME, MIN_BUFFER_TIME, MAX_BUFFER_TIME
                );
                println!("option name SyzygyPath type string default <empty>");
                println!(
                    "option name ScaleMaterial type spin default {} min {} max {}",
                    DEFAULT_EVAL_SCALE, MIN_EVAL_SCALE, MAX_EVAL_SCALE
                );
                println!(
                    "option name ScaleKingSafety type spin default {} min {} max {}",
                    DEFAULT_EVAL_SCALE, MIN_EVAL_SCALE, MAX_EVAL_SCALE
                );
                println!("uciok");
            }
            "isready" => println!("readyok"),
            "ucinewgame" => self.clear_all(),
            "position" => self.set_position(&tokens),
            "go" => self.go(&tokens),
            "ponderhit" => {
                IS_PONDERING.store(false, Ordering::Relaxed);
            }
            "stop" => self.stop_search(),
            "quit" => {
                self.stop_search();
                return false;
            }
            "setoption" => self.set_option(&tokens),

            // Non-UCI conveniences.
            "board" => eprint!("{}", self.board),
            "perft" => {
                if let Some(depth) = tokens.get(1).and_then(|t| t.parse::<u16>().ok()) {
                    let start = Instant::now();
                    let nodes = perft(&self.board, depth);
                    let time = elapsed_ms(start);
                    eprintln!("Nodes: {}", nodes);
                    eprintln!("Time: {}", time);
                    eprintln!("Nodes/second: {}", 1000 * nodes / time.max(1) as u64);
                }
            }
            "eval" => {
                eprintln!("Static evaluation: {}", eval::evaluate(&self.board));
            }
            "bench" => {
                let depth = tokens
                    .get(1)
                    .and_then(|t| t.parse::<i64>().ok())
                    .unwrap_or(13);
                self.run_benchmark(depth);
            }

            // Inputs that do not make sense are ignored.
            _ => {}
        }
        true
    }

    fn clear_all(&mut self) {
        TT_TABLE.clear();
        EVAL_CACHE.clear();
        threads::reset_histories();
        self.board = Board::start_pos();
    }

    /// `position [startpos | fen <fen>] [moves <move>...]`
    fn set_position(&mut self, tokens: &[&str]) {
        let moves_at = tokens.iter().position(|t| *t == "moves");

        let board = if tokens.get(1) == Some(&"startpos") {
            Board::from_fen(START_FEN).ok()
        } else if tokens.get(1) == Some(&"fen") {
            let end = moves_at.unwrap_or(tokens.len());
            let fen = tokens[2..end].join(" ");
            match Board::from_fen(&fen) {
                Ok(b) => Some(b),
                Err(err) => {
                    println!("info string invalid fen: {}", err);
                    None
                }
            }
        } else {
            None
        };
        let mut board = match board {
            Some(b) => b,
            None => return,
        };

        threads::with_game_history(|history| {
            history.clear();

            if let Some(at) = moves_at {
                for move_str in &tokens[at + 1..] {
                    let mv = match parse_move(&board, move_str) {
                        Some(m) => m,
                        None => {
                            println!("info string illegal move in line: {}", move_str);
                            break;
                        }
                    };

                    history.push(board.zobrist());
                    // Captures, pawn moves and castles are irreversible;
                    // nothing before them can repeat.
                    let color = board.turn();
                    let is_pawn_move =
                        board.piece_on_sq(color, mv.get_src()) == Some(sable::PieceType::P);
                    if mv.is_capture() || is_pawn_move || mv.is_castle() {
                        history.clear();
                    }
                    board.do_move(mv);
                }
            }

            history.set_root_end();
        });

        self.board = board;
    }

    /// `go [movetime N | depth N | infinite | wtime N btime N ...]`
    fn go(&mut self, tokens: &[&str]) {
        if !IS_STOP.load(Ordering::Relaxed) {
            return;
        }

        let value_of = |name: &str| -> Option<i64> {
            tokens
                .iter()
                .position(|t| t.eq_ignore_ascii_case(name))
                .and_then(|i| tokens.get(i + 1))
                .and_then(|t| t.parse::<i64>().ok())
        };

        if tokens.iter().any(|t| t.eq_ignore_ascii_case("ponder")) {
            IS_PONDERING.store(true, Ordering::Relaxed);
        }

        self.moves_to_search.clear();
        if let Some(at) = tokens.iter().position(|t| t.eq_ignore_ascii_case("searchmoves")) {
            for move_str in &tokens[at + 1..] {
                if let Some(m) = parse_move(&self.board, move_str) {
                    self.moves_to_search.push(m);
                } else {
                    break;
                }
            }
        }

        let time_params = if let Some(ms) = value_of("movetime") {
            TimeManagement::move_time(ms)
        } else if let Some(d) = value_of("depth") {
            TimeManagement::depth(d.min(MAX_DEPTH as i64))
        } else if tokens.iter().any(|t| t.eq_ignore_ascii_case("infinite")) {
            TimeManagement::depth(MAX_DEPTH as i64)
        } else if value_of("wtime").is_some() || value_of("btime").is_some() {
            let our_time = if self.board.turn() == sable::Player::White {
                value_of("wtime")
            } else {
                value_of("btime")
            }
            .unwrap_or(0);
            let our_inc = if self.board.turn() == sable::Player::White {
                value_of("winc")
            } else {
                value_of("binc")
            }
            .unwrap_or(0);
            TimeManagement::from_clock(
                our_time,
                our_inc,
                value_of("movestogo"),
                self.board.move_number() as i64,
                BUFFER_TIME.load(Ordering::Relaxed) as i64,
            )
        } else {
            TimeManagement::depth(MAX_DEPTH as i64)
        };

        IS_STOP.store(false, Ordering::Relaxed);
        STOP_SIGNAL.store(false, Ordering::Relaxed);
        self.join_search();

        let board = self.board.static_copy();
        let moves_to_search = self.moves_to_search.clone();
        self.search_thread = Some(std::thread::spawn(move || {
            threads::launch(board, time_params, moves_to_search);
        }));
    }

    fn stop_search(&mut self) {
        IS_PONDERING.store(false, Ordering::Relaxed);
        IS_STOP.store(true, Ordering::Relaxed);
        STOP_SIGNAL.store(true, Ordering::Relaxed);
        self.join_search();
    }

    fn join_search(&mut self) {
        if let Some(handle) = self.search_thread.take() {
            let _ = handle.join();
        }
    }

    /// `setoption name <name> value <value>`
    fn set_option(&mut self, tokens: &[&str]) {
        if tokens.len() < 5
            || !tokens[1].eq_ignore_ascii_case("name")
            || !tokens[3].eq_ignore_ascii_case("value")
        {
            println!("info string Invalid option format.");
            return;
        }
        let name = tokens[2].to_ascii_lowercase();
        let value = tokens[4];

        match name.as_str() {
            "threads" => {
                if let Ok(n) = value.parse::<usize>() {
                    threads::set_num_threads(n.clamp(MIN_THREADS, MAX_THREADS));
                }
            }
            "hash" => {
                if let Ok(mb) = value.parse::<u64>() {
                    TT_TABLE.resize(mb.clamp(MIN_HASH_MB, MAX_HASH_MB));
                }
            }
            "evalcache" => {
                if let Ok(mb) = value.parse::<u64>() {
                    EVAL_CACHE.resize(mb.clamp(MIN_HASH_MB, MAX_HASH_MB));
                }
            }
            "ponder" => {}
            "multipv" => {
                if let Ok(n) = value.parse::<usize>() {
                    MULTI_PV.store(n.clamp(MIN_MULTI_PV, MAX_MULTI_PV), Ordering::Relaxed);
                }
            }
            "buffertime" => {
                if let Ok(ms) = value.parse::<i64>() {
                    BUFFER_TIME.store(
                        ms.clamp(MIN_BUFFER_TIME, MAX_BUFFER_TIME) as i32,
                        Ordering::Relaxed,
                    );
                }
            }
            "syzygypath" => {
                // Paths may contain spaces.
                let path = tokens[4..].join(" ");
                tablebases::init_tablebases(&path);
            }
            "scalematerial" => {
                if let Ok(scale) = value.parse::<i32>() {
                    eval::set_material_scale(scale.clamp(MIN_EVAL_SCALE, MAX_EVAL_SCALE));
                }
            }
            "scalekingsafety" => {
                if let Ok(scale) = value.parse::<i32>() {
                    eval::set_king_safety_scale(scale.clamp(MIN_EVAL_SCALE, MAX_EVAL_SCALE));
                }
            }
            _ => println!("info string Invalid option."),
        }
    }

    /// Fixed-depth sweep over the bench positions, reporting total nodes
    /// and speed.
    fn run_benchmark(&mut self, depth: i64) {
        let start = Instant::now();
        let mut total_nodes: u64 = 0;

        for fen in BENCH_FENS.iter() {
            let board = match Board::from_fen(fen) {
                Ok(b) => b,
                Err(_) => continue,
            };
            NODES.store(0, Ordering::Relaxed);
            TB_HITS.store(0, Ordering::Relaxed);
            SEL_DEPTH.store(0, Ordering::Relaxed);
            IS_STOP.store(false, Ordering::Relaxed);
            STOP_SIGNAL.store(false, Ordering::Relaxed);

            let legal = board.generate_legal_moves();
            if legal.is_empty() {
                continue;
            }
            let mut mem = ThreadMemory::new();
            let mut searcher = crate::search::Searcher::new(
                0,
                &mut mem,
                TimeManagement::depth(depth),
                Instant::now(),
                crate::time::MAX_TIME,
                0,
            );
            let result = searcher.iterative_deepening(&board, legal, 0, false);
            eprintln!("bestmove {}", result.best_move);
            total_nodes += NODES.load(Ordering::Relaxed);

            IS_STOP.store(true, Ordering::Relaxed);
            STOP_SIGNAL.store(true, Ordering::Relaxed);
        }

        let time = elapsed_ms(start);
        eprintln!("Time  : {}", time);
        eprintln!("Nodes : {}", total_nodes);
        eprintln!("NPS   : {}", 1000 * total_nodes / time.max(1) as u64);
    }
}

/// Parses a move in coordinate notation against the legal moves of a
/// position.
pub fn parse_move(board: &Board, move_str: &str) -> Option<BitMove> {
    board
        .generate_legal_moves()
        .iter()
        .copied()
        .find(|m| m.stringify() == move_str.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_replay_updates_board() {
        crate::consts::init_globals();
        let mut uci = Uci::new();
        uci.handle_command("position startpos moves e2e4 e7e5 g1f3");
        assert_eq!(uci.board.move_number(), 2);
        assert_eq!(uci.board.turn(), sable::Player::Black);
    }

    #[test]
    fn illegal_replay_stops_at_prefix() {
        crate::consts::init_globals();
        let mut uci = Uci::new();
        uci.handle_command("position startpos moves e2e4 e7e6 e4d5");
        // The illegal third move is ignored; the first two stand.
        assert_eq!(uci.board.turn(), sable::Player::White);
        assert_eq!(uci.board.move_number(), 2);
    }

    #[test]
    fn fen_position_accepted() {
        crate::consts::init_globals();
        let mut uci = Uci::new();
        uci.handle_command("position fen 8/2k5/8/8/8/8/4R3/4K3 w - - 0 1");
        assert_eq!(uci.board.fen(), "8/2k5/8/8/8/8/4R3/4K3 w - - 0 1");
    }

    #[test]
    fn parse_move_validates() {
        crate::consts::init_globals();
        let board = Board::start_pos();
        assert!(parse_move(&board, "e2e4").is_some());
        assert!(parse_move(&board, "e2e5").is_none());
        assert!(parse_move(&board, "e7e5").is_none());
    }
}

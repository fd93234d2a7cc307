//! Constant values and globally shared structures.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU16, AtomicU64, AtomicUsize};

use crate::eval_cache::EvalCache;
use crate::tt::TranspositionTable;

/// Value of a checkmate at the root.
pub const MATE_SCORE: i32 = 32_766;
/// Larger than any achievable score.
pub const INFTY: i32 = 32_767;
/// Scores at or beyond this magnitude encode a mate distance. The gap to
/// `MATE_SCORE` leaves 266 plies to account for hash-table grafting.
pub const MAX_PLY_MATE_SCORE: i32 = 32_500;
/// Bound under which aspiration windows are allowed to operate.
pub const NEAR_MATE_SCORE: i32 = 2_500;

/// Maximum search depth in plies.
pub const MAX_DEPTH: i32 = 127;

/// Default transposition table size, in megabytes.
pub const DEFAULT_HASH_MB: u64 = 16;
pub const MIN_HASH_MB: u64 = 1;
pub const MAX_HASH_MB: u64 = 1024 * 1024;

pub const DEFAULT_THREADS: usize = 1;
pub const MIN_THREADS: usize = 1;
pub const MAX_THREADS: usize = 128;

pub const DEFAULT_MULTI_PV: usize = 1;
pub const MIN_MULTI_PV: usize = 1;
pub const MAX_MULTI_PV: usize = 256;

pub const DEFAULT_BUFFER_TIME: i64 = 300;
pub const MIN_BUFFER_TIME: i64 = 0;
pub const MAX_BUFFER_TIME: i64 = 5_000;

pub const DEFAULT_EVAL_SCALE: i32 = 100;
pub const MIN_EVAL_SCALE: i32 = 1;
pub const MAX_EVAL_SCALE: i32 = 1_000;

lazy_static! {
    /// The shared transposition table. Written freely by every worker; all
    /// reads are verified against the stored key.
    pub static ref TT_TABLE: TranspositionTable = TranspositionTable::new(DEFAULT_HASH_MB);

    /// The shared static-eval memoization table.
    pub static ref EVAL_CACHE: EvalCache = EvalCache::new(DEFAULT_HASH_MB);
}

/// External stop request ("stop" command or time out). Starts true: the
/// engine is idle until the first "go".
pub static IS_STOP: AtomicBool = AtomicBool::new(true);
/// Internal termination signal used to wind down helper threads.
pub static STOP_SIGNAL: AtomicBool = AtomicBool::new(true);
/// Set while a "go ponder" search runs.
pub static IS_PONDERING: AtomicBool = AtomicBool::new(false);

/// Live search workers; the primary waits for this to drain before
/// reporting its best move.
pub static THREADS_RUNNING: AtomicI32 = AtomicI32::new(0);

/// Node and tablebase-hit counters summed across all workers.
pub static NODES: AtomicU64 = AtomicU64::new(0);
pub static TB_HITS: AtomicU64 = AtomicU64::new(0);
/// The deepest ply any worker has reached this search.
pub static SEL_DEPTH: AtomicU16 = AtomicU16::new(0);

/// Values for UCI options.
pub static NUM_THREADS: AtomicUsize = AtomicUsize::new(DEFAULT_THREADS);
pub static MULTI_PV: AtomicUsize = AtomicUsize::new(DEFAULT_MULTI_PV);
pub static BUFFER_TIME: AtomicI32 = AtomicI32::new(DEFAULT_BUFFER_TIME as i32);

pub fn init_globals() {
    lazy_static::initialize(&TT_TABLE);
    lazy_static::initialize(&EVAL_CACHE);
    sable::helper::init_statics();
    crate::search::init_reduction_table();
    crate::eval::init_eval_tables();
}

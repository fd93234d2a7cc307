//! The shared transposition table.
//!
//! A power-of-two array of two-slot buckets indexed by the low bits of the
//! zobrist key. Each slot is a pair of atomic words: the full key for
//! collision detection, and the packed search data (score, best move,
//! static eval, depth, and an age/node-type byte).
//!
//! Writes take no lock. A torn read is possible but harmless: either the
//! stored key mismatches the probing position and the slot is ignored, or
//! the extracted move is rejected by `Board::do_hash_move`.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use sable::BitMove;

use crate::consts::MAX_PLY_MATE_SCORE;
use crate::tables::TableBase;

/// The node is an exact / principal-variation score.
pub const PV_NODE: u8 = 0;
/// The node failed high; the score is a lower bound.
pub const CUT_NODE: u8 = 1;
/// The node failed low; the score is an upper bound.
pub const ALL_NODE: u8 = 2;
/// No stored information.
pub const NO_NODE_INFO: u8 = 3;

/// Packs search data into a single word: score in bits 0..16, move in
/// 16..32, static eval in 32..48, depth in 48..56, age and node type in
/// 56..64 (age in the upper six bits).
#[inline(always)]
pub fn pack_hash_data(depth: i32, mv: BitMove, score: i32, eval: i32, node_type: u8, age: u8) -> u64 {
    (score as i16 as u16 as u64)
        | ((mv.get_raw() as u64) << 16)
        | ((eval as i16 as u16 as u64) << 32)
        | ((depth as i8 as u8 as u64) << 48)
        | (((((age & 0x3F) << 2) | node_type) as u64) << 56)
}

#[inline(always)]
pub fn hash_score(data: u64) -> i32 {
    data as u16 as i16 as i32
}

#[inline(always)]
pub fn hash_move(data: u64) -> BitMove {
    BitMove::new((data >> 16) as u16)
}

#[inline(always)]
pub fn hash_eval(data: u64) -> i32 {
    (data >> 32) as u16 as i16 as i32
}

#[inline(always)]
pub fn hash_depth(data: u64) -> i32 {
    (data >> 48) as u8 as i8 as i32
}

#[inline(always)]
pub fn hash_age(data: u64) -> u8 {
    (data >> 56) as u8 >> 2
}

#[inline(always)]
pub fn hash_node_type(data: u64) -> u8 {
    (data >> 56) as u8 & 0b11
}

/// Adjusts a score for storage: mate scores become distance from the
/// current node instead of distance from the root.
#[inline]
pub fn adjust_hash_score(score: i32, plies: i32) -> i32 {
    if score >= MAX_PLY_MATE_SCORE {
        score + plies
    } else if score <= -MAX_PLY_MATE_SCORE {
        score - plies
    } else {
        score
    }
}

/// One slot: the position key and its packed data.
#[derive(Default)]
struct Entry {
    key: AtomicU64,
    data: AtomicU64,
}

/// A two-slot bucket.
#[derive(Default)]
struct Node {
    slots: [Entry; 2],
}

/// The transposition table itself. All methods take `&self`: probing and
/// storing are lock-free, and the resizing entry points must only be
/// called while no search is running.
pub struct TranspositionTable {
    inner: UnsafeCell<TableBase<Node>>,
    age: AtomicU8,
}

unsafe impl Sync for TranspositionTable {}
unsafe impl Send for TranspositionTable {}

/// Bytes per bucket; determines how many buckets fit a given table size.
const NODE_BYTES: u64 = 32;

fn nodes_for_mb(mb: u64) -> usize {
    let bytes = mb << 20;
    let max_nodes = bytes / NODE_BYTES;
    let mut size: u64 = 1;
    while size <= max_nodes {
        size <<= 1;
    }
    (size >> 1) as usize
}

impl TranspositionTable {
    /// Creates a table of the largest power-of-two bucket count that fits
    /// in `mb` megabytes.
    pub fn new(mb: u64) -> TranspositionTable {
        TranspositionTable {
            inner: UnsafeCell::new(
                TableBase::new(nodes_for_mb(mb)).expect("transposition table allocation"),
            ),
            age: AtomicU8::new(0),
        }
    }

    #[inline(always)]
    fn table(&self) -> &TableBase<Node> {
        unsafe { &*self.inner.get() }
    }

    /// Number of buckets.
    pub fn num_nodes(&self) -> usize {
        self.table().size()
    }

    /// The current search age.
    #[inline(always)]
    pub fn age(&self) -> u8 {
        self.age.load(Ordering::Relaxed)
    }

    /// Bumps the age. Called once per root search. Wraps within the six
    /// stored bits; replacement arithmetic treats the difference as an
    /// unsigned byte.
    pub fn new_search(&self) {
        self.age.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the packed data stored for this key, or 0 if neither slot
    /// matches.
    pub fn probe(&self, key: u64) -> u64 {
        let node = self.table().get(key);
        for slot in node.slots.iter() {
            if slot.key.load(Ordering::Relaxed) == key {
                return slot.data.load(Ordering::Relaxed);
            }
        }
        0
    }

    /// Stores packed data for a key.
    ///
    /// A more recent update to the same position always replaces it.
    /// Otherwise each slot gets a replacement score
    /// `16 * age_difference + depth_difference` measuring how stale it is,
    /// the staler slot is chosen, and the store happens only if the new
    /// entry is from a newer search space or of sufficiently high depth.
    pub fn store(&self, key: u64, data: u64, depth: i32) {
        let age = self.age() & 0x3F;
        let node = self.table().get(key);

        for slot in node.slots.iter() {
            if slot.key.load(Ordering::Relaxed) == key {
                slot.data.store(data, Ordering::Relaxed);
                slot.key.store(key, Ordering::Release);
                return;
            }
        }

        let replace_score = |slot: &Entry| -> i32 {
            let d = slot.data.load(Ordering::Relaxed);
            16 * (age.wrapping_sub(hash_age(d)) as i32) + depth - hash_depth(d)
        };
        let score1 = replace_score(&node.slots[0]);
        let score2 = replace_score(&node.slots[1]);
        let to_replace = if score1 < score2 {
            &node.slots[1]
        } else {
            &node.slots[0]
        };
        // The entry must come from a newer search space or a sufficiently
        // high depth.
        if score1 >= -2 || score2 >= -2 {
            to_replace.data.store(data, Ordering::Relaxed);
            to_replace.key.store(key, Ordering::Release);
        }
    }

    /// Zeroes the table and resets the age.
    pub fn clear(&self) {
        let table = self.table();
        for i in 0..table.size() {
            let node = table.get(i as u64);
            for slot in node.slots.iter() {
                slot.key.store(0, Ordering::Relaxed);
                slot.data.store(0, Ordering::Relaxed);
            }
        }
        self.age.store(0, Ordering::Relaxed);
    }

    /// Re-allocates the table for a new size in megabytes.
    ///
    /// # Safety
    ///
    /// Must not be called while any search is probing the table.
    pub fn resize(&self, mb: u64) {
        unsafe {
            (*self.inner.get()).resize(nodes_for_mb(mb));
        }
        self.age.store(0, Ordering::Relaxed);
    }

    /// Estimates table occupancy in permille by sampling the first 500
    /// buckets for entries written by the current search.
    pub fn hashfull(&self) -> u32 {
        let table = self.table();
        let age = self.age() & 0x3F;
        let mut used = 0;
        for i in 0..table.size().min(500) {
            let node = table.get(i as u64);
            for slot in node.slots.iter() {
                let data = slot.data.load(Ordering::Relaxed);
                if data != 0 && hash_age(data) == age {
                    used += 1;
                }
            }
        }
        used
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable::core::sq::SQ;

    #[test]
    fn size_rounds_to_power_of_two() {
        // 1 MB of 32-byte buckets = 32768 buckets.
        assert_eq!(nodes_for_mb(1), 32_768);
        assert_eq!(nodes_for_mb(3), 65_536);
        assert_eq!(nodes_for_mb(4), 131_072);
    }

    #[test]
    fn pack_unpack_round_trips() {
        let mv = BitMove::make_capture(SQ(12), SQ(28));
        let data = pack_hash_data(22, mv, -1_234, 567, CUT_NODE, 9);
        assert_eq!(hash_score(data), -1_234);
        assert_eq!(hash_move(data), mv);
        assert_eq!(hash_eval(data), 567);
        assert_eq!(hash_depth(data), 22);
        assert_eq!(hash_age(data), 9);
        assert_eq!(hash_node_type(data), CUT_NODE);

        // Negative depths are used by quiescence entries.
        let qdata = pack_hash_data(-3, mv, 10, 20, ALL_NODE, 63);
        assert_eq!(hash_depth(qdata), -3);
        assert_eq!(hash_age(qdata), 63);
    }

    #[test]
    fn probe_finds_stored_entry() {
        let tt = TranspositionTable::new(1);
        let mv = BitMove::make_quiet(SQ(12), SQ(20));
        let data = pack_hash_data(5, mv, 42, 17, PV_NODE, tt.age());
        tt.store(0xDEAD_BEEF_0123_4567, data, 5);
        assert_eq!(tt.probe(0xDEAD_BEEF_0123_4567), data);
        assert_eq!(tt.probe(0xDEAD_BEEF_0123_4568), 0);
    }

    #[test]
    fn same_key_always_overwrites() {
        let tt = TranspositionTable::new(1);
        let key = 0x1111_2222_3333_4444;
        let mv = BitMove::make_quiet(SQ(1), SQ(2));
        tt.store(key, pack_hash_data(20, mv, 1, 0, PV_NODE, tt.age()), 20);
        tt.store(key, pack_hash_data(2, mv, 5, 0, ALL_NODE, tt.age()), 2);
        let data = tt.probe(key);
        assert_eq!(hash_depth(data), 2);
        assert_eq!(hash_score(data), 5);
    }

    // The replacement rule is deliberately literal: when both existing
    // slots are deeper than the incoming entry by more than two and no
    // fresher, the store is refused entirely.
    #[test]
    fn shallow_entry_refused_when_both_slots_deep() {
        let tt = TranspositionTable::new(1);
        let size = tt.num_nodes() as u64;
        let mv = BitMove::make_quiet(SQ(1), SQ(2));

        // Two distinct keys landing in the same bucket.
        let key_a = 0x42;
        let key_b = 0x42 + size;
        let key_c = 0x42 + 2 * size;
        tt.store(key_a, pack_hash_data(20, mv, 0, 0, PV_NODE, tt.age()), 20);
        tt.store(key_b, pack_hash_data(18, mv, 0, 0, CUT_NODE, tt.age()), 18);

        // depth 10: scores are 10-20 = -10 and 10-18 = -8, both < -2.
        tt.store(key_c, pack_hash_data(10, mv, 0, 0, CUT_NODE, tt.age()), 10);
        assert_eq!(tt.probe(key_c), 0);
        assert_ne!(tt.probe(key_a), 0);
        assert_ne!(tt.probe(key_b), 0);

        // depth 16: score vs the shallower slot is 16-18 = -2, allowed;
        // the shallower slot is the one replaced.
        tt.store(key_c, pack_hash_data(16, mv, 0, 0, CUT_NODE, tt.age()), 16);
        assert_ne!(tt.probe(key_c), 0);
        assert_ne!(tt.probe(key_a), 0);
        assert_eq!(tt.probe(key_b), 0);
    }

    #[test]
    fn newer_age_always_replaces() {
        let tt = TranspositionTable::new(1);
        let size = tt.num_nodes() as u64;
        let mv = BitMove::make_quiet(SQ(1), SQ(2));

        let key_a = 0x99;
        let key_b = 0x99 + size;
        let key_c = 0x99 + 2 * size;
        tt.store(key_a, pack_hash_data(10, mv, 0, 0, PV_NODE, tt.age()), 10);
        tt.store(key_b, pack_hash_data(10, mv, 0, 0, PV_NODE, tt.age()), 10);

        tt.new_search();
        // 16 * 1 age difference outweighs the 9-ply depth deficit.
        tt.store(key_c, pack_hash_data(1, mv, 0, 0, CUT_NODE, tt.age()), 1);
        assert_ne!(tt.probe(key_c), 0);
    }

    #[test]
    fn mate_score_adjustment() {
        use crate::consts::MATE_SCORE;
        let found_at_ply_7 = MATE_SCORE - 12;
        let stored = adjust_hash_score(found_at_ply_7, 7);
        assert_eq!(stored, found_at_ply_7 + 7);
        // Probing at ply 3 converts back to distance from root.
        assert_eq!(stored - 3, MATE_SCORE - 12 + 7 - 3);
        assert_eq!(adjust_hash_score(100, 7), 100);
        assert_eq!(adjust_hash_score(-MAX_PLY_MATE_SCORE, 4), -MAX_PLY_MATE_SCORE - 4);
    }
}

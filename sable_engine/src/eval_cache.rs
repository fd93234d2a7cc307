//! Direct-mapped memoization of static evaluations, shared by all
//! workers.
//!
//! Each entry is a single atomic word holding the high 32 bits of the
//! zobrist key and the evaluation carried with an offset so that a stored
//! score is never zero. A zero word therefore means "empty", and a torn or
//! collided entry simply fails the key comparison.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::tables::TableBase;

/// Offset added to scores before packing so valid entries are non-zero.
const EVAL_HASH_OFFSET: i32 = 1 << 16;

/// Bytes per entry.
const ENTRY_BYTES: u64 = 8;

pub struct EvalCache {
    inner: UnsafeCell<TableBase<AtomicU64>>,
}

unsafe impl Sync for EvalCache {}
unsafe impl Send for EvalCache {}

fn entries_for_mb(mb: u64) -> usize {
    let max_entries = (mb << 20) / ENTRY_BYTES;
    let mut size: u64 = 1;
    while size <= max_entries {
        size <<= 1;
    }
    (size >> 1) as usize
}

impl EvalCache {
    /// Creates a cache of the largest power-of-two entry count fitting in
    /// `mb` megabytes.
    pub fn new(mb: u64) -> EvalCache {
        EvalCache {
            inner: UnsafeCell::new(
                TableBase::new(entries_for_mb(mb)).expect("eval cache allocation"),
            ),
        }
    }

    #[inline(always)]
    fn table(&self) -> &TableBase<AtomicU64> {
        unsafe { &*self.inner.get() }
    }

    /// Saves an evaluation for a position.
    pub fn add(&self, key: u64, eval: i32) {
        let data =
            (key & 0xFFFF_FFFF_0000_0000) | ((eval + EVAL_HASH_OFFSET) as u32 as u64);
        self.table().get(key).store(data, Ordering::Relaxed);
    }

    /// Returns the cached evaluation for a position, if present.
    pub fn get(&self, key: u64) -> Option<i32> {
        let data = self.table().get(key).load(Ordering::Relaxed);
        if data != 0 && (data >> 32) == (key >> 32) {
            Some((data as u32 as i32) - EVAL_HASH_OFFSET)
        } else {
            None
        }
    }

    /// Empties the cache.
    pub fn clear(&self) {
        let table = self.table();
        for i in 0..table.size() {
            table.get(i as u64).store(0, Ordering::Relaxed);
        }
    }

    /// Re-allocates the cache for a new size in megabytes.
    ///
    /// # Safety
    ///
    /// Must not be called while any search is probing the cache.
    pub fn resize(&self, mb: u64) {
        unsafe {
            (*self.inner.get()).resize(entries_for_mb(mb));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_get_round_trips() {
        let cache = EvalCache::new(1);
        cache.add(0xABCD_EF01_2345_6789, -250);
        assert_eq!(cache.get(0xABCD_EF01_2345_6789), Some(-250));
        // Different high bits miss even when the index collides.
        assert_eq!(cache.get(0x1BCD_EF01_2345_6789), None);
    }

    #[test]
    fn zero_and_negative_scores_survive() {
        let cache = EvalCache::new(1);
        cache.add(0x1111_0000_0000_0042, 0);
        assert_eq!(cache.get(0x1111_0000_0000_0042), Some(0));
        cache.add(0x2222_0000_0000_0042, -32_000);
        assert_eq!(cache.get(0x2222_0000_0000_0042), Some(-32_000));
    }

    #[test]
    fn clear_and_resize() {
        let cache = EvalCache::new(1);
        cache.add(0x42, 17);
        cache.clear();
        assert_eq!(cache.get(0x42), None);

        cache.add(0x42, 17);
        cache.resize(2);
        assert_eq!(cache.get(0x42), None);
    }
}

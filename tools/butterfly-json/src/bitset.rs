//! Sparse presence set over 64-bit OSM identifiers
//!
//! Identifiers are grouped into 64-bit words keyed by `id / 64`; bit `id % 64` of that word
//! marks membership. Words that were never touched are not stored, so memory grows with the
//! number of distinct id ranges rather than with the id space.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Concurrent-safe sparse bitset keyed by non-negative ids
#[derive(Debug, Default)]
pub struct BitSet {
    words: RwLock<FxHashMap<u64, u64>>,
}

#[inline]
fn locate(id: i64) -> (u64, u64) {
    let v = id as u64;
    (v / 64, 1u64 << (v % 64))
}

impl BitSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a set from `(word_index, word)` pairs, as produced by [`BitSet::words`]
    pub fn from_words<I: IntoIterator<Item = (u64, u64)>>(words: I) -> Self {
        let map = words.into_iter().filter(|(_, w)| *w != 0).collect();
        Self {
            words: RwLock::new(map),
        }
    }

    pub fn insert(&self, id: i64) {
        let (index, mask) = locate(id);
        *self.words.write().entry(index).or_insert(0) |= mask;
    }

    pub fn has(&self, id: i64) -> bool {
        let (index, mask) = locate(id);
        self.words
            .read()
            .get(&index)
            .is_some_and(|word| word & mask != 0)
    }

    /// True if nothing was ever inserted
    pub fn is_empty(&self) -> bool {
        self.words.read().is_empty()
    }

    /// Number of ids in the set.
    ///
    /// Scans every stored word; meant for diagnostics, not hot paths.
    pub fn len(&self) -> u64 {
        self.words
            .read()
            .values()
            .map(|word| u64::from(word.count_ones()))
            .sum()
    }

    /// Snapshot of the stored words, sorted by word index
    pub fn words(&self) -> Vec<(u64, u64)> {
        let mut words: Vec<(u64, u64)> = self.words.read().iter().map(|(k, v)| (*k, *v)).collect();
        words.sort_unstable_by_key(|(index, _)| *index);
        words
    }
}

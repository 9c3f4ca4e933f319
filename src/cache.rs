use std::collections::HashMap;

use crate::board::Fingerprint;

/// Scores memoized by position. Entries are never evicted; `clear` is the
/// only way to drop them.
#[derive(Default)]
pub struct TranspositionCache {
    entries: HashMap<Fingerprint, i32>,
    hits: u64,
    misses: u64,
}

impl TranspositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, fingerprint: &Fingerprint) -> Option<i32> {
        let score = self.entries.get(fingerprint).copied();
        if score.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        score
    }

    /// Overwrites whatever was stored for `fingerprint`.
    pub fn put(&mut self, fingerprint: Fingerprint, score: i32) {
        self.entries.insert(fingerprint, score);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        log::trace!("clearing transposition cache ({} entries)", self.entries.len());
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

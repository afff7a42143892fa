//! Learned per-user costs.
//!
//! Committed conversions are recorded as `(reading, surface)` segments.
//! Unigram costs are `-log10(count / total)`, bigram costs are
//! `-log10(count(prev, next) / count(prev))`. Anything recorded here overrides
//! the system model, so a correction is effective on the next conversion.

use std::collections::HashMap;

use tracing::debug;

use crate::lm::{word_key, UserLanguageModel};
use crate::settings::settings;


#[derive(Clone, Default)]
pub struct UserHistory {
    /// `surface/reading` → count
    unigrams: HashMap<String, u32>,
    /// (prev key, next key) → count
    bigrams: HashMap<(String, String), u32>,
}

impl UserHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a confirmed conversion: list of (reading, surface) segments.
    pub fn record(&mut self, segments: &[(String, String)]) {
        let keys: Vec<String> = segments
            .iter()
            .map(|(reading, surface)| word_key(surface, reading))
            .collect();

        for key in &keys {
            *self.unigrams.entry(key.clone()).or_insert(0) += 1;
        }

        // Bigram: consecutive pairs
        for pair in keys.windows(2) {
            *self
                .bigrams
                .entry((pair[0].clone(), pair[1].clone()))
                .or_insert(0) += 1;
        }

        self.evict();
    }

    /// Returns (unigram_count, bigram_count).
    pub fn stats(&self) -> (usize, usize) {
        (self.unigrams.len(), self.bigrams.len())
    }

    pub fn is_empty(&self) -> bool {
        self.unigrams.is_empty()
    }

    fn total(&self) -> u64 {
        self.unigrams.values().map(|&c| u64::from(c)).sum()
    }

    /// Evict lowest-count entries when exceeding capacity.
    fn evict(&mut self) {
        let s = settings();
        let dropped = evict_map(&mut self.unigrams, s.history.max_unigrams)
            + evict_map(&mut self.bigrams, s.history.max_bigrams);
        if dropped > 0 {
            debug!(dropped, "evicted user history entries");
        }
    }
}

impl UserLanguageModel for UserHistory {
    fn unigram_cost(&self, key: &str) -> Option<f32> {
        let count = *self.unigrams.get(key)?;
        Some(neg_log10(u64::from(count), self.total()))
    }

    fn bigram_cost(&self, prev_key: &str, next_key: &str) -> Option<f32> {
        let pair = *self
            .bigrams
            .get(&(prev_key.to_string(), next_key.to_string()))?;
        let prev = self.unigrams.get(prev_key).copied().unwrap_or(pair);
        Some(neg_log10(u64::from(pair), u64::from(prev.max(pair))))
    }
}

fn neg_log10(count: u64, total: u64) -> f32 {
    -((count as f64) / (total.max(1) as f64)).log10() as f32
}

/// Drop the least frequent entries until `map` fits in `max`.
/// Ties are broken by key so eviction is deterministic.
fn evict_map<K: Clone + Ord + std::hash::Hash>(map: &mut HashMap<K, u32>, max: usize) -> usize {
    if map.len() <= max {
        return 0;
    }
    let mut all: Vec<(u32, K)> = map.iter().map(|(k, &c)| (c, k.clone())).collect();
    all.sort();
    let to_remove = map.len() - max;
    for (_, key) in all.into_iter().take(to_remove) {
        map.remove(&key);
    }
    to_remove
}

use std::collections::HashMap;

use tracing::debug;

use crate::settings::{settings, ModelSettings};

use super::{SystemLanguageModel, WordId};

/// Hash-map backed system model.
///
/// Loading a trained model is left to the embedder; this type holds costs
/// that were already decoded, and is what tests and benches convert with.
pub struct InMemorySystemModel {
    unigrams: HashMap<String, (WordId, f32)>,
    bigrams: HashMap<(WordId, WordId), f32>,
    defaults: ModelSettings,
}

impl InMemorySystemModel {
    pub fn builder() -> SystemModelBuilder {
        SystemModelBuilder::new()
    }

    /// Returns (unigram_count, bigram_count).
    pub fn stats(&self) -> (usize, usize) {
        (self.unigrams.len(), self.bigrams.len())
    }
}

impl SystemLanguageModel for InMemorySystemModel {
    fn find_unigram(&self, key: &str) -> Option<(WordId, f32)> {
        self.unigrams.get(key).copied()
    }

    fn find_bigram(&self, prev: WordId, next: WordId) -> f32 {
        self.bigrams.get(&(prev, next)).copied().unwrap_or(0.0)
    }

    fn default_cost(&self) -> f32 {
        self.defaults.default_cost
    }

    fn default_cost_for_short(&self) -> f32 {
        self.defaults.default_cost_for_short
    }

    fn default_score(&self) -> f32 {
        self.defaults.default_score
    }
}

/// Collects `surface/reading` keyed costs and assigns word ids in
/// insertion order.
pub struct SystemModelBuilder {
    unigrams: Vec<(String, f32)>,
    bigrams: Vec<(String, String, f32)>,
    defaults: ModelSettings,
}

impl Default for SystemModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemModelBuilder {
    /// Starts with the fallback costs from the global settings.
    pub fn new() -> Self {
        Self {
            unigrams: Vec::new(),
            bigrams: Vec::new(),
            defaults: settings().model.clone(),
        }
    }

    pub fn unigram(mut self, key: impl Into<String>, cost: f32) -> Self {
        self.unigrams.push((key.into(), cost));
        self
    }

    /// A bigram cost of exactly `0.0` is indistinguishable from "absent".
    pub fn bigram(
        mut self,
        prev_key: impl Into<String>,
        next_key: impl Into<String>,
        cost: f32,
    ) -> Self {
        self.bigrams.push((prev_key.into(), next_key.into(), cost));
        self
    }

    pub fn defaults(
        mut self,
        default_cost: f32,
        default_cost_for_short: f32,
        default_score: f32,
    ) -> Self {
        self.defaults = ModelSettings {
            default_cost,
            default_cost_for_short,
            default_score,
        };
        self
    }

    pub fn build(self) -> InMemorySystemModel {
        let mut unigrams: HashMap<String, (WordId, f32)> =
            HashMap::with_capacity(self.unigrams.len());
        for (key, cost) in self.unigrams {
            let next_id = WordId(unigrams.len() as u32);
            // A repeated key keeps its id and takes the latest cost.
            let slot = unigrams.entry(key).or_insert((next_id, cost));
            slot.1 = cost;
        }

        let mut bigrams = HashMap::with_capacity(self.bigrams.len());
        for (prev_key, next_key, cost) in self.bigrams {
            match (unigrams.get(&prev_key), unigrams.get(&next_key)) {
                (Some(&(prev, _)), Some(&(next, _))) => {
                    bigrams.insert((prev, next), cost);
                }
                _ => debug!(%prev_key, %next_key, "bigram without unigram, skipped"),
            }
        }

        InMemorySystemModel {
            unigrams,
            bigrams,
            defaults: self.defaults,
        }
    }
}

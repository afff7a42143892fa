#![cfg(test)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::dict::CompressedDictionary;
use crate::lm::{InMemorySystemModel, SystemLanguageModel, UserLanguageModel, WordId};

/// Shared test dictionary for converter tests.
///
/// Covers "わたしのなまえはなかのです。" with competing segmentations
/// (な/まえ vs なまえ, なか/の vs なかの) and a few unrelated words.
pub fn test_dict() -> CompressedDictionary {
    CompressedDictionary::build(vec![
        ("わたし", vec!["私", "渡し"]),
        ("わた", vec!["綿"]),
        ("の", vec!["の", "野"]),
        ("なまえ", vec!["名前"]),
        ("な", vec!["名", "菜"]),
        ("まえ", vec!["前"]),
        ("は", vec!["は", "葉"]),
        ("なか", vec!["中", "仲"]),
        ("なかの", vec!["中野"]),
        ("かの", vec!["彼の"]),
        ("です", vec!["です"]),
        ("で", vec!["出"]),
        ("す", vec!["酢"]),
        ("きょう", vec!["今日", "京"]),
    ])
    .unwrap()
}

/// System model trained toward "私の名前は中野です".
pub fn test_model() -> InMemorySystemModel {
    InMemorySystemModel::builder()
        .unigram("私/わたし", 2.5)
        .unigram("渡し/わたし", 4.0)
        .unigram("綿/わた", 5.0)
        .unigram("の/の", 1.0)
        .unigram("野/の", 4.5)
        .unigram("名前/なまえ", 3.0)
        .unigram("名/な", 4.0)
        .unigram("菜/な", 5.0)
        .unigram("前/まえ", 3.5)
        .unigram("は/は", 1.2)
        .unigram("葉/は", 4.8)
        .unigram("中/なか", 3.2)
        .unigram("仲/なか", 4.2)
        .unigram("中野/なかの", 3.8)
        .unigram("彼の/かの", 4.5)
        .unigram("です/です", 1.5)
        .unigram("出/で", 4.0)
        .unigram("酢/す", 5.0)
        .unigram("今日/きょう", 3.0)
        .unigram("京/きょう", 4.0)
        .bigram("私/わたし", "の/の", 0.8)
        .bigram("の/の", "名前/なまえ", 1.2)
        .bigram("名前/なまえ", "は/は", 0.7)
        .bigram("は/は", "中野/なかの", 2.0)
        .bigram("中野/なかの", "です/です", 1.0)
        .defaults(20.0, 19.0, 20.0)
        .build()
}

/// Wraps a system model and counts lookups.
pub struct CountingModel<M> {
    inner: M,
    unigram_calls: AtomicUsize,
    bigram_calls: AtomicUsize,
}

impl<M: SystemLanguageModel> CountingModel<M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            unigram_calls: AtomicUsize::new(0),
            bigram_calls: AtomicUsize::new(0),
        }
    }

    pub fn unigram_calls(&self) -> usize {
        self.unigram_calls.load(Ordering::Relaxed)
    }

    pub fn bigram_calls(&self) -> usize {
        self.bigram_calls.load(Ordering::Relaxed)
    }
}

impl<M: SystemLanguageModel> SystemLanguageModel for CountingModel<M> {
    fn find_unigram(&self, key: &str) -> Option<(WordId, f32)> {
        self.unigram_calls.fetch_add(1, Ordering::Relaxed);
        self.inner.find_unigram(key)
    }

    fn find_bigram(&self, prev: WordId, next: WordId) -> f32 {
        self.bigram_calls.fetch_add(1, Ordering::Relaxed);
        self.inner.find_bigram(prev, next)
    }

    fn default_cost(&self) -> f32 {
        self.inner.default_cost()
    }

    fn default_cost_for_short(&self) -> f32 {
        self.inner.default_cost_for_short()
    }

    fn default_score(&self) -> f32 {
        self.inner.default_score()
    }
}

/// User model backed by plain maps.
#[derive(Default)]
pub struct MapUserModel {
    unigrams: HashMap<String, f32>,
    bigrams: HashMap<(String, String), f32>,
}

impl MapUserModel {
    pub fn with_unigram(mut self, key: &str, cost: f32) -> Self {
        self.unigrams.insert(key.to_string(), cost);
        self
    }

    pub fn with_bigram(mut self, prev: &str, next: &str, cost: f32) -> Self {
        self.bigrams
            .insert((prev.to_string(), next.to_string()), cost);
        self
    }
}

impl UserLanguageModel for MapUserModel {
    fn unigram_cost(&self, key: &str) -> Option<f32> {
        self.unigrams.get(key).copied()
    }

    fn bigram_cost(&self, prev_key: &str, next_key: &str) -> Option<f32> {
        self.bigrams
            .get(&(prev_key.to_string(), next_key.to_string()))
            .copied()
    }
}

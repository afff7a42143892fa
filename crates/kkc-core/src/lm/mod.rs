//! Language-model ports.
//!
//! The conversion core never owns a model format: it asks a
//! `SystemLanguageModel` for trained costs and a `UserLanguageModel` for
//! per-user overrides. Costs are negative log probabilities (lower is better).

mod system;

pub use system::{InMemorySystemModel, SystemModelBuilder};

/// Identifier of a word in the system language model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WordId(pub u32);

/// Trained unigram/bigram costs. Shared read-only between conversions.
pub trait SystemLanguageModel: Send + Sync {
    /// Word id and unigram cost for a `surface/reading` key.
    fn find_unigram(&self, key: &str) -> Option<(WordId, f32)>;

    /// Transition cost between two words. `0.0` means the pair is absent.
    fn find_bigram(&self, prev: WordId, next: WordId) -> f32;

    /// Unigram cost for a candidate the model does not know.
    fn default_cost(&self) -> f32;

    /// Unigram cost for an unknown candidate whose surface is shorter than
    /// its reading.
    fn default_cost_for_short(&self) -> f32;

    /// Bigram cost when the pair is not modelled.
    fn default_score(&self) -> f32;
}

/// Per-user cost overrides. Any value returned here beats the system model.
pub trait UserLanguageModel: Send + Sync {
    fn unigram_cost(&self, key: &str) -> Option<f32>;
    fn bigram_cost(&self, prev_key: &str, next_key: &str) -> Option<f32>;
}

/// A user model that never overrides anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUserModel;

impl UserLanguageModel for NoUserModel {
    fn unigram_cost(&self, _key: &str) -> Option<f32> {
        None
    }

    fn bigram_cost(&self, _prev_key: &str, _next_key: &str) -> Option<f32> {
        None
    }
}

/// Language-model key of a candidate: `surface/reading`.
pub fn word_key(surface: &str, reading: &str) -> String {
    let mut key = String::with_capacity(surface.len() + 1 + reading.len());
    key.push_str(surface);
    key.push('/');
    key.push_str(reading);
    key
}

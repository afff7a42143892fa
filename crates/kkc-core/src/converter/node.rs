use std::borrow::Cow;
use std::collections::HashMap;

use crate::expr::{DynamicEvaluator, RenderError, Surface};
use crate::lm::{word_key, SystemLanguageModel, UserLanguageModel, WordId};

/// Index of a node in its lattice's arena.
pub type NodeIdx = usize;

/// Language-model key of the BOS sentinel.
pub const BOS_KEY: &str = "__BOS__";
/// Language-model key of the EOS sentinel.
pub const EOS_KEY: &str = "__EOS__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Bos,
    Eos,
    Word,
}

/// A rejected predecessor link. Reaching one means the search is broken,
/// so the conversion fails instead of producing a corrupt path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidLink {
    #[error("BOS cannot have a predecessor")]
    PredecessorOfBos,

    #[error("EOS cannot be a predecessor")]
    EosAsPredecessor,

    #[error("node starting at {start} cannot follow BOS")]
    NonInitialAfterBos { start: usize },

    #[error("node starting at {start} cannot follow a node with the same start")]
    SameStart { start: usize },

    #[error("predecessor [{prev_start}, {prev_end}) does not end where the node starts ({start})")]
    NotAdjacent {
        prev_start: usize,
        prev_end: usize,
        start: usize,
    },
}

/// A node in the conversion lattice.
///
/// Word nodes cover the char range `[start, end)` of the input. BOS is the
/// empty span before position 0 and EOS the empty span at the input length.
#[derive(Debug, Clone)]
pub struct LatticeNode {
    /// Start position (char index, inclusive)
    pub start: usize,
    /// End position (char index, exclusive)
    pub end: usize,
    /// Kana substring (reading)
    pub reading: String,
    /// Candidate text (kanji, etc.)
    pub surface: Surface,
    pub kind: NodeKind,
    key: String,
    word_id: Option<WordId>,
    unigram: Option<f32>,
    /// Minimum cumulative cost from BOS, set by the path search.
    pub(super) best_cost: f32,
    pub(super) predecessor: Option<NodeIdx>,
    /// successor key → transition cost
    bigram_cache: HashMap<String, f32>,
}

impl LatticeNode {
    pub fn new(
        start: usize,
        end: usize,
        reading: impl Into<String>,
        surface: impl Into<String>,
    ) -> Self {
        let reading = reading.into();
        let surface = Surface::new(surface);
        let key = word_key(surface.raw(), &reading);
        Self::with_key(start, end, reading, surface, NodeKind::Word, key)
    }

    pub fn bos() -> Self {
        let mut node = Self::with_key(
            0,
            0,
            String::new(),
            Surface::Literal(String::new()),
            NodeKind::Bos,
            BOS_KEY.to_string(),
        );
        node.best_cost = 0.0;
        node
    }

    pub fn eos(pos: usize) -> Self {
        Self::with_key(
            pos,
            pos,
            String::new(),
            Surface::Literal(String::new()),
            NodeKind::Eos,
            EOS_KEY.to_string(),
        )
    }

    fn with_key(
        start: usize,
        end: usize,
        reading: String,
        surface: Surface,
        kind: NodeKind,
        key: String,
    ) -> Self {
        Self {
            start,
            end,
            reading,
            surface,
            kind,
            key,
            word_id: None,
            unigram: None,
            best_cost: f32::INFINITY,
            predecessor: None,
            bigram_cache: HashMap::new(),
        }
    }

    /// Language-model key: `surface/reading`, or a fixed token for sentinels.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_bos(&self) -> bool {
        self.kind == NodeKind::Bos
    }

    pub fn is_eos(&self) -> bool {
        self.kind == NodeKind::Eos
    }

    /// System-model id, resolved by `unigram_cost`. `None` means unknown.
    pub fn word_id(&self) -> Option<WordId> {
        self.word_id
    }

    pub fn predecessor(&self) -> Option<NodeIdx> {
        self.predecessor
    }

    pub fn best_cost(&self) -> f32 {
        self.best_cost
    }

    /// Unigram cost, computed on first call and remembered afterwards.
    ///
    /// A user override wins outright. Otherwise the system model is asked;
    /// when it does not know the word, a surface shorter than its reading
    /// (a kanji spelling) gets the cheaper `default_cost_for_short`.
    pub fn unigram_cost(
        &mut self,
        user: &dyn UserLanguageModel,
        system: &dyn SystemLanguageModel,
    ) -> f32 {
        if let Some(cost) = self.unigram {
            return cost;
        }
        let cost = self.compute_unigram_cost(user, system);
        self.unigram = Some(cost);
        cost
    }

    /// Cached unigram cost, if `unigram_cost` has run.
    pub fn cached_unigram_cost(&self) -> Option<f32> {
        self.unigram
    }

    fn compute_unigram_cost(
        &mut self,
        user: &dyn UserLanguageModel,
        system: &dyn SystemLanguageModel,
    ) -> f32 {
        if let Some(cost) = user.unigram_cost(&self.key) {
            return cost;
        }
        if let Some((word_id, cost)) = system.find_unigram(&self.key) {
            self.word_id = Some(word_id);
            return cost;
        }
        if self.surface.raw().chars().count() < self.reading.chars().count() {
            system.default_cost_for_short()
        } else {
            system.default_cost()
        }
    }

    /// Transition cost from this node to `next`, memoised per successor key.
    ///
    /// `next.unigram_cost` must have run first so its word id is resolved.
    pub fn bigram_cost(
        &mut self,
        next: &LatticeNode,
        user: &dyn UserLanguageModel,
        system: &dyn SystemLanguageModel,
    ) -> f32 {
        if let Some(&cost) = self.bigram_cache.get(next.key()) {
            return cost;
        }
        let cost = self.compute_bigram_cost(next, user, system);
        self.bigram_cache.insert(next.key().to_string(), cost);
        cost
    }

    fn compute_bigram_cost(
        &self,
        next: &LatticeNode,
        user: &dyn UserLanguageModel,
        system: &dyn SystemLanguageModel,
    ) -> f32 {
        if let Some(cost) = user.bigram_cost(&self.key, next.key()) {
            return cost;
        }
        let (Some(prev_id), Some(next_id)) = (self.word_id, next.word_id) else {
            return system.default_score();
        };
        let cost = system.find_bigram(prev_id, next_id);
        // 0.0 is how the model says "no such pair".
        if cost != 0.0 {
            cost
        } else {
            system.default_score()
        }
    }

    /// Check that `prev` may be this node's predecessor.
    pub fn check_link(&self, prev: &LatticeNode) -> Result<(), InvalidLink> {
        if self.is_bos() {
            return Err(InvalidLink::PredecessorOfBos);
        }
        if prev.is_eos() {
            return Err(InvalidLink::EosAsPredecessor);
        }
        if prev.is_bos() {
            return if self.start == 0 {
                Ok(())
            } else {
                Err(InvalidLink::NonInitialAfterBos { start: self.start })
            };
        }
        if prev.start == self.start {
            return Err(InvalidLink::SameStart { start: self.start });
        }
        if prev.start > self.start || prev.end != self.start {
            return Err(InvalidLink::NotAdjacent {
                prev_start: prev.start,
                prev_end: prev.end,
                start: self.start,
            });
        }
        Ok(())
    }

    /// Display text, evaluating expression candidates.
    pub fn render_surface(
        &self,
        evaluator: &dyn DynamicEvaluator,
    ) -> Result<Cow<'_, str>, RenderError> {
        self.surface.render(evaluator)
    }
}

impl PartialEq for LatticeNode {
    /// Nodes are the same candidate when span, reading and surface agree.
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.start == other.start
            && self.end == other.end
            && self.reading == other.reading
            && self.surface == other.surface
    }
}

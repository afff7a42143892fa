use std::path::Path;
use std::sync::{Arc, RwLock};

use kkc_core::converter::{convert, Candidate, ConvertOptions, Segment};
use kkc_core::dict::{CompressedDictionary, Dictionary};
use kkc_core::expr::{DynamicEvaluator, NoEvaluator};
use kkc_core::lm::SystemLanguageModel;
use kkc_core::user_history::UserHistory;
use tracing::{debug, info};

use crate::EngineError;

/// Conversion entry point shared by all input sessions.
///
/// Dictionary, system model and evaluator are read-only and shared through
/// `Arc`. The learned history is read by every conversion and written by
/// `learn`. Cloning an engine shares all of it.
#[derive(Clone)]
pub struct Engine {
    dict: Arc<dyn Dictionary>,
    model: Arc<dyn SystemLanguageModel>,
    history: Arc<RwLock<UserHistory>>,
    evaluator: Arc<dyn DynamicEvaluator>,
}

impl Engine {
    pub fn new(dict: Arc<dyn Dictionary>, model: Arc<dyn SystemLanguageModel>) -> Self {
        Self {
            dict,
            model,
            history: Arc::new(RwLock::new(UserHistory::new())),
            evaluator: Arc::new(NoEvaluator),
        }
    }

    /// Load a compressed dictionary blob and build an engine over it.
    pub fn open(
        dict_path: &Path,
        model: Arc<dyn SystemLanguageModel>,
    ) -> Result<Self, EngineError> {
        let dict = CompressedDictionary::load(dict_path)?;
        Ok(Self::new(Arc::new(dict), model))
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn DynamicEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_history(mut self, history: UserHistory) -> Self {
        self.history = Arc::new(RwLock::new(history));
        self
    }

    pub fn convert(
        &self,
        kana: &str,
        options: &ConvertOptions,
    ) -> Result<Vec<Segment>, EngineError> {
        let history = self.history.read().map_err(|e| EngineError::Internal {
            msg: e.to_string(),
        })?;
        let segments = convert(
            self.dict.as_ref(),
            &*history,
            self.model.as_ref(),
            kana,
            options,
        )?;
        debug!(segments = segments.len(), "converted");
        Ok(segments)
    }

    /// Best conversion as display text.
    pub fn convert_to_string(&self, kana: &str) -> Result<String, EngineError> {
        let segments = self.convert(kana, &ConvertOptions::default())?;
        Ok(segments.iter().map(|s| self.render(s.best())).collect())
    }

    /// Display text of a candidate. A failing expression shows its raw text.
    pub fn render(&self, candidate: &Candidate) -> String {
        candidate
            .surface
            .render_or_raw(self.evaluator.as_ref())
            .into_owned()
    }

    /// Record the segments the user committed, as `(reading, surface)`.
    pub fn learn(&self, segments: &[(String, String)]) -> Result<(), EngineError> {
        let mut history = self.history.write().map_err(|e| EngineError::Internal {
            msg: e.to_string(),
        })?;
        history.record(segments);
        let (unigrams, bigrams) = history.stats();
        info!(unigrams, bigrams, "learned");
        Ok(())
    }

    /// Returns (unigram_count, bigram_count) of the learned history.
    pub fn history_stats(&self) -> Result<(usize, usize), EngineError> {
        let history = self.history.read().map_err(|e| EngineError::Internal {
            msg: e.to_string(),
        })?;
        Ok(history.stats())
    }
}

use std::sync::Arc;

use super::{extend_unique, Dictionary};

/// A dictionary that merges results from multiple layers.
///
/// Layers are searched in order and earlier layers have higher priority:
/// their candidates come first. Duplicate surfaces are dropped.
pub struct CompositeDictionary {
    layers: Vec<Arc<dyn Dictionary>>,
}

impl CompositeDictionary {
    pub fn new(layers: Vec<Arc<dyn Dictionary>>) -> Self {
        Self { layers }
    }
}

impl Dictionary for CompositeDictionary {
    fn find_candidates(&self, reading: &str) -> Vec<String> {
        let mut out = Vec::new();
        for layer in &self.layers {
            extend_unique(&mut out, layer.find_candidates(reading));
        }
        out
    }

    fn prefixes_of(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        for layer in &self.layers {
            extend_unique(&mut out, layer.prefixes_of(text));
        }
        // All prefixes of the same string: byte length orders them.
        out.sort_by_key(|p| p.len());
        out
    }
}

//! Kana-to-kanji conversion via lattice construction and Viterbi search.
//!
//! Builds a character-level lattice from dictionary lookups, scores it with
//! the system and user language models, and returns the best segmentation
//! with a ranked candidate list per segment.

mod lattice;
mod node;
pub(crate) mod testutil;
mod viterbi;

#[cfg(test)]
mod tests;

use std::ops::Range;

use crate::dict::Dictionary;
use crate::lm::{SystemLanguageModel, UserLanguageModel};
use crate::settings::settings;

pub use lattice::{build_lattice, build_lattice_with_clauses, Lattice};
pub use node::{InvalidLink, LatticeNode, NodeIdx, NodeKind, BOS_KEY, EOS_KEY};
pub use viterbi::{Candidate, Segment};

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("invalid lattice link: {0}")]
    InvalidLink(#[from] InvalidLink),

    #[error("invalid clauses: {0}")]
    InvalidClauses(String),
}

/// Per-call conversion hints.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Fixed segmentation as char ranges tiling the input. The search then
    /// only picks a candidate for each clause.
    pub clauses: Option<Vec<Range<usize>>>,
}

/// Convert a kana string to its best segmentation.
///
/// Each returned segment lists its candidates best first; the first one is
/// on the minimum-cost path. Candidate list shape follows
/// `settings().candidates`.
pub fn convert(
    dict: &dyn Dictionary,
    user: &dyn UserLanguageModel,
    system: &dyn SystemLanguageModel,
    kana: &str,
    options: &ConvertOptions,
) -> Result<Vec<Segment>, ConvertError> {
    if kana.is_empty() {
        return Ok(Vec::new());
    }
    let mut lattice = match &options.clauses {
        Some(clauses) => build_lattice_with_clauses(dict, kana, clauses)?,
        None => build_lattice(dict, kana),
    };
    viterbi::forward(&mut lattice, user, system)?;
    Ok(viterbi::segments(
        &mut lattice,
        user,
        system,
        &settings().candidates,
    ))
}

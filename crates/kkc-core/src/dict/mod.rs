//! Reading → candidate dictionaries.
//!
//! `CompressedDictionary` stores every entry as a single trie key of the form
//! `reading ‖ 0xFF ‖ cand1/cand2/...`. Because `0xFF` never occurs in UTF-8,
//! a predictive search on `reading ‖ 0xFF` finds exactly the entry for that
//! reading, and a predictive search on `prefix ‖ 0xFF` at every code-point
//! boundary enumerates all readings that prefix a string.

mod composite;
mod compressed;
mod compressed_io;
#[cfg(test)]
mod tests;

pub use composite::CompositeDictionary;
pub use compressed::CompressedDictionary;

use std::io;

/// Byte separating the reading from its candidate payload inside a trie key.
pub const SEPARATOR: u8 = 0xFF;

/// Delimiter between candidates in the payload.
pub const CANDIDATE_DELIMITER: char = '/';

/// Errors raised while building a dictionary from entries.
///
/// A failed build produces no dictionary at all.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no entries to build from")]
    Empty,

    #[error("reading {reading:?} contains the separator byte 0xFF")]
    SeparatorInReading { reading: Vec<u8> },

    #[error("empty reading")]
    EmptyReading,

    #[error("reading {reading:?} is not valid UTF-8")]
    InvalidReading { reading: Vec<u8> },

    #[error("candidate {candidate:?} for {reading:?} contains '/'")]
    SlashInCandidate { reading: String, candidate: String },

    #[error("reading {reading:?} has no candidates")]
    NoCandidates { reading: String },
}

/// Error type for dictionary binary I/O (load, save, decode).
#[derive(Debug, thiserror::Error)]
pub enum DictError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid header (too short)")]
    InvalidHeader,

    #[error("invalid magic bytes (expected KKDX)")]
    InvalidMagic,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("checksum mismatch (expected {expected:08x}, found {found:08x})")]
    ChecksumMismatch { expected: u32, found: u32 },

    #[error("trie data exceeds u32::MAX")]
    TooLarge,

    #[error("corrupt trie data: {0}")]
    Trie(String),
}

impl From<lexime_trie::TrieError> for DictError {
    fn from(e: lexime_trie::TrieError) -> Self {
        match e {
            lexime_trie::TrieError::InvalidMagic => DictError::Trie("invalid magic".into()),
            lexime_trie::TrieError::InvalidVersion => DictError::Trie("invalid version".into()),
            lexime_trie::TrieError::TruncatedData => DictError::Trie("truncated".into()),
        }
    }
}

/// Read-only dictionary interface used by the lattice builder.
///
/// Implementations are shared between concurrent conversions, so lookups
/// must not mutate.
pub trait Dictionary: Send + Sync {
    /// Candidates for an exact reading, in priority order. Empty when absent.
    fn find_candidates(&self, reading: &str) -> Vec<String>;

    /// Every dictionary reading that is a prefix of `text`, each exactly once.
    fn prefixes_of(&self, text: &str) -> Vec<String>;
}

/// Split a candidate payload on `/`, dropping empty fragments.
pub(crate) fn split_candidates(payload: &str) -> impl Iterator<Item = &str> {
    payload
        .split(CANDIDATE_DELIMITER)
        .filter(|fragment| !fragment.is_empty())
}

/// Append `items` to `out`, skipping values already present.
pub(crate) fn extend_unique(out: &mut Vec<String>, items: impl IntoIterator<Item = String>) {
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
}

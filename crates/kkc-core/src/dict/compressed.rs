use std::collections::HashMap;

use lexime_trie::DoubleArray;
use tracing::debug;

use super::{extend_unique, split_candidates, BuildError, Dictionary, SEPARATOR};

/// Double-array trie over `reading ‖ 0xFF ‖ candidates` keys.
///
/// Each reading owns exactly one key; the candidate payload is stored in the
/// key itself, so no side table is needed.
#[derive(Debug)]
pub struct CompressedDictionary {
    pub(super) trie: DoubleArray<u8>,
    pub(super) num_keys: usize,
}

impl CompressedDictionary {
    /// Build from `(reading, candidates)` pairs.
    ///
    /// Readings are taken as raw bytes so that malformed input (a stray
    /// `0xFF`, invalid UTF-8) is rejected instead of corrupting lookups.
    /// Repeated readings are merged: their candidate lists are concatenated
    /// in input order and duplicate surfaces dropped.
    pub fn build<R, C, S>(entries: impl IntoIterator<Item = (R, C)>) -> Result<Self, BuildError>
    where
        R: AsRef<[u8]>,
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut merged: Vec<(String, Vec<String>)> = Vec::new();
        let mut slot_of: HashMap<String, usize> = HashMap::new();

        for (raw_reading, candidates) in entries {
            let reading = validate_reading(raw_reading.as_ref())?;

            let mut surfaces = Vec::new();
            for candidate in candidates {
                let candidate = candidate.as_ref();
                if candidate.contains(super::CANDIDATE_DELIMITER) {
                    return Err(BuildError::SlashInCandidate {
                        reading,
                        candidate: candidate.to_string(),
                    });
                }
                if !candidate.is_empty() {
                    surfaces.push(candidate.to_string());
                }
            }

            let slot = *slot_of.entry(reading.clone()).or_insert_with(|| {
                merged.push((reading, Vec::new()));
                merged.len() - 1
            });
            extend_unique(&mut merged[slot].1, surfaces);
        }

        if merged.is_empty() {
            return Err(BuildError::Empty);
        }
        if let Some((reading, _)) = merged.iter().find(|(_, c)| c.is_empty()) {
            return Err(BuildError::NoCandidates {
                reading: reading.clone(),
            });
        }

        let mut keys: Vec<Vec<u8>> = merged
            .iter()
            .map(|(reading, candidates)| encode_key(reading, candidates))
            .collect();
        keys.sort();

        let key_refs: Vec<&[u8]> = keys.iter().map(|k| k.as_slice()).collect();
        let trie = DoubleArray::<u8>::build(&key_refs);
        debug!(num_keys = keys.len(), "built dictionary");

        Ok(Self {
            trie,
            num_keys: keys.len(),
        })
    }

    /// Number of distinct keys (readings) in the trie.
    pub fn len(&self) -> usize {
        self.num_keys
    }

    pub fn is_empty(&self) -> bool {
        self.num_keys == 0
    }

    /// Iterate over all `(reading, candidates)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (String, Vec<String>)> + '_ {
        self.trie.predictive_search(b"").filter_map(|m| {
            let sep = m.key.iter().position(|&b| b == SEPARATOR)?;
            let reading = String::from_utf8_lossy(&m.key[..sep]).into_owned();
            let payload = String::from_utf8_lossy(&m.key[sep + 1..]);
            let candidates = split_candidates(&payload).map(str::to_string).collect();
            Some((reading, candidates))
        })
    }

    /// Raw keys, used when verifying a loaded blob.
    pub(super) fn raw_key_count(&self) -> usize {
        self.trie.predictive_search(b"").count()
    }
}

impl Dictionary for CompressedDictionary {
    fn find_candidates(&self, reading: &str) -> Vec<String> {
        let query = separated(reading);
        let mut out = Vec::new();
        // `build` guarantees a single key per reading; blobs from elsewhere
        // may carry several, which are merged in trie order.
        for m in self.trie.predictive_search(&query) {
            let payload = String::from_utf8_lossy(&m.key[query.len()..]);
            extend_unique(
                &mut out,
                split_candidates(&payload).map(str::to_string),
            );
        }
        out
    }

    fn prefixes_of(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        for (offset, ch) in text.char_indices() {
            let end = offset + ch.len_utf8();
            let prefix = &text[..end];
            let query = separated(prefix);
            // Every hit shares the bytes before the separator, which are the
            // prefix itself, so one hit is enough.
            if self.trie.predictive_search(&query).next().is_some() {
                out.push(prefix.to_string());
            }
        }
        out
    }
}

fn validate_reading(raw: &[u8]) -> Result<String, BuildError> {
    if raw.is_empty() {
        return Err(BuildError::EmptyReading);
    }
    if raw.contains(&SEPARATOR) {
        return Err(BuildError::SeparatorInReading {
            reading: raw.to_vec(),
        });
    }
    String::from_utf8(raw.to_vec()).map_err(|_| BuildError::InvalidReading {
        reading: raw.to_vec(),
    })
}

fn separated(reading: &str) -> Vec<u8> {
    let mut query = Vec::with_capacity(reading.len() + 1);
    query.extend_from_slice(reading.as_bytes());
    query.push(SEPARATOR);
    query
}

fn encode_key(reading: &str, candidates: &[String]) -> Vec<u8> {
    let mut key = separated(reading);
    key.extend_from_slice(candidates.join("/").as_bytes());
    key
}

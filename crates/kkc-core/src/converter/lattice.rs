use std::ops::Range;

use tracing::{debug, debug_span};

use crate::dict::Dictionary;
use crate::kana::{has_hiragana, to_katakana};
use crate::settings::settings;

use super::node::{InvalidLink, LatticeNode, NodeIdx};
use super::ConvertError;

/// The lattice: all candidate spans of an input string.
///
/// Nodes live in one arena. BOS is always slot 0 and EOS the last slot;
/// word nodes are pushed in ascending start order, so a node's valid
/// predecessors always have smaller indices.
pub struct Lattice {
    /// The kana input
    pub input: String,
    /// All nodes in the lattice
    pub nodes: Vec<LatticeNode>,
    /// nodes_by_start[i] = indices of nodes that start at position i (EOS at char_count)
    pub nodes_by_start: Vec<Vec<NodeIdx>>,
    /// nodes_by_end[i] = indices of nodes that end at position i (BOS at 0)
    pub nodes_by_end: Vec<Vec<NodeIdx>>,
    /// Number of characters in input
    pub char_count: usize,
    /// Whether every span also gets its katakana spelling
    katakana: bool,
}

impl Lattice {
    pub const BOS: NodeIdx = 0;

    fn new(input: &str, katakana: bool) -> Self {
        let char_count = input.chars().count();
        let mut nodes_by_end = vec![Vec::new(); char_count + 1];
        nodes_by_end[0].push(Self::BOS);
        Self {
            input: input.to_string(),
            nodes: vec![LatticeNode::bos()],
            nodes_by_start: vec![Vec::new(); char_count + 1],
            nodes_by_end,
            char_count,
            katakana,
        }
    }

    pub fn eos(&self) -> NodeIdx {
        self.nodes.len() - 1
    }

    fn push(&mut self, node: LatticeNode) -> NodeIdx {
        let idx = self.nodes.len();
        self.nodes_by_start[node.start].push(idx);
        if !node.is_eos() {
            self.nodes_by_end[node.end].push(idx);
        }
        self.nodes.push(node);
        idx
    }

    /// Push one node per candidate, then the reading itself and its
    /// katakana spelling. A surface already present in the span is skipped.
    fn push_span(&mut self, start: usize, reading: &str, candidates: Vec<String>) {
        let end = start + reading.chars().count();
        let mut surfaces = candidates;
        surfaces.push(reading.to_string());
        if self.katakana && has_hiragana(reading) {
            surfaces.push(to_katakana(reading));
        }

        let mut seen: Vec<&str> = Vec::with_capacity(surfaces.len());
        for surface in &surfaces {
            if seen.contains(&surface.as_str()) {
                continue;
            }
            seen.push(surface);
            self.push(LatticeNode::new(start, end, reading, surface.as_str()));
        }
    }

    fn finish(mut self) -> Self {
        let eos = LatticeNode::eos(self.char_count);
        self.push(eos);
        debug!(node_count = self.nodes.len());
        self
    }

    /// Link `idx` to its predecessor `prev`, rejecting links that would
    /// break the DAG.
    pub fn set_predecessor(&mut self, idx: NodeIdx, prev: NodeIdx) -> Result<(), InvalidLink> {
        link(&mut self.nodes, idx, prev)
    }

    /// Node indices on the path ending at EOS, BOS and EOS excluded.
    /// Empty when EOS has no predecessor.
    pub fn best_path(&self) -> Vec<NodeIdx> {
        let mut path = Vec::new();
        let mut cur = self.nodes[self.eos()].predecessor();
        while let Some(idx) = cur {
            if idx == Self::BOS {
                break;
            }
            path.push(idx);
            cur = self.nodes[idx].predecessor();
        }
        path.reverse();
        path
    }
}

/// Checked predecessor assignment on the arena.
pub(super) fn link(
    nodes: &mut [LatticeNode],
    idx: NodeIdx,
    prev: NodeIdx,
) -> Result<(), InvalidLink> {
    nodes[idx].check_link(&nodes[prev])?;
    nodes[idx].predecessor = Some(prev);
    Ok(())
}

/// Build a lattice from a kana string using dictionary lookups.
///
/// Every reading the dictionary knows at each start position becomes a span
/// holding its candidates, the reading itself and, when enabled in settings,
/// its katakana spelling. Positions without a 1-char dictionary reading get a
/// 1-char span of the same shape, which guarantees a BOS → EOS path even for
/// unknown input.
pub fn build_lattice(dict: &dyn Dictionary, kana: &str) -> Lattice {
    build(dict, kana, settings().candidates.katakana)
}

pub(crate) fn build(dict: &dyn Dictionary, kana: &str, katakana: bool) -> Lattice {
    let mut lattice = Lattice::new(kana, katakana);
    let _span = debug_span!("build_lattice", char_count = lattice.char_count).entered();

    for (start, (offset, ch)) in kana.char_indices().enumerate() {
        let suffix = &kana[offset..];
        let single = &suffix[..ch.len_utf8()];
        let mut has_single_char_span = false;

        for reading in dict.prefixes_of(suffix) {
            has_single_char_span |= reading == single;
            let candidates = dict.find_candidates(&reading);
            lattice.push_span(start, &reading, candidates);
        }

        if !has_single_char_span {
            lattice.push_span(start, single, Vec::new());
        }
    }

    lattice.finish()
}

/// Build a lattice whose segmentation is fixed by `clauses`.
///
/// Clauses are char ranges that must tile the input exactly. Each clause is
/// one span, shaped like a dictionary span of `build_lattice`.
pub fn build_lattice_with_clauses(
    dict: &dyn Dictionary,
    kana: &str,
    clauses: &[Range<usize>],
) -> Result<Lattice, ConvertError> {
    let mut lattice = Lattice::new(kana, settings().candidates.katakana);
    let _span = debug_span!("build_lattice_with_clauses", clauses = clauses.len()).entered();
    validate_clauses(clauses, lattice.char_count)?;

    let byte_offsets: Vec<usize> = kana
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(kana.len()))
        .collect();

    for clause in clauses {
        let reading = &kana[byte_offsets[clause.start]..byte_offsets[clause.end]];
        let candidates = dict.find_candidates(reading);
        lattice.push_span(clause.start, reading, candidates);
    }

    Ok(lattice.finish())
}

fn validate_clauses(clauses: &[Range<usize>], char_count: usize) -> Result<(), ConvertError> {
    let mut expected_start = 0;
    for clause in clauses {
        if clause.start != expected_start {
            return Err(ConvertError::InvalidClauses(format!(
                "clause {clause:?} should start at {expected_start}"
            )));
        }
        if clause.end <= clause.start || clause.end > char_count {
            return Err(ConvertError::InvalidClauses(format!(
                "clause {clause:?} is empty or exceeds input length {char_count}"
            )));
        }
        expected_start = clause.end;
    }
    if expected_start != char_count {
        return Err(ConvertError::InvalidClauses(format!(
            "clauses cover {expected_start} of {char_count} chars"
        )));
    }
    Ok(())
}

use tracing::{debug, debug_span};

use crate::expr::Surface;
use crate::lm::{SystemLanguageModel, UserLanguageModel};
use crate::settings::CandidateSettings;

use super::lattice::{link, Lattice};
use super::node::{LatticeNode, NodeIdx};
use super::ConvertError;

/// One ranked choice for a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub reading: String,
    pub surface: Surface,
    /// Unigram cost of the candidate (lower is better)
    pub cost: f32,
}

/// A segment of the best path with its candidate list, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// The kana reading of this segment
    pub reading: String,
    /// Char range of the segment in the input
    pub start: usize,
    pub end: usize,
    /// The first entry is the one the search chose
    pub candidates: Vec<Candidate>,
}

impl Segment {
    pub fn best(&self) -> &Candidate {
        &self.candidates[0]
    }
}

/// Forward pass: fill `best_cost` and `predecessor` for every node.
///
/// For a node `m` starting at `p` the cost through `n` (ending at `p`) is
/// `best(n) + m.unigram + n.bigram(m)`. Only a strictly lower cost replaces
/// the current predecessor, so among equal paths the first one seen stays.
pub(crate) fn forward(
    lattice: &mut Lattice,
    user: &dyn UserLanguageModel,
    system: &dyn SystemLanguageModel,
) -> Result<(), ConvertError> {
    let Lattice {
        nodes,
        nodes_by_start,
        nodes_by_end,
        char_count,
        ..
    } = lattice;
    let _span = debug_span!("viterbi", char_count = *char_count).entered();

    // Resolves the BOS word id for models that carry sentinel entries.
    nodes[Lattice::BOS].unigram_cost(user, system);

    for pos in 0..=*char_count {
        for &next_idx in &nodes_by_start[pos] {
            let word = nodes[next_idx].unigram_cost(user, system);

            for &prev_idx in &nodes_by_end[pos] {
                // Predecessors always sit earlier in the arena.
                let (before, rest) = nodes.split_at_mut(next_idx);
                let prev = &mut before[prev_idx];
                if prev.best_cost.is_infinite() {
                    continue;
                }
                let next = &rest[0];
                let total = prev.best_cost + word + prev.bigram_cost(next, user, system);

                if total < rest[0].best_cost {
                    let linked = link(nodes, next_idx, prev_idx);
                    debug_assert!(linked.is_ok(), "{linked:?}");
                    linked?;
                    nodes[next_idx].best_cost = total;
                }
            }
        }
    }

    let eos = &nodes[nodes.len() - 1];
    debug!(best_cost = eos.best_cost, node_count = nodes.len());
    Ok(())
}

/// Turn the best path into segments with ranked candidate lists.
///
/// The chosen node comes first. Every other node with the same span follows
/// in ascending unigram cost, ties keeping lattice order.
pub(crate) fn segments(
    lattice: &mut Lattice,
    user: &dyn UserLanguageModel,
    system: &dyn SystemLanguageModel,
    opts: &CandidateSettings,
) -> Vec<Segment> {
    let path = lattice.best_path();
    let mut out = Vec::with_capacity(path.len());

    for chosen in path {
        let (start, end) = (lattice.nodes[chosen].start, lattice.nodes[chosen].end);
        let reading = lattice.nodes[chosen].reading.clone();

        let same_span: Vec<NodeIdx> = lattice.nodes_by_start[start]
            .iter()
            .copied()
            .filter(|&i| i != chosen && lattice.nodes[i].end == end)
            .collect();
        let mut alternatives: Vec<(NodeIdx, f32)> = same_span
            .into_iter()
            .map(|i| (i, lattice.nodes[i].unigram_cost(user, system)))
            .collect();
        alternatives.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut candidates = Vec::with_capacity(alternatives.len() + 1);
        let chosen_cost = lattice.nodes[chosen].unigram_cost(user, system);
        candidates.push(candidate(&lattice.nodes[chosen], chosen_cost));
        for (idx, cost) in alternatives {
            candidates.push(candidate(&lattice.nodes[idx], cost));
        }

        if opts.max_per_segment > 0 {
            candidates.truncate(opts.max_per_segment);
        }

        out.push(Segment {
            reading,
            start,
            end,
            candidates,
        });
    }

    out
}

fn candidate(node: &LatticeNode, cost: f32) -> Candidate {
    Candidate {
        reading: node.reading.clone(),
        surface: node.surface.clone(),
        cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::lattice::{build, build_lattice};
    use crate::converter::testutil::{test_dict, test_model};
    use crate::dict::CompressedDictionary;
    use crate::lm::{InMemorySystemModel, NoUserModel};

    fn all_candidates() -> CandidateSettings {
        CandidateSettings {
            max_per_segment: 0,
            katakana: true,
        }
    }

    fn surfaces(segment: &Segment) -> Vec<&str> {
        segment.candidates.iter().map(|c| c.surface.raw()).collect()
    }

    #[test]
    fn test_forward_links_every_reachable_node() {
        let dict = test_dict();
        let model = test_model();
        let mut lattice = build_lattice(&dict, "わたしのなまえ");
        forward(&mut lattice, &NoUserModel, &model).unwrap();

        for (idx, node) in lattice.nodes.iter().enumerate() {
            if node.is_bos() {
                assert_eq!(node.best_cost(), 0.0);
                assert!(node.predecessor().is_none());
                continue;
            }
            let prev = node.predecessor().expect("every node is reachable");
            assert!(prev < idx);
            assert_eq!(node.check_link(&lattice.nodes[prev]), Ok(()));
            assert!(node.best_cost().is_finite());
        }
    }

    #[test]
    fn test_best_cost_is_minimal() {
        let dict = test_dict();
        let model = test_model();
        let mut lattice = build_lattice(&dict, "わたしの");
        forward(&mut lattice, &NoUserModel, &model).unwrap();

        // EOS cost is the minimum over all nodes that end at the input end.
        let eos = lattice.eos();
        let best = lattice.nodes[eos].best_cost();
        let pred = lattice.nodes[eos].predecessor().unwrap();
        assert_eq!(lattice.nodes[pred].surface.raw(), "の");
        let first = lattice.nodes[pred].predecessor().unwrap();
        assert_eq!(lattice.nodes[first].surface.raw(), "私");
        for &idx in &lattice.nodes_by_end[4] {
            assert!(lattice.nodes[idx].best_cost() <= best);
        }
    }

    #[test]
    fn test_tie_keeps_first_seen() {
        let dict = CompressedDictionary::build(vec![("か", vec!["火", "化"])]).unwrap();
        // Both candidates unknown to the model: identical costs everywhere.
        let model = InMemorySystemModel::builder().defaults(20.0, 19.0, 20.0).build();
        let mut lattice = build_lattice(&dict, "か");
        forward(&mut lattice, &NoUserModel, &model).unwrap();
        let segs = segments(&mut lattice, &NoUserModel, &model, &all_candidates());
        assert_eq!(segs.len(), 1);
        assert_eq!(surfaces(&segs[0]), vec!["火", "化", "か", "カ"]);
    }

    #[test]
    fn test_candidate_list_order() {
        let dict = test_dict();
        let model = test_model();
        let mut lattice = build_lattice(&dict, "なかのです");
        forward(&mut lattice, &NoUserModel, &model).unwrap();
        let segs = segments(&mut lattice, &NoUserModel, &model, &all_candidates());

        let readings: Vec<&str> = segs.iter().map(|s| s.reading.as_str()).collect();
        assert_eq!(readings, vec!["なかの", "です"]);
        assert_eq!(surfaces(&segs[0]), vec!["中野", "なかの", "ナカノ"]);
        assert_eq!(surfaces(&segs[1]), vec!["です", "デス"]);
        assert_eq!((segs[1].start, segs[1].end), (3, 5));
    }

    #[test]
    fn test_alternatives_sorted_by_unigram() {
        let dict = test_dict();
        let model = test_model();
        let mut lattice = build_lattice(&dict, "わたし");
        forward(&mut lattice, &NoUserModel, &model).unwrap();
        let segs = segments(&mut lattice, &NoUserModel, &model, &all_candidates());
        assert_eq!(segs.len(), 1);
        let seg = &segs[0];
        assert_eq!(surfaces(seg), vec!["私", "渡し", "わたし", "ワタシ"]);
        let costs: Vec<f32> = seg.candidates[1..].iter().map(|c| c.cost).collect();
        assert!(costs.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seg.best().cost, 2.5);
    }

    #[test]
    fn test_katakana_disabled_and_truncation() {
        let dict = test_dict();
        let model = test_model();
        let opts = CandidateSettings {
            max_per_segment: 0,
            katakana: false,
        };
        let mut lattice = build(&dict, "わたし", false);
        forward(&mut lattice, &NoUserModel, &model).unwrap();
        let segs = segments(&mut lattice, &NoUserModel, &model, &opts);
        assert_eq!(surfaces(&segs[0]), vec!["私", "渡し", "わたし"]);

        let opts = CandidateSettings {
            max_per_segment: 2,
            ..opts
        };
        let mut lattice = build_lattice(&dict, "わたし");
        forward(&mut lattice, &NoUserModel, &model).unwrap();
        let segs = segments(&mut lattice, &NoUserModel, &model, &opts);
        assert_eq!(surfaces(&segs[0]), vec!["私", "渡し"]);
    }

    #[test]
    fn test_katakana_wins_when_preferred() {
        let dict = test_dict();
        let model = InMemorySystemModel::builder()
            .unigram("今日/きょう", 3.0)
            .unigram("キョウ/きょう", 1.0)
            .defaults(20.0, 19.0, 20.0)
            .build();
        let mut lattice = build_lattice(&dict, "きょう");
        forward(&mut lattice, &NoUserModel, &model).unwrap();
        let segs = segments(&mut lattice, &NoUserModel, &model, &all_candidates());
        assert_eq!(surfaces(&segs[0]), vec!["キョウ", "今日", "京", "きょう"]);
    }

    #[test]
    fn test_no_katakana_for_non_kana() {
        let dict = test_dict();
        let model = test_model();
        let mut lattice = build_lattice(&dict, "。");
        forward(&mut lattice, &NoUserModel, &model).unwrap();
        let segs = segments(&mut lattice, &NoUserModel, &model, &all_candidates());
        assert_eq!(surfaces(&segs[0]), vec!["。"]);
    }

    #[test]
    fn test_bigram_changes_choice() {
        let dict = CompressedDictionary::build(vec![
            ("き", vec!["木", "気"]),
            ("が", vec!["が"]),
        ])
        .unwrap();
        let model = InMemorySystemModel::builder()
            .unigram("木/き", 3.0)
            .unigram("気/き", 3.5)
            .unigram("が/が", 1.0)
            .bigram("気/き", "が/が", 0.1)
            .defaults(20.0, 19.0, 20.0)
            .build();
        let mut lattice = build_lattice(&dict, "きが");
        forward(&mut lattice, &NoUserModel, &model).unwrap();
        let segs = segments(&mut lattice, &NoUserModel, &model, &all_candidates());
        // 気 wins through the bigram even though 木 has the lower unigram.
        assert_eq!(segs[0].best().surface.raw(), "気");
        assert_eq!(surfaces(&segs[0])[1], "木");
    }
}

//! Clustering of addresses into coordinated voting blocks.

pub mod patterns;
pub mod power;

use crate::similarity::SimilarityMatrix;
use rust_decimal::Decimal;
use std::collections::BTreeSet;

/// A set of addresses mutually connected (directly or transitively) through
/// similarity edges at or above a threshold. Always has at least 2 members.
pub type VotingBlock = BTreeSet<String>;

struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            let root = self.find(self.parent[x]);
            self.parent[x] = root;
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

/// Extracts the connected components of the threshold graph over the matrix.
///
/// An edge connects two distinct addresses whose similarity is at or above
/// `threshold`; components of size 1 are discarded, so addresses with no
/// qualifying edge do not appear in any block. The returned blocks partition
/// the covered addresses and are ordered by their smallest member.
pub fn voting_blocks(matrix: &SimilarityMatrix, threshold: Decimal) -> Vec<VotingBlock> {
    let n = matrix.len();
    let mut sets = DisjointSets::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            if matrix.get(i, j) >= threshold {
                sets.union(i, j);
            }
        }
    }

    let mut components: Vec<VotingBlock> = vec![VotingBlock::new(); n];
    for i in 0..n {
        let root = sets.find(i);
        components[root].insert(matrix.addresses()[i].clone());
    }

    let mut blocks: Vec<VotingBlock> = components
        .into_iter()
        .filter(|component| component.len() >= 2)
        .collect();
    // matrix order is sorted, so sorting by first member keeps labels stable
    blocks.sort_by(|a, b| a.iter().next().cmp(&b.iter().next()));
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::voting_similarity;
    use crate::votes::test_fixtures::*;
    use crate::votes::{build_voting_history, Outcome, VotingHistory, SUPPORT_AGAINST, SUPPORT_FOR};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;
    use test_strategy::proptest;

    fn two_camps_history() -> VotingHistory {
        // A, B, C always vote together; D, E always vote the other way
        let proposals = (0..4)
            .map(|i| {
                proposal(
                    &format!("P{i}"),
                    Outcome::Passed,
                    vec![
                        vote("A", SUPPORT_FOR),
                        vote("B", SUPPORT_FOR),
                        vote("C", SUPPORT_FOR),
                        vote("D", SUPPORT_AGAINST),
                        vote("E", SUPPORT_AGAINST),
                    ],
                )
            })
            .collect::<Vec<_>>();
        build_voting_history(&proposals)
    }

    #[test]
    fn coordinated_camps_form_two_blocks() {
        let matrix = voting_similarity(&two_camps_history(), 2).unwrap();
        let blocks = voting_blocks(&matrix, dec!(0.7));
        assert_eq!(blocks.len(), 2);
        let expected_abc: VotingBlock = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        let expected_de: VotingBlock = ["D", "E"].iter().map(|s| s.to_string()).collect();
        assert!(blocks.contains(&expected_abc));
        assert!(blocks.contains(&expected_de));
    }

    #[test]
    fn addresses_without_edges_are_excluded() {
        let proposals = vec![
            proposal(
                "P1",
                Outcome::Passed,
                vec![
                    vote("A", SUPPORT_FOR),
                    vote("B", SUPPORT_FOR),
                    vote("C", SUPPORT_AGAINST),
                ],
            ),
            proposal(
                "P2",
                Outcome::Passed,
                vec![
                    vote("A", SUPPORT_FOR),
                    vote("B", SUPPORT_FOR),
                    vote("C", SUPPORT_FOR),
                ],
            ),
        ];
        let history = build_voting_history(&proposals);
        let matrix = voting_similarity(&history, 2).unwrap();
        let blocks = voting_blocks(&matrix, dec!(0.8));
        assert_eq!(blocks.len(), 1);
        assert!(!blocks[0].contains("C"));
    }

    #[test]
    fn empty_matrix_yields_no_blocks() {
        let matrix = voting_similarity(&VotingHistory::new(), 1).unwrap();
        assert!(voting_blocks(&matrix, dec!(0.7)).is_empty());
    }

    fn history_strategy() -> impl Strategy<Value = VotingHistory> {
        proptest::collection::hash_map(
            "0x[0-9a-f]{4}",
            proptest::collection::hash_map("P[0-9]{1}", 0..2u8, 0..5),
            0..10,
        )
    }

    #[proptest]
    fn blocks_partition_their_addresses(#[strategy(history_strategy())] history: VotingHistory) {
        let matrix = voting_similarity(&history, 1).unwrap();
        let blocks = voting_blocks(&matrix, dec!(0.6));
        let mut seen = HashSet::new();
        for block in &blocks {
            assert!(block.len() >= 2);
            for address in block {
                assert!(seen.insert(address.clone()), "address in two blocks");
            }
        }
    }

    #[proptest]
    fn raising_threshold_never_grows_coverage(
        #[strategy(history_strategy())] history: VotingHistory,
    ) {
        let matrix = voting_similarity(&history, 1).unwrap();
        let low = voting_blocks(&matrix, dec!(0.5));
        let high = voting_blocks(&matrix, dec!(0.9));
        let covered = |blocks: &[VotingBlock]| blocks.iter().map(BTreeSet::len).sum::<usize>();
        assert!(covered(&high) <= covered(&low));
    }
}

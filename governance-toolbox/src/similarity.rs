//! Pairwise voting-agreement scores between addresses.

use crate::error::{AnalysisError, Result};
use crate::votes::VotingHistory;
use itertools::Itertools;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Symmetric square matrix of agreement scores in `[0, 1]`, indexed by the
/// addresses present in the voting history. The diagonal is fixed at 1.
///
/// The score of a pair is the fraction of commonly-voted proposals on which
/// both cast the same support value; pairs sharing fewer than `min_overlap`
/// proposals score 0. Proposals only one of the two voted on are excluded
/// from the comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimilarityMatrix {
    addresses: Vec<String>,
    index: HashMap<String, usize>,
    scores: Vec<Decimal>,
}

impl SimilarityMatrix {
    /// Addresses in matrix order (sorted, so identical histories always
    /// produce identical matrices).
    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn score(&self, a: &str, b: &str) -> Option<Decimal> {
        let i = *self.index.get(a)?;
        let j = *self.index.get(b)?;
        Some(self.get(i, j))
    }

    pub(crate) fn get(&self, i: usize, j: usize) -> Decimal {
        self.scores[i * self.addresses.len() + j]
    }
}

/// Computes the full similarity matrix for a voting history.
///
/// `min_overlap` is the minimum number of commonly-voted proposals required
/// before a pair is scored at all; it must be positive.
pub fn voting_similarity(history: &VotingHistory, min_overlap: usize) -> Result<SimilarityMatrix> {
    if min_overlap == 0 {
        return Err(AnalysisError::InvalidMinOverlap);
    }

    let mut addresses: Vec<String> = history.keys().cloned().collect();
    addresses.sort();
    let index: HashMap<String, usize> = addresses
        .iter()
        .enumerate()
        .map(|(i, addr)| (addr.clone(), i))
        .collect();

    // per-address proposal maps resolved once, not inside the pair loop
    let proposal_votes: Vec<_> = addresses.iter().map(|addr| &history[addr]).collect();

    let n = addresses.len();
    let mut scores = vec![Decimal::ZERO; n * n];
    for i in 0..n {
        scores[i * n + i] = Decimal::ONE;
    }

    for (i, j) in (0..n).tuple_combinations() {
        // iterate the smaller voting record of the two
        let (probe, other) = if proposal_votes[i].len() <= proposal_votes[j].len() {
            (proposal_votes[i], proposal_votes[j])
        } else {
            (proposal_votes[j], proposal_votes[i])
        };

        let mut common = 0u64;
        let mut agreements = 0u64;
        for (proposal, support) in probe {
            if let Some(other_support) = other.get(proposal) {
                common += 1;
                if other_support == support {
                    agreements += 1;
                }
            }
        }

        let score = if (common as usize) < min_overlap {
            Decimal::ZERO
        } else {
            Decimal::from(agreements) / Decimal::from(common)
        };
        scores[i * n + j] = score;
        scores[j * n + i] = score;
    }

    Ok(SimilarityMatrix {
        addresses,
        index,
        scores,
    })
}

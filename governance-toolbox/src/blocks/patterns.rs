//! Per-proposal voting behavior of a single block.

use crate::blocks::VotingBlock;
use crate::votes::{ProposalId, VotingHistory, SUPPORT_AGAINST, SUPPORT_FOR};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Serialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct ProposalTally {
    pub votes_for: usize,
    pub votes_against: usize,
    pub abstain: usize,
    pub no_vote: usize,
    /// Voted members over block size, in `[0, 100]`.
    pub participation_pct: Decimal,
    /// Largest same-vote faction over voted members, in `[0, 100]`;
    /// 0 when nobody in the block voted.
    pub consensus_pct: Decimal,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct BlockPatterns {
    pub proposals: BTreeMap<ProposalId, ProposalTally>,
    pub avg_participation: Decimal,
    pub avg_consensus: Decimal,
}

/// Tallies every proposal touched by any member of the block.
///
/// A member with no recorded vote on a touched proposal counts as `no_vote`
/// and lowers participation; consensus is computed over voted members only.
/// An empty block yields an empty, zeroed result.
pub fn block_voting_patterns(block: &VotingBlock, history: &VotingHistory) -> BlockPatterns {
    let touched: BTreeSet<&ProposalId> = block
        .iter()
        .filter_map(|member| history.get(member))
        .flat_map(|votes| votes.keys())
        .collect();
    if block.is_empty() || touched.is_empty() {
        return BlockPatterns::default();
    }

    let mut proposals = BTreeMap::new();
    for proposal in touched {
        let mut tally = ProposalTally::default();
        for member in block {
            match history.get(member).and_then(|votes| votes.get(proposal)) {
                Some(&SUPPORT_FOR) => tally.votes_for += 1,
                Some(&SUPPORT_AGAINST) => tally.votes_against += 1,
                Some(_) => tally.abstain += 1,
                None => tally.no_vote += 1,
            }
        }

        let voted = tally.votes_for + tally.votes_against + tally.abstain;
        tally.participation_pct =
            Decimal::from(voted as u64) / Decimal::from(block.len() as u64) * dec!(100);
        tally.consensus_pct = if voted == 0 {
            Decimal::ZERO
        } else {
            let majority = tally.votes_for.max(tally.votes_against).max(tally.abstain);
            Decimal::from(majority as u64) / Decimal::from(voted as u64) * dec!(100)
        };
        proposals.insert(proposal.clone(), tally);
    }

    let count = Decimal::from(proposals.len() as u64);
    let avg_participation = proposals
        .values()
        .map(|t| t.participation_pct)
        .sum::<Decimal>()
        / count;
    let avg_consensus = proposals.values().map(|t| t.consensus_pct).sum::<Decimal>() / count;

    BlockPatterns {
        proposals,
        avg_participation,
        avg_consensus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::votes::test_fixtures::*;
    use crate::votes::{build_voting_history, Outcome};
    use rust_decimal_macros::dec;

    fn block_of(members: &[&str]) -> VotingBlock {
        members.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn unanimous_block_has_full_consensus() {
        let proposals = (0..3)
            .map(|i| {
                proposal(
                    &format!("P{i}"),
                    Outcome::Passed,
                    vec![
                        vote("A", SUPPORT_FOR),
                        vote("B", SUPPORT_FOR),
                        vote("C", SUPPORT_FOR),
                    ],
                )
            })
            .collect::<Vec<_>>();
        let history = build_voting_history(&proposals);
        let patterns = block_voting_patterns(&block_of(&["A", "B", "C"]), &history);

        assert_eq!(patterns.proposals.len(), 3);
        assert_eq!(patterns.avg_consensus, dec!(100));
        assert_eq!(patterns.avg_participation, dec!(100));
    }

    #[test]
    fn missing_votes_lower_participation_not_consensus() {
        let proposals = vec![proposal(
            "P1",
            Outcome::Passed,
            vec![vote("A", SUPPORT_FOR), vote("B", SUPPORT_FOR)],
        )];
        let history = build_voting_history(&proposals);
        // C never voted on P1
        let patterns = block_voting_patterns(&block_of(&["A", "B", "C"]), &history);

        let tally = &patterns.proposals["P1"];
        assert_eq!(tally.votes_for, 2);
        assert_eq!(tally.no_vote, 1);
        assert!((tally.participation_pct - dec!(66.66)).abs() < dec!(0.01));
        assert_eq!(tally.consensus_pct, dec!(100));
    }

    #[test]
    fn split_vote_halves_consensus() {
        let proposals = vec![proposal(
            "P1",
            Outcome::Passed,
            vec![vote("A", SUPPORT_FOR), vote("B", SUPPORT_AGAINST)],
        )];
        let history = build_voting_history(&proposals);
        let patterns = block_voting_patterns(&block_of(&["A", "B"]), &history);
        assert_eq!(patterns.proposals["P1"].consensus_pct, dec!(50));
    }

    #[test]
    fn abstain_support_values_are_tracked_separately() {
        let proposals = vec![proposal(
            "P1",
            Outcome::Passed,
            vec![vote("A", SUPPORT_FOR), vote("B", 2)],
        )];
        let history = build_voting_history(&proposals);
        let patterns = block_voting_patterns(&block_of(&["A", "B"]), &history);
        let tally = &patterns.proposals["P1"];
        assert_eq!(tally.votes_for, 1);
        assert_eq!(tally.abstain, 1);
        assert_eq!(tally.participation_pct, dec!(100));
    }

    #[test]
    fn empty_block_yields_zeroed_result() {
        let history = build_voting_history(&[]);
        let patterns = block_voting_patterns(&VotingBlock::new(), &history);
        assert!(patterns.proposals.is_empty());
        assert_eq!(patterns.avg_participation, Decimal::ZERO);
        assert_eq!(patterns.avg_consensus, Decimal::ZERO);
    }
}

//! Statistical scans for suspicious voting patterns.
//!
//! Four independent checks over the raw proposal list and holder set:
//! participation spikes, perfectly-agreeing address pairs, outcomes that
//! contradict raw voting power, and whale-vs-community sentiment splits.
//! None of them require the similarity matrix.

use crate::votes::{
    build_voting_history, check_proposal, check_vote, Address, Outcome, Proposal, ProposalId,
    RowCheck, SUPPORT_AGAINST, SUPPORT_FOR,
};
use itertools::Itertools;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::HashMap;
use token_snapshot::HolderRecord;

/// Agreeing on at least this many common proposals makes a pair suspicious.
const COORDINATION_MIN_OVERLAP: usize = 3;

/// Participation above this multiple of the mean is flagged as a spike.
const SPIKE_FACTOR: Decimal = dec!(1.5);

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ParticipationSpike {
    pub proposal_id: ProposalId,
    /// Votes cast over total holders, as a fraction.
    pub participation_rate: Decimal,
    pub average_rate: Decimal,
    pub increase_pct: Decimal,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct CoordinatedPair {
    pub address_a: Address,
    pub address_b: Address,
    pub shared_proposals: usize,
    pub balance_a: u64,
    pub balance_b: u64,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct PowerContradiction {
    pub proposal_id: ProposalId,
    pub outcome: Outcome,
    pub tokens_for: u64,
    pub tokens_against: u64,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct WhaleDivergence {
    pub proposal_id: ProposalId,
    pub whale_for_pct: Decimal,
    pub whale_against_pct: Decimal,
    pub community_for_pct: Decimal,
    pub community_against_pct: Decimal,
}

/// The four fixed finding categories. Empty inputs yield empty lists.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct AnomalyReport {
    pub sudden_participation: Vec<ParticipationSpike>,
    pub coordinated_voting: Vec<CoordinatedPair>,
    pub vote_against_size: Vec<PowerContradiction>,
    pub whale_against_community: Vec<WhaleDivergence>,
}

impl AnomalyReport {
    pub fn is_empty(&self) -> bool {
        self.sudden_participation.is_empty()
            && self.coordinated_voting.is_empty()
            && self.vote_against_size.is_empty()
            && self.whale_against_community.is_empty()
    }
}

pub fn detect_anomalies(proposals: &[Proposal], holders: &[HolderRecord]) -> AnomalyReport {
    let balances: HashMap<&str, u64> = holders
        .iter()
        .map(|h| (h.address.as_str(), h.balance))
        .collect();

    AnomalyReport {
        sudden_participation: participation_spikes(proposals, holders.len()),
        coordinated_voting: coordinated_pairs(proposals, &balances),
        vote_against_size: power_contradictions(proposals, &balances),
        whale_against_community: whale_divergences(proposals, &balances),
    }
}

fn valid_rows(proposal: &Proposal) -> Option<(&ProposalId, Vec<(&Address, u8)>)> {
    match check_proposal(proposal) {
        RowCheck::Valid((id, votes)) => {
            let rows = votes
                .iter()
                .filter_map(|vote| match check_vote(vote) {
                    RowCheck::Valid(row) => Some(row),
                    RowCheck::Skip(_) => None,
                })
                .collect();
            Some((id, rows))
        }
        RowCheck::Skip(_) => None,
    }
}

fn participation_spikes(proposals: &[Proposal], holder_count: usize) -> Vec<ParticipationSpike> {
    if holder_count == 0 {
        return Vec::new();
    }
    let rates: Vec<(&ProposalId, Decimal)> = proposals
        .iter()
        .filter_map(valid_rows)
        .map(|(id, rows)| {
            (
                id,
                Decimal::from(rows.len() as u64) / Decimal::from(holder_count as u64),
            )
        })
        .collect();
    if rates.is_empty() {
        return Vec::new();
    }

    let average = rates.iter().map(|(_, rate)| *rate).sum::<Decimal>()
        / Decimal::from(rates.len() as u64);
    if average.is_zero() {
        return Vec::new();
    }

    rates
        .into_iter()
        .filter(|(_, rate)| *rate > SPIKE_FACTOR * average)
        .map(|(id, rate)| ParticipationSpike {
            proposal_id: id.clone(),
            participation_rate: rate,
            average_rate: average,
            increase_pct: (rate - average) / average * dec!(100),
        })
        .collect()
}

fn coordinated_pairs(
    proposals: &[Proposal],
    balances: &HashMap<&str, u64>,
) -> Vec<CoordinatedPair> {
    // too few proposals to distinguish coordination from coincidence
    if proposals.iter().filter_map(valid_rows).count() < COORDINATION_MIN_OVERLAP {
        return Vec::new();
    }

    let history = build_voting_history(proposals);
    let mut addresses: Vec<&Address> = history.keys().collect();
    addresses.sort();

    let mut findings = Vec::new();
    for (a, b) in addresses.iter().tuple_combinations() {
        let votes_a = &history[*a];
        let votes_b = &history[*b];
        let (probe, other) = if votes_a.len() <= votes_b.len() {
            (votes_a, votes_b)
        } else {
            (votes_b, votes_a)
        };

        let mut common = 0usize;
        let mut agreements = 0usize;
        for (proposal, support) in probe {
            if let Some(other_support) = other.get(proposal) {
                common += 1;
                if other_support == support {
                    agreements += 1;
                }
            }
        }
        if common >= COORDINATION_MIN_OVERLAP && agreements == common {
            findings.push(CoordinatedPair {
                address_a: (*a).clone(),
                address_b: (*b).clone(),
                shared_proposals: common,
                balance_a: balances.get(a.as_str()).copied().unwrap_or_default(),
                balance_b: balances.get(b.as_str()).copied().unwrap_or_default(),
            });
        }
    }
    findings
}

fn power_contradictions(
    proposals: &[Proposal],
    balances: &HashMap<&str, u64>,
) -> Vec<PowerContradiction> {
    proposals
        .iter()
        .filter_map(|proposal| {
            let outcome = proposal.outcome?;
            let (id, rows) = valid_rows(proposal)?;

            let mut tokens_for = 0u64;
            let mut tokens_against = 0u64;
            for (voter, support) in rows {
                let balance = balances.get(voter.as_str()).copied().unwrap_or_default();
                match support {
                    SUPPORT_FOR => tokens_for = tokens_for.saturating_add(balance),
                    SUPPORT_AGAINST => tokens_against = tokens_against.saturating_add(balance),
                    _ => {}
                }
            }

            let contradicts = match outcome {
                Outcome::Passed => tokens_against > tokens_for,
                Outcome::Rejected => tokens_for > tokens_against,
            };
            contradicts.then(|| PowerContradiction {
                proposal_id: id.clone(),
                outcome,
                tokens_for,
                tokens_against,
            })
        })
        .collect()
}

fn whale_divergences(
    proposals: &[Proposal],
    balances: &HashMap<&str, u64>,
) -> Vec<WhaleDivergence> {
    proposals
        .iter()
        .filter_map(|proposal| {
            let (id, mut rows) = valid_rows(proposal)?;
            // too few voters to split into a meaningful top decile
            if rows.len() < 10 {
                return None;
            }

            rows.sort_by(|(a_addr, _), (b_addr, _)| {
                let a_bal = balances.get(a_addr.as_str()).copied().unwrap_or_default();
                let b_bal = balances.get(b_addr.as_str()).copied().unwrap_or_default();
                b_bal.cmp(&a_bal).then_with(|| a_addr.cmp(b_addr))
            });

            let whale_count = (rows.len() / 10).max(1);
            let (whales, community) = rows.split_at(whale_count);

            let (whale_for_pct, whale_against_pct, whale_majority) = group_sentiment(whales)?;
            let (community_for_pct, community_against_pct, community_majority) =
                group_sentiment(community)?;

            (whale_majority != community_majority).then(|| WhaleDivergence {
                proposal_id: id.clone(),
                whale_for_pct,
                whale_against_pct,
                community_for_pct,
                community_against_pct,
            })
        })
        .collect()
}

/// For/against percentages within a voter group plus its majority leaning
/// (`true` = for); `None` when the group cast no directional votes.
fn group_sentiment(rows: &[(&Address, u8)]) -> Option<(Decimal, Decimal, bool)> {
    let votes_for = rows.iter().filter(|(_, s)| *s == SUPPORT_FOR).count();
    let votes_against = rows.iter().filter(|(_, s)| *s == SUPPORT_AGAINST).count();
    let total = votes_for + votes_against;
    if total == 0 {
        return None;
    }
    let for_pct = Decimal::from(votes_for as u64) / Decimal::from(total as u64) * dec!(100);
    let against_pct = Decimal::from(votes_against as u64) / Decimal::from(total as u64) * dec!(100);
    Some((for_pct, against_pct, votes_for > votes_against))
}

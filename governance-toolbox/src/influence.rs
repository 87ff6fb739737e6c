//! Per-proposal influence of large token holders.

use crate::votes::{check_proposal, check_vote, Address, Outcome, Proposal, ProposalId, RowCheck};
use crate::votes::{SUPPORT_AGAINST, SUPPORT_FOR};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Number of top-balance holders considered "top holders" per proposal.
const TOP_HOLDERS: usize = 10;

/// The minimal prefix of balance-ranked, participating holders whose
/// combined vote flips the running majority outcome.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ThresholdEvent {
    /// How many ranked voters had been accumulated when the flip occurred.
    pub voters_needed: usize,
    pub cumulative_tokens: u64,
    pub flipped_to: Outcome,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct TopHolderInfluence {
    /// Aggregate balance of the top holders, whether or not they voted.
    pub combined_balance: u64,
    pub tokens_for: u64,
    pub tokens_against: u64,
    /// Share of the top holders' cast voting power that matched the recorded
    /// outcome, in `[0, 100]`; 0 when none of them voted.
    pub aligned_pct: Decimal,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ProposalInfluence {
    pub outcome: Outcome,
    pub threshold_event: Option<ThresholdEvent>,
    pub top_holders: TopHolderInfluence,
    pub tokens_for: u64,
    pub tokens_against: u64,
    /// Cast voting power over total token supply, in `[0, 100]`.
    pub participation_pct: Decimal,
}

/// Analyzes how balance-ranked holders drive each proposal's outcome.
///
/// Holders are sorted by balance descending once and that ordering is shared
/// across proposals. Proposals missing id, votes or outcome are skipped with
/// a warning; empty input yields an empty map.
pub fn proposal_influence(
    proposals: &[Proposal],
    balances: &HashMap<Address, u64>,
) -> BTreeMap<ProposalId, ProposalInfluence> {
    let mut ranked: Vec<(&Address, u64)> = balances.iter().map(|(a, b)| (a, *b)).collect();
    ranked.sort_by(|(a_addr, a_bal), (b_addr, b_bal)| {
        b_bal.cmp(a_bal).then_with(|| a_addr.cmp(b_addr))
    });
    let total_supply = balances.values().fold(0u64, |acc, v| acc.saturating_add(*v));

    let mut results = BTreeMap::new();
    for proposal in proposals {
        let (id, votes) = match check_proposal(proposal) {
            RowCheck::Valid(row) => row,
            RowCheck::Skip(reason) => {
                warn!(reason, "skipping proposal in influence analysis");
                continue;
            }
        };
        let outcome = match proposal.outcome {
            Some(outcome) => outcome,
            None => {
                warn!(proposal = %id, "skipping proposal without recorded outcome");
                continue;
            }
        };

        let mut vote_map: HashMap<&Address, u8> = HashMap::new();
        for vote in votes {
            if let RowCheck::Valid((voter, support)) = check_vote(vote) {
                vote_map.insert(voter, support);
            }
        }

        results.insert(
            id.clone(),
            analyze_one(outcome, &vote_map, &ranked, total_supply),
        );
    }
    results
}

fn analyze_one(
    outcome: Outcome,
    vote_map: &HashMap<&Address, u8>,
    ranked: &[(&Address, u64)],
    total_supply: u64,
) -> ProposalInfluence {
    let mut tokens_for = 0u64;
    let mut tokens_against = 0u64;
    let mut cumulative = 0u64;
    let mut voters_walked = 0usize;
    let mut previous: Option<Outcome> = None;
    let mut threshold_event = None;

    for (address, balance) in ranked {
        let support = match vote_map.get(address) {
            Some(&support) => support,
            None => continue,
        };
        match support {
            SUPPORT_FOR => tokens_for = tokens_for.saturating_add(*balance),
            SUPPORT_AGAINST => tokens_against = tokens_against.saturating_add(*balance),
            // abstain-style values carry no directional power
            _ => continue,
        }
        cumulative = cumulative.saturating_add(*balance);
        voters_walked += 1;

        let current = running_outcome(tokens_for, tokens_against);
        if let Some(previous) = previous {
            if previous != current && threshold_event.is_none() {
                threshold_event = Some(ThresholdEvent {
                    voters_needed: voters_walked,
                    cumulative_tokens: cumulative,
                    flipped_to: current,
                });
            }
        }
        previous = Some(current);
    }

    let top_holders = top_holder_influence(outcome, vote_map, ranked);
    let cast_power = tokens_for.saturating_add(tokens_against);
    let participation_pct = if total_supply == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(cast_power) / Decimal::from(total_supply) * dec!(100)
    };

    ProposalInfluence {
        outcome,
        threshold_event,
        top_holders,
        tokens_for,
        tokens_against,
        participation_pct,
    }
}

fn running_outcome(tokens_for: u64, tokens_against: u64) -> Outcome {
    let cast = tokens_for + tokens_against;
    if cast == 0 {
        return Outcome::Rejected;
    }
    let for_pct = Decimal::from(tokens_for) / Decimal::from(cast) * dec!(100);
    if for_pct > dec!(50) {
        Outcome::Passed
    } else {
        Outcome::Rejected
    }
}

fn top_holder_influence(
    outcome: Outcome,
    vote_map: &HashMap<&Address, u8>,
    ranked: &[(&Address, u64)],
) -> TopHolderInfluence {
    let mut influence = TopHolderInfluence::default();
    for (address, balance) in ranked.iter().take(TOP_HOLDERS) {
        influence.combined_balance = influence.combined_balance.saturating_add(*balance);
        match vote_map.get(address) {
            Some(&SUPPORT_FOR) => {
                influence.tokens_for = influence.tokens_for.saturating_add(*balance)
            }
            Some(&SUPPORT_AGAINST) => {
                influence.tokens_against = influence.tokens_against.saturating_add(*balance)
            }
            _ => {}
        }
    }

    let cast = influence.tokens_for.saturating_add(influence.tokens_against);
    influence.aligned_pct = if cast == 0 {
        Decimal::ZERO
    } else {
        let aligned = match outcome {
            Outcome::Passed => influence.tokens_for,
            Outcome::Rejected => influence.tokens_against,
        };
        Decimal::from(aligned) / Decimal::from(cast) * dec!(100)
    };
    influence
}

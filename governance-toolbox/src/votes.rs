//! Ingestion of raw proposal/vote records into a per-address voting history.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

pub type Address = String;
pub type ProposalId = String;

/// Raw support value: 0 = against, 1 = for, anything else is treated as
/// abstain where the distinction matters.
pub type Support = u8;

pub const SUPPORT_AGAINST: Support = 0;
pub const SUPPORT_FOR: Support = 1;

/// `Address -> (proposal id -> support)`. Built once per analysis session;
/// duplicate votes for the same pair are last-write-wins.
pub type VotingHistory = HashMap<Address, HashMap<ProposalId, Support>>;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Rejected,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Passed => write!(f, "passed"),
            Outcome::Rejected => write!(f, "rejected"),
        }
    }
}

/// A single vote row as supplied by collaborators. Source exports routinely
/// miss fields, hence everything is optional and validated at ingestion.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct VoteRecord {
    pub voter: Option<Address>,
    pub support: Option<Support>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Proposal {
    pub id: Option<ProposalId>,
    pub votes: Option<Vec<VoteRecord>>,
    pub outcome: Option<Outcome>,
}

/// Per-row validation result; malformed rows are skipped, never raised.
pub(crate) enum RowCheck<T> {
    Valid(T),
    Skip(&'static str),
}

pub(crate) fn check_proposal(proposal: &Proposal) -> RowCheck<(&ProposalId, &[VoteRecord])> {
    match (&proposal.id, &proposal.votes) {
        (Some(id), Some(votes)) => RowCheck::Valid((id, votes)),
        (None, _) => RowCheck::Skip("missing proposal id"),
        (_, None) => RowCheck::Skip("missing votes list"),
    }
}

pub(crate) fn check_vote(vote: &VoteRecord) -> RowCheck<(&Address, Support)> {
    match (&vote.voter, vote.support) {
        (Some(voter), Some(support)) => RowCheck::Valid((voter, support)),
        (None, _) => RowCheck::Skip("missing voter address"),
        (_, None) => RowCheck::Skip("missing support value"),
    }
}

/// Parses a collaborator-supplied JSON array of proposals.
///
/// This is the structural tier of error handling: a payload that is not a
/// JSON array of objects fails here, while gaps inside individual rows
/// survive parsing (as `None` fields) and are skipped later.
pub fn proposals_from_json(json: &str) -> Result<Vec<Proposal>> {
    serde_json::from_str(json).map_err(|e| AnalysisError::InvalidVotingData(e.to_string()))
}

/// Builds the voting history, skipping malformed rows with a warning.
pub fn build_voting_history(proposals: &[Proposal]) -> VotingHistory {
    let mut history = VotingHistory::new();
    let mut skipped_proposals = 0usize;
    let mut skipped_votes = 0usize;

    for proposal in proposals {
        let (id, votes) = match check_proposal(proposal) {
            RowCheck::Valid(row) => row,
            RowCheck::Skip(reason) => {
                warn!(reason, "skipping proposal");
                skipped_proposals += 1;
                continue;
            }
        };
        for vote in votes {
            match check_vote(vote) {
                RowCheck::Valid((voter, support)) => {
                    history
                        .entry(voter.clone())
                        .or_default()
                        .insert(id.clone(), support);
                }
                RowCheck::Skip(reason) => {
                    warn!(proposal = %id, reason, "skipping vote");
                    skipped_votes += 1;
                }
            }
        }
    }

    if skipped_proposals > 0 || skipped_votes > 0 {
        warn!(
            skipped_proposals,
            skipped_votes, "ingested voting data with gaps"
        );
    }
    history
}


#[cfg(test)]
mod tests {
    use super::test_fixtures::*;
    use super::*;

    #[test]
    fn last_write_wins_on_duplicate_votes() {
        let proposals = vec![proposal(
            "P1",
            Outcome::Passed,
            vec![vote("a", SUPPORT_FOR), vote("a", SUPPORT_AGAINST)],
        )];
        let history = build_voting_history(&proposals);
        assert_eq!(history["a"]["P1"], SUPPORT_AGAINST);
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let proposals = vec![
            // no id: whole proposal dropped
            Proposal {
                id: None,
                votes: Some(vec![vote("a", SUPPORT_FOR)]),
                outcome: Some(Outcome::Passed),
            },
            // no votes list: dropped
            Proposal {
                id: Some("P1".into()),
                votes: None,
                outcome: None,
            },
            // one good vote, one missing voter, one missing support
            proposal(
                "P2",
                Outcome::Rejected,
                vec![
                    vote("b", SUPPORT_AGAINST),
                    VoteRecord {
                        voter: None,
                        support: Some(SUPPORT_FOR),
                    },
                    VoteRecord {
                        voter: Some("c".into()),
                        support: None,
                    },
                ],
            ),
        ];
        let history = build_voting_history(&proposals);
        assert_eq!(history.len(), 1);
        assert_eq!(history["b"]["P2"], SUPPORT_AGAINST);
    }

    #[test]
    fn empty_input_builds_empty_history() {
        assert!(build_voting_history(&[]).is_empty());
    }

    #[test]
    fn json_rows_tolerate_unknown_and_missing_fields() {
        let proposals = proposals_from_json(
            r#"[
                {
                    "id": "PROP-1",
                    "title": "enable fee switch",
                    "outcome": "passed",
                    "votes": [
                        {"voter": "0xabc", "support": 1, "weight": "12.5"},
                        {"voter": "0xdef"}
                    ]
                },
                {"title": "orphaned row without id"}
            ]"#,
        )
        .unwrap();
        assert_eq!(proposals.len(), 2);
        assert_eq!(proposals[0].outcome, Some(Outcome::Passed));

        let history = build_voting_history(&proposals);
        assert_eq!(history.len(), 1);
        assert_eq!(history["0xabc"]["PROP-1"], SUPPORT_FOR);
    }

    #[test]
    fn structurally_invalid_json_is_an_error() {
        assert!(matches!(
            proposals_from_json(r#"{"not": "an array"}"#),
            Err(AnalysisError::InvalidVotingData(_))
        ));
    }
}

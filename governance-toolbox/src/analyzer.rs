//! Stateful entry point tying the analyses together.

use crate::anomalies::{detect_anomalies, AnomalyReport};
use crate::blocks::patterns::{block_voting_patterns, BlockPatterns};
use crate::blocks::power::{block_voting_power, BlockPower};
use crate::blocks::{voting_blocks, VotingBlock};
use crate::error::Result;
use crate::influence::{proposal_influence, ProposalInfluence};
use crate::similarity::{voting_similarity, SimilarityMatrix};
use crate::votes::{
    build_voting_history, proposals_from_json, Address, Proposal, ProposalId, VotingHistory,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, HashMap};
use token_snapshot::HolderRecord;

/// Overlap used when [`BlockAnalyzer::identify_voting_blocks`] has to compute
/// the similarity matrix itself.
pub const DEFAULT_MIN_OVERLAP: usize = 2;

/// Reasonable default edge threshold for block identification.
pub const DEFAULT_SIMILARITY_THRESHOLD: Decimal = dec!(0.7);

/// Analyzes the voting behavior of one protocol's governance.
///
/// Owns the voting history plus the cached similarity matrix and block list;
/// both caches are invalidated by [`load_voting_data`]. An instance is meant
/// to be owned by a single thread; run parallel analyses with one analyzer
/// per dataset rather than sharing one.
///
/// [`load_voting_data`]: BlockAnalyzer::load_voting_data
#[derive(Default, Clone, Debug)]
pub struct BlockAnalyzer {
    voting_history: VotingHistory,
    similarity: Option<SimilarityMatrix>,
    blocks: Option<Vec<VotingBlock>>,
}

impl BlockAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the voting history and drops the cached matrix and blocks.
    /// Malformed rows are skipped with a warning, never an error.
    pub fn load_voting_data(&mut self, proposals: &[Proposal]) {
        self.voting_history = build_voting_history(proposals);
        self.similarity = None;
        self.blocks = None;
    }

    /// Like [`load_voting_data`](Self::load_voting_data) but takes the raw
    /// collaborator JSON; fails only on a structurally unusable payload.
    pub fn load_voting_data_json(&mut self, json: &str) -> Result<()> {
        let proposals = proposals_from_json(json)?;
        self.load_voting_data(&proposals);
        Ok(())
    }

    pub fn voting_history(&self) -> &VotingHistory {
        &self.voting_history
    }

    /// Computes and caches the similarity matrix for the loaded history.
    pub fn calculate_voting_similarity(&mut self, min_overlap: usize) -> Result<&SimilarityMatrix> {
        let matrix = voting_similarity(&self.voting_history, min_overlap)?;
        self.blocks = None;
        Ok(self.similarity.insert(matrix))
    }

    /// Clusters addresses into blocks at the given edge threshold.
    ///
    /// Uses the cached similarity matrix if one was computed; otherwise the
    /// matrix is computed first with [`DEFAULT_MIN_OVERLAP`] — call
    /// [`calculate_voting_similarity`](Self::calculate_voting_similarity)
    /// beforehand to control the overlap.
    pub fn identify_voting_blocks(&mut self, threshold: Decimal) -> Result<&[VotingBlock]> {
        if self.similarity.is_none() {
            self.calculate_voting_similarity(DEFAULT_MIN_OVERLAP)?;
        }
        let matrix = self
            .similarity
            .as_ref()
            .expect("similarity matrix was just computed");
        Ok(self.blocks.insert(voting_blocks(matrix, threshold)))
    }

    /// Token power per identified block; empty when no blocks are cached.
    pub fn calculate_voting_power(
        &self,
        balances: &HashMap<Address, u64>,
    ) -> BTreeMap<String, BlockPower> {
        match &self.blocks {
            Some(blocks) => block_voting_power(blocks, balances),
            None => BTreeMap::new(),
        }
    }

    /// Voting behavior of one block against the loaded history.
    pub fn get_block_voting_patterns(&self, block: &VotingBlock) -> BlockPatterns {
        block_voting_patterns(block, &self.voting_history)
    }

    /// Holder-influence breakdown per proposal; independent of the loaded
    /// history and caches.
    pub fn analyze_proposal_influence(
        &self,
        proposals: &[Proposal],
        balances: &HashMap<Address, u64>,
    ) -> BTreeMap<ProposalId, ProposalInfluence> {
        proposal_influence(proposals, balances)
    }

    /// Statistical anomaly scan; independent of the loaded history and
    /// caches.
    pub fn detect_voting_anomalies(
        &self,
        proposals: &[Proposal],
        holders: &[HolderRecord],
    ) -> AnomalyReport {
        detect_anomalies(proposals, holders)
    }
}

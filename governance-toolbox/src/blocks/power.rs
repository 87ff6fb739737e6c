//! Aggregate token power held by each voting block.

use crate::blocks::VotingBlock;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct BlockPower {
    pub members: Vec<String>,
    pub member_count: usize,
    pub total_tokens: u64,
    /// Share of the grand total of the balance map, in `[0, 100]`.
    pub percentage: Decimal,
}

/// Sums each block's balances and its share of total supply.
///
/// The total is the grand total of the balance map, not just the union of
/// block members. Addresses absent from the map count as 0. Output is keyed
/// `"Block 1"`, `"Block 2"`, ... in block-list order; with ten or more
/// blocks the index is zero-padded so the map still iterates in that order.
pub fn block_voting_power(
    blocks: &[VotingBlock],
    balances: &HashMap<String, u64>,
) -> BTreeMap<String, BlockPower> {
    let total_supply = balances.values().fold(0u64, |acc, v| acc.saturating_add(*v));
    let label_width = blocks.len().to_string().len();

    blocks
        .iter()
        .enumerate()
        .map(|(i, block)| {
            let total_tokens = block
                .iter()
                .map(|address| balances.get(address).copied().unwrap_or_default())
                .fold(0u64, |acc, v| acc.saturating_add(v));
            let percentage = if total_supply == 0 {
                Decimal::ZERO
            } else {
                Decimal::from(total_tokens) / Decimal::from(total_supply) * dec!(100)
            };
            (
                format!("Block {:0label_width$}", i + 1),
                BlockPower {
                    members: block.iter().cloned().collect(),
                    member_count: block.len(),
                    total_tokens,
                    percentage,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn block_of(members: &[&str]) -> VotingBlock {
        members.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn block_share_is_relative_to_grand_total() {
        let blocks = vec![block_of(&["a", "b"]), block_of(&["c", "d"])];
        let balances = HashMap::from([
            ("a".to_string(), 300u64),
            ("b".to_string(), 200),
            ("c".to_string(), 100),
            ("d".to_string(), 100),
            // outside any block but part of the total
            ("e".to_string(), 300),
        ]);
        let power = block_voting_power(&blocks, &balances);

        let first = &power["Block 1"];
        assert_eq!(first.total_tokens, 500);
        assert_eq!(first.member_count, 2);
        assert_eq!(first.percentage, dec!(50));

        let second = &power["Block 2"];
        assert_eq!(second.total_tokens, 200);
        assert_eq!(second.percentage, dec!(20));
    }

    #[test]
    fn unknown_addresses_count_as_zero() {
        let blocks = vec![block_of(&["a", "ghost"])];
        let balances = HashMap::from([("a".to_string(), 100u64)]);
        let power = block_voting_power(&blocks, &balances);
        assert_eq!(power["Block 1"].total_tokens, 100);
        assert_eq!(power["Block 1"].percentage, dec!(100));
    }

    #[test]
    fn zero_total_supply_yields_zero_percentages() {
        let blocks = vec![block_of(&["a", "b"])];
        let power = block_voting_power(&blocks, &HashMap::new());
        assert_eq!(power["Block 1"].total_tokens, 0);
        assert_eq!(power["Block 1"].percentage, Decimal::ZERO);
    }

    #[test]
    fn no_blocks_yields_empty_map() {
        assert!(block_voting_power(&[], &HashMap::new()).is_empty());
    }

    #[test]
    fn labels_iterate_in_block_list_order_beyond_ten_blocks() {
        // each block i holds i + 1 tokens so list position is recoverable
        let blocks: Vec<VotingBlock> = (0..12)
            .map(|i| [format!("a{i}"), format!("b{i}")].into_iter().collect())
            .collect();
        let balances: HashMap<String, u64> =
            (0..12).map(|i| (format!("a{i}"), i as u64 + 1)).collect();

        let power = block_voting_power(&blocks, &balances);
        assert_eq!(power.len(), 12);
        assert!(power.contains_key("Block 01"));
        let tokens_in_map_order: Vec<u64> = power.values().map(|p| p.total_tokens).collect();
        assert_eq!(tokens_in_map_order, (1..=12).collect::<Vec<u64>>());
    }
}

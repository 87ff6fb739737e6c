//! Token-holder balance snapshots for governance analysis.
//!
//! A [`Snapshot`] is built once from collaborator-supplied holder records
//! (typically parsed from a JSON export of on-chain balances) and then read
//! by the analyzers in `governance-toolbox`. Balances are opaque `u64` base
//! units; no assumption is made about decimals or address format.

pub mod concentration;

use serde::Deserialize;
use std::collections::HashMap;

pub type Address = String;
pub type Balance = u64;

/// A single holder row as supplied by collaborators.
///
/// Extra fields in the source data (labels, ENS names, tx counts, ...) are
/// ignored on deserialization.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct HolderRecord {
    pub address: Address,
    pub balance: Balance,
}

#[derive(Deserialize, Clone, Debug)]
pub struct RawSnapshot(Vec<HolderRecord>);

impl From<Vec<HolderRecord>> for RawSnapshot {
    fn from(from: Vec<HolderRecord>) -> Self {
        Self(from)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    // balances are aggregated per address so that duplicate rows in the raw
    // export (e.g. one per token contract interaction) collapse into one entry
    inner: HashMap<Address, Balance>,
    balance_threshold: Balance,
    total_supply: Balance,
}

impl Snapshot {
    /// Drops holders below `balance_threshold` and aggregates duplicate
    /// addresses by summing their balances.
    pub fn from_raw_snapshot(raw_snapshot: RawSnapshot, balance_threshold: Balance) -> Self {
        let inner = raw_snapshot
            .0
            .into_iter()
            .filter(|holder| holder.balance >= balance_threshold)
            .fold(HashMap::<Address, Balance>::new(), |mut acc, holder| {
                let entry = acc.entry(holder.address).or_default();
                *entry = entry.saturating_add(holder.balance);
                acc
            });
        let total_supply = inner.values().fold(0u64, |acc, v| acc.saturating_add(*v));
        Self {
            inner,
            balance_threshold,
            total_supply,
        }
    }

    pub fn balance_threshold(&self) -> Balance {
        self.balance_threshold
    }

    /// Grand total over all retained holders.
    pub fn total_supply(&self) -> Balance {
        self.total_supply
    }

    pub fn balances(&self) -> &HashMap<Address, Balance> {
        &self.inner
    }

    pub fn balance_of(&self, address: &str) -> Balance {
        self.inner.get(address).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Holders sorted by balance descending, ties broken by address so the
    /// ordering is stable across runs.
    pub fn holders_by_balance_desc(&self) -> Vec<(&Address, Balance)> {
        let mut holders: Vec<_> = self.inner.iter().map(|(a, b)| (a, *b)).collect();
        holders.sort_by(|(a_addr, a_bal), (b_addr, b_bal)| {
            b_bal.cmp(a_bal).then_with(|| a_addr.cmp(b_addr))
        });
        holders
    }
}

#[cfg(any(test, feature = "proptest"))]
mod arbitrary_impls {
    use super::*;
    use proptest::prelude::*;

    impl Arbitrary for HolderRecord {
        type Parameters = ();
        type Strategy = BoxedStrategy<HolderRecord>;

        fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
            ("0x[0-9a-f]{40}", 0..1_000_000_000u64)
                .prop_map(|(address, balance)| HolderRecord { address, balance })
                .boxed()
        }
    }

    impl Arbitrary for RawSnapshot {
        type Parameters = ();
        type Strategy = BoxedStrategy<RawSnapshot>;

        fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
            any::<Vec<HolderRecord>>().prop_map(RawSnapshot).boxed()
        }
    }

    impl Arbitrary for Snapshot {
        type Parameters = ();
        type Strategy = BoxedStrategy<Snapshot>;

        fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
            (any::<RawSnapshot>(), 0..1000u64)
                .prop_map(|(raw_snapshot, threshold)| {
                    Self::from_raw_snapshot(raw_snapshot, threshold)
                })
                .boxed()
        }
    }
}

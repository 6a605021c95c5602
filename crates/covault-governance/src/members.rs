//! Membership weight registry.

use covault_types::{Address, Weight};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Voting weights per member with a cached aggregate.
///
/// Unknown members weigh 0 and lookups never fail. Setting a weight to 0
/// removes voting rights but keeps the record; entries are never deleted.
/// The cached `total_weight` always equals the sum of stored weights.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MembershipRegistry {
    weights: BTreeMap<Address, Weight>,
    total_weight: Weight,
}

impl MembershipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from stored weights, recomputing the aggregate.
    pub fn from_weights(weights: impl IntoIterator<Item = (Address, Weight)>) -> Self {
        let mut registry = Self::new();
        for (member, weight) in weights {
            registry.set_weight(member, weight);
        }
        registry
    }

    /// Set a member's weight, adjusting the aggregate by the delta.
    /// Returns the previous weight.
    pub fn set_weight(&mut self, member: Address, weight: Weight) -> Weight {
        let previous = self.weights.insert(member, weight).unwrap_or(0);
        self.total_weight = self
            .total_weight
            .saturating_sub(previous)
            .saturating_add(weight);
        previous
    }

    /// A member's current weight; 0 for unknown members.
    pub fn weight_of(&self, member: &Address) -> Weight {
        self.weights.get(member).copied().unwrap_or(0)
    }

    /// True iff the member holds nonzero weight.
    pub fn is_member(&self, member: &Address) -> bool {
        self.weight_of(member) > 0
    }

    /// Sum of all member weights.
    pub fn total_weight(&self) -> Weight {
        self.total_weight
    }

    /// All recorded members and weights, ascending by identity.
    pub fn members(&self) -> impl Iterator<Item = (&Address, Weight)> {
        self.weights.iter().map(|(member, weight)| (member, *weight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(tag: u8) -> Address {
        Address::from_bytes([tag; 20])
    }

    #[test]
    fn test_unknown_member_weighs_zero() {
        let registry = MembershipRegistry::new();
        assert_eq!(registry.weight_of(&member(1)), 0);
        assert!(!registry.is_member(&member(1)));
        assert_eq!(registry.total_weight(), 0);
    }

    #[test]
    fn test_set_weight_adjusts_aggregate_by_delta() {
        let mut registry = MembershipRegistry::new();

        assert_eq!(registry.set_weight(member(1), 5), 0);
        assert_eq!(registry.total_weight(), 5);

        assert_eq!(registry.set_weight(member(2), 3), 0);
        assert_eq!(registry.total_weight(), 8);

        // Lowering a weight shrinks the aggregate
        assert_eq!(registry.set_weight(member(1), 2), 5);
        assert_eq!(registry.total_weight(), 5);
    }

    #[test]
    fn test_zero_weight_removes_rights_but_keeps_record() {
        let mut registry = MembershipRegistry::new();
        registry.set_weight(member(1), 5);
        registry.set_weight(member(1), 0);

        assert!(!registry.is_member(&member(1)));
        assert_eq!(registry.total_weight(), 0);
        assert_eq!(registry.members().count(), 1);
    }

    #[test]
    fn test_from_weights_recomputes_total() {
        let registry =
            MembershipRegistry::from_weights([(member(1), 4), (member(2), 6), (member(3), 0)]);
        assert_eq!(registry.total_weight(), 10);
        assert_eq!(registry.members().count(), 3);
    }

    proptest::proptest! {
        /// The cached aggregate equals the sum of stored weights after any
        /// sequence of updates.
        #[test]
        fn prop_total_weight_matches_sum(
            updates in proptest::collection::vec((0u8..8, 0u64..1_000_000), 0..64)
        ) {
            let mut registry = MembershipRegistry::new();
            for (tag, weight) in updates {
                registry.set_weight(member(tag), weight);
            }

            let sum: u64 = registry.members().map(|(_, w)| w).sum();
            proptest::prop_assert_eq!(registry.total_weight(), sum);
        }
    }
}

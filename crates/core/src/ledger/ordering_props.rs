//! Property-based tests for balance update ordering.
//!
//! - Lock order depends only on the account pair, never on direction
//! - The plan always moves exactly `amount` and nets to zero

use proptest::prelude::*;
use tally_shared::types::AccountId;

use super::ordering::balance_update_order;

/// Strategy for two distinct account ids.
fn distinct_pair() -> impl Strategy<Value = (AccountId, AccountId)> {
    (1i64..10_000, 1i64..10_000)
        .prop_filter("accounts must differ", |(a, b)| a != b)
        .prop_map(|(a, b)| (AccountId::new(a), AccountId::new(b)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Both directions of a pair lock the same accounts in the same order.
    #[test]
    fn prop_lock_order_is_direction_independent(
        (a, b) in distinct_pair(),
        amount in 1i64..1_000_000_000,
    ) {
        let forward = balance_update_order(a, b, amount);
        let backward = balance_update_order(b, a, amount);

        prop_assert_eq!(forward[0].account_id, backward[0].account_id);
        prop_assert_eq!(forward[1].account_id, backward[1].account_id);
    }

    /// Locks are always taken in ascending id order.
    #[test]
    fn prop_lock_order_is_ascending(
        (a, b) in distinct_pair(),
        amount in 1i64..1_000_000_000,
    ) {
        let plan = balance_update_order(a, b, amount);
        prop_assert!(plan[0].account_id < plan[1].account_id);
    }

    /// The source loses `amount`, the destination gains it, nothing else moves.
    #[test]
    fn prop_plan_conserves_balance(
        (a, b) in distinct_pair(),
        amount in 1i64..1_000_000_000,
    ) {
        let plan = balance_update_order(a, b, amount);

        prop_assert_eq!(plan[0].delta + plan[1].delta, 0);

        let source = plan.iter().find(|adj| adj.account_id == a).unwrap();
        let destination = plan.iter().find(|adj| adj.account_id == b).unwrap();
        prop_assert_eq!(source.delta, -amount);
        prop_assert_eq!(destination.delta, amount);
    }
}

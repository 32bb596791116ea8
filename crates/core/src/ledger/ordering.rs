//! Lock ordering for balance updates.
//!
//! Adjusting a balance locks the account row until the transaction ends. Two
//! transfers between the same pair of accounts in opposite directions would
//! deadlock if each locked its own source first. Every transfer therefore
//! adjusts the lower account id first, whatever the direction.

use tally_shared::types::AccountId;

/// One balance adjustment in a transfer's plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceAdjustment {
    /// Account to adjust.
    pub account_id: AccountId,
    /// Signed amount to add.
    pub delta: i64,
}

/// Returns the two balance adjustments of a transfer in lock order.
///
/// The first element always has the lower account id. The source account is
/// debited by `amount` and the destination credited by `amount`.
///
/// `amount` must be positive, as guaranteed by [`super::ValidatedTransfer`].
#[must_use]
pub(crate) fn balance_update_order(
    from: AccountId,
    to: AccountId,
    amount: i64,
) -> [BalanceAdjustment; 2] {
    let debit = BalanceAdjustment {
        account_id: from,
        delta: -amount,
    };
    let credit = BalanceAdjustment {
        account_id: to,
        delta: amount,
    };

    if from < to {
        [debit, credit]
    } else {
        [credit, debit]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lower_source_is_debited_first() {
        let plan = balance_update_order(AccountId::new(1), AccountId::new(2), 300);
        assert_eq!(plan[0].account_id, AccountId::new(1));
        assert_eq!(plan[0].delta, -300);
        assert_eq!(plan[1].account_id, AccountId::new(2));
        assert_eq!(plan[1].delta, 300);
    }

    #[test]
    fn test_lower_destination_is_credited_first() {
        let plan = balance_update_order(AccountId::new(2), AccountId::new(1), 300);
        assert_eq!(plan[0].account_id, AccountId::new(1));
        assert_eq!(plan[0].delta, 300);
        assert_eq!(plan[1].account_id, AccountId::new(2));
        assert_eq!(plan[1].delta, -300);
    }

    #[test]
    fn test_largest_amount_negates() {
        let plan = balance_update_order(AccountId::new(5), AccountId::new(3), i64::MAX);
        assert_eq!(plan[0].delta, i64::MAX);
        assert_eq!(plan[1].delta, -i64::MAX);
        assert_eq!(plan[0].delta + plan[1].delta, 0);
    }
}

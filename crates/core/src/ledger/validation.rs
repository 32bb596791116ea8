//! Transfer request validation.
//!
//! Runs before a transaction is opened and only reads, so a rejected request
//! never holds a connection or a row lock.

use tally_shared::types::AccountId;

use super::error::{StoreError, TransferError, ValidationError};
use super::store::LedgerStore;
use super::types::{Account, ValidatedTransfer};

/// Validates transfer requests against the store.
pub struct TransferValidator;

impl TransferValidator {
    /// Checks the parts of a request that need no lookup.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a self-transfer or a non-positive amount.
    pub fn check_request(
        from: AccountId,
        to: AccountId,
        amount: i64,
    ) -> Result<(), ValidationError> {
        if from == to {
            return Err(ValidationError::SelfTransfer(from));
        }
        if amount <= 0 {
            return Err(ValidationError::NonPositiveAmount(amount));
        }
        Ok(())
    }

    /// Validates a request and resolves both accounts.
    ///
    /// Checks, in order:
    /// 1. Source and destination differ
    /// 2. Amount is positive
    /// 3. Source account exists
    /// 4. Destination account exists
    /// 5. Both accounts hold the same currency
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Validation` for a malformed request,
    /// `TransferError::AccountNotFound` for a missing account, and
    /// `TransferError::Persistence` if a lookup fails for another reason.
    pub async fn validate<S>(
        store: &S,
        from: AccountId,
        to: AccountId,
        amount: i64,
    ) -> Result<ValidatedTransfer, TransferError>
    where
        S: LedgerStore + ?Sized,
    {
        Self::check_request(from, to, amount)?;

        let from_account = Self::resolve_account(store, from).await?;
        let to_account = Self::resolve_account(store, to).await?;

        if from_account.currency != to_account.currency {
            return Err(ValidationError::CurrencyMismatch {
                from: from_account.currency,
                to: to_account.currency,
            }
            .into());
        }

        Ok(ValidatedTransfer {
            from_account_id: from,
            to_account_id: to,
            amount,
        })
    }

    async fn resolve_account<S>(store: &S, account_id: AccountId) -> Result<Account, TransferError>
    where
        S: LedgerStore + ?Sized,
    {
        store.get_account(account_id).await.map_err(|e| match e {
            StoreError::NotFound(_) => TransferError::AccountNotFound(account_id),
            other => TransferError::Persistence(other),
        })
    }
}

//! Transfer engine.
//!
//! [`TransferService::transfer`] validates a request outside any transaction,
//! then writes the transfer, both entries and both balance updates inside a
//! single transaction. Balance updates follow [`balance_update_order`] so
//! concurrent transfers over the same accounts lock rows in the same order.
//!
//! Balances may go negative: sufficiency is not checked here and belongs to
//! whoever authorises the transfer.

use std::sync::Arc;

use tally_shared::types::AccountId;
use tracing::{debug, info};

use super::error::{StoreError, TransferError};
use super::ordering::balance_update_order;
use super::store::{LedgerStore, LedgerTx, execute_in_transaction};
use super::types::{
    Account, Entry, EntryQuery, Transfer, TransferQuery, TransferResult, ValidatedTransfer,
};
use super::validation::TransferValidator;

/// Transfer engine over a ledger store.
pub struct TransferService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for TransferService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> TransferService<S>
where
    S: LedgerStore + ?Sized,
{
    /// Creates a transfer service over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Moves `amount` from one account to another.
    ///
    /// # Errors
    ///
    /// - `Validation` for a self-transfer, a non-positive amount or a
    ///   currency mismatch; nothing is written
    /// - `AccountNotFound` if either account does not exist; nothing is written
    /// - `Persistence` if the store fails; the transaction was rolled back
    /// - `Rollback` if the rollback failed as well
    pub async fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: i64,
    ) -> Result<TransferResult, TransferError> {
        let request = TransferValidator::validate(self.store.as_ref(), from, to, amount).await?;
        self.execute(request).await
    }

    /// Executes an already validated transfer in its own transaction.
    ///
    /// # Errors
    ///
    /// Same as [`Self::transfer`], minus validation.
    pub async fn execute(&self, request: ValidatedTransfer) -> Result<TransferResult, TransferError> {
        let result = execute_in_transaction(self.store.as_ref(), |tx| {
            Box::pin(apply_transfer(tx, request))
        })
        .await?;

        info!(
            transfer_id = %result.transfer.id,
            from = %request.from_account_id,
            to = %request.to_account_id,
            amount = request.amount,
            "Transfer committed"
        );

        Ok(result)
    }

    /// Looks up an account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if it does not exist.
    pub async fn get_account(&self, account_id: AccountId) -> Result<Account, TransferError> {
        self.store
            .get_account(account_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => TransferError::AccountNotFound(account_id),
                other => TransferError::Persistence(other),
            })
    }

    /// Lists transfers leaving `query.from_account_id` or arriving at
    /// `query.to_account_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the store fails.
    pub async fn list_transfers(&self, query: TransferQuery) -> Result<Vec<Transfer>, TransferError> {
        Ok(self.store.list_transfers(query).await?)
    }

    /// Lists an account's entries, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the store fails.
    pub async fn list_entries(&self, query: EntryQuery) -> Result<Vec<Entry>, TransferError> {
        Ok(self.store.list_entries(query).await?)
    }
}

/// Writes one transfer through an open transaction.
async fn apply_transfer(
    tx: &mut dyn LedgerTx,
    request: ValidatedTransfer,
) -> Result<TransferResult, TransferError> {
    let ValidatedTransfer {
        from_account_id: from,
        to_account_id: to,
        amount,
    } = request;

    let transfer = tx.create_transfer(from, to, amount).await?;
    let from_entry = tx.create_entry(from, -amount).await?;
    let to_entry = tx.create_entry(to, amount).await?;

    let [first, second] = balance_update_order(from, to, amount);
    debug!(
        first = %first.account_id,
        second = %second.account_id,
        "Adjusting balances"
    );
    let first_account = tx.adjust_balance(first.account_id, first.delta).await?;
    let second_account = tx.adjust_balance(second.account_id, second.delta).await?;

    let (from_account, to_account) = if first.account_id == from {
        (first_account, second_account)
    } else {
        (second_account, first_account)
    };

    Ok(TransferResult {
        transfer,
        from_account,
        to_account,
        from_entry,
        to_entry,
    })
}

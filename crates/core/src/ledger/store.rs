//! Storage contract for the ledger.
//!
//! A backend implements [`LedgerStore`] for autocommit access and hands out
//! [`LedgerTx`] handles for work that must be all-or-nothing. Both expose the
//! same primitives so a caller can run any of them inside or outside a
//! transaction.
//!
//! Dropping a `LedgerTx` without calling `commit` must roll it back.

use async_trait::async_trait;
use futures::future::BoxFuture;
use tally_shared::types::{AccountId, TransferId};
use tracing::{error, warn};

use super::error::{StoreError, TransferError};
use super::types::{Account, Entry, EntryQuery, NewAccount, Transfer, TransferQuery};

/// Result type for storage primitives.
pub type StoreResult<T> = Result<T, StoreError>;

/// A ledger storage backend.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Opens a transaction.
    async fn begin(&self) -> StoreResult<Box<dyn LedgerTx>>;

    /// Opens an account.
    async fn create_account(&self, input: NewAccount) -> StoreResult<Account>;

    /// Inserts one transfer row.
    async fn create_transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: i64,
    ) -> StoreResult<Transfer>;

    /// Inserts one entry row.
    async fn create_entry(&self, account_id: AccountId, amount: i64) -> StoreResult<Entry>;

    /// Atomically adds `delta` to the balance and returns the updated row.
    async fn adjust_balance(&self, account_id: AccountId, delta: i64) -> StoreResult<Account>;

    /// Point lookup of an account.
    async fn get_account(&self, account_id: AccountId) -> StoreResult<Account>;

    /// Point lookup of a transfer.
    async fn get_transfer(&self, transfer_id: TransferId) -> StoreResult<Transfer>;

    /// Lists transfers, oldest first.
    async fn list_transfers(&self, query: TransferQuery) -> StoreResult<Vec<Transfer>>;

    /// Lists an account's entries, oldest first.
    async fn list_entries(&self, query: EntryQuery) -> StoreResult<Vec<Entry>>;
}

/// An open transaction on a [`LedgerStore`].
///
/// `adjust_balance` locks the account row until the transaction ends;
/// callers touching several accounts must adjust them in ascending id order.
#[async_trait]
pub trait LedgerTx: Send {
    /// Inserts one transfer row.
    async fn create_transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: i64,
    ) -> StoreResult<Transfer>;

    /// Inserts one entry row.
    async fn create_entry(&mut self, account_id: AccountId, amount: i64) -> StoreResult<Entry>;

    /// Atomically adds `delta` to the balance and returns the updated row.
    async fn adjust_balance(&mut self, account_id: AccountId, delta: i64) -> StoreResult<Account>;

    /// Point lookup of an account, seeing this transaction's own writes.
    async fn get_account(&mut self, account_id: AccountId) -> StoreResult<Account>;

    /// Lists transfers, seeing this transaction's own writes.
    async fn list_transfers(&mut self, query: TransferQuery) -> StoreResult<Vec<Transfer>>;

    /// Makes every write of this transaction visible.
    async fn commit(self: Box<Self>) -> StoreResult<()>;

    /// Discards every write of this transaction.
    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

/// Runs `work` inside a transaction scope.
///
/// The handle is only reachable from inside `work`. On `Ok` the transaction
/// is committed; on `Err` it is rolled back before the error is returned. If
/// the rollback fails too, both errors come back as
/// [`TransferError::Rollback`]. If the returned future is dropped before it
/// completes, the handle is dropped with it and the store rolls back.
///
/// # Example
///
/// ```ignore
/// let transfer = execute_in_transaction(&store, |tx| {
///     Box::pin(async move { Ok(tx.create_transfer(from, to, 100).await?) })
/// })
/// .await?;
/// ```
pub async fn execute_in_transaction<S, T, F>(store: &S, work: F) -> Result<T, TransferError>
where
    S: LedgerStore + ?Sized,
    T: Send,
    F: for<'t> FnOnce(&'t mut dyn LedgerTx) -> BoxFuture<'t, Result<T, TransferError>> + Send,
{
    let mut tx = store.begin().await?;

    let outcome = work(tx.as_mut()).await;

    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(cause) => {
            warn!(error = %cause, "Rolling back transaction");
            match tx.rollback().await {
                Ok(()) => Err(cause),
                Err(rollback) => {
                    error!(error = %cause, rollback_error = %rollback, "Rollback failed");
                    Err(TransferError::Rollback {
                        cause: Box::new(cause),
                        rollback,
                    })
                }
            }
        }
    }
}

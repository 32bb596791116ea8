//! PostgreSQL ledger store.
//!
//! [`PgLedgerStore`] runs each primitive in autocommit mode on the pool;
//! [`PgLedgerTx`] runs them on one `DatabaseTransaction`. Dropping a
//! `PgLedgerTx` without committing rolls the transaction back.

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tally_core::ledger::{
    Account, Entry, EntryQuery, LedgerStore, LedgerTx, NewAccount, StoreResult, Transfer,
    TransferQuery,
};
use tally_shared::types::{AccountId, TransferId};
use tracing::debug;

use crate::error::classify_db_err;
use crate::repositories::{AccountRepository, EntryRepository, TransferRepository};

/// Ledger store backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    db: DatabaseConnection,
}

impl PgLedgerStore {
    /// Creates a store over an open pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Opens a transaction, returning the concrete handle.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection could be acquired.
    pub async fn begin_tx(&self) -> StoreResult<PgLedgerTx> {
        let txn = self.db.begin().await.map_err(classify_db_err)?;
        debug!("Transaction opened");
        Ok(PgLedgerTx { txn })
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> StoreResult<Box<dyn LedgerTx>> {
        Ok(Box::new(self.begin_tx().await?))
    }

    async fn create_account(&self, input: NewAccount) -> StoreResult<Account> {
        AccountRepository::new(&self.db)
            .create(input)
            .await
            .map_err(classify_db_err)
    }

    async fn create_transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: i64,
    ) -> StoreResult<Transfer> {
        TransferRepository::new(&self.db)
            .create(from, to, amount)
            .await
            .map_err(classify_db_err)
    }

    async fn create_entry(&self, account_id: AccountId, amount: i64) -> StoreResult<Entry> {
        EntryRepository::new(&self.db)
            .create(account_id, amount)
            .await
            .map_err(classify_db_err)
    }

    async fn adjust_balance(&self, account_id: AccountId, delta: i64) -> StoreResult<Account> {
        AccountRepository::new(&self.db)
            .adjust_balance(account_id, delta)
            .await
            .map_err(classify_db_err)
    }

    async fn get_account(&self, account_id: AccountId) -> StoreResult<Account> {
        AccountRepository::new(&self.db)
            .get(account_id)
            .await
            .map_err(classify_db_err)
    }

    async fn get_transfer(&self, transfer_id: TransferId) -> StoreResult<Transfer> {
        TransferRepository::new(&self.db)
            .get(transfer_id)
            .await
            .map_err(classify_db_err)
    }

    async fn list_transfers(&self, query: TransferQuery) -> StoreResult<Vec<Transfer>> {
        TransferRepository::new(&self.db)
            .list(query)
            .await
            .map_err(classify_db_err)
    }

    async fn list_entries(&self, query: EntryQuery) -> StoreResult<Vec<Entry>> {
        EntryRepository::new(&self.db)
            .list(query)
            .await
            .map_err(classify_db_err)
    }
}

/// An open PostgreSQL transaction.
#[derive(Debug)]
pub struct PgLedgerTx {
    txn: DatabaseTransaction,
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn create_transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: i64,
    ) -> StoreResult<Transfer> {
        TransferRepository::new(&self.txn)
            .create(from, to, amount)
            .await
            .map_err(classify_db_err)
    }

    async fn create_entry(&mut self, account_id: AccountId, amount: i64) -> StoreResult<Entry> {
        EntryRepository::new(&self.txn)
            .create(account_id, amount)
            .await
            .map_err(classify_db_err)
    }

    async fn adjust_balance(&mut self, account_id: AccountId, delta: i64) -> StoreResult<Account> {
        AccountRepository::new(&self.txn)
            .adjust_balance(account_id, delta)
            .await
            .map_err(classify_db_err)
    }

    async fn get_account(&mut self, account_id: AccountId) -> StoreResult<Account> {
        AccountRepository::new(&self.txn)
            .get(account_id)
            .await
            .map_err(classify_db_err)
    }

    async fn list_transfers(&mut self, query: TransferQuery) -> StoreResult<Vec<Transfer>> {
        TransferRepository::new(&self.txn)
            .list(query)
            .await
            .map_err(classify_db_err)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.txn.commit().await.map_err(classify_db_err)?;
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.txn.rollback().await.map_err(classify_db_err)?;
        debug!("Transaction rolled back");
        Ok(())
    }
}

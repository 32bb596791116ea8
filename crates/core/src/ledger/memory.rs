//! In-memory ledger store.
//!
//! Behaves like the PostgreSQL store as far as the transfer engine can tell:
//! - writes inside a transaction are staged and published on commit
//! - ids come from sequences that are consumed even when a transaction rolls
//!   back
//! - `adjust_balance` takes an exclusive row lock held until the transaction
//!   ends, so two transactions locking the same accounts in opposite order
//!   really do block each other
//! - foreign keys, `amount > 0` on transfers and `UNIQUE(owner, currency)` on
//!   accounts are enforced as constraint violations
//!
//! Dropping a [`MemoryTx`] without committing discards its writes and
//! releases its row locks.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tally_shared::types::{AccountId, EntryId, TransferId};
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};

use super::error::StoreError;
use super::store::{LedgerStore, LedgerTx, StoreResult};
use super::types::{Account, Entry, EntryQuery, NewAccount, Transfer, TransferQuery};

#[derive(Debug, Default)]
struct State {
    accounts: BTreeMap<AccountId, Account>,
    entries: Vec<Entry>,
    transfers: Vec<Transfer>,
}

#[derive(Debug)]
struct Inner {
    state: Mutex<State>,
    row_locks: Mutex<HashMap<AccountId, Arc<RowLock<()>>>>,
    account_seq: AtomicI64,
    entry_seq: AtomicI64,
    transfer_seq: AtomicI64,
}

impl Inner {
    fn state(&self) -> StoreResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Other("ledger state lock poisoned".into()))
    }

    fn row_lock(&self, account_id: AccountId) -> StoreResult<Arc<RowLock<()>>> {
        let mut locks = self
            .row_locks
            .lock()
            .map_err(|_| StoreError::Other("row lock table poisoned".into()))?;
        Ok(Arc::clone(locks.entry(account_id).or_default()))
    }
}

/// Next value of a sequence, starting at 1.
fn next_id(seq: &AtomicI64) -> i64 {
    seq.fetch_add(1, Ordering::Relaxed) + 1
}

fn page<T: Clone>(rows: impl Iterator<Item = T>, limit: u64, offset: u64) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    rows.skip(offset).take(limit).collect()
}

fn sorted_transfers<'a>(rows: impl Iterator<Item = &'a Transfer>) -> Vec<Transfer> {
    let mut rows: Vec<Transfer> = rows.cloned().collect();
    rows.sort_by_key(|t| (t.created_at, t.id));
    rows
}

/// In-memory implementation of [`LedgerStore`].
///
/// Cloning shares the underlying ledger.
#[derive(Debug, Clone)]
pub struct MemoryLedgerStore {
    inner: Arc<Inner>,
}

impl Default for MemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedgerStore {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                row_locks: Mutex::new(HashMap::new()),
                account_seq: AtomicI64::new(0),
                entry_seq: AtomicI64::new(0),
                transfer_seq: AtomicI64::new(0),
            }),
        }
    }

    /// Opens a transaction without boxing it.
    #[must_use]
    pub fn begin_tx(&self) -> MemoryTx {
        MemoryTx {
            inner: Arc::clone(&self.inner),
            balances: HashMap::new(),
            entries: Vec::new(),
            transfers: Vec::new(),
            row_guards: HashMap::new(),
        }
    }

    /// Number of committed transfers.
    pub fn transfer_count(&self) -> StoreResult<usize> {
        Ok(self.inner.state()?.transfers.len())
    }

    /// Number of committed entries.
    pub fn entry_count(&self) -> StoreResult<usize> {
        Ok(self.inner.state()?.entries.len())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn begin(&self) -> StoreResult<Box<dyn LedgerTx>> {
        Ok(Box::new(self.begin_tx()))
    }

    async fn create_account(&self, input: NewAccount) -> StoreResult<Account> {
        let mut state = self.inner.state()?;

        let duplicate = state
            .accounts
            .values()
            .any(|a| a.owner == input.owner && a.currency == input.currency);
        if duplicate {
            return Err(StoreError::ConstraintViolation(format!(
                "accounts_owner_currency_key: ({}, {})",
                input.owner, input.currency
            )));
        }

        let account = Account {
            id: AccountId::new(next_id(&self.inner.account_seq)),
            owner: input.owner,
            balance: input.balance,
            currency: input.currency,
            created_at: Utc::now(),
        };
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn create_transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: i64,
    ) -> StoreResult<Transfer> {
        let mut tx = self.begin_tx();
        let transfer = tx.create_transfer(from, to, amount).await?;
        Box::new(tx).commit().await?;
        Ok(transfer)
    }

    async fn create_entry(&self, account_id: AccountId, amount: i64) -> StoreResult<Entry> {
        let mut tx = self.begin_tx();
        let entry = tx.create_entry(account_id, amount).await?;
        Box::new(tx).commit().await?;
        Ok(entry)
    }

    async fn adjust_balance(&self, account_id: AccountId, delta: i64) -> StoreResult<Account> {
        let mut tx = self.begin_tx();
        let account = tx.adjust_balance(account_id, delta).await?;
        Box::new(tx).commit().await?;
        Ok(account)
    }

    async fn get_account(&self, account_id: AccountId) -> StoreResult<Account> {
        self.inner
            .state()?
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("account {account_id}")))
    }

    async fn get_transfer(&self, transfer_id: TransferId) -> StoreResult<Transfer> {
        self.inner
            .state()?
            .transfers
            .iter()
            .find(|t| t.id == transfer_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("transfer {transfer_id}")))
    }

    async fn list_transfers(&self, query: TransferQuery) -> StoreResult<Vec<Transfer>> {
        let state = self.inner.state()?;
        let rows = sorted_transfers(state.transfers.iter().filter(|t| query.matches(t)));
        Ok(page(rows.into_iter(), query.limit, query.offset))
    }

    async fn list_entries(&self, query: EntryQuery) -> StoreResult<Vec<Entry>> {
        let state = self.inner.state()?;
        let mut rows: Vec<Entry> = state
            .entries
            .iter()
            .filter(|e| e.account_id == query.account_id)
            .cloned()
            .collect();
        rows.sort_by_key(|e| (e.created_at, e.id));
        Ok(page(rows.into_iter(), query.limit, query.offset))
    }
}

/// An open transaction on a [`MemoryLedgerStore`].
#[derive(Debug)]
pub struct MemoryTx {
    inner: Arc<Inner>,
    balances: HashMap<AccountId, i64>,
    entries: Vec<Entry>,
    transfers: Vec<Transfer>,
    row_guards: HashMap<AccountId, OwnedMutexGuard<()>>,
}

impl MemoryTx {
    /// Waits for the account's row lock unless this transaction holds it.
    async fn lock_row(&mut self, account_id: AccountId) -> StoreResult<()> {
        if self.row_guards.contains_key(&account_id) {
            return Ok(());
        }
        let lock = self.inner.row_lock(account_id)?;
        let guard = lock.lock_owned().await;
        self.row_guards.insert(account_id, guard);
        Ok(())
    }

    fn require_account(state: &State, account_id: AccountId, constraint: &str) -> StoreResult<()> {
        if state.accounts.contains_key(&account_id) {
            Ok(())
        } else {
            Err(StoreError::ConstraintViolation(format!(
                "{constraint}: account {account_id} does not exist"
            )))
        }
    }

    fn visible_account(&self, state: &State, account_id: AccountId) -> StoreResult<Account> {
        let mut account = state
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("account {account_id}")))?;
        if let Some(&balance) = self.balances.get(&account_id) {
            account.balance = balance;
        }
        Ok(account)
    }
}

#[async_trait]
impl LedgerTx for MemoryTx {
    async fn create_transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: i64,
    ) -> StoreResult<Transfer> {
        if amount <= 0 {
            return Err(StoreError::ConstraintViolation(format!(
                "transfers_amount_check: amount {amount} must be positive"
            )));
        }
        {
            let state = self.inner.state()?;
            Self::require_account(&state, from, "transfers_from_account_id_fkey")?;
            Self::require_account(&state, to, "transfers_to_account_id_fkey")?;
        }

        let transfer = Transfer {
            id: TransferId::new(next_id(&self.inner.transfer_seq)),
            from_account_id: from,
            to_account_id: to,
            amount,
            created_at: Utc::now(),
        };
        self.transfers.push(transfer.clone());
        Ok(transfer)
    }

    async fn create_entry(&mut self, account_id: AccountId, amount: i64) -> StoreResult<Entry> {
        {
            let state = self.inner.state()?;
            Self::require_account(&state, account_id, "entries_account_id_fkey")?;
        }

        let entry = Entry {
            id: EntryId::new(next_id(&self.inner.entry_seq)),
            account_id,
            amount,
            created_at: Utc::now(),
        };
        self.entries.push(entry.clone());
        Ok(entry)
    }

    async fn adjust_balance(&mut self, account_id: AccountId, delta: i64) -> StoreResult<Account> {
        self.lock_row(account_id).await?;

        let mut account = {
            let state = self.inner.state()?;
            self.visible_account(&state, account_id)?
        };
        account.balance = account.balance.checked_add(delta).ok_or_else(|| {
            StoreError::ConstraintViolation(format!(
                "balance of account {account_id} out of range"
            ))
        })?;

        self.balances.insert(account_id, account.balance);
        Ok(account)
    }

    async fn get_account(&mut self, account_id: AccountId) -> StoreResult<Account> {
        let state = self.inner.state()?;
        self.visible_account(&state, account_id)
    }

    async fn list_transfers(&mut self, query: TransferQuery) -> StoreResult<Vec<Transfer>> {
        let state = self.inner.state()?;
        let rows = sorted_transfers(
            state
                .transfers
                .iter()
                .chain(self.transfers.iter())
                .filter(|t| query.matches(t)),
        );
        Ok(page(rows.into_iter(), query.limit, query.offset))
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let mut state = self.inner.state()?;

        for (account_id, balance) in &self.balances {
            let account = state
                .accounts
                .get_mut(account_id)
                .ok_or_else(|| StoreError::NotFound(format!("account {account_id}")))?;
            account.balance = *balance;
        }
        state.transfers.extend(self.transfers.iter().cloned());
        state.entries.extend(self.entries.iter().cloned());

        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

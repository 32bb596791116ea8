//! Ledger domain types.
//!
//! Amounts are signed 64-bit integers in the smallest currency unit. Entries
//! use the sign for direction: positive credits the account, negative debits
//! it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, Currency, EntryId, PageRequest, TransferId};

/// A balance-holding account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Owner reference (resolved upstream).
    pub owner: String,
    /// Current balance in the smallest currency unit.
    pub balance: i64,
    /// Currency the balance is denominated in.
    pub currency: Currency,
    /// When the account was opened.
    pub created_at: DateTime<Utc>,
}

/// An immutable record of a single balance change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Entry ID.
    pub id: EntryId,
    /// Account the change applies to.
    pub account_id: AccountId,
    /// Signed amount: positive is a credit, negative a debit.
    pub amount: i64,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
}

/// An immutable record of a directed movement between two accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Transfer ID.
    pub id: TransferId,
    /// Source account.
    pub from_account_id: AccountId,
    /// Destination account.
    pub to_account_id: AccountId,
    /// Amount moved, always positive.
    pub amount: i64,
    /// When the transfer was recorded.
    pub created_at: DateTime<Utc>,
}

/// Input for opening an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    /// Owner reference.
    pub owner: String,
    /// Account currency.
    pub currency: Currency,
    /// Opening balance.
    pub balance: i64,
}

/// Query for listing transfers.
///
/// Matches transfers leaving `from_account_id` or arriving at
/// `to_account_id`, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferQuery {
    /// Source account to match.
    pub from_account_id: AccountId,
    /// Destination account to match.
    pub to_account_id: AccountId,
    /// Maximum number of rows.
    pub limit: u64,
    /// Rows to skip.
    pub offset: u64,
}

impl TransferQuery {
    /// Builds a query for one page of transfers between two accounts.
    #[must_use]
    pub fn page(from_account_id: AccountId, to_account_id: AccountId, page: PageRequest) -> Self {
        Self {
            from_account_id,
            to_account_id,
            limit: page.limit(),
            offset: page.offset(),
        }
    }

    /// Returns true if `transfer` satisfies the query's account filter.
    #[must_use]
    pub fn matches(&self, transfer: &Transfer) -> bool {
        transfer.from_account_id == self.from_account_id
            || transfer.to_account_id == self.to_account_id
    }
}

/// Query for listing the entries of one account, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryQuery {
    /// Account whose entries to list.
    pub account_id: AccountId,
    /// Maximum number of rows.
    pub limit: u64,
    /// Rows to skip.
    pub offset: u64,
}

impl EntryQuery {
    /// Builds a query for one page of an account's entries.
    #[must_use]
    pub fn page(account_id: AccountId, page: PageRequest) -> Self {
        Self {
            account_id,
            limit: page.limit(),
            offset: page.offset(),
        }
    }
}

/// A transfer request that passed validation.
///
/// Only [`crate::ledger::TransferValidator`] constructs these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedTransfer {
    pub(crate) from_account_id: AccountId,
    pub(crate) to_account_id: AccountId,
    pub(crate) amount: i64,
}

impl ValidatedTransfer {
    /// Source account.
    #[must_use]
    pub const fn from_account_id(&self) -> AccountId {
        self.from_account_id
    }

    /// Destination account.
    #[must_use]
    pub const fn to_account_id(&self) -> AccountId {
        self.to_account_id
    }

    /// Amount to move.
    #[must_use]
    pub const fn amount(&self) -> i64 {
        self.amount
    }
}

/// Everything one committed transfer wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    /// The transfer record.
    pub transfer: Transfer,
    /// Source account after the debit.
    pub from_account: Account,
    /// Destination account after the credit.
    pub to_account: Account,
    /// Debit entry on the source account.
    pub from_entry: Entry,
    /// Credit entry on the destination account.
    pub to_entry: Entry,
}

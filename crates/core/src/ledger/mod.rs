//! Double-entry transfer engine.
//!
//! This module implements the core ledger functionality:
//! - Domain types for accounts, entries and transfers
//! - The storage contract (`LedgerStore`, `LedgerTx`) and a scoped
//!   transaction helper
//! - Request validation
//! - Deadlock-free balance update ordering
//! - The transfer service
//! - An in-memory store

pub mod error;
pub mod memory;
pub mod ordering;
pub mod service;
pub mod store;
pub mod types;
pub mod validation;

#[cfg(test)]
mod ordering_props;

pub use error::{StoreError, TransferError, ValidationError};
pub use memory::{MemoryLedgerStore, MemoryTx};
pub use ordering::BalanceAdjustment;
pub use service::TransferService;
pub use store::{LedgerStore, LedgerTx, StoreResult, execute_in_transaction};
pub use types::{
    Account, Entry, EntryQuery, NewAccount, Transfer, TransferQuery, TransferResult,
    ValidatedTransfer,
};
pub use validation::TransferValidator;

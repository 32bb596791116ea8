//! Core business logic for Tally.
//!
//! This crate contains the transfer engine with ZERO web or database driver
//! dependencies. Storage is reached through the `ledger::LedgerStore` trait;
//! `tally-db` implements it on PostgreSQL and `ledger::memory` implements it
//! in process.
//!
//! # Modules
//!
//! - `ledger` - Accounts, entries, transfers and the transfer engine

pub mod ledger;

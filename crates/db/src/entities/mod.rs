//! `SeaORM` entities for the ledger tables.

pub mod accounts;
pub mod entries;
pub mod transfers;

//! Repository abstractions for data access.
//!
//! Repositories borrow any `ConnectionTrait` implementor, so the same
//! queries run on the pool or inside an open `DatabaseTransaction`.

pub mod account;
pub mod entry;
pub mod transfer;

pub use account::AccountRepository;
pub use entry::EntryRepository;
pub use transfer::TransferRepository;

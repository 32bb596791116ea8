//! Ledger error types.
//!
//! Three layers:
//! - [`StoreError`] is what a storage backend reports for a single primitive.
//! - [`ValidationError`] rejects a malformed request before any transaction
//!   is opened.
//! - [`TransferError`] is what callers of the transfer engine see.

use tally_shared::AppError;
use tally_shared::types::{AccountId, Currency};
use thiserror::Error;

/// Failure of a single storage primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The referenced row does not exist.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A uniqueness, foreign-key or check constraint rejected the write.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// The connection to the store failed or could not be acquired.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Any other storage failure.
    #[error("Storage error: {0}")]
    Other(String),
}

impl StoreError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            Self::Connection(_) => "CONNECTION_ERROR",
            Self::Other(_) => "STORAGE_ERROR",
        }
    }
}

/// A transfer request that can never succeed as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Source and destination are the same account.
    #[error("Cannot transfer from account {0} to itself")]
    SelfTransfer(AccountId),

    /// Amount is zero or negative.
    #[error("Transfer amount must be positive, got {0}")]
    NonPositiveAmount(i64),

    /// The two accounts hold different currencies.
    #[error("Currency mismatch: source account is {from}, destination account is {to}")]
    CurrencyMismatch {
        /// Source account currency.
        from: Currency,
        /// Destination account currency.
        to: Currency,
    },
}

impl ValidationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::SelfTransfer(_) => "SELF_TRANSFER",
            Self::NonPositiveAmount(_) => "INVALID_AMOUNT",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
        }
    }
}

/// Errors surfaced by the transfer engine.
///
/// Every variant is returned only after the transaction, if one was opened,
/// has been rolled back. `Rollback` is the exception: the rollback itself
/// failed and the connection must not be reused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// The request is malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A referenced account does not exist.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// The store failed while executing the transfer.
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// Rolling back after `cause` failed as well.
    #[error("Transaction error: {cause}; rollback error: {rollback}")]
    Rollback {
        /// The error that triggered the rollback.
        cause: Box<TransferError>,
        /// The error the rollback itself returned.
        rollback: StoreError,
    },
}

impl TransferError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.code(),
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::Persistence(e) => e.code(),
            Self::Rollback { .. } => "ROLLBACK_FAILED",
        }
    }

    /// Returns true if the caller may retry the same request unchanged.
    ///
    /// Only connection failures qualify; the engine itself never retries.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(StoreError::Connection(_)))
    }
}

impl From<TransferError> for AppError {
    fn from(err: TransferError) -> Self {
        match &err {
            TransferError::Validation(_) => Self::Validation(err.to_string()),
            TransferError::AccountNotFound(_) | TransferError::Persistence(StoreError::NotFound(_)) => {
                Self::NotFound(err.to_string())
            }
            TransferError::Persistence(StoreError::ConstraintViolation(_)) => {
                Self::Conflict(err.to_string())
            }
            TransferError::Persistence(_) => Self::Database(err.to_string()),
            TransferError::Rollback { .. } => Self::Internal(err.to_string()),
        }
    }
}

//! Mapping from `DbErr` to the ledger's storage error classes.

use sea_orm::{DbErr, RuntimeErr};
use tally_core::ledger::StoreError;

/// SQLSTATE class for integrity constraint violations.
const INTEGRITY_CONSTRAINT_CLASS: &str = "23";

/// SQLSTATE for a value outside the column type's range.
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// Classifies a database error.
///
/// - `RecordNotFound` maps to `NotFound`
/// - SQLSTATE class 23 and numeric overflow map to `ConstraintViolation`
/// - connection and pool failures map to `Connection`
/// - everything else maps to `Other`
pub fn classify_db_err(err: DbErr) -> StoreError {
    match &err {
        DbErr::RecordNotFound(msg) => return StoreError::NotFound(msg.clone()),
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => {
            return StoreError::Connection(err.to_string());
        }
        DbErr::Exec(runtime) | DbErr::Query(runtime) => {
            if let Some(classified) = classify_runtime(runtime, err.to_string()) {
                return classified;
            }
        }
        _ => {}
    }

    StoreError::Other(err.to_string())
}

fn classify_runtime(runtime: &RuntimeErr, message: String) -> Option<StoreError> {
    let RuntimeErr::SqlxError(source) = runtime else {
        return None;
    };
    let source: &sqlx::Error = source;

    match source {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code()?;
            if code.starts_with(INTEGRITY_CONSTRAINT_CLASS) || code == NUMERIC_VALUE_OUT_OF_RANGE {
                Some(StoreError::ConstraintViolation(message))
            } else {
                None
            }
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => Some(StoreError::Connection(message)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::ConnAcquireErr;

    use super::*;

    #[test]
    fn test_record_not_found() {
        let err = classify_db_err(DbErr::RecordNotFound("account 9".to_string()));
        assert_eq!(err, StoreError::NotFound("account 9".to_string()));
    }

    #[test]
    fn test_connection_errors() {
        let err = classify_db_err(DbErr::Conn(RuntimeErr::Internal("reset".to_string())));
        assert!(matches!(err, StoreError::Connection(_)));

        let err = classify_db_err(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout));
        assert!(matches!(err, StoreError::Connection(_)));
    }

    #[test]
    fn test_pool_timeout_during_query() {
        let err = classify_db_err(DbErr::Query(RuntimeErr::SqlxError(
            sqlx::Error::PoolTimedOut.into(),
        )));
        assert!(matches!(err, StoreError::Connection(_)));
        assert!(err.to_string().starts_with("Connection error"));
    }

    #[test]
    fn test_everything_else_is_other() {
        let err = classify_db_err(DbErr::Custom("boom".to_string()));
        assert!(matches!(err, StoreError::Other(_)));

        let err = classify_db_err(DbErr::Exec(RuntimeErr::Internal("bad".to_string())));
        assert!(matches!(err, StoreError::Other(_)));
    }
}

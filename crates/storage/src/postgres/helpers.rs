//! Shared helpers for the PostgreSQL adapter.

use gazette_core::error::StorageError;

/// Classify a sqlx error into the storage taxonomy.
///
/// Pool acquisition timeouts surface as `Timeout`, transport failures as
/// `ConnectionError`; everything else is a query error. Callers decide
/// nothing based on the message, only on the variant.
pub(crate) fn storage_err(e: sqlx::Error) -> StorageError {
    match e {
        sqlx::Error::PoolTimedOut => {
            StorageError::Timeout("connection acquisition timed out".into())
        }
        sqlx::Error::PoolClosed => StorageError::ConnectionError("pool closed".into()),
        sqlx::Error::Io(e) => StorageError::ConnectionError(e.to_string()),
        other => StorageError::QueryError(other.to_string()),
    }
}

/// Bind a list of [`SqlValue`]s onto a sqlx query in order.
///
/// Works for `query`, `query_as` and `query_scalar` alike, which share
/// a `bind` method but no common trait.
macro_rules! bind_values {
    ($query:expr, $values:expr) => {{
        let mut q = $query;
        for v in $values {
            q = match v {
                $crate::postgres::keyset::SqlValue::BigInt(n) => q.bind(*n),
                $crate::postgres::keyset::SqlValue::Text(s) => q.bind(s.clone()),
            };
        }
        q
    }};
}

pub(crate) use bind_values;

#[cfg(test)]
mod tests {
    use super::*;

    // Test critique: un timeout d'acquisition est classé Timeout,
    // pas QueryError (le GraphQL ne doit pas le rapporter pareil)
    #[test]
    fn test_pool_timeout_classification() {
        let err = storage_err(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StorageError::Timeout(_)));

        let err = storage_err(sqlx::Error::RowNotFound);
        assert!(matches!(err, StorageError::QueryError(_)));
    }
}

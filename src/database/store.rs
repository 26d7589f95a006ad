use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Column/value pairs handed to the storage provider
pub type Fields = Map<String, Value>;

const MAX_DETAIL_LEN: usize = 200;

/// Failures reported by a storage provider for a single operation
#[derive(Debug, Error)]
pub enum StoreError {
    /// The provider refused the write (constraint, permission, bad value)
    #[error("{0}")]
    Rejected(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("malformed storage response: {0}")]
    Malformed(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl StoreError {
    /// Short diagnostic that is safe to hand back to an API caller
    pub fn client_detail(&self) -> String {
        match self {
            StoreError::Rejected(msg) => short_detail(msg),
            StoreError::Unavailable(_) => "storage unavailable".to_string(),
            StoreError::Malformed(_) => "storage returned an unexpected response".to_string(),
            StoreError::InvalidIdentifier(_) => "storage rejected the request".to_string(),
        }
    }
}

/// First line of a provider message, capped in length
pub fn short_detail(message: &str) -> String {
    let line = message.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    if line.is_empty() {
        return "storage error".to_string();
    }
    if line.chars().count() <= MAX_DETAIL_LEN {
        return line.to_string();
    }
    let mut cut: String = line.chars().take(MAX_DETAIL_LEN - 3).collect();
    cut.push_str("...");
    cut
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => StoreError::Rejected(db_err.message().to_string()),
            sqlx::Error::RowNotFound | sqlx::Error::ColumnNotFound(_) | sqlx::Error::ColumnDecode { .. } => {
                StoreError::Malformed(err.to_string())
            }
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Insert contract of the storage provider.
///
/// `insert` returns the stored record when the provider echoes one back,
/// `None` when it accepted the write without returning a row.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, table: &str, fields: Fields) -> Result<Option<Value>, StoreError>;

    /// Connectivity probe used by the health endpoint
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_detail_is_passed_through() {
        let err = StoreError::Rejected("constraint violated".to_string());
        assert_eq!(err.client_detail(), "constraint violated");
    }

    #[test]
    fn internal_failures_get_generic_details() {
        let err = StoreError::Unavailable("PoolTimedOut at src/pool.rs:42".to_string());
        assert_eq!(err.client_detail(), "storage unavailable");
        let err = StoreError::Malformed("ColumnDecode { index: \"record\" }".to_string());
        assert!(!err.client_detail().contains("ColumnDecode"));
    }

    #[test]
    fn short_detail_keeps_first_line_and_caps_length() {
        assert_eq!(short_detail("boom\n   at frame 1\n   at frame 2"), "boom");
        assert_eq!(short_detail("\n\n  "), "storage error");

        let long = "x".repeat(500);
        let detail = short_detail(&long);
        assert_eq!(detail.chars().count(), MAX_DETAIL_LEN);
        assert!(detail.ends_with("..."));
    }

    #[test]
    fn database_errors_map_to_categories() {
        assert!(matches!(StoreError::from(sqlx::Error::RowNotFound), StoreError::Malformed(_)));
        assert!(matches!(StoreError::from(sqlx::Error::PoolTimedOut), StoreError::Unavailable(_)));
    }
}

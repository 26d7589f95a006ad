use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row};

use super::manager::DatabaseManager;
use super::store::{Fields, RecordStore, StoreError};

/// PostgreSQL-backed record store
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build `INSERT ... RETURNING to_jsonb(row)` for the given columns
    fn insert_sql<'a>(table: &str, columns: impl IntoIterator<Item = &'a String>) -> Result<String, StoreError> {
        if !DatabaseManager::is_valid_identifier(table) {
            return Err(StoreError::InvalidIdentifier(table.to_string()));
        }

        let mut quoted = Vec::new();
        for column in columns {
            if !DatabaseManager::is_valid_identifier(column) {
                return Err(StoreError::InvalidIdentifier(column.clone()));
            }
            quoted.push(DatabaseManager::quote_identifier(column));
        }

        let table = DatabaseManager::quote_identifier(table);
        if quoted.is_empty() {
            return Ok(format!(
                "INSERT INTO {} AS t DEFAULT VALUES RETURNING to_jsonb(t) AS record",
                table
            ));
        }

        let placeholders: Vec<String> = (1..=quoted.len()).map(|i| format!("${}", i)).collect();
        Ok(format!(
            "INSERT INTO {} AS t ({}) VALUES ({}) RETURNING to_jsonb(t) AS record",
            table,
            quoted.join(", "),
            placeholders.join(", ")
        ))
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(&self, table: &str, fields: Fields) -> Result<Option<Value>, StoreError> {
        let sql = Self::insert_sql(table, fields.keys())?;

        let mut query = sqlx::query(&sql);
        for value in fields.values() {
            query = match value {
                Value::String(s) => query.bind(s.clone()),
                Value::Null => query.bind(Option::<String>::None),
                other => query.bind(sqlx::types::Json(other.clone())),
            };
        }

        let row = query.fetch_optional(&self.pool).await.map_err(|e| {
            tracing::error!(table, "insert failed: {}", e);
            StoreError::from(e)
        })?;

        match row {
            Some(row) => row
                .try_get::<Value, _>("record")
                .map(Some)
                .map_err(StoreError::from),
            None => Ok(None),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn builds_insert_with_numbered_placeholders() {
        let cols = columns(&["title", "content", "owner_id"]);
        let sql = PgRecordStore::insert_sql("pages", &cols).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO \"pages\" AS t (\"title\", \"content\", \"owner_id\") VALUES ($1, $2, $3) RETURNING to_jsonb(t) AS record"
        );
    }

    #[test]
    fn empty_column_list_uses_default_values() {
        let sql = PgRecordStore::insert_sql("pages", &Vec::<String>::new()).unwrap();
        assert!(sql.contains("DEFAULT VALUES"));
    }

    #[test]
    fn refuses_unsafe_identifiers() {
        let cols = columns(&["title"]);
        assert!(matches!(
            PgRecordStore::insert_sql("pages; --", &cols),
            Err(StoreError::InvalidIdentifier(_))
        ));

        let cols = columns(&["title", "owner\" = 'x"]);
        assert!(matches!(
            PgRecordStore::insert_sql("pages", &cols),
            Err(StoreError::InvalidIdentifier(_))
        ));
    }
}

pub mod manager;
pub mod pg_store;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use pg_store::PgRecordStore;
pub use store::{Fields, RecordStore, StoreError};

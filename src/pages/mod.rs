//! Page creation: typed input, owner stamping and the authenticated write path.

pub mod handler;
pub mod request;

pub use handler::{PageCreationHandler, PageOutcome, PageSettings, PAGES_TABLE};
pub use request::{PageCreateRequest, PageRecord, ValidationError, ValidationPolicy};

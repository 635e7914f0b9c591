//! Elasticsearch loader and `movies` index schema.
//!
//! `loader` submits bulk upserts; `schema` holds the index mapping and a
//! one-shot bootstrap operation.

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{LoadError, SchemaError};
pub use loader::{DocError, Loader, LoadOutcome};
pub use schema::{create_index_if_missing, index_body, INDEX_NAME};

//! Postgres extractor and file-backed checkpoint store.
//!
//! `extractor` runs the keyset-paginated join query; `checkpoint` holds
//! the durable high-water mark the extractor resumes from.

pub mod checkpoint;
pub mod error;
pub mod extractor;

pub use checkpoint::CheckpointStore;
pub use error::{CheckpointError, ExtractError};
pub use extractor::{Extractor, Page};

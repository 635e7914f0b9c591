//! Shared types and utilities for the filmsync pipeline.
//!
//! `model` holds the raw/target record shapes moved between the
//! extractor, transformer and loader. `config` builds the process-wide
//! settings record from the environment. `retry` is the backoff harness
//! reused by the database and index clients.

pub mod config;
pub mod model;
pub mod retry;

pub use config::Settings;
pub use model::{Checkpoint, DocPerson, FilmDocument, Genre, Participant, RawFilm};

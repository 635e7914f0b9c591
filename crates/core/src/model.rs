//! Record shapes moving through the pipeline.
//!
//! `RawFilm` is what the extractor produces from the relational join;
//! `FilmDocument` is what the loader submits to the search index. The
//! transformer is the pure mapping between the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// High-water-mark timestamp the pipeline resumes from.
///
pub type Checkpoint = DateTime<Utc>;

/// The smallest representable checkpoint, used when no state has been persisted yet.
pub const MIN_CHECKPOINT: Checkpoint = DateTime::<Utc>::MIN_UTC;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
  pub id: Uuid,
  pub name: String,
}

/// A director/actor/writer row as it comes off the join.
///
/// `id` and `name` are independently nullable in the source aggregates,
/// so both are optional here; the transformer decides what survives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
  pub id: Option<Uuid>,
  pub name: Option<String>,
}

/// One film joined with its genres and role-partitioned participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFilm {
  pub id: Uuid,
  pub title: Option<String>,
  pub description: Option<String>,
  pub imdb_rating: Option<f64>,
  pub modified: DateTime<Utc>,
  #[serde(default)]
  pub genres: Vec<Genre>,
  #[serde(default)]
  pub directors: Vec<Participant>,
  #[serde(default)]
  pub actors: Vec<Participant>,
  #[serde(default)]
  pub writers: Vec<Participant>,
  #[serde(default)]
  pub directors_names: Vec<Option<String>>,
  #[serde(default)]
  pub actors_names: Vec<Option<String>>,
  #[serde(default)]
  pub writers_names: Vec<Option<String>>,
}

/// A participant as it's stored in the index: both fields present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocPerson {
  pub id: String,
  pub name: String,
}

/// The denormalized search document, keyed by `id` in the `movies` index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmDocument {
  pub id: String,
  pub title: String,
  pub imdb_rating: f64,
  pub description: String,
  pub genres: Vec<String>,
  pub directors: Vec<DocPerson>,
  pub actors: Vec<DocPerson>,
  pub writers: Vec<DocPerson>,
  pub directors_names: Vec<String>,
  pub actors_names: Vec<String>,
  pub writers_names: Vec<String>,
}

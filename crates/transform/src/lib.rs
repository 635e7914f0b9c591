//! Pure `RawFilm` → `FilmDocument` mapping.
//!
//! No I/O, no async: every rule here is deterministic and restartable,
//! so replaying the same raw record always produces the same document.

use filmsync_core::model::{DocPerson, FilmDocument, Participant, RawFilm};

const NAME_SENTINEL: &str = "N/A";

/// Map one raw film row into its search document.
pub fn transform(raw: RawFilm) -> FilmDocument {
  FilmDocument {
    id: raw.id.to_string(),
    title: raw.title.unwrap_or_default(),
    imdb_rating: raw.imdb_rating.unwrap_or(0.0),
    description: raw.description.unwrap_or_default(),
    genres: raw.genres.into_iter().map(|g| g.name).collect(),
    directors: participants(raw.directors),
    actors: participants(raw.actors),
    writers: participants(raw.writers),
    directors_names: names(raw.directors_names),
    actors_names: names(raw.actors_names),
    writers_names: names(raw.writers_names),
  }
}

/// Map a lazily-produced sequence of raw records into documents,
/// one-per-input-record, preserving order.
pub fn transform_all(raws: impl IntoIterator<Item = RawFilm>) -> impl Iterator<Item = FilmDocument> {
  raws.into_iter().map(transform)
}

fn participants(raw: Vec<Participant>) -> Vec<DocPerson> {
  raw
    .into_iter()
    .filter_map(|p| {
      let id = p.id?;
      Some(DocPerson {
        id: id.to_string(),
        name: p.name.unwrap_or_default(),
      })
    })
    .collect()
}

fn names(raw: Vec<Option<String>>) -> Vec<String> {
  raw
    .into_iter()
    .flatten()
    .filter(|name| !name.is_empty() && name != NAME_SENTINEL)
    .collect()
}

//! Keyset-paginated extractor over the film/genre/person join.
//!
//! One row per film, genres and role-partitioned participants aggregated
//! as JSON arrays (deduplicated by id), plus parallel name-only arrays
//! with nulls left in place for the transformer to strip.

use crate::error::ExtractError;
use filmsync_core::config::Settings;
use filmsync_core::model::{Checkpoint, Genre, Participant, RawFilm};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use uuid::Uuid;

const QUERY: &str = r#"
SELECT
    fw.id,
    fw.title,
    fw.description,
    fw.rating::double precision AS imdb_rating,
    fw.modified,
    COALESCE(
        json_agg(DISTINCT jsonb_build_object('id', g.id, 'name', g.name))
        FILTER (WHERE g.id IS NOT NULL),
        '[]'
    ) AS genres,
    COALESCE(
        json_agg(DISTINCT jsonb_build_object('id', p.id, 'name', p.full_name))
        FILTER (WHERE pfw.role = 'director'),
        '[]'
    ) AS directors,
    COALESCE(
        json_agg(DISTINCT jsonb_build_object('id', p.id, 'name', p.full_name))
        FILTER (WHERE pfw.role = 'actor'),
        '[]'
    ) AS actors,
    COALESCE(
        json_agg(DISTINCT jsonb_build_object('id', p.id, 'name', p.full_name))
        FILTER (WHERE pfw.role = 'writer'),
        '[]'
    ) AS writers,
    array_remove(
        array_agg(DISTINCT p.full_name)
        FILTER (WHERE pfw.role = 'director'),
        NULL
    ) AS directors_names,
    array_remove(
        array_agg(DISTINCT p.full_name)
        FILTER (WHERE pfw.role = 'actor'),
        NULL
    ) AS actors_names,
    array_remove(
        array_agg(DISTINCT p.full_name)
        FILTER (WHERE pfw.role = 'writer'),
        NULL
    ) AS writers_names
FROM film_work fw
LEFT JOIN genre_film_work gfw ON fw.id = gfw.film_work_id
LEFT JOIN genre g ON gfw.genre_id = g.id
LEFT JOIN person_film_work pfw ON fw.id = pfw.film_work_id
LEFT JOIN person p ON pfw.person_id = p.id
WHERE fw.modified > $1
GROUP BY fw.id, fw.modified
ORDER BY fw.modified, fw.id
LIMIT $2
"#;

#[derive(Debug, sqlx::FromRow)]
struct FilmRow {
  id: Uuid,
  title: Option<String>,
  description: Option<String>,
  imdb_rating: Option<f64>,
  modified: Checkpoint,
  genres: serde_json::Value,
  directors: serde_json::Value,
  actors: serde_json::Value,
  writers: serde_json::Value,
  directors_names: Option<Vec<Option<String>>>,
  actors_names: Option<Vec<Option<String>>>,
  writers_names: Option<Vec<Option<String>>>,
}

impl FilmRow {
  fn into_raw_film(self) -> Result<RawFilm, ExtractError> {
    Ok(RawFilm {
      id: self.id,
      title: self.title,
      description: self.description,
      imdb_rating: self.imdb_rating,
      modified: self.modified,
      genres: serde_json::from_value::<Vec<Genre>>(self.genres)?,
      directors: serde_json::from_value::<Vec<Participant>>(self.directors)?,
      actors: serde_json::from_value::<Vec<Participant>>(self.actors)?,
      writers: serde_json::from_value::<Vec<Participant>>(self.writers)?,
      directors_names: self.directors_names.unwrap_or_default(),
      actors_names: self.actors_names.unwrap_or_default(),
      writers_names: self.writers_names.unwrap_or_default(),
    })
  }
}

/// A non-empty page of raw film records and the checkpoint value it
/// advances the store to once the page has been fully loaded.
pub struct Page {
  pub records: Vec<RawFilm>,
  pub max_modified: Checkpoint,
}

pub struct Extractor {
  pool: PgPool,
  batch_size: i64,
}

impl Extractor {
  pub fn new(pool: PgPool, batch_size: i64) -> Self {
    Self { pool, batch_size }
  }

  /// Open a connection pool, retrying connection-class failures with
  /// exponential backoff per the configured retry budget.
  pub async fn connect(settings: &Settings) -> Result<PgPool, ExtractError> {
    let options = PgConnectOptions::new()
      .host(&settings.postgres_host)
      .port(settings.postgres_port)
      .username(&settings.postgres_user)
      .password(&settings.postgres_password)
      .database(&settings.postgres_db);

    filmsync_core::retry::retry_connect(settings.retry, || {
      let options = options.clone();
      async move {
        PgPoolOptions::new()
          .max_connections(5)
          .acquire_timeout(settings.connect_timeout)
          .connect_with(options)
          .await
          .map_err(classify_sqlx_error)
      }
    })
    .await
    .map_err(ExtractError::Connection)
  }

  /// Fetch the next page of rows whose `modified > after`, or `None` once
  /// the source has no further matching rows.
  pub async fn fetch_page(&self, after: Checkpoint) -> Result<Option<Page>, ExtractError> {
    let rows: Vec<FilmRow> = sqlx::query_as(QUERY)
      .bind(after)
      .bind(self.batch_size)
      .fetch_all(&self.pool)
      .await
      .map_err(|e| match classify_sqlx_error(e) {
        backoff::Error::Transient { err, .. } => ExtractError::Connection(err),
        backoff::Error::Permanent(err) => ExtractError::Query(err),
      })?;

    if rows.is_empty() {
      return Ok(None);
    }

    let max_modified = rows.iter().map(|r| r.modified).max().expect("checked non-empty above");
    let records = rows.into_iter().map(FilmRow::into_raw_film).collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Page { records, max_modified }))
  }
}

/// Connection-class failures (pool exhaustion, I/O, TLS, timeouts) are
/// retried; anything else, a malformed query or a constraint violation,
/// is fatal for the current pass.
fn classify_sqlx_error(err: sqlx::Error) -> backoff::Error<sqlx::Error> {
  match err {
    sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
      backoff::Error::transient(err)
    }
    _ => backoff::Error::permanent(err),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classifies_pool_timeout_as_transient() {
    let classified = classify_sqlx_error(sqlx::Error::PoolTimedOut);
    assert!(matches!(classified, backoff::Error::Transient { .. }));
  }

  #[test]
  fn classifies_decode_error_as_permanent() {
    let err = sqlx::Error::ColumnNotFound("modified".into());
    let classified = classify_sqlx_error(err);
    assert!(matches!(classified, backoff::Error::Permanent(_)));
  }

  /// When several rows in a page share the same `modified` timestamp (the
  /// keyset tie the `ORDER BY fw.modified, fw.id` clause breaks by id),
  /// the page's checkpoint must be their shared max, not an arbitrary one
  /// of them. Otherwise whichever tied row happens to land last would
  /// silently set a different watermark depending on row order.
  #[test]
  fn page_checkpoint_is_the_shared_max_when_rows_tie_on_modified() {
    let tied = chrono::Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let earlier = chrono::Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

    let rows = vec![
      FilmRow {
        id: Uuid::new_v4(),
        title: None,
        description: None,
        imdb_rating: None,
        modified: earlier,
        genres: serde_json::json!([]),
        directors: serde_json::json!([]),
        actors: serde_json::json!([]),
        writers: serde_json::json!([]),
        directors_names: None,
        actors_names: None,
        writers_names: None,
      },
      FilmRow {
        id: Uuid::new_v4(),
        title: None,
        description: None,
        imdb_rating: None,
        modified: tied,
        genres: serde_json::json!([]),
        directors: serde_json::json!([]),
        actors: serde_json::json!([]),
        writers: serde_json::json!([]),
        directors_names: None,
        actors_names: None,
        writers_names: None,
      },
      FilmRow {
        id: Uuid::new_v4(),
        title: None,
        description: None,
        imdb_rating: None,
        modified: tied,
        genres: serde_json::json!([]),
        directors: serde_json::json!([]),
        actors: serde_json::json!([]),
        writers: serde_json::json!([]),
        directors_names: None,
        actors_names: None,
        writers_names: None,
      },
    ];

    let max_modified = rows.iter().map(|r| r.modified).max().unwrap();
    assert_eq!(max_modified, tied);
    let records: Vec<_> = rows.into_iter().map(FilmRow::into_raw_film).collect::<Result<_, _>>().unwrap();
    assert_eq!(records.len(), 3, "tied rows must not be deduplicated away");
  }
}

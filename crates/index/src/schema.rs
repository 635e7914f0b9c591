//! `movies` index mapping and one-shot bootstrap.
//!
//! Schema bootstrap is an administrative operation outside the ETL
//! engine's runtime loop; it's kept here because the mapping is the
//! external contract the loader's documents must satisfy.

use crate::error::SchemaError;
use serde_json::{json, Value};

pub const INDEX_NAME: &str = "movies";

/// One shard, zero replicas, a strict top-level mapping, and the `ru_en`
/// analyzer (standard tokenizer, lowercase, English/Russian stop words,
/// English possessive stemmer, English stemmer, Russian stemmer).
pub fn index_body() -> Value {
  json!({
    "settings": {
      "number_of_shards": 1,
      "number_of_replicas": 0,
      "refresh_interval": "1s",
      "analysis": {
        "filter": {
          "english_stop": { "type": "stop", "stopwords": "_english_" },
          "english_stemmer": { "type": "stemmer", "language": "english" },
          "english_possessive_stemmer": { "type": "stemmer", "language": "possessive_english" },
          "russian_stop": { "type": "stop", "stopwords": "_russian_" },
          "russian_stemmer": { "type": "stemmer", "language": "russian" }
        },
        "analyzer": {
          "ru_en": {
            "tokenizer": "standard",
            "filter": [
              "lowercase",
              "english_stop",
              "english_stemmer",
              "english_possessive_stemmer",
              "russian_stop",
              "russian_stemmer"
            ]
          }
        }
      }
    },
    "mappings": {
      "dynamic": "strict",
      "properties": {
        "id": { "type": "keyword" },
        "imdb_rating": { "type": "float" },
        "genres": { "type": "keyword" },
        "title": {
          "type": "text",
          "analyzer": "ru_en",
          "fields": { "raw": { "type": "keyword" } }
        },
        "description": { "type": "text", "analyzer": "ru_en" },
        "directors_names": { "type": "text", "analyzer": "ru_en" },
        "actors_names": { "type": "text", "analyzer": "ru_en" },
        "writers_names": { "type": "text", "analyzer": "ru_en" },
        "directors": {
          "type": "nested",
          "dynamic": "strict",
          "properties": {
            "id": { "type": "keyword" },
            "name": { "type": "text", "analyzer": "ru_en" }
          }
        },
        "actors": {
          "type": "nested",
          "dynamic": "strict",
          "properties": {
            "id": { "type": "keyword" },
            "name": { "type": "text", "analyzer": "ru_en" }
          }
        },
        "writers": {
          "type": "nested",
          "dynamic": "strict",
          "properties": {
            "id": { "type": "keyword" },
            "name": { "type": "text", "analyzer": "ru_en" }
          }
        }
      }
    }
  })
}

/// Create the `movies` index if it doesn't already exist.
///
/// Idempotent: skips if the index is already present unless `force` is
/// set, in which case the existing index is deleted and recreated.
pub async fn create_index_if_missing(client: &reqwest::Client, es_host: &str, force: bool) -> Result<bool, SchemaError> {
  let url = format!("{}/{}", es_host.trim_end_matches('/'), INDEX_NAME);

  let exists = client.head(&url).send().await?.status().is_success();

  if exists {
    if !force {
      tracing::warn!(index = INDEX_NAME, "index already exists, skipping");
      return Ok(false);
    }
    tracing::warn!(index = INDEX_NAME, "deleting existing index before recreate");
    client.delete(&url).send().await?.error_for_status()?;
  }

  let response = client.put(&url).json(&index_body()).send().await?;
  if !response.status().is_success() {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    return Err(SchemaError::CreateFailed { status: status.as_u16(), body });
  }

  tracing::info!(index = INDEX_NAME, "created index");
  Ok(true)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mapping_is_strict_and_single_shard() {
    let body = index_body();
    assert_eq!(body["mappings"]["dynamic"], "strict");
    assert_eq!(body["settings"]["number_of_shards"], 1);
    assert_eq!(body["settings"]["number_of_replicas"], 0);
  }

  #[test]
  fn title_has_raw_keyword_subfield() {
    let body = index_body();
    assert_eq!(body["mappings"]["properties"]["title"]["fields"]["raw"]["type"], "keyword");
  }

  #[test]
  fn ru_en_analyzer_has_expected_filter_chain() {
    let body = index_body();
    let filters = body["settings"]["analysis"]["analyzer"]["ru_en"]["filter"].as_array().unwrap();
    let names: Vec<&str> = filters.iter().map(|v| v.as_str().unwrap()).collect();
    assert_eq!(
      names,
      vec![
        "lowercase",
        "english_stop",
        "english_stemmer",
        "english_possessive_stemmer",
        "russian_stop",
        "russian_stemmer",
      ]
    );
  }

  #[test]
  fn nested_role_fields_are_strict() {
    let body = index_body();
    for field in ["directors", "actors", "writers"] {
      assert_eq!(body["mappings"]["properties"][field]["type"], "nested");
      assert_eq!(body["mappings"]["properties"][field]["dynamic"], "strict");
    }
  }
}

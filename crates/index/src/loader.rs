//! Bulk upsert client for the `movies` index.
//!
//! Elasticsearch's `_bulk` endpoint takes newline-delimited JSON action/
//! source pairs; each `index` action is an upsert keyed by `_id`, which is
//! exactly the idempotent-upsert semantics this service needs.

use crate::error::LoadError;
use filmsync_core::config::{RetryConfig, Settings};
use filmsync_core::model::FilmDocument;
use serde::Deserialize;
use serde_json::json;

/// Per-document failure reported by a bulk submission.
#[derive(Debug, Clone, PartialEq)]
pub struct DocError {
  pub id: String,
  pub reason: String,
}

/// Result of one bulk submission.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
  pub succeeded: usize,
  pub errors: Vec<DocError>,
}

impl LoadOutcome {
  /// A submission "succeeds" when at least one document was indexed.
  pub fn is_success(&self) -> bool {
    self.succeeded > 0
  }
}

#[derive(Deserialize)]
struct BulkResponse {
  items: Vec<BulkItem>,
}

#[derive(Deserialize)]
struct BulkItem {
  index: BulkItemAction,
}

#[derive(Deserialize)]
struct BulkItemAction {
  #[serde(rename = "_id")]
  id: String,
  status: u16,
  #[serde(default)]
  error: Option<serde_json::Value>,
}

pub struct Loader {
  client: reqwest::Client,
  es_host: String,
  retry: RetryConfig,
}

impl Loader {
  pub fn new(client: reqwest::Client, es_host: String) -> Self {
    Self {
      client,
      es_host,
      retry: RetryConfig::default(),
    }
  }

  /// Build the client and confirm the cluster is reachable, retrying
  /// connection-class failures with exponential backoff.
  pub async fn connect(settings: &Settings) -> Result<Self, LoadError> {
    let client = reqwest::Client::builder()
      .connect_timeout(settings.connect_timeout)
      .timeout(settings.request_timeout)
      .build()
      .map_err(LoadError::Request)?;

    let es_host = settings.es_host.clone();
    filmsync_core::retry::retry_connect(settings.retry, || {
      let client = client.clone();
      let es_host = es_host.clone();
      async move { client.get(&es_host).send().await.map_err(classify_reqwest_error) }
    })
    .await
    .map_err(LoadError::Connection)?;

    Ok(Self {
      client,
      es_host,
      retry: settings.retry,
    })
  }

  /// Submit a batch of documents as bulk upserts into `movies`.
  pub async fn load(&self, documents: &[FilmDocument]) -> Result<LoadOutcome, LoadError> {
    if documents.is_empty() {
      return Ok(LoadOutcome { succeeded: 0, errors: Vec::new() });
    }

    let mut body = String::new();
    for doc in documents {
      let action = json!({ "index": { "_index": crate::schema::INDEX_NAME, "_id": doc.id } });
      body.push_str(&action.to_string());
      body.push('\n');
      body.push_str(&serde_json::to_string(doc)?);
      body.push('\n');
    }

    let url = format!("{}/_bulk", self.es_host.trim_end_matches('/'));
    let response = filmsync_core::retry::retry_connect(self.retry, || {
      let url = url.clone();
      let body = body.clone();
      async move {
        self
          .client
          .post(&url)
          .header("Content-Type", "application/x-ndjson")
          .body(body)
          .send()
          .await
          .map_err(classify_reqwest_error)
      }
    })
    .await
    .map_err(LoadError::Connection)?;

    let parsed: BulkResponse = response.json().await.map_err(LoadError::Request)?;

    let mut succeeded = 0;
    let mut errors = Vec::new();
    for item in parsed.items {
      if item.index.status < 300 {
        succeeded += 1;
      } else {
        let reason = item
          .index
          .error
          .as_ref()
          .and_then(|e| e.get("reason"))
          .and_then(|r| r.as_str())
          .unwrap_or("unknown error")
          .to_string();
        tracing::warn!(id = %item.index.id, reason = %reason, "document indexing failed");
        errors.push(DocError { id: item.index.id, reason });
      }
    }

    Ok(LoadOutcome { succeeded, errors })
  }
}

fn classify_reqwest_error(err: reqwest::Error) -> backoff::Error<reqwest::Error> {
  if err.is_connect() || err.is_timeout() {
    backoff::Error::transient(err)
  } else {
    backoff::Error::permanent(err)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn outcome_is_success_when_any_document_indexed() {
    let outcome = LoadOutcome {
      succeeded: 1,
      errors: vec![DocError {
        id: "x".into(),
        reason: "mapper_parsing_exception".into(),
      }],
    };
    assert!(outcome.is_success());
  }

  #[test]
  fn outcome_is_not_success_when_nothing_indexed() {
    let outcome = LoadOutcome {
      succeeded: 0,
      errors: vec![],
    };
    assert!(!outcome.is_success());
  }

  #[test]
  fn empty_batch_is_a_no_op() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let loader = Loader::new(reqwest::Client::new(), "http://localhost:9200".into());
    let outcome = rt.block_on(loader.load(&[])).unwrap();
    assert_eq!(outcome.succeeded, 0);
    assert!(outcome.errors.is_empty());
  }

  fn sample_document() -> FilmDocument {
    FilmDocument {
      id: "f1".into(),
      title: "Arrival".into(),
      imdb_rating: 7.9,
      description: "a linguist deciphers an alien language".into(),
      genres: vec!["Sci-Fi".into()],
      directors: vec![],
      actors: vec![],
      writers: vec![],
      directors_names: vec![],
      actors_names: vec![],
      writers_names: vec![],
    }
  }

  /// A transient outage on the first bulk attempt (the request times out
  /// before the index responds) must not surface as a pass failure: the
  /// retry harness should recover once the index becomes reachable again.
  #[tokio::test]
  async fn transient_timeout_is_retried_until_the_index_recovers() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    let success_body = serde_json::json!({
      "items": [{ "index": { "_id": "f1", "status": 201 } }]
    });

    Mock::given(method("POST"))
      .and(path("/_bulk"))
      .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_millis(300)))
      .up_to_n_times(1)
      .with_priority(1)
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/_bulk"))
      .respond_with(ResponseTemplate::new(200).set_body_json(success_body))
      .with_priority(2)
      .mount(&server)
      .await;

    let client = reqwest::Client::builder().timeout(std::time::Duration::from_millis(50)).build().unwrap();
    let loader = Loader {
      client,
      es_host: server.uri(),
      retry: RetryConfig {
        max_attempts: 5,
        max_elapsed: std::time::Duration::from_secs(5),
      },
    };

    let outcome = loader.load(&[sample_document()]).await.unwrap();
    assert_eq!(outcome.succeeded, 1);
    assert!(outcome.errors.is_empty());
  }

  /// A bulk response where some documents fail (e.g. a mapping mismatch)
  /// must report those failures without discarding the documents that did
  /// index successfully in the same request.
  #[tokio::test]
  async fn partial_bulk_failure_reports_only_the_failing_documents() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    let body = serde_json::json!({
      "items": [
        { "index": { "_id": "f1", "status": 201 } },
        { "index": { "_id": "f2", "status": 400, "error": { "reason": "mapper_parsing_exception" } } },
      ]
    });

    Mock::given(method("POST"))
      .and(path("/_bulk"))
      .respond_with(ResponseTemplate::new(200).set_body_json(body))
      .mount(&server)
      .await;

    let client = reqwest::Client::new();
    let loader = Loader {
      client,
      es_host: server.uri(),
      retry: RetryConfig::default(),
    };

    let mut second = sample_document();
    second.id = "f2".into();
    let outcome = loader.load(&[sample_document(), second]).await.unwrap();

    assert_eq!(outcome.succeeded, 1);
    assert_eq!(
      outcome.errors,
      vec![DocError {
        id: "f2".into(),
        reason: "mapper_parsing_exception".into(),
      }]
    );
  }
}

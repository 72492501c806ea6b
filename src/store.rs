//! Document store seam: assignments and submissions are opaque string-keyed documents.
//!
//! `MemoryStore` keeps everything in-process; `FirestoreStore` talks to the Firestore
//! REST API and converts between plain JSON and Firestore's typed values.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

pub type Document = Map<String, Value>;

pub const ASSIGNMENTS: &str = "readfit_assignments";
pub const SUBMISSIONS: &str = "readfit_submissions";

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("store request failed: {0}")]
  Request(String),
  #[error("store returned HTTP {status}: {message}")]
  Status { status: u16, message: String },
  #[error("malformed document: {0}")]
  Malformed(String),
}

/// Equality filter on a top-level field.
#[derive(Clone, Debug)]
pub struct FieldFilter {
  pub field: String,
  pub value: Value,
}

#[derive(Clone, Debug)]
pub struct OrderBy {
  pub field: String,
  pub descending: bool,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
  async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError>;
  async fn set(&self, collection: &str, key: &str, doc: Document) -> Result<(), StoreError>;
  /// Insert under a generated key, which is returned.
  async fn add(&self, collection: &str, doc: Document) -> Result<String, StoreError>;
  async fn query(
    &self,
    collection: &str,
    filter: Option<FieldFilter>,
    order: Option<OrderBy>,
    limit: usize,
  ) -> Result<Vec<Document>, StoreError>;
}

/// Serialize a record into a document (must be a JSON object).
pub fn to_document<T: serde::Serialize>(value: &T) -> Result<Document, StoreError> {
  match serde_json::to_value(value).map_err(|e| StoreError::Malformed(e.to_string()))? {
    Value::Object(map) => Ok(map),
    other => Err(StoreError::Malformed(format!("expected object, got {}", other))),
  }
}

pub fn from_document<T: serde::de::DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
  serde_json::from_value(Value::Object(doc)).map_err(|e| StoreError::Malformed(e.to_string()))
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
  collections: RwLock<HashMap<String, Vec<(String, Document)>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
  use std::cmp::Ordering;
  match (a, b) {
    (Some(Value::Number(x)), Some(Value::Number(y))) => {
      x.as_f64().unwrap_or(0.0).partial_cmp(&y.as_f64().unwrap_or(0.0)).unwrap_or(Ordering::Equal)
    }
    (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
    (Some(_), None) => Ordering::Greater,
    (None, Some(_)) => Ordering::Less,
    _ => Ordering::Equal,
  }
}

#[async_trait]
impl DocumentStore for MemoryStore {
  async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
    let cols = self.collections.read().await;
    Ok(cols.get(collection).and_then(|docs| docs.iter().find(|(k, _)| k == key)).map(|(_, d)| d.clone()))
  }

  async fn set(&self, collection: &str, key: &str, doc: Document) -> Result<(), StoreError> {
    let mut cols = self.collections.write().await;
    let docs = cols.entry(collection.to_string()).or_default();
    match docs.iter_mut().find(|(k, _)| k == key) {
      Some(slot) => slot.1 = doc,
      None => docs.push((key.to_string(), doc)),
    }
    Ok(())
  }

  async fn add(&self, collection: &str, doc: Document) -> Result<String, StoreError> {
    let key = Uuid::new_v4().simple().to_string();
    self.set(collection, &key, doc).await?;
    Ok(key)
  }

  async fn query(
    &self,
    collection: &str,
    filter: Option<FieldFilter>,
    order: Option<OrderBy>,
    limit: usize,
  ) -> Result<Vec<Document>, StoreError> {
    let cols = self.collections.read().await;
    let mut out: Vec<Document> = cols
      .get(collection)
      .map(|docs| {
        docs
          .iter()
          .filter(|(_, d)| filter.as_ref().map_or(true, |f| d.get(&f.field) == Some(&f.value)))
          .map(|(_, d)| d.clone())
          .collect()
      })
      .unwrap_or_default();
    if let Some(o) = &order {
      // stable: equal keys keep insertion order
      out.sort_by(|a, b| {
        let ord = compare_values(a.get(&o.field), b.get(&o.field));
        if o.descending { ord.reverse() } else { ord }
      });
    }
    out.truncate(limit);
    Ok(out)
  }
}

// ---------------------------------------------------------------------------
// Firestore (REST)
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct FirestoreStore {
  client: reqwest::Client,
  base_url: String,
  project_id: String,
  token: Option<String>,
}

impl FirestoreStore {
  /// Build from FIRESTORE_PROJECT_ID (required), FIRESTORE_BASE_URL, FIRESTORE_TOKEN.
  pub fn from_env() -> Option<Self> {
    let project_id = std::env::var("FIRESTORE_PROJECT_ID").ok().filter(|p| !p.is_empty())?;
    let base_url =
      std::env::var("FIRESTORE_BASE_URL").unwrap_or_else(|_| "https://firestore.googleapis.com/v1".into());
    let token = std::env::var("FIRESTORE_TOKEN").ok().filter(|t| !t.is_empty());
    let client = reqwest::Client::builder().timeout(Duration::from_secs(10)).build().ok()?;
    Some(Self { client, base_url, project_id, token })
  }

  pub fn project_id(&self) -> &str {
    &self.project_id
  }

  fn documents_root(&self) -> String {
    format!("{}/projects/{}/databases/(default)/documents", self.base_url.trim_end_matches('/'), self.project_id)
  }

  fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
    let mut req = self
      .client
      .request(method, url)
      .header(USER_AGENT, "readfit-backend/0.1")
      .header(CONTENT_TYPE, "application/json");
    if let Some(t) = &self.token {
      req = req.header(AUTHORIZATION, format!("Bearer {}", t));
    }
    req
  }

  async fn send_json(&self, req: reqwest::RequestBuilder) -> Result<Option<Value>, StoreError> {
    let res = req.send().await.map_err(|e| StoreError::Request(e.to_string()))?;
    let status = res.status();
    if status == reqwest::StatusCode::NOT_FOUND {
      return Ok(None);
    }
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      let message = extract_firestore_error(&body).unwrap_or(body);
      return Err(StoreError::Status { status: status.as_u16(), message });
    }
    res.json::<Value>().await.map(Some).map_err(|e| StoreError::Request(e.to_string()))
  }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
  #[instrument(level = "debug", skip(self))]
  async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
    let url = format!("{}/{}/{}", self.documents_root(), collection, key);
    match self.send_json(self.request(reqwest::Method::GET, &url)).await? {
      Some(v) => decode_document(&v).map(Some),
      None => Ok(None),
    }
  }

  #[instrument(level = "debug", skip(self, doc))]
  async fn set(&self, collection: &str, key: &str, doc: Document) -> Result<(), StoreError> {
    let url = format!("{}/{}/{}", self.documents_root(), collection, key);
    let body = json!({ "fields": encode_fields(&doc) });
    self
      .send_json(self.request(reqwest::Method::PATCH, &url).json(&body))
      .await?
      .ok_or_else(|| StoreError::Status { status: 404, message: format!("collection {} not found", collection) })?;
    Ok(())
  }

  #[instrument(level = "debug", skip(self, doc))]
  async fn add(&self, collection: &str, doc: Document) -> Result<String, StoreError> {
    let url = format!("{}/{}", self.documents_root(), collection);
    let body = json!({ "fields": encode_fields(&doc) });
    let created = self
      .send_json(self.request(reqwest::Method::POST, &url).json(&body))
      .await?
      .ok_or_else(|| StoreError::Status { status: 404, message: format!("collection {} not found", collection) })?;
    let name = created.get("name").and_then(Value::as_str).ok_or_else(|| StoreError::Malformed("missing name".into()))?;
    Ok(name.rsplit('/').next().unwrap_or(name).to_string())
  }

  #[instrument(level = "debug", skip(self))]
  async fn query(
    &self,
    collection: &str,
    filter: Option<FieldFilter>,
    order: Option<OrderBy>,
    limit: usize,
  ) -> Result<Vec<Document>, StoreError> {
    let mut structured = json!({
      "from": [{ "collectionId": collection }],
      "limit": limit,
    });
    if let Some(f) = &filter {
      structured["where"] = json!({
        "fieldFilter": { "field": { "fieldPath": f.field }, "op": "EQUAL", "value": encode_value(&f.value) }
      });
    }
    if let Some(o) = &order {
      structured["orderBy"] = json!([{
        "field": { "fieldPath": o.field },
        "direction": if o.descending { "DESCENDING" } else { "ASCENDING" },
      }]);
    }
    let url = format!("{}:runQuery", self.documents_root());
    let body = json!({ "structuredQuery": structured });
    let rows = self.send_json(self.request(reqwest::Method::POST, &url).json(&body)).await?.unwrap_or(Value::Null);
    let rows = rows.as_array().cloned().unwrap_or_default();
    debug!(target: "store", %collection, rows = rows.len(), "Firestore query");
    rows.iter().filter_map(|r| r.get("document")).map(decode_document).collect()
  }
}

/// JSON → Firestore typed value.
pub fn encode_value(v: &Value) -> Value {
  match v {
    Value::Null => json!({ "nullValue": null }),
    Value::Bool(b) => json!({ "booleanValue": b }),
    Value::Number(n) if n.is_i64() || n.is_u64() => json!({ "integerValue": n.to_string() }),
    Value::Number(n) => json!({ "doubleValue": n.as_f64().unwrap_or(0.0) }),
    Value::String(s) => json!({ "stringValue": s }),
    Value::Array(items) => json!({ "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() } }),
    Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
  }
}

fn encode_fields(doc: &Document) -> Value {
  Value::Object(doc.iter().map(|(k, v)| (k.clone(), encode_value(v))).collect())
}

/// Firestore typed value → JSON. Timestamps become RFC 3339 strings.
pub fn decode_value(v: &Value) -> Result<Value, StoreError> {
  let obj = v.as_object().ok_or_else(|| StoreError::Malformed(format!("not a typed value: {}", v)))?;
  let (kind, inner) = obj.iter().next().ok_or_else(|| StoreError::Malformed("empty typed value".into()))?;
  Ok(match kind.as_str() {
    "nullValue" => Value::Null,
    "booleanValue" => inner.clone(),
    "integerValue" => {
      let raw = inner.as_str().map(str::to_string).unwrap_or_else(|| inner.to_string());
      raw.parse::<i64>().map(Value::from).map_err(|e| StoreError::Malformed(e.to_string()))?
    }
    "doubleValue" => inner.clone(),
    "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
    "arrayValue" => Value::Array(
      inner
        .get("values")
        .and_then(Value::as_array)
        .map(|vals| vals.iter().map(decode_value).collect::<Result<Vec<_>, _>>())
        .transpose()?
        .unwrap_or_default(),
    ),
    "mapValue" => Value::Object(decode_fields(inner.get("fields"))?),
    other => return Err(StoreError::Malformed(format!("unsupported value type {}", other))),
  })
}

fn decode_fields(fields: Option<&Value>) -> Result<Document, StoreError> {
  let mut out = Document::new();
  if let Some(map) = fields.and_then(Value::as_object) {
    for (k, v) in map {
      out.insert(k.clone(), decode_value(v)?);
    }
  }
  Ok(out)
}

fn decode_document(doc: &Value) -> Result<Document, StoreError> {
  decode_fields(doc.get("fields"))
}

fn extract_firestore_error(body: &str) -> Option<String> {
  serde_json::from_str::<Value>(body)
    .ok()?
    .get("error")?
    .get("message")?
    .as_str()
    .map(str::to_string)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn doc(v: Value) -> Document {
    v.as_object().cloned().unwrap()
  }

  #[tokio::test]
  async fn memory_store_get_set_overwrite() {
    let store = MemoryStore::new();
    assert!(store.get(ASSIGNMENTS, "111111").await.unwrap().is_none());
    store.set(ASSIGNMENTS, "111111", doc(json!({"unit": "Unit 1"}))).await.unwrap();
    store.set(ASSIGNMENTS, "111111", doc(json!({"unit": "Unit 2"}))).await.unwrap();
    let got = store.get(ASSIGNMENTS, "111111").await.unwrap().unwrap();
    assert_eq!(got["unit"], "Unit 2");
  }

  #[tokio::test]
  async fn memory_store_query_filters_orders_and_limits() {
    let store = MemoryStore::new();
    for (code, ts) in [("1", "2026-01-01"), ("2", "2026-01-03"), ("1", "2026-01-02"), ("1", "2026-01-04")] {
      store.add(SUBMISSIONS, doc(json!({"access_code": code, "timestamp": ts}))).await.unwrap();
    }
    let rows = store
      .query(
        SUBMISSIONS,
        Some(FieldFilter { field: "access_code".into(), value: json!("1") }),
        Some(OrderBy { field: "timestamp".into(), descending: true }),
        2,
      )
      .await
      .unwrap();
    let ts: Vec<&str> = rows.iter().map(|r| r["timestamp"].as_str().unwrap()).collect();
    assert_eq!(ts, vec!["2026-01-04", "2026-01-02"]);
  }

  #[test]
  fn firestore_values_convert_both_ways() {
    let original = json!({
      "access_code": "123456",
      "quiz_score": 67,
      "ratio": 0.5,
      "ok": true,
      "none": null,
      "quiz": [{"question": "Q", "options": ["a", "b", "c"], "answer": 1}],
    });
    let encoded = encode_fields(original.as_object().unwrap());
    assert_eq!(encoded["quiz_score"], json!({"integerValue": "67"}));
    let decoded = decode_fields(Some(&encoded)).unwrap();
    assert_eq!(Value::Object(decoded), original);
  }

  #[test]
  fn timestamps_decode_to_strings() {
    let v = json!({"timestampValue": "2026-10-17T09:00:00Z"});
    assert_eq!(decode_value(&v).unwrap(), json!("2026-10-17T09:00:00Z"));
    assert!(decode_value(&json!({"geoPointValue": {}})).is_err());
  }

  #[test]
  fn records_round_trip_through_documents() {
    #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
    struct Rec { a: u8, b: String }
    let d = to_document(&Rec { a: 1, b: "x".into() }).unwrap();
    assert_eq!(from_document::<Rec>(d).unwrap(), Rec { a: 1, b: "x".into() });
    assert!(to_document(&5).is_err());
  }
}

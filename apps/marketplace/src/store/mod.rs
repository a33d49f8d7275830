// apps/marketplace/src/store/mod.rs

//! Document store port.
//!
//! The marketplace persists everything as JSON documents in five flat
//! collections. The store guarantees per-key atomicity only: there are no
//! multi-key transactions, joins or secondary indexes. Each key carries a
//! version that increments on every write, which is what compare-and-swap
//! checks against.

pub mod memory;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use memory::MemoryStore;

pub type Version = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
  Users,
  Products,
  Orders,
  Messages,
  Reviews,
}

impl Collection {
  pub fn as_str(self) -> &'static str {
    match self {
      Collection::Users => "users",
      Collection::Products => "products",
      Collection::Orders => "orders",
      Collection::Messages => "messages",
      Collection::Reviews => "reviews",
    }
  }
}

impl std::fmt::Display for Collection {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A raw document as held by the store.
#[derive(Debug, Clone)]
pub struct Stored {
  pub id: String,
  pub version: Version,
  /// Store-wide insertion counter, assigned on first insert and kept across
  /// overwrites. Scans return documents in `seq` order.
  pub seq: u64,
  pub value: Value,
}

/// A decoded document plus the bookkeeping needed for conditional writes.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
  pub version: Version,
  pub seq: u64,
  pub doc: T,
}

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("version conflict on {collection}/{id}: expected {expected:?}, found {found:?}")]
  Conflict {
    collection: &'static str,
    id: String,
    expected: Option<Version>,
    found: Option<Version>,
  },

  #[error("document store unavailable: {0}")]
  Unavailable(String),

  #[error("corrupt document {collection}/{id}: {message}")]
  Corrupt {
    collection: &'static str,
    id: String,
    message: String,
  },
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
  async fn get(&self, collection: Collection, id: &str) -> Result<Option<Stored>, StoreError>;

  /// Unconditional insert or overwrite. Returns the new version.
  async fn put(&self, collection: Collection, id: &str, value: Value) -> Result<Version, StoreError>;

  /// Writes only if the key's current version equals `expected`; `None`
  /// means the key must not exist yet.
  async fn compare_and_swap(
    &self,
    collection: Collection,
    id: &str,
    expected: Option<Version>,
    value: Value,
  ) -> Result<Version, StoreError>;

  async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError>;

  /// Every document of a collection in insertion order. Not a snapshot:
  /// writes racing with the scan may or may not be observed.
  async fn scan(&self, collection: Collection) -> Result<Vec<Stored>, StoreError>;

  async fn count(&self, collection: Collection) -> Result<usize, StoreError>;
}

fn decode<T: DeserializeOwned>(collection: Collection, stored: Stored) -> Result<Versioned<T>, StoreError> {
  let doc = serde_json::from_value(stored.value).map_err(|e| StoreError::Corrupt {
    collection: collection.as_str(),
    id: stored.id.clone(),
    message: e.to_string(),
  })?;
  Ok(Versioned {
    version: stored.version,
    seq: stored.seq,
    doc,
  })
}

fn encode<T: Serialize>(collection: Collection, id: &str, doc: &T) -> Result<Value, StoreError> {
  serde_json::to_value(doc).map_err(|e| StoreError::Corrupt {
    collection: collection.as_str(),
    id: id.to_string(),
    message: e.to_string(),
  })
}

pub async fn load<T: DeserializeOwned>(
  store: &dyn DocumentStore,
  collection: Collection,
  id: &str,
) -> Result<Option<Versioned<T>>, StoreError> {
  match store.get(collection, id).await? {
    Some(stored) => decode(collection, stored).map(Some),
    None => Ok(None),
  }
}

pub async fn load_all<T: DeserializeOwned>(
  store: &dyn DocumentStore,
  collection: Collection,
) -> Result<Vec<Versioned<T>>, StoreError> {
  store
    .scan(collection)
    .await?
    .into_iter()
    .map(|stored| decode(collection, stored))
    .collect()
}

pub async fn save<T: Serialize + Sync>(
  store: &dyn DocumentStore,
  collection: Collection,
  id: &str,
  doc: &T,
) -> Result<Version, StoreError> {
  let value = encode(collection, id, doc)?;
  store.put(collection, id, value).await
}

pub async fn save_if<T: Serialize + Sync>(
  store: &dyn DocumentStore,
  collection: Collection,
  id: &str,
  expected: Option<Version>,
  doc: &T,
) -> Result<Version, StoreError> {
  let value = encode(collection, id, doc)?;
  store.compare_and_swap(collection, id, expected, value).await
}

pub fn new_id() -> String {
  uuid::Uuid::new_v4().simple().to_string()
}

// apps/marketplace/src/store/memory.rs

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{Collection, DocumentStore, Stored, StoreError, Version};

#[derive(Debug, Clone)]
struct Entry {
  version: Version,
  seq: u64,
  value: Value,
}

/// In-process document store.
///
/// Each write takes the collection's write lock for the duration of a map
/// operation only, so per-key reads and writes are atomic and no lock is ever
/// held across an await.
#[derive(Debug, Default)]
pub struct MemoryStore {
  collections: RwLock<HashMap<Collection, HashMap<String, Entry>>>,
  next_seq: AtomicU64,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn write_entry(&self, collection: Collection, id: &str, expected: Option<Option<Version>>, value: Value) -> Result<Version, StoreError> {
    let mut collections = self.collections.write();
    let docs = collections.entry(collection).or_default();
    let current = docs.get(id).map(|e| e.version);

    if let Some(expected) = expected {
      if expected != current {
        return Err(StoreError::Conflict {
          collection: collection.as_str(),
          id: id.to_string(),
          expected,
          found: current,
        });
      }
    }

    let version = current.map_or(1, |v| v + 1);
    let seq = match docs.get(id) {
      Some(existing) => existing.seq,
      None => self.next_seq.fetch_add(1, Ordering::SeqCst),
    };
    docs.insert(id.to_string(), Entry { version, seq, value });
    Ok(version)
  }
}

#[async_trait]
impl DocumentStore for MemoryStore {
  async fn get(&self, collection: Collection, id: &str) -> Result<Option<Stored>, StoreError> {
    let collections = self.collections.read();
    Ok(collections.get(&collection).and_then(|docs| docs.get(id)).map(|e| Stored {
      id: id.to_string(),
      version: e.version,
      seq: e.seq,
      value: e.value.clone(),
    }))
  }

  async fn put(&self, collection: Collection, id: &str, value: Value) -> Result<Version, StoreError> {
    self.write_entry(collection, id, None, value)
  }

  async fn compare_and_swap(
    &self,
    collection: Collection,
    id: &str,
    expected: Option<Version>,
    value: Value,
  ) -> Result<Version, StoreError> {
    self.write_entry(collection, id, Some(expected), value)
  }

  async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
    let mut collections = self.collections.write();
    Ok(
      collections
        .get_mut(&collection)
        .map_or(false, |docs| docs.remove(id).is_some()),
    )
  }

  async fn scan(&self, collection: Collection) -> Result<Vec<Stored>, StoreError> {
    let collections = self.collections.read();
    let mut out: Vec<Stored> = collections
      .get(&collection)
      .map(|docs| {
        docs
          .iter()
          .map(|(id, e)| Stored {
            id: id.clone(),
            version: e.version,
            seq: e.seq,
            value: e.value.clone(),
          })
          .collect()
      })
      .unwrap_or_default();
    out.sort_by_key(|s| s.seq);
    Ok(out)
  }

  async fn count(&self, collection: Collection) -> Result<usize, StoreError> {
    Ok(self.collections.read().get(&collection).map_or(0, HashMap::len))
  }
}

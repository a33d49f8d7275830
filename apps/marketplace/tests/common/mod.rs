// apps/marketplace/tests/common/mod.rs

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use marketplace::config::AppConfig;
use marketplace::models::{ListingType, Product, ProductStatus, Role, UserProfile};
use marketplace::services::identity::{IdentityProvider, JwtIdentityProvider};
use marketplace::state::AppState;
use marketplace::store::{self, Collection, DocumentStore, MemoryStore, Stored, StoreError, Version};

pub const SECRET: &str = "integration-secret-integration-secret";

static TRACING: Lazy<()> = Lazy::new(|| {
  let filter = tracing_subscriber::EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
  tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().init();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING);
}

pub fn test_config(strict_rooms: bool) -> AppConfig {
  let strict = strict_rooms.to_string();
  AppConfig::from_lookup(move |key| match key {
    "AUTH_JWT_SECRET" => Some(SECRET.to_string()),
    "CHAT_STRICT_ROOMS" => Some(strict.clone()),
    _ => None,
  })
  .expect("test config")
}

pub fn token_provider() -> JwtIdentityProvider {
  JwtIdentityProvider::new(SECRET, None, None)
}

pub fn token_for(uid: &str) -> String {
  token_provider()
    .issue(uid, Some(&format!("{}@campus.example", uid)), Duration::hours(1))
    .expect("token")
}

pub fn bearer(uid: &str) -> (&'static str, String) {
  ("Authorization", format!("Bearer {}", token_for(uid)))
}

pub fn state_with(store: Arc<dyn DocumentStore>) -> AppState {
  setup_tracing();
  let identity: Arc<dyn IdentityProvider> = Arc::new(token_provider());
  AppState::with_identity(test_config(false), store, identity)
}

pub async fn put_user(store: &dyn DocumentStore, id: &str, name: &str, role: Role) {
  let profile = UserProfile {
    id: id.to_string(),
    name: name.to_string(),
    email: format!("{}@campus.example", id),
    college: None,
    role,
    created_at: Utc::now(),
  };
  store::save(store, Collection::Users, id, &profile).await.expect("save user");
}

pub async fn put_product(store: &dyn DocumentStore, id: &str, seller: &str, listing_type: ListingType) -> Product {
  let now = Utc::now();
  let product = Product {
    id: id.to_string(),
    seller: seller.to_string(),
    title: format!("Listing {}", id),
    description: String::new(),
    category: "books".to_string(),
    listing_type,
    price: 20.0,
    image: "/uploads/book.jpg".to_string(),
    status: ProductStatus::Available,
    created_at: now,
    updated_at: now,
  };
  store::save(store, Collection::Products, id, &product).await.expect("save product");
  product
}

pub async fn product_status(store: &dyn DocumentStore, id: &str) -> ProductStatus {
  store::load::<Product>(store, Collection::Products, id)
    .await
    .expect("load product")
    .expect("product exists")
    .doc
    .status
}

/// Yields to the scheduler before every operation so concurrent requests
/// interleave between their reads and writes.
pub struct YieldingStore(pub MemoryStore);

#[async_trait]
impl DocumentStore for YieldingStore {
  async fn get(&self, c: Collection, id: &str) -> Result<Option<Stored>, StoreError> {
    tokio::task::yield_now().await;
    self.0.get(c, id).await
  }

  async fn put(&self, c: Collection, id: &str, value: Value) -> Result<Version, StoreError> {
    tokio::task::yield_now().await;
    self.0.put(c, id, value).await
  }

  async fn compare_and_swap(
    &self,
    c: Collection,
    id: &str,
    expected: Option<Version>,
    value: Value,
  ) -> Result<Version, StoreError> {
    tokio::task::yield_now().await;
    self.0.compare_and_swap(c, id, expected, value).await
  }

  async fn delete(&self, c: Collection, id: &str) -> Result<bool, StoreError> {
    self.0.delete(c, id).await
  }

  async fn scan(&self, c: Collection) -> Result<Vec<Stored>, StoreError> {
    self.0.scan(c).await
  }

  async fn count(&self, c: Collection) -> Result<usize, StoreError> {
    self.0.count(c).await
  }
}

/// Rejects every write to one collection as if the backend were down.
pub struct FailingWrites {
  pub inner: MemoryStore,
  pub collection: Collection,
}

impl FailingWrites {
  fn check(&self, c: Collection) -> Result<(), StoreError> {
    if c == self.collection {
      Err(StoreError::Unavailable(format!("{} is read-only in this test", c)))
    } else {
      Ok(())
    }
  }
}

#[async_trait]
impl DocumentStore for FailingWrites {
  async fn get(&self, c: Collection, id: &str) -> Result<Option<Stored>, StoreError> {
    self.inner.get(c, id).await
  }

  async fn put(&self, c: Collection, id: &str, value: Value) -> Result<Version, StoreError> {
    self.check(c)?;
    self.inner.put(c, id, value).await
  }

  async fn compare_and_swap(
    &self,
    c: Collection,
    id: &str,
    expected: Option<Version>,
    value: Value,
  ) -> Result<Version, StoreError> {
    self.check(c)?;
    self.inner.compare_and_swap(c, id, expected, value).await
  }

  async fn delete(&self, c: Collection, id: &str) -> Result<bool, StoreError> {
    self.check(c)?;
    self.inner.delete(c, id).await
  }

  async fn scan(&self, c: Collection) -> Result<Vec<Stored>, StoreError> {
    self.inner.scan(c).await
  }

  async fn count(&self, c: Collection) -> Result<usize, StoreError> {
    self.inner.count(c).await
  }
}

/// Rewrites the target product right before each of the next `interruptions`
/// conditional product writes, so those writes see a newer version than the
/// caller read.
pub struct InterferingStore {
  pub inner: MemoryStore,
  interruptions: AtomicUsize,
  edit: fn(&mut Value),
}

impl InterferingStore {
  pub fn new(interruptions: usize, edit: fn(&mut Value)) -> Self {
    Self {
      inner: MemoryStore::new(),
      interruptions: AtomicUsize::new(interruptions),
      edit,
    }
  }

  async fn interfere(&self, c: Collection, id: &str) -> Result<(), StoreError> {
    if c != Collection::Products {
      return Ok(());
    }
    let due = self
      .interruptions
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_ok();
    if !due {
      return Ok(());
    }
    if let Some(mut current) = self.inner.get(c, id).await? {
      (self.edit)(&mut current.value);
      self.inner.put(c, id, current.value).await?;
    }
    Ok(())
  }
}

#[async_trait]
impl DocumentStore for InterferingStore {
  async fn get(&self, c: Collection, id: &str) -> Result<Option<Stored>, StoreError> {
    self.inner.get(c, id).await
  }

  async fn put(&self, c: Collection, id: &str, value: Value) -> Result<Version, StoreError> {
    self.inner.put(c, id, value).await
  }

  async fn compare_and_swap(
    &self,
    c: Collection,
    id: &str,
    expected: Option<Version>,
    value: Value,
  ) -> Result<Version, StoreError> {
    self.interfere(c, id).await?;
    self.inner.compare_and_swap(c, id, expected, value).await
  }

  async fn delete(&self, c: Collection, id: &str) -> Result<bool, StoreError> {
    self.inner.delete(c, id).await
  }

  async fn scan(&self, c: Collection) -> Result<Vec<Stored>, StoreError> {
    self.inner.scan(c).await
  }

  async fn count(&self, c: Collection) -> Result<usize, StoreError> {
    self.inner.count(c).await
  }
}

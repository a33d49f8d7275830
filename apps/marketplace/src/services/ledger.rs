// apps/marketplace/src/services/ledger.rs

//! Product availability ledger.
//!
//! Reads and writes the `status` of product documents. Plain
//! [`set_status`](ProductLedger::set_status) does no transition checking;
//! order creation goes through [`claim`](ProductLedger::claim) and
//! [`release`](ProductLedger::release), which are conditional on the version
//! the caller last read.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::errors::{AppError, Result};
use crate::models::{Product, ProductStatus};
use crate::store::{self, Collection, DocumentStore, StoreError, Versioned};

#[derive(Clone)]
pub struct ProductLedger {
  store: Arc<dyn DocumentStore>,
}

impl ProductLedger {
  pub fn new(store: Arc<dyn DocumentStore>) -> Self {
    Self { store }
  }

  pub async fn get(&self, product_id: &str) -> Result<Product> {
    Ok(self.get_versioned(product_id).await?.doc)
  }

  pub async fn get_versioned(&self, product_id: &str) -> Result<Versioned<Product>> {
    store::load::<Product>(self.store.as_ref(), Collection::Products, product_id)
      .await?
      .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
  }

  /// Unconditional status overwrite.
  #[instrument(name = "ledger::set_status", skip(self), fields(product_id = %product_id))]
  pub async fn set_status(&self, product_id: &str, status: ProductStatus) -> Result<Product> {
    let mut product = self.get(product_id).await?;
    product.status = status;
    product.updated_at = Utc::now();
    store::save(self.store.as_ref(), Collection::Products, product_id, &product).await?;
    debug!(?status, "Product status overwritten.");
    Ok(product)
  }

  /// Moves `current` to `status` if nobody has written the product since it
  /// was read. A lost race surfaces as [`StoreError::Conflict`] so the caller
  /// can decide whether to re-read.
  pub async fn claim(
    &self,
    current: &Versioned<Product>,
    status: ProductStatus,
  ) -> Result<Versioned<Product>, StoreError> {
    self.write_status(current, status).await
  }

  /// Undoes a claim, conditional on the version the claim produced.
  pub async fn release(&self, claimed: &Versioned<Product>) -> Result<Versioned<Product>, StoreError> {
    self.write_status(claimed, ProductStatus::Available).await
  }

  async fn write_status(
    &self,
    current: &Versioned<Product>,
    status: ProductStatus,
  ) -> Result<Versioned<Product>, StoreError> {
    let mut product = current.doc.clone();
    product.status = status;
    product.updated_at = Utc::now();
    let version = store::save_if(
      self.store.as_ref(),
      Collection::Products,
      &product.id,
      Some(current.version),
      &product,
    )
    .await?;
    debug!(product_id = %product.id, ?status, version, "Product status written conditionally.");
    Ok(Versioned {
      version,
      seq: current.seq,
      doc: product,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::ListingType;
  use crate::store::MemoryStore;

  async fn seeded() -> (ProductLedger, Arc<dyn DocumentStore>) {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let now = Utc::now();
    let product = Product {
      id: "p1".into(),
      seller: "s1".into(),
      title: "Bike".into(),
      description: String::new(),
      category: "transport".into(),
      listing_type: ListingType::Sell,
      price: 80.0,
      image: "bike.jpg".into(),
      status: ProductStatus::Available,
      created_at: now,
      updated_at: now,
    };
    store::save(store.as_ref(), Collection::Products, "p1", &product).await.unwrap();
    (ProductLedger::new(store.clone()), store)
  }

  #[tokio::test]
  async fn missing_product_is_not_found() {
    let (ledger, _) = seeded().await;
    assert!(matches!(ledger.get("nope").await, Err(AppError::NotFound(_))));
  }

  #[tokio::test]
  async fn set_status_is_unchecked_and_visible() {
    let (ledger, _) = seeded().await;
    ledger.set_status("p1", ProductStatus::Sold).await.unwrap();
    ledger.set_status("p1", ProductStatus::Rented).await.unwrap();
    assert_eq!(ledger.get("p1").await.unwrap().status, ProductStatus::Rented);
  }

  #[tokio::test]
  async fn claim_fails_on_stale_version() {
    let (ledger, _) = seeded().await;
    let first = ledger.get_versioned("p1").await.unwrap();
    let stale = first.clone();

    let claimed = ledger.claim(&first, ProductStatus::Sold).await.unwrap();
    assert_eq!(claimed.version, first.version + 1);
    assert!(matches!(
      ledger.claim(&stale, ProductStatus::Sold).await,
      Err(StoreError::Conflict { .. })
    ));

    ledger.release(&claimed).await.unwrap();
    assert!(ledger.get("p1").await.unwrap().status.is_available());
  }
}

// apps/marketplace/src/pipelines/contexts.rs

//! Data threaded through the marketplace sagas. Handlers receive these
//! wrapped in `vanik_saga::ContextData`.

use std::sync::Arc;

use crate::models::{NewOrder, Order, Product, Review};
use crate::services::ledger::ProductLedger;
use crate::store::{DocumentStore, Versioned};

/// Order creation: guarded read, claim, record.
pub struct CreateOrderCtx {
  pub store: Arc<dyn DocumentStore>,
  pub ledger: ProductLedger,
  pub buyer_id: String,
  pub request: NewOrder,

  /// Product as read by the guarded read, refreshed on a claim retry.
  pub product: Option<Versioned<Product>>,
  /// Product as written by a successful claim. The compensator releases
  /// against this version.
  pub claimed: Option<Versioned<Product>>,
  pub order: Option<Order>,
}

impl CreateOrderCtx {
  pub fn new(store: Arc<dyn DocumentStore>, buyer_id: String, request: NewOrder) -> Self {
    Self {
      ledger: ProductLedger::new(store.clone()),
      store,
      buyer_id,
      request,
      product: None,
      claimed: None,
      order: None,
    }
  }
}

/// Review creation: resolve order, check reviewer, resolve seller, record.
pub struct AddReviewCtx {
  pub store: Arc<dyn DocumentStore>,
  pub reviewer_id: String,
  pub order_id: String,
  pub rating: i64,
  pub comment: String,

  pub order: Option<Order>,
  pub seller_id: Option<String>,
  pub review: Option<Review>,
}

impl AddReviewCtx {
  pub fn new(store: Arc<dyn DocumentStore>, reviewer_id: String, order_id: String, rating: i64, comment: String) -> Self {
    Self {
      store,
      reviewer_id,
      order_id,
      rating,
      comment,
      order: None,
      seller_id: None,
      review: None,
    }
  }
}

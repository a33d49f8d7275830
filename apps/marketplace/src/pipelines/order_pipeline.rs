// apps/marketplace/src/pipelines/order_pipeline.rs

//! Order creation saga.
//!
//! The store cannot update a product and insert an order atomically, so the
//! product is claimed first with a compare-and-swap on the version read in
//! `load_product`, and released again if recording the order fails.

use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vanik_saga::{ContextData, Saga, SagaRegistry, SkipCondition, StepControl};

use crate::errors::{AppError, Result};
use crate::models::{Order, OrderStatus, OrderType, Product};
use crate::pipelines::contexts::CreateOrderCtx;
use crate::store::{self, Collection, StoreError};

pub const PRODUCT_UNAVAILABLE: &str = "Product is no longer available";

pub fn build_order_saga() -> Saga<CreateOrderCtx, AppError> {
  let buy_orders: SkipCondition<CreateOrderCtx> =
    Arc::new(|ctx: ContextData<CreateOrderCtx>| ctx.view(|c| c.request.order_type == OrderType::Buy));

  let mut saga = Saga::<CreateOrderCtx, AppError>::new(&[
    ("load_product", false, None),
    ("check_availability", false, None),
    ("validate_rental_window", false, Some(buy_orders)),
    ("claim_product", false, None),
    ("record_order", false, None),
  ]);

  saga.on_step("load_product", load_product);
  saga.on_step("check_availability", check_availability);
  saga.on_step("validate_rental_window", validate_rental_window);
  saga.on_step("claim_product", claim_product);
  saga.compensate_step("claim_product", release_claim);
  saga.on_step("record_order", record_order);
  saga
}

pub fn register_order_pipeline(registry: &SagaRegistry<AppError>) {
  registry.register(build_order_saga());
}

async fn load_product(ctx: ContextData<CreateOrderCtx>) -> Result<StepControl> {
  let (ledger, product_id) = ctx.view(|c| (c.ledger.clone(), c.request.product.clone()));
  let product = ledger.get_versioned(&product_id).await?;
  debug!(product_id = %product_id, version = product.version, status = ?product.doc.status, "Product loaded.");
  ctx.update(|c| c.product = Some(product));
  Ok(StepControl::Continue)
}

async fn check_availability(ctx: ContextData<CreateOrderCtx>) -> Result<StepControl> {
  ctx.view(|c| {
    let product = &c
      .product
      .as_ref()
      .ok_or_else(|| AppError::Internal("product not loaded".to_string()))?
      .doc;
    ensure_orderable(product, c)?;
    if !c.request.total_price.is_finite() || c.request.total_price < 0.0 {
      return Err(AppError::InvalidState(
        "Order total must be a non-negative number".to_string(),
      ));
    }
    Ok(StepControl::Continue)
  })
}

/// Product-side preconditions. Checked on the guarded read and again on the
/// re-read after a lost claim.
fn ensure_orderable(product: &Product, c: &CreateOrderCtx) -> Result<()> {
  if !product.status.is_available() {
    return Err(AppError::InvalidState(PRODUCT_UNAVAILABLE.to_string()));
  }
  if product.seller == c.buyer_id {
    return Err(AppError::InvalidState("You cannot order your own product".to_string()));
  }
  if !c.request.order_type.allowed_for(product.listing_type) {
    return Err(AppError::InvalidState(format!(
      "This product cannot be ordered as {:?}",
      c.request.order_type
    )));
  }
  Ok(())
}

async fn validate_rental_window(ctx: ContextData<CreateOrderCtx>) -> Result<StepControl> {
  ctx.view(|c| match (c.request.rental_start_date, c.request.rental_end_date) {
    (Some(start), Some(end)) if start <= end => Ok(StepControl::Continue),
    (Some(_), Some(_)) => Err(AppError::InvalidState(
      "Rental start date must not be after the end date".to_string(),
    )),
    _ => Err(AppError::InvalidState(
      "Rental orders need a start and end date".to_string(),
    )),
  })
}

async fn claim_product(ctx: ContextData<CreateOrderCtx>) -> Result<StepControl> {
  let (ledger, current, target) = ctx.view(|c| {
    (
      c.ledger.clone(),
      c.product.clone(),
      c.request.order_type.claimed_status(),
    )
  });
  let current = current.ok_or_else(|| AppError::Internal("product not loaded".to_string()))?;

  let claimed = match ledger.claim(&current, target).await {
    Ok(claimed) => claimed,
    Err(StoreError::Conflict { .. }) => {
      debug!(product_id = %current.doc.id, "Claim lost a race; re-reading product.");
      let fresh = ledger.get_versioned(&current.doc.id).await?;
      ctx.view(|c| ensure_orderable(&fresh.doc, c))?;
      let retried = ledger.claim(&fresh, target).await;
      ctx.update(|c| c.product = Some(fresh));
      retried.map_err(|e| match e {
        StoreError::Conflict { .. } => {
          AppError::Conflict("Product changed while ordering; please try again".to_string())
        }
        other => other.into(),
      })?
    }
    Err(e) => return Err(e.into()),
  };

  info!(product_id = %claimed.doc.id, status = ?target, version = claimed.version, "Product claimed.");
  ctx.update(|c| c.claimed = Some(claimed));
  Ok(StepControl::Continue)
}

async fn release_claim(ctx: ContextData<CreateOrderCtx>) -> anyhow::Result<()> {
  let (ledger, claimed) = ctx.view(|c| (c.ledger.clone(), c.claimed.clone()));
  let Some(claimed) = claimed else {
    return Ok(());
  };
  ledger
    .release(&claimed)
    .await
    .with_context(|| format!("releasing product {}", claimed.doc.id))?;
  warn!(product_id = %claimed.doc.id, "Product claim released after a failed order.");
  ctx.update(|c| c.claimed = None);
  Ok(())
}

async fn record_order(ctx: ContextData<CreateOrderCtx>) -> Result<StepControl> {
  let now = Utc::now();
  let (store, order) = ctx.view(|c| {
    let rental = c.request.order_type == OrderType::Rent;
    (
      c.store.clone(),
      Order {
        id: store::new_id(),
        buyer: c.buyer_id.clone(),
        product: c.request.product.clone(),
        order_type: c.request.order_type,
        rental_start_date: c.request.rental_start_date.filter(|_| rental),
        rental_end_date: c.request.rental_end_date.filter(|_| rental),
        total_price: c.request.total_price,
        status: OrderStatus::Pending,
        claim_version: c.claimed.as_ref().map(|p| p.version),
        created_at: now,
        updated_at: now,
      },
    )
  });
  order.validate()?;
  store::save_if(store.as_ref(), Collection::Orders, &order.id, None, &order).await?;
  info!(order_id = %order.id, product_id = %order.product, "Order recorded.");
  ctx.update(|c| c.order = Some(order));
  Ok(StepControl::Continue)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{ListingType, NewOrder, ProductStatus};
  use crate::store::{DocumentStore, MemoryStore};

  fn product(listing_type: ListingType) -> Product {
    let now = Utc::now();
    Product {
      id: "p1".into(),
      seller: "seller".into(),
      title: "Calculator".into(),
      description: String::new(),
      category: "electronics".into(),
      listing_type,
      price: 15.0,
      image: "calc.png".into(),
      status: ProductStatus::Available,
      created_at: now,
      updated_at: now,
    }
  }

  async fn store_with(p: &Product) -> Arc<dyn DocumentStore> {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    store::save(store.as_ref(), Collection::Products, &p.id, p).await.unwrap();
    store
  }

  fn request(order_type: OrderType) -> NewOrder {
    NewOrder {
      product: "p1".into(),
      order_type,
      rental_start_date: None,
      rental_end_date: None,
      total_price: 15.0,
    }
  }

  #[tokio::test]
  async fn buy_order_claims_product() {
    let store = store_with(&product(ListingType::Sell)).await;
    let ctx = ContextData::new(CreateOrderCtx::new(store.clone(), "buyer".into(), request(OrderType::Buy)));
    build_order_saga().run(ctx.clone()).await.unwrap();

    let order = ctx.view(|c| c.order.clone()).unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    let p = store::load::<Product>(store.as_ref(), Collection::Products, "p1").await.unwrap().unwrap();
    assert_eq!(p.doc.status, ProductStatus::Sold);
    assert_eq!(order.claim_version, Some(p.version));
  }

  #[tokio::test]
  async fn rent_without_window_is_rejected_before_claim() {
    let store = store_with(&product(ListingType::Rent)).await;
    let ctx = ContextData::new(CreateOrderCtx::new(store.clone(), "buyer".into(), request(OrderType::Rent)));
    let err = build_order_saga().run(ctx).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
    let p = store::load::<Product>(store.as_ref(), Collection::Products, "p1").await.unwrap().unwrap();
    assert!(p.doc.status.is_available());
    assert_eq!(p.version, 1);
  }

  #[tokio::test]
  async fn own_product_and_wrong_listing_type_are_rejected() {
    let store = store_with(&product(ListingType::Sell)).await;
    let own = ContextData::new(CreateOrderCtx::new(store.clone(), "seller".into(), request(OrderType::Buy)));
    assert!(matches!(build_order_saga().run(own).await, Err(AppError::InvalidState(_))));

    let rent = ContextData::new(CreateOrderCtx::new(store.clone(), "buyer".into(), request(OrderType::Rent)));
    assert!(matches!(build_order_saga().run(rent).await, Err(AppError::InvalidState(_))));
  }

  #[tokio::test]
  async fn unavailable_product_fails_invalid_state() {
    let mut sold = product(ListingType::Both);
    sold.status = ProductStatus::Sold;
    let store = store_with(&sold).await;
    let ctx = ContextData::new(CreateOrderCtx::new(store, "buyer".into(), request(OrderType::Buy)));
    assert!(matches!(
      build_order_saga().run(ctx).await,
      Err(AppError::InvalidState(m)) if m == PRODUCT_UNAVAILABLE
    ));
  }
}

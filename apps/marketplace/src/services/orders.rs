// apps/marketplace/src/services/orders.rs

//! Order lifecycle: creation through the order saga, status transitions and
//! the per-user order listing.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use vanik_saga::{ContextData, SagaOutcome, SagaRegistry};

use crate::errors::{AppError, Result};
use crate::models::{NewOrder, Order, OrderStatus, OrderView, Product, UserProfile};
use crate::pipelines::contexts::CreateOrderCtx;
use crate::services::ledger::ProductLedger;
use crate::store::{self, Collection, DocumentStore};

#[instrument(
  name = "orders::create",
  skip(sagas, store, request),
  fields(product_id = %request.product, order_type = ?request.order_type)
)]
pub async fn create_order(
  sagas: &SagaRegistry<AppError>,
  store: Arc<dyn DocumentStore>,
  buyer_id: &str,
  request: NewOrder,
) -> Result<Order> {
  let ctx = ContextData::new(CreateOrderCtx::new(store, buyer_id.to_string(), request));
  match sagas.run(ctx.clone()).await? {
    SagaOutcome::Completed => ctx
      .update(|c| c.order.take())
      .ok_or_else(|| AppError::Internal("order saga completed without an order".to_string())),
    SagaOutcome::Halted => Err(AppError::Internal("order saga halted unexpectedly".to_string())),
  }
}

#[instrument(name = "orders::update_status", skip(store, user), fields(user_id = %user.id))]
pub async fn update_order_status(
  store: Arc<dyn DocumentStore>,
  user: &UserProfile,
  order_id: &str,
  next: OrderStatus,
) -> Result<Order> {
  let current = store::load::<Order>(store.as_ref(), Collection::Orders, order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  let mut order = current.doc;

  let ledger = ProductLedger::new(store.clone());
  let product = match ledger.get_versioned(&order.product).await {
    Ok(p) => Some(p),
    Err(AppError::NotFound(_)) => None,
    Err(e) => return Err(e),
  };
  let is_seller = product.as_ref().is_some_and(|p| p.doc.seller == user.id);
  if order.buyer != user.id && !is_seller && !user.is_admin() {
    return Err(AppError::Unauthorized("Not authorized to update this order".to_string()));
  }

  if !order.status.can_transition_to(next) {
    return Err(AppError::InvalidState(format!(
      "Cannot change a {:?} order to {:?}",
      order.status, next
    )));
  }
  if order.status == next {
    return Ok(order);
  }

  order.status = next;
  order.updated_at = Utc::now();
  store::save_if(store.as_ref(), Collection::Orders, order_id, Some(current.version), &order).await?;
  info!(order_id, status = ?next, "Order status updated.");

  if next == OrderStatus::Cancelled {
    if let Some(product) = product.filter(|p| order.holds_claim(p.doc.status, p.version)) {
      if let Err(e) = ledger.release(&product).await {
        warn!(order_id, product_id = %order.product, error = %e, "Could not release product of cancelled order.");
      }
    }
  }
  Ok(order)
}

/// Orders `user_id` placed or received as seller, newest first, each with its
/// product resolved. Admins get the same view. Products are read at most once
/// per call.
#[instrument(name = "orders::list_for_user", skip(store))]
pub async fn list_orders_for_user(store: &dyn DocumentStore, user_id: &str) -> Result<Vec<OrderView>> {
  let orders = store::load_all::<Order>(store, Collection::Orders).await?;
  let mut products: HashMap<String, Option<Product>> = HashMap::new();
  let mut views = Vec::new();

  for order in orders.into_iter().map(|v| v.doc) {
    if !products.contains_key(&order.product) {
      let product = store::load::<Product>(store, Collection::Products, &order.product)
        .await?
        .map(|v| v.doc);
      products.insert(order.product.clone(), product);
    }
    let product = products.get(&order.product).cloned().flatten();

    if order.buyer == user_id || product.as_ref().is_some_and(|p| p.seller == user_id) {
      views.push(OrderView::new(order, product));
    }
  }

  views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
  Ok(views)
}

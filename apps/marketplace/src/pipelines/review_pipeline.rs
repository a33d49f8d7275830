// apps/marketplace/src/pipelines/review_pipeline.rs

//! Review creation saga. Uniqueness per `(order, reviewer)` comes from a
//! create-if-absent write on a key derived from that pair.

use chrono::Utc;
use tracing::{debug, info};
use vanik_saga::{ContextData, Saga, SagaRegistry, StepControl};

use crate::errors::{AppError, Result};
use crate::models::{Order, Product, Review};
use crate::pipelines::contexts::AddReviewCtx;
use crate::store::{self, Collection, StoreError};

pub fn build_review_saga() -> Saga<AddReviewCtx, AppError> {
  let mut saga = Saga::<AddReviewCtx, AppError>::new(&[
    ("load_order", false, None),
    ("authorize_reviewer", false, None),
    ("resolve_seller", false, None),
    ("record_review", false, None),
  ]);
  saga.on_step("load_order", load_order);
  saga.on_step("authorize_reviewer", authorize_reviewer);
  saga.on_step("resolve_seller", resolve_seller);
  saga.on_step("record_review", record_review);
  saga
}

pub fn register_review_pipeline(registry: &SagaRegistry<AppError>) {
  registry.register(build_review_saga());
}

async fn load_order(ctx: ContextData<AddReviewCtx>) -> Result<StepControl> {
  let (store, order_id) = ctx.view(|c| (c.store.clone(), c.order_id.clone()));
  let order = store::load::<Order>(store.as_ref(), Collection::Orders, &order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  ctx.update(|c| c.order = Some(order.doc));
  Ok(StepControl::Continue)
}

async fn authorize_reviewer(ctx: ContextData<AddReviewCtx>) -> Result<StepControl> {
  ctx.view(|c| match &c.order {
    Some(order) if order.buyer == c.reviewer_id => Ok(StepControl::Continue),
    Some(_) => Err(AppError::Unauthorized("Not authorized to review this order".to_string())),
    None => Err(AppError::Internal("order not loaded".to_string())),
  })
}

async fn resolve_seller(ctx: ContextData<AddReviewCtx>) -> Result<StepControl> {
  let (store, product_id) = ctx.view(|c| (c.store.clone(), c.order.as_ref().map(|o| o.product.clone())));
  let product_id = product_id.ok_or_else(|| AppError::Internal("order not loaded".to_string()))?;
  let product = store::load::<Product>(store.as_ref(), Collection::Products, &product_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Product for this order no longer exists".to_string()))?;
  debug!(product_id = %product_id, seller_id = %product.doc.seller, "Seller resolved.");
  ctx.update(|c| c.seller_id = Some(product.doc.seller));
  Ok(StepControl::Continue)
}

async fn record_review(ctx: ContextData<AddReviewCtx>) -> Result<StepControl> {
  let (store, review) = ctx.view(|c| {
    let rating = u8::try_from(c.rating).unwrap_or(0);
    let review = Review {
      id: Review::key_for(&c.order_id, &c.reviewer_id),
      reviewer: c.reviewer_id.clone(),
      seller: c.seller_id.clone().unwrap_or_default(),
      order: c.order_id.clone(),
      rating,
      comment: c.comment.trim().to_string(),
      created_at: Utc::now(),
    };
    (c.store.clone(), review)
  });
  review.validate()?;

  store::save_if(store.as_ref(), Collection::Reviews, &review.id, None, &review)
    .await
    .map_err(|e| match e {
      StoreError::Conflict { .. } => AppError::Conflict("You have already reviewed this order".to_string()),
      other => other.into(),
    })?;
  info!(order_id = %review.order, seller_id = %review.seller, rating = review.rating, "Review recorded.");
  ctx.update(|c| c.review = Some(review));
  Ok(StepControl::Continue)
}

// apps/marketplace/src/services/reviews.rs

use std::sync::Arc;
use tracing::{debug, instrument};
use vanik_saga::{ContextData, SagaOutcome, SagaRegistry};

use crate::errors::{AppError, Result};
use crate::models::{Review, ReviewView, SellerReviews};
use crate::pipelines::contexts::AddReviewCtx;
use crate::services::users;
use crate::store::{self, Collection, DocumentStore};

#[instrument(name = "reviews::add", skip(sagas, store, comment))]
pub async fn add_review(
  sagas: &SagaRegistry<AppError>,
  store: Arc<dyn DocumentStore>,
  reviewer_id: &str,
  order_id: &str,
  rating: i64,
  comment: String,
) -> Result<Review> {
  let ctx = ContextData::new(AddReviewCtx::new(
    store,
    reviewer_id.to_string(),
    order_id.to_string(),
    rating,
    comment,
  ));
  match sagas.run(ctx.clone()).await? {
    SagaOutcome::Completed => ctx
      .update(|c| c.review.take())
      .ok_or_else(|| AppError::Internal("review saga completed without a review".to_string())),
    SagaOutcome::Halted => Err(AppError::Internal("review saga halted unexpectedly".to_string())),
  }
}

/// Every review left for `seller_id` with reviewer names resolved, plus the
/// mean rating (`0` when there are none). Reviews are not indexed by seller,
/// so this scans the whole collection.
#[instrument(name = "reviews::for_seller", skip(store))]
pub async fn get_seller_reviews(store: &dyn DocumentStore, seller_id: &str) -> Result<SellerReviews> {
  let reviews: Vec<Review> = store::load_all::<Review>(store, Collection::Reviews)
    .await?
    .into_iter()
    .map(|v| v.doc)
    .filter(|r| r.seller == seller_id)
    .collect();

  let average_rating = if reviews.is_empty() {
    0.0
  } else {
    reviews.iter().map(|r| f64::from(r.rating)).sum::<f64>() / reviews.len() as f64
  };

  let mut views = Vec::with_capacity(reviews.len());
  for review in reviews {
    let reviewer_name = users::display_name(store, &review.reviewer).await?;
    views.push(ReviewView { review, reviewer_name });
  }
  debug!(count = views.len(), average_rating, "Seller reviews collected.");

  Ok(SellerReviews {
    reviews: views,
    average_rating,
  })
}

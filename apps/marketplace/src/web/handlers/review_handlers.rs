// apps/marketplace/src/web/handlers/review_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::instrument;

use crate::errors::Result;
use crate::services::reviews;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddReviewPayload {
  pub order_id: String,
  pub rating: i64,
  #[serde(default)]
  pub comment: String,
}

#[instrument(
  name = "handler::add_review",
  skip(app_state, payload, user),
  fields(user_id = %user.id(), order_id = %payload.order_id)
)]
pub async fn add_review_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<AddReviewPayload>,
  user: AuthenticatedUser,
) -> Result<HttpResponse> {
  let AddReviewPayload {
    order_id,
    rating,
    comment,
  } = payload.into_inner();
  let review = reviews::add_review(
    &app_state.sagas,
    app_state.store.clone(),
    user.id(),
    &order_id,
    rating,
    comment,
  )
  .await?;
  Ok(HttpResponse::Created().json(review))
}

#[instrument(name = "handler::seller_reviews", skip(app_state))]
pub async fn seller_reviews_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse> {
  let summary = reviews::get_seller_reviews(app_state.store.as_ref(), &path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(summary))
}

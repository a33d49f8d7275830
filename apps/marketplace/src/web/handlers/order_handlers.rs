// apps/marketplace/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::errors::{AppError, Result};
use crate::models::{NewOrder, OrderStatus};
use crate::services::orders;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct StatusUpdatePayload {
  pub status: Option<OrderStatus>,
}

#[instrument(
  name = "handler::create_order",
  skip(app_state, payload, user),
  fields(user_id = %user.id(), product_id = %payload.product)
)]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<NewOrder>,
  user: AuthenticatedUser,
) -> Result<HttpResponse> {
  match orders::create_order(&app_state.sagas, app_state.store.clone(), user.id(), payload.into_inner()).await {
    Ok(order) => {
      info!(order_id = %order.id, "Order created.");
      Ok(HttpResponse::Created().json(order))
    }
    Err(err) => {
      warn!(error = %err, "Order creation failed.");
      Err(err)
    }
  }
}

#[instrument(name = "handler::my_orders", skip(app_state, user), fields(user_id = %user.id()))]
pub async fn my_orders_handler(app_state: web::Data<AppState>, user: AuthenticatedUser) -> Result<HttpResponse> {
  let views = orders::list_orders_for_user(app_state.store.as_ref(), user.id()).await?;
  Ok(HttpResponse::Ok().json(views))
}

#[instrument(
  name = "handler::update_order_status",
  skip(app_state, path, payload, user),
  fields(user_id = %user.id(), order_id = %path.as_str())
)]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  payload: web::Json<StatusUpdatePayload>,
  user: AuthenticatedUser,
) -> Result<HttpResponse> {
  let status = payload
    .status
    .ok_or_else(|| AppError::InvalidState("Status is required".to_string()))?;
  let order = orders::update_order_status(app_state.store.clone(), &user.0, &path.into_inner(), status).await?;
  Ok(HttpResponse::Ok().json(order))
}

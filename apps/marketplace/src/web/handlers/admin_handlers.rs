// apps/marketplace/src/web/handlers/admin_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::errors::Result;
use crate::models::ProductStatus;
use crate::services::admin;
use crate::state::AppState;
use crate::web::extractors::AdminUser;

#[derive(Debug, Deserialize)]
pub struct ProductStatusPayload {
  pub status: Option<ProductStatus>,
}

#[instrument(name = "handler::admin_users", skip_all)]
pub async fn list_users_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse> {
  Ok(HttpResponse::Ok().json(admin::list_users(app_state.store.as_ref()).await?))
}

#[instrument(name = "handler::admin_delete_user", skip(app_state, _admin))]
pub async fn delete_user_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  _admin: AdminUser,
) -> Result<HttpResponse> {
  admin::delete_user(app_state.store.as_ref(), &path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "User removed" })))
}

#[instrument(name = "handler::admin_product_status", skip(app_state, payload, _admin))]
pub async fn update_product_status_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  payload: web::Json<ProductStatusPayload>,
  _admin: AdminUser,
) -> Result<HttpResponse> {
  let product = admin::update_product_status(&app_state.ledger(), &path.into_inner(), payload.status).await?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::admin_stats", skip_all)]
pub async fn stats_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse> {
  Ok(HttpResponse::Ok().json(admin::stats(app_state.store.as_ref()).await?))
}

// apps/marketplace/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::Result;
use crate::services::catalog::{self, NewProduct, ProductFilter, ProductPatch};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ProductFilter>,
) -> Result<HttpResponse> {
  let products = catalog::list_products(app_state.store.as_ref(), &query).await?;
  info!(count = products.len(), "Products listed.");
  Ok(HttpResponse::Ok().json(products))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_str()))]
pub async fn get_product_handler(app_state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
  let view = catalog::get_product(app_state.store.as_ref(), &path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(view))
}

#[instrument(name = "handler::create_product", skip(app_state, payload, user), fields(user_id = %user.id()))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<NewProduct>,
  user: AuthenticatedUser,
) -> Result<HttpResponse> {
  let product = catalog::create_product(app_state.store.as_ref(), user.id(), payload.into_inner()).await?;
  Ok(HttpResponse::Created().json(product))
}

#[instrument(
  name = "handler::update_product",
  skip(app_state, path, payload, user),
  fields(user_id = %user.id(), product_id = %path.as_str())
)]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  payload: web::Json<ProductPatch>,
  user: AuthenticatedUser,
) -> Result<HttpResponse> {
  let product =
    catalog::update_product(app_state.store.as_ref(), &user.0, &path.into_inner(), payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(
  name = "handler::delete_product",
  skip(app_state, path, user),
  fields(user_id = %user.id(), product_id = %path.as_str())
)]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  user: AuthenticatedUser,
) -> Result<HttpResponse> {
  catalog::delete_product(app_state.store.as_ref(), &user.0, &path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "Product removed" })))
}

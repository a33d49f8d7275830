// apps/marketplace/src/web/handlers/user_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::instrument;

use crate::errors::Result;
use crate::services::users::{self, ProfileUpdate};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

pub async fn me_handler(user: AuthenticatedUser) -> Result<HttpResponse> {
  Ok(HttpResponse::Ok().json(user.0))
}

#[instrument(name = "handler::update_me", skip(app_state, payload, user), fields(user_id = %user.id()))]
pub async fn update_me_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<ProfileUpdate>,
  user: AuthenticatedUser,
) -> Result<HttpResponse> {
  let profile = users::upsert_own_profile(app_state.store.as_ref(), &user.0, payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(profile))
}

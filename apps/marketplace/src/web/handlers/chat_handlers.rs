// apps/marketplace/src/web/handlers/chat_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::instrument;

use crate::errors::Result;
use crate::services::chat;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::my_chats", skip(app_state, user), fields(user_id = %user.id()))]
pub async fn my_chats_handler(app_state: web::Data<AppState>, user: AuthenticatedUser) -> Result<HttpResponse> {
  let threads = chat::my_chats(app_state.store.as_ref(), user.id()).await?;
  Ok(HttpResponse::Ok().json(threads))
}

#[instrument(name = "handler::chat_history", skip(app_state, path, user), fields(user_id = %user.id()))]
pub async fn chat_history_handler(
  app_state: web::Data<AppState>,
  path: web::Path<(String, String)>,
  user: AuthenticatedUser,
) -> Result<HttpResponse> {
  let (other_user_id, product_id) = path.into_inner();
  let messages = chat::chat_history(app_state.store.as_ref(), user.id(), &other_user_id, &product_id).await?;
  Ok(HttpResponse::Ok().json(messages))
}

// apps/marketplace/src/realtime/mod.rs

//! Chat socket surface: `GET /ws` upgrade, room relay and per-connection loop.

use actix_web::http::header::{AUTHORIZATION, ORIGIN};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tracing::{error, instrument, warn};

use crate::errors::AppError;
use crate::services::identity::{self, bearer_token};
use crate::state::AppState;

pub mod events;
pub mod hub;
mod session;

pub use hub::{thread_room, ChatRelay, ThreadRoom};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
  pub token: Option<String>,
}

/// Upgrades to a chat socket once the origin and bearer token check out.
/// The token comes from `?token=` or, failing that, the `Authorization`
/// header.
#[instrument(name = "handler::ws_entry", skip_all)]
pub async fn ws_entry(
  state: web::Data<AppState>,
  req: HttpRequest,
  query: web::Query<WsQuery>,
  body: web::Payload,
) -> actix_web::Result<HttpResponse> {
  if let Some(origin) = req.headers().get(ORIGIN) {
    let allowed = origin.to_str().map(|o| state.config.origin_allowed(o)).unwrap_or(false);
    if !allowed {
      warn!(origin = ?origin, "Rejected chat upgrade from disallowed origin.");
      return Err(actix_web::error::ErrorForbidden("Origin not allowed"));
    }
  }

  let token = query
    .token
    .clone()
    .filter(|t| !t.is_empty())
    .or_else(|| {
      req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string)
    })
    .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_string()))?;
  let verified = state.identity.verify(&token)?;
  let profile = identity::resolve_profile(state.store.as_ref(), &verified).await?;

  let (response, session, stream) = actix_ws::handle(&req, body).map_err(|e| {
    error!(error = %e, "Chat socket upgrade failed.");
    e
  })?;

  let relay = state.relay.clone();
  let (conn, inbox) = relay.connect(&profile.id);
  let chat = session::ChatSession::new(relay, conn, profile.id);
  actix_web::rt::spawn(chat.run(session, stream, inbox));
  Ok(response)
}

// apps/marketplace/src/web/extractors.rs

//! Request extractors that verify the bearer token and resolve the caller's
//! profile before a handler runs.

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::errors::AppError;
use crate::models::UserProfile;
use crate::services::identity::{self, bearer_token};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserProfile);

impl AuthenticatedUser {
  pub fn id(&self) -> &str {
    &self.0.id
  }
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let state = req.app_data::<web::Data<AppState>>().cloned();
    let token = req
      .headers()
      .get(AUTHORIZATION)
      .and_then(|h| h.to_str().ok())
      .and_then(bearer_token)
      .map(str::to_string);

    Box::pin(async move {
      let state = state.ok_or_else(|| AppError::Internal("application state not configured".to_string()))?;
      let Some(token) = token else {
        debug!("Request without bearer token.");
        return Err(AppError::Unauthorized("Not authorized, no token".to_string()));
      };
      let verified = state.identity.verify(&token)?;
      let profile = identity::resolve_profile(state.store.as_ref(), &verified).await?;
      Ok(AuthenticatedUser(profile))
    })
  }
}

/// An authenticated caller with the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub UserProfile);

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
    let user = AuthenticatedUser::from_request(req, payload);
    Box::pin(async move {
      let AuthenticatedUser(profile) = user.await?;
      if profile.is_admin() {
        Ok(AdminUser(profile))
      } else {
        Err(AppError::Unauthorized("Not authorized as an admin".to_string()))
      }
    })
  }
}

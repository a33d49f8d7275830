// apps/marketplace/src/services/identity.rs

//! Bearer token verification and profile resolution.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::models::UserProfile;
use crate::store::{self, Collection, DocumentStore};

/// Who a verified token says the caller is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
  pub uid: String,
  pub email: Option<String>,
}

pub trait IdentityProvider: Send + Sync {
  fn verify(&self, token: &str) -> Result<Identity>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
  sub: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  email: Option<String>,
  exp: i64,
  iat: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  iss: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  aud: Option<String>,
}

/// HS256 tokens signed with a shared secret.
pub struct JwtIdentityProvider {
  encoding_key: EncodingKey,
  decoding_key: DecodingKey,
  validation: Validation,
  issuer: Option<String>,
  audience: Option<String>,
}

impl JwtIdentityProvider {
  pub fn new(secret: &str, issuer: Option<String>, audience: Option<String>) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    if let Some(iss) = &issuer {
      validation.set_issuer(&[iss]);
    }
    match &audience {
      Some(aud) => validation.set_audience(&[aud]),
      None => validation.validate_aud = false,
    }
    Self {
      encoding_key: EncodingKey::from_secret(secret.as_bytes()),
      decoding_key: DecodingKey::from_secret(secret.as_bytes()),
      validation,
      issuer,
      audience,
    }
  }

  pub fn from_config(config: &AppConfig) -> Self {
    Self::new(
      &config.auth_jwt_secret,
      config.auth_jwt_issuer.clone(),
      config.auth_jwt_audience.clone(),
    )
  }

  /// Mints a token for `uid`. Used for seeding and by tests; production
  /// tokens come from the external identity service sharing the secret.
  pub fn issue(&self, uid: &str, email: Option<&str>, ttl: Duration) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
      sub: uid.to_string(),
      email: email.map(str::to_string),
      exp: (now + ttl).timestamp(),
      iat: now.timestamp(),
      iss: self.issuer.clone(),
      aud: self.audience.clone(),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
      .map_err(|e| AppError::Internal(format!("token generation failed: {}", e)))
  }
}

impl IdentityProvider for JwtIdentityProvider {
  fn verify(&self, token: &str) -> Result<Identity> {
    let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
      let reason = match e.kind() {
        ErrorKind::ExpiredSignature => "token expired",
        ErrorKind::InvalidSignature => "invalid signature",
        _ => "token failed",
      };
      debug!(error = %e, "Token verification failed.");
      AppError::Unauthorized(format!("Not authorized, {}", reason))
    })?;
    Ok(Identity {
      uid: data.claims.sub,
      email: data.claims.email,
    })
  }
}

/// Pulls the token out of an `Authorization: Bearer <token>` value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
  header_value
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

/// Loads the caller's stored profile, or a transient one if none exists.
#[instrument(name = "identity::resolve_profile", skip(store, identity), fields(user_id = %identity.uid))]
pub async fn resolve_profile(store: &dyn DocumentStore, identity: &Identity) -> Result<UserProfile> {
  match store::load::<UserProfile>(store, Collection::Users, &identity.uid).await {
    Ok(Some(stored)) => Ok(stored.doc),
    Ok(None) => Ok(UserProfile::transient(&identity.uid, identity.email.as_deref())),
    Err(e) => {
      warn!(error = %e, "Profile lookup failed.");
      Err(e.into())
    }
  }
}

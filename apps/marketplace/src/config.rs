// apps/marketplace/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Text,
  Json,
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,

  /// HS256 key used to verify bearer tokens.
  pub auth_jwt_secret: String,
  pub auth_jwt_issuer: Option<String>,
  pub auth_jwt_audience: Option<String>,

  /// Origins allowed to open the chat socket.
  pub cors_origins: Vec<String>,
  /// When set, only canonical `thread:` rooms may be joined.
  pub chat_strict_rooms: bool,

  pub log_format: LogFormat,
  pub seed_db: bool,
}

impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("auth_jwt_secret", &"[REDACTED]")
      .field("auth_jwt_issuer", &self.auth_jwt_issuer)
      .field("auth_jwt_audience", &self.auth_jwt_audience)
      .field("cors_origins", &self.cors_origins)
      .field("chat_strict_rooms", &self.chat_strict_rooms)
      .field("log_format", &self.log_format)
      .field("seed_db", &self.seed_db)
      .finish()
  }
}

const MIN_SECRET_LEN: usize = 32;

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from an arbitrary key lookup, so tests do not have to
  /// touch the process environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_env = |var_name: &str| {
      lookup(var_name).ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", var_name)))
    };
    let parse_bool = |var_name: &str| -> Result<bool> {
      get_env(var_name)
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .map_err(|e| AppError::Config(format!("Invalid {} value: {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "5001".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;

    let auth_jwt_secret = get_env("AUTH_JWT_SECRET")?;
    if auth_jwt_secret.len() < MIN_SECRET_LEN {
      return Err(AppError::Config(format!(
        "AUTH_JWT_SECRET must be at least {} bytes",
        MIN_SECRET_LEN
      )));
    }
    let auth_jwt_issuer = get_env("AUTH_JWT_ISSUER").ok().filter(|s| !s.is_empty());
    let auth_jwt_audience = get_env("AUTH_JWT_AUDIENCE").ok().filter(|s| !s.is_empty());

    let cors_origins = get_env("CORS_ORIGINS")
      .unwrap_or_else(|_| "http://localhost:5173".to_string())
      .split(',')
      .map(|s| s.trim().trim_end_matches('/').to_string())
      .filter(|s| !s.is_empty())
      .collect();

    let chat_strict_rooms = parse_bool("CHAT_STRICT_ROOMS")?;
    let seed_db = parse_bool("SEED_DB")?;

    let log_format = match get_env("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()).as_str() {
      "text" => LogFormat::Text,
      "json" => LogFormat::Json,
      other => return Err(AppError::Config(format!("Invalid LOG_FORMAT '{}': expected text or json", other))),
    };

    Ok(Self {
      server_host,
      server_port,
      auth_jwt_secret,
      auth_jwt_issuer,
      auth_jwt_audience,
      cors_origins,
      chat_strict_rooms,
      log_format,
      seed_db,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }

  pub fn origin_allowed(&self, origin: &str) -> bool {
    let origin = origin.trim_end_matches('/');
    self.cors_origins.iter().any(|o| o == "*" || o == origin)
  }
}

// apps/marketplace/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  #[default]
  Student,
  Admin,
}

/// Profile stored in the `users` collection, keyed by the identity
/// provider's subject id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub college: Option<String>,
  #[serde(default)]
  pub role: Role,
  pub created_at: DateTime<Utc>,
}

impl UserProfile {
  /// Stand-in for a verified identity that has no stored profile yet.
  pub fn transient(id: &str, email: Option<&str>) -> Self {
    let email = email.unwrap_or_default().to_string();
    Self {
      id: id.to_string(),
      name: if email.is_empty() { id.to_string() } else { email.clone() },
      email,
      college: None,
      role: Role::Student,
      created_at: Utc::now(),
    }
  }

  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }
}

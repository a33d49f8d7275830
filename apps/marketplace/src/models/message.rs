// apps/marketplace/src/models/message.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, Result};

/// One chat message. Append-only: never updated after it is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
  pub id: String,
  pub sender: String,
  pub receiver: String,
  pub content: String,
  /// Product the conversation is about, if any.
  #[serde(default)]
  pub product: Option<String>,
  #[serde(default)]
  pub room: Option<String>,
  #[serde(default)]
  pub read: bool,
  pub created_at: DateTime<Utc>,
}

impl Message {
  pub fn validate(&self) -> Result<()> {
    if self.content.trim().is_empty() {
      return Err(AppError::InvalidState("Message content is required".to_string()));
    }
    if self.sender == self.receiver {
      return Err(AppError::InvalidState("Sender and receiver must differ".to_string()));
    }
    Ok(())
  }

  /// The participant that is not `user_id`, or `None` if `user_id` is not in
  /// this message at all.
  pub fn counterpart_of(&self, user_id: &str) -> Option<&str> {
    if self.sender == user_id {
      Some(&self.receiver)
    } else if self.receiver == user_id {
      Some(&self.sender)
    } else {
      None
    }
  }

  /// True if the message is between exactly `a` and `b`, in either direction.
  pub fn is_between(&self, a: &str, b: &str) -> bool {
    (self.sender == a && self.receiver == b) || (self.sender == b && self.receiver == a)
  }
}

/// One row of a user's conversation list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatThreadSummary {
  pub product_id: Option<String>,
  pub product_title: Option<String>,
  pub other_user_id: String,
  pub other_user_name: Option<String>,
}

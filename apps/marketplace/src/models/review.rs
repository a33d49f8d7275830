// apps/marketplace/src/models/review.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
  pub id: String,
  pub reviewer: String,
  pub seller: String,
  pub order: String,
  pub rating: u8,
  pub comment: String,
  pub created_at: DateTime<Utc>,
}

impl Review {
  /// Store key for a review. One review per reviewer per order, so the key
  /// is derived from that pair rather than generated.
  pub fn key_for(order_id: &str, reviewer_id: &str) -> String {
    format!("{}:{}", order_id, reviewer_id)
  }

  pub fn validate(&self) -> Result<()> {
    if !(1..=5).contains(&self.rating) {
      return Err(AppError::InvalidState("Rating must be between 1 and 5".to_string()));
    }
    if self.comment.trim().is_empty() {
      return Err(AppError::InvalidState("Review comment is required".to_string()));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
  #[serde(flatten)]
  pub review: Review,
  pub reviewer_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerReviews {
  pub reviews: Vec<ReviewView>,
  pub average_rating: f64,
}

// apps/marketplace/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
  Sell,
  Rent,
  Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductStatus {
  Available,
  Sold,
  Rented,
}

impl ProductStatus {
  pub fn is_available(self) -> bool {
    self == ProductStatus::Available
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: String,
  /// Identity of the listing's owner.
  pub seller: String,
  pub title: String,
  #[serde(default)]
  pub description: String,
  pub category: String,
  #[serde(rename = "type")]
  pub listing_type: ListingType,
  #[serde(default)]
  pub price: f64,
  /// Opaque reference to the uploaded image.
  #[serde(alias = "imageRef")]
  pub image: String,
  pub status: ProductStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Product {
  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(AppError::InvalidState("Product title is required".to_string()));
    }
    if self.category.trim().is_empty() {
      return Err(AppError::InvalidState("Product category is required".to_string()));
    }
    if !self.price.is_finite() || self.price < 0.0 {
      return Err(AppError::InvalidState("Product price must be a non-negative number".to_string()));
    }
    if self.image.trim().is_empty() {
      return Err(AppError::InvalidState("Please upload an image".to_string()));
    }
    Ok(())
  }
}

/// Public seller fields attached to product reads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerSummary {
  pub id: String,
  pub name: String,
  pub email: String,
  pub college: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
  #[serde(flatten)]
  pub product: Product,
  pub seller_profile: Option<SellerSummary>,
}

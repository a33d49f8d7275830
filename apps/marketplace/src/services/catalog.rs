// apps/marketplace/src/services/catalog.rs

//! Product listings: filtered browsing and owner-checked mutation.

use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{info, instrument};

use crate::errors::{AppError, Result};
use crate::models::{ListingType, Product, ProductStatus, ProductView, SellerSummary, UserProfile};
use crate::store::{self, Collection, DocumentStore};

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
  pub category: Option<String>,
  #[serde(rename = "type")]
  pub listing_type: Option<ListingType>,
  pub min_price: Option<f64>,
  pub max_price: Option<f64>,
  /// Case-insensitive substring of the title.
  pub search: Option<String>,
}

impl ProductFilter {
  pub fn matches(&self, product: &Product) -> bool {
    if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
      if product.category != category {
        return false;
      }
    }
    if self.listing_type.is_some_and(|t| t != product.listing_type) {
      return false;
    }
    if self.min_price.is_some_and(|min| product.price < min) {
      return false;
    }
    if self.max_price.is_some_and(|max| product.price > max) {
      return false;
    }
    match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
      Some(needle) => product.title.to_lowercase().contains(&needle.to_lowercase()),
      None => true,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
  pub title: String,
  #[serde(default)]
  pub description: String,
  pub category: String,
  #[serde(rename = "type")]
  pub listing_type: ListingType,
  pub price: f64,
  #[serde(default, alias = "image")]
  pub image_ref: Option<String>,
}

/// Partial update. Absent fields keep their current value.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
  pub title: Option<String>,
  pub description: Option<String>,
  pub category: Option<String>,
  #[serde(rename = "type")]
  pub listing_type: Option<ListingType>,
  pub price: Option<f64>,
  pub status: Option<ProductStatus>,
  #[serde(alias = "image")]
  pub image_ref: Option<String>,
}

async fn seller_summary(store: &dyn DocumentStore, seller_id: &str) -> Result<Option<SellerSummary>> {
  Ok(
    store::load::<UserProfile>(store, Collection::Users, seller_id)
      .await?
      .map(|v| SellerSummary {
        id: v.doc.id,
        name: v.doc.name,
        email: v.doc.email,
        college: v.doc.college,
      }),
  )
}

#[instrument(name = "catalog::list", skip(store))]
pub async fn list_products(store: &dyn DocumentStore, filter: &ProductFilter) -> Result<Vec<ProductView>> {
  let products: Vec<Product> = store::load_all::<Product>(store, Collection::Products)
    .await?
    .into_iter()
    .map(|v| v.doc)
    .filter(|p| filter.matches(p))
    .collect();

  let mut sellers: HashMap<String, Option<SellerSummary>> = HashMap::new();
  let mut views = Vec::with_capacity(products.len());
  for product in products {
    if !sellers.contains_key(&product.seller) {
      let summary = seller_summary(store, &product.seller).await?;
      sellers.insert(product.seller.clone(), summary);
    }
    let seller_profile = sellers.get(&product.seller).cloned().flatten();
    views.push(ProductView { product, seller_profile });
  }
  Ok(views)
}

pub async fn get_product(store: &dyn DocumentStore, product_id: &str) -> Result<ProductView> {
  let product = store::load::<Product>(store, Collection::Products, product_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?
    .doc;
  let seller_profile = seller_summary(store, &product.seller).await?;
  Ok(ProductView { product, seller_profile })
}

#[instrument(name = "catalog::create", skip(store, input), fields(seller_id = %seller_id))]
pub async fn create_product(store: &dyn DocumentStore, seller_id: &str, input: NewProduct) -> Result<Product> {
  let now = Utc::now();
  let product = Product {
    id: store::new_id(),
    seller: seller_id.to_string(),
    title: input.title.trim().to_string(),
    description: input.description,
    category: input.category.trim().to_string(),
    listing_type: input.listing_type,
    price: input.price,
    image: input.image_ref.unwrap_or_default(),
    status: ProductStatus::Available,
    created_at: now,
    updated_at: now,
  };
  product.validate()?;
  store::save_if(store, Collection::Products, &product.id, None, &product).await?;
  info!(product_id = %product.id, "Product listed.");
  Ok(product)
}

fn ensure_owner_or_admin(product: &Product, user: &UserProfile, action: &str) -> Result<()> {
  if product.seller == user.id || user.is_admin() {
    Ok(())
  } else {
    Err(AppError::Unauthorized(format!("Not authorized to {} this product", action)))
  }
}

#[instrument(name = "catalog::update", skip(store, user, patch), fields(user_id = %user.id))]
pub async fn update_product(
  store: &dyn DocumentStore,
  user: &UserProfile,
  product_id: &str,
  patch: ProductPatch,
) -> Result<Product> {
  let current = store::load::<Product>(store, Collection::Products, product_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
  ensure_owner_or_admin(&current.doc, user, "update")?;

  let mut product = current.doc;
  let non_blank = |s: Option<String>| s.filter(|v| !v.trim().is_empty());
  if let Some(title) = non_blank(patch.title) {
    product.title = title.trim().to_string();
  }
  if let Some(description) = non_blank(patch.description) {
    product.description = description;
  }
  if let Some(category) = non_blank(patch.category) {
    product.category = category.trim().to_string();
  }
  if let Some(image) = non_blank(patch.image_ref) {
    product.image = image;
  }
  if let Some(listing_type) = patch.listing_type {
    product.listing_type = listing_type;
  }
  if let Some(price) = patch.price {
    product.price = price;
  }
  if let Some(status) = patch.status {
    product.status = status;
  }
  product.updated_at = Utc::now();
  product.validate()?;

  store::save_if(store, Collection::Products, product_id, Some(current.version), &product).await?;
  info!(product_id, "Product updated.");
  Ok(product)
}

#[instrument(name = "catalog::delete", skip(store, user), fields(user_id = %user.id))]
pub async fn delete_product(store: &dyn DocumentStore, user: &UserProfile, product_id: &str) -> Result<()> {
  let product = store::load::<Product>(store, Collection::Products, product_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
  ensure_owner_or_admin(&product.doc, user, "delete")?;
  store.delete(Collection::Products, product_id).await?;
  info!(product_id, "Product removed.");
  Ok(())
}

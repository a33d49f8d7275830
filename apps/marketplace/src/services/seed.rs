// apps/marketplace/src/services/seed.rs

//! Demo data for local runs (`SEED_DB=true`).

use chrono::Utc;
use tracing::info;

use crate::errors::Result;
use crate::models::{ListingType, Product, ProductStatus, Role, UserProfile};
use crate::store::{self, Collection, DocumentStore};

pub const DEMO_ADMIN: &str = "demo-admin";
pub const DEMO_SELLER: &str = "demo-seller";
pub const DEMO_BUYER: &str = "demo-buyer";

fn user(id: &str, name: &str, role: Role) -> UserProfile {
  UserProfile {
    id: id.to_string(),
    name: name.to_string(),
    email: format!("{}@campus.example", id),
    college: Some("North Campus".to_string()),
    role,
    created_at: Utc::now(),
  }
}

fn product(title: &str, category: &str, listing_type: ListingType, price: f64) -> Product {
  let now = Utc::now();
  Product {
    id: store::new_id(),
    seller: DEMO_SELLER.to_string(),
    title: title.to_string(),
    description: format!("{} in good condition", title),
    category: category.to_string(),
    listing_type,
    price,
    image: format!("/uploads/{}.jpg", title.to_lowercase().replace(' ', "-")),
    status: ProductStatus::Available,
    created_at: now,
    updated_at: now,
  }
}

/// Writes the demo users and listings. Skipped if any user already exists.
pub async fn seed_demo_data(store: &dyn DocumentStore) -> Result<()> {
  if store.count(Collection::Users).await? > 0 {
    info!("Store already has users; skipping seed.");
    return Ok(());
  }

  for profile in [
    user(DEMO_ADMIN, "Campus Admin", Role::Admin),
    user(DEMO_SELLER, "Sam Seller", Role::Student),
    user(DEMO_BUYER, "Bea Buyer", Role::Student),
  ] {
    store::save(store, Collection::Users, &profile.id, &profile).await?;
  }

  let listings = [
    product("Graphing calculator", "electronics", ListingType::Sell, 45.0),
    product("Mini fridge", "appliances", ListingType::Both, 60.0),
    product("Road bike", "transport", ListingType::Rent, 15.0),
  ];
  for listing in &listings {
    store::save(store, Collection::Products, &listing.id, listing).await?;
  }
  info!(users = 3, products = listings.len(), "Demo data seeded.");
  Ok(())
}

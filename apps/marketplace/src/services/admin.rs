// apps/marketplace/src/services/admin.rs

use serde::Serialize;
use tracing::{info, instrument};

use crate::errors::{AppError, Result};
use crate::models::{Order, OrderStatus, Product, ProductStatus, UserProfile};
use crate::services::ledger::ProductLedger;
use crate::store::{self, Collection, DocumentStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
  pub users_count: usize,
  pub products_count: usize,
  pub orders_count: usize,
  /// Sum of `totalPrice` over completed orders.
  pub total_revenue: f64,
}

pub async fn list_users(store: &dyn DocumentStore) -> Result<Vec<UserProfile>> {
  Ok(
    store::load_all::<UserProfile>(store, Collection::Users)
      .await?
      .into_iter()
      .map(|v| v.doc)
      .collect(),
  )
}

#[instrument(name = "admin::delete_user", skip(store))]
pub async fn delete_user(store: &dyn DocumentStore, user_id: &str) -> Result<()> {
  let user = store::load::<UserProfile>(store, Collection::Users, user_id)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
  if user.doc.is_admin() {
    return Err(AppError::InvalidState("Cannot delete admin user".to_string()));
  }
  store.delete(Collection::Users, user_id).await?;
  info!("User removed.");
  Ok(())
}

/// Admin override of a product's status. Goes through the ledger's
/// unconditional write, so it can also relist a sold product.
#[instrument(name = "admin::set_product_status", skip(ledger))]
pub async fn update_product_status(
  ledger: &ProductLedger,
  product_id: &str,
  status: Option<ProductStatus>,
) -> Result<Product> {
  match status {
    Some(status) => ledger.set_status(product_id, status).await,
    None => ledger.get(product_id).await,
  }
}

pub async fn stats(store: &dyn DocumentStore) -> Result<AdminStats> {
  let total_revenue = store::load_all::<Order>(store, Collection::Orders)
    .await?
    .into_iter()
    .filter(|o| o.doc.status == OrderStatus::Completed)
    .map(|o| o.doc.total_price)
    .sum();
  Ok(AdminStats {
    users_count: store.count(Collection::Users).await?,
    products_count: store.count(Collection::Products).await?,
    orders_count: store.count(Collection::Orders).await?,
    total_revenue,
  })
}

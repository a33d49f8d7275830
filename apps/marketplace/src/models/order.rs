// apps/marketplace/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::product::{ListingType, Product, ProductStatus};
use crate::errors::{AppError, Result};
use crate::store::Version;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
  Buy,
  Rent,
}

impl OrderType {
  /// Product status an order of this type moves its product to.
  pub fn claimed_status(self) -> ProductStatus {
    match self {
      OrderType::Buy => ProductStatus::Sold,
      OrderType::Rent => ProductStatus::Rented,
    }
  }

  pub fn allowed_for(self, listing: ListingType) -> bool {
    matches!(
      (self, listing),
      (_, ListingType::Both) | (OrderType::Buy, ListingType::Sell) | (OrderType::Rent, ListingType::Rent)
    )
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
  Pending,
  Completed,
  Cancelled,
}

impl OrderStatus {
  pub fn is_terminal(self) -> bool {
    matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
  }

  /// `Pending -> {Completed, Cancelled}`; terminal states are locked.
  /// Re-asserting the current status is accepted as a no-op.
  pub fn can_transition_to(self, next: OrderStatus) -> bool {
    self == next || (self == OrderStatus::Pending && next.is_terminal())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: String,
  pub buyer: String,
  /// Id of the ordered product.
  pub product: String,
  #[serde(rename = "type")]
  pub order_type: OrderType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rental_start_date: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rental_end_date: Option<DateTime<Utc>>,
  pub total_price: f64,
  pub status: OrderStatus,
  /// Product version written by this order's claim. Cancelling releases the
  /// product only while it still sits at this version.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub claim_version: Option<Version>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  /// Whether `product` is still held by this order's claim.
  pub fn holds_claim(&self, product_status: ProductStatus, product_version: Version) -> bool {
    product_status == self.order_type.claimed_status() && self.claim_version == Some(product_version)
  }

  pub fn validate(&self) -> Result<()> {
    if !self.total_price.is_finite() || self.total_price < 0.0 {
      return Err(AppError::InvalidState("Order total must be a non-negative number".to_string()));
    }
    match (self.order_type, self.rental_start_date, self.rental_end_date) {
      (OrderType::Rent, Some(start), Some(end)) if start > end => Err(AppError::InvalidState(
        "Rental start date must not be after the end date".to_string(),
      )),
      (OrderType::Rent, Some(_), Some(_)) | (OrderType::Buy, _, _) => Ok(()),
      (OrderType::Rent, _, _) => Err(AppError::InvalidState(
        "Rental orders need a start and end date".to_string(),
      )),
    }
  }
}

/// Client input for order creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
  /// Id of the product being ordered.
  pub product: String,
  #[serde(rename = "type")]
  pub order_type: OrderType,
  #[serde(default)]
  pub rental_start_date: Option<DateTime<Utc>>,
  #[serde(default)]
  pub rental_end_date: Option<DateTime<Utc>>,
  pub total_price: f64,
}

/// An order as returned to clients, with its product resolved. `product` is
/// `None` when the listing has since been deleted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
  pub id: String,
  pub buyer: String,
  pub product_id: String,
  pub product: Option<Product>,
  #[serde(rename = "type")]
  pub order_type: OrderType,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub rental_start_date: Option<DateTime<Utc>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub rental_end_date: Option<DateTime<Utc>>,
  pub total_price: f64,
  pub status: OrderStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl OrderView {
  pub fn new(order: Order, product: Option<Product>) -> Self {
    Self {
      id: order.id,
      buyer: order.buyer,
      product_id: order.product,
      product,
      order_type: order.order_type,
      rental_start_date: order.rental_start_date,
      rental_end_date: order.rental_end_date,
      total_price: order.total_price,
      status: order.status,
      created_at: order.created_at,
      updated_at: order.updated_at,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  #[test]
  fn terminal_states_are_locked() {
    use OrderStatus::*;
    assert!(Pending.can_transition_to(Completed));
    assert!(Pending.can_transition_to(Cancelled));
    assert!(Pending.can_transition_to(Pending));
    assert!(!Completed.can_transition_to(Pending));
    assert!(!Completed.can_transition_to(Cancelled));
    assert!(!Cancelled.can_transition_to(Completed));
    assert!(Cancelled.can_transition_to(Cancelled));
  }

  #[test]
  fn order_type_matches_listing_type() {
    assert!(OrderType::Buy.allowed_for(ListingType::Sell));
    assert!(OrderType::Rent.allowed_for(ListingType::Both));
    assert!(!OrderType::Rent.allowed_for(ListingType::Sell));
    assert!(!OrderType::Buy.allowed_for(ListingType::Rent));
    assert_eq!(OrderType::Buy.claimed_status(), ProductStatus::Sold);
    assert_eq!(OrderType::Rent.claimed_status(), ProductStatus::Rented);
  }

  #[test]
  fn rental_window_validation() {
    let now = Utc::now();
    let mut order = Order {
      id: "o1".into(),
      buyer: "b".into(),
      product: "p".into(),
      order_type: OrderType::Rent,
      rental_start_date: Some(now),
      rental_end_date: Some(now - Duration::days(1)),
      total_price: 10.0,
      status: OrderStatus::Pending,
      claim_version: Some(2),
      created_at: now,
      updated_at: now,
    };
    assert!(order.validate().is_err());

    order.rental_end_date = None;
    assert!(order.validate().is_err());

    order.rental_end_date = Some(now + Duration::days(3));
    assert!(order.validate().is_ok());

    order.order_type = OrderType::Buy;
    order.total_price = f64::NAN;
    assert!(order.validate().is_err());
  }

  #[test]
  fn claim_is_held_only_at_the_claimed_version() {
    let now = Utc::now();
    let order = Order {
      id: "o1".into(),
      buyer: "b".into(),
      product: "p".into(),
      order_type: OrderType::Buy,
      rental_start_date: None,
      rental_end_date: None,
      total_price: 10.0,
      status: OrderStatus::Pending,
      claim_version: Some(2),
      created_at: now,
      updated_at: now,
    };
    assert!(order.holds_claim(ProductStatus::Sold, 2));
    assert!(!order.holds_claim(ProductStatus::Sold, 4));
    assert!(!order.holds_claim(ProductStatus::Rented, 2));

    let legacy = Order { claim_version: None, ..order };
    assert!(!legacy.holds_claim(ProductStatus::Sold, 2));
  }
}

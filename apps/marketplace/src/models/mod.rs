// apps/marketplace/src/models/mod.rs

//! Document schemas for the five store collections, plus the read models
//! built from them.

pub mod message;
pub mod order;
pub mod product;
pub mod review;
pub mod user;

pub use message::{ChatThreadSummary, Message};
pub use order::{NewOrder, Order, OrderStatus, OrderType, OrderView};
pub use product::{ListingType, Product, ProductStatus, ProductView, SellerSummary};
pub use review::{Review, ReviewView, SellerReviews};
pub use user::{Role, UserProfile};

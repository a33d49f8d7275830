// apps/marketplace/src/web/handlers/mod.rs

pub mod admin_handlers;
pub mod chat_handlers;
pub mod order_handlers;
pub mod product_handlers;
pub mod review_handlers;
pub mod user_handlers;

// apps/marketplace/src/web/routes.rs

use actix_web::{web, HttpResponse};

use crate::errors::AppError;
use crate::realtime;
use crate::web::handlers::{
  admin_handlers, chat_handlers, order_handlers, product_handlers, review_handlers, user_handlers,
};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Mounts the REST API under `/api` and the chat socket at `/ws`.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  let json_config =
    web::JsonConfig::default().error_handler(|err, _req| AppError::Validation(err.to_string()).into());
  let query_config =
    web::QueryConfig::default().error_handler(|err, _req| AppError::Validation(err.to_string()).into());

  cfg
    .app_data(json_config)
    .app_data(query_config)
    .route("/health", web::get().to(health_check_handler))
    .route("/ws", web::get().to(realtime::ws_entry))
    .service(
      web::scope("/api")
        .route("/health", web::get().to(health_check_handler))
        .service(
          web::scope("/orders")
            .route("", web::post().to(order_handlers::create_order_handler))
            .route("/my", web::get().to(order_handlers::my_orders_handler))
            .route("/{id}/status", web::put().to(order_handlers::update_order_status_handler)),
        )
        .service(
          web::scope("/reviews")
            .route("", web::post().to(review_handlers::add_review_handler))
            .route("/seller/{seller_id}", web::get().to(review_handlers::seller_reviews_handler)),
        )
        .service(
          web::scope("/products")
            .route("", web::get().to(product_handlers::list_products_handler))
            .route("", web::post().to(product_handlers::create_product_handler))
            .route("/{id}", web::get().to(product_handlers::get_product_handler))
            .route("/{id}", web::put().to(product_handlers::update_product_handler))
            .route("/{id}", web::delete().to(product_handlers::delete_product_handler)),
        )
        .service(
          web::scope("/chat")
            .route("/mychats", web::get().to(chat_handlers::my_chats_handler))
            .route(
              "/{other_user_id}/{product_id}",
              web::get().to(chat_handlers::chat_history_handler),
            ),
        )
        .service(
          web::scope("/users")
            .route("/me", web::get().to(user_handlers::me_handler))
            .route("/me", web::put().to(user_handlers::update_me_handler)),
        )
        .service(
          web::scope("/admin")
            .route("/users", web::get().to(admin_handlers::list_users_handler))
            .route("/users/{id}", web::delete().to(admin_handlers::delete_user_handler))
            .route(
              "/products/{id}/status",
              web::put().to(admin_handlers::update_product_status_handler),
            )
            .route("/stats", web::get().to(admin_handlers::stats_handler)),
        ),
    );
}

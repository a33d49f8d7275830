// apps/marketplace/tests/catalog_tests.rs

mod common;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;

use common::*;
use marketplace::models::Role;
use marketplace::store::{DocumentStore, MemoryStore};
use marketplace::web::configure_app_routes;

#[actix_rt::test]
async fn listings_are_owner_managed_and_filterable() {
  let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
  put_user(store.as_ref(), "s1", "Sam", Role::Student).await;
  let app = test::init_service(
    App::new()
      .app_data(web::Data::new(state_with(store.clone())))
      .configure(configure_app_routes),
  )
  .await;

  let no_image = test::TestRequest::post()
    .uri("/api/products")
    .insert_header(bearer("s1"))
    .set_json(json!({"title": "Lamp", "category": "furniture", "type": "sell", "price": 10.0}))
    .to_request();
  let resp = test::call_service(&app, no_image).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "Please upload an image");

  let create = test::TestRequest::post()
    .uri("/api/products")
    .insert_header(bearer("s1"))
    .set_json(json!({
      "title": "Desk Lamp",
      "category": "furniture",
      "type": "sell",
      "price": 10.0,
      "imageRef": "/uploads/lamp.jpg"
    }))
    .to_request();
  let created: Value = test::call_and_read_body_json(&app, create).await;
  assert_eq!(created["status"], "Available");
  let id = created["id"].as_str().unwrap().to_string();

  let search = test::TestRequest::get().uri("/api/products?search=lamp&maxPrice=15").to_request();
  let found: Value = test::call_and_read_body_json(&app, search).await;
  assert_eq!(found.as_array().unwrap().len(), 1);
  assert_eq!(found[0]["sellerProfile"]["name"], "Sam");

  let too_cheap = test::TestRequest::get().uri("/api/products?minPrice=50").to_request();
  let none: Value = test::call_and_read_body_json(&app, too_cheap).await;
  assert!(none.as_array().unwrap().is_empty());

  let bad_query = test::TestRequest::get().uri("/api/products?minPrice=cheap").to_request();
  assert_eq!(test::call_service(&app, bad_query).await.status(), StatusCode::BAD_REQUEST);

  let hijack = test::TestRequest::put()
    .uri(&format!("/api/products/{}", id))
    .insert_header(bearer("intruder"))
    .set_json(json!({"price": 1.0}))
    .to_request();
  assert_eq!(test::call_service(&app, hijack).await.status(), StatusCode::UNAUTHORIZED);

  let reprice = test::TestRequest::put()
    .uri(&format!("/api/products/{}", id))
    .insert_header(bearer("s1"))
    .set_json(json!({"price": 8.0}))
    .to_request();
  let updated: Value = test::call_and_read_body_json(&app, reprice).await;
  assert_eq!(updated["price"], 8.0);
  assert_eq!(updated["title"], "Desk Lamp");

  let delete = test::TestRequest::delete()
    .uri(&format!("/api/products/{}", id))
    .insert_header(bearer("s1"))
    .to_request();
  assert_eq!(test::call_service(&app, delete).await.status(), StatusCode::OK);

  let gone = test::TestRequest::get().uri(&format!("/api/products/{}", id)).to_request();
  assert_eq!(test::call_service(&app, gone).await.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn own_profile_can_be_read_and_updated() {
  let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
  let app = test::init_service(
    App::new()
      .app_data(web::Data::new(state_with(store.clone())))
      .configure(configure_app_routes),
  )
  .await;

  let me = test::TestRequest::get()
    .uri("/api/users/me")
    .insert_header(bearer("newbie"))
    .to_request();
  let profile: Value = test::call_and_read_body_json(&app, me).await;
  assert_eq!(profile["id"], "newbie");
  assert_eq!(profile["role"], "student");

  let update = test::TestRequest::put()
    .uri("/api/users/me")
    .insert_header(bearer("newbie"))
    .set_json(json!({"name": "New Person", "college": "East", "role": "admin"}))
    .to_request();
  let saved: Value = test::call_and_read_body_json(&app, update).await;
  assert_eq!(saved["name"], "New Person");
  assert_eq!(saved["role"], "student");

  let health = test::TestRequest::get().uri("/health").to_request();
  assert_eq!(test::call_service(&app, health).await.status(), StatusCode::OK);
}

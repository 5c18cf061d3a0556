use actix_web::{http::StatusCode, web, web::ServiceConfig};
use serde_json::json;
use voltio_engine::{
    db_types::{OrderStatus, OrderWithItems, Role, UserId},
    events::EventPublishers,
    CartApi, OrderFlowApi, OrderFlowError,
};

use super::{
    helpers::{error_code, get_request, issue_token, order_fixture, patch_request, user},
    mocks::MockStorefrontDb,
};
use crate::routes::{CartPatchRoute, ConfirmOrderRoute, MyCartRoute};

fn cart_fixture(client: i64) -> OrderWithItems {
    OrderWithItems { order: order_fixture(1, OrderStatus::Draft, client, Some(2)), items: vec![] }
}

#[actix_web::test]
async fn fetch_my_cart_without_a_token_is_unauthorized() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/orders", configure_cart).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body).as_deref(), Some("unauthorized"));
}

#[actix_web::test]
async fn staff_roles_cannot_use_the_client_cart() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&user(2, Role::Seller));
    let (status, body) = get_request(&token, "/orders", configure_cart).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body).as_deref(), Some("forbidden"));
}

#[actix_web::test]
async fn fetch_my_cart_returns_the_draft() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&user(3, Role::Client));
    let (status, body) = get_request(&token, "/orders", configure_cart).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"DRAFT\""));
}

#[actix_web::test]
async fn fetch_my_cart_is_null_when_no_draft_exists() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&user(7, Role::Client));
    let (status, body) = get_request(&token, "/orders", configure_empty_cart).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "null");
}

#[actix_web::test]
async fn update_qty_normalizes_string_quantities() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&user(3, Role::Client));
    // "2,9" parses the Argentine way and floors to 2
    let body = json!({"action": "updateQty", "itemId": 11, "quantity": "2,9"});
    let (status, _) = patch_request(&token, "/orders", body, configure_update_qty).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn confirm_conflict_maps_to_409() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&user(1, Role::Admin));
    let (status, body) = patch_request(&token, "/orders/5/confirm", json!({}), configure_conflict).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body).as_deref(), Some("conflict"));
}

#[actix_web::test]
async fn unassigned_seller_confirm_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&user(4, Role::Seller));
    let (status, body) =
        patch_request(&token, "/orders/5/confirm", json!({}), configure_submitted_order).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body).as_deref(), Some("forbidden"));
}

#[actix_web::test]
async fn assigned_seller_confirm_succeeds() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&user(2, Role::Seller));
    let (status, body) =
        patch_request(&token, "/orders/5/confirm", json!({}), configure_submitted_order).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"APPROVED\""));
}

fn configure_cart(cfg: &mut ServiceConfig) {
    let mut db = MockStorefrontDb::new();
    db.expect_fetch_draft_order().returning(|client_id| Ok(Some(cart_fixture(client_id.0))));
    cfg.service(MyCartRoute::<MockStorefrontDb>::new()).app_data(web::Data::new(CartApi::new(db)));
}

fn configure_empty_cart(cfg: &mut ServiceConfig) {
    let mut db = MockStorefrontDb::new();
    db.expect_fetch_draft_order().returning(|_| Ok(None));
    cfg.service(MyCartRoute::<MockStorefrontDb>::new()).app_data(web::Data::new(CartApi::new(db)));
}

fn configure_update_qty(cfg: &mut ServiceConfig) {
    let mut db = MockStorefrontDb::new();
    db.expect_replace_draft_item()
        .withf(|client_id, item_id, quantity| {
            *client_id == UserId(3) && *item_id == 11 && *quantity == 2
        })
        .returning(|client_id, _, _| Ok(cart_fixture(client_id.0)));
    let flow_db = MockStorefrontDb::new();
    cfg.service(CartPatchRoute::<MockStorefrontDb>::new())
        .app_data(web::Data::new(CartApi::new(db)))
        .app_data(web::Data::new(OrderFlowApi::new(flow_db, EventPublishers::default())));
}

fn configure_conflict(cfg: &mut ServiceConfig) {
    let mut db = MockStorefrontDb::new();
    db.expect_fetch_order()
        .returning(|id| Ok(Some(order_fixture(id.0, OrderStatus::Submitted, 3, Some(2)))));
    db.expect_transition_order().returning(|id, from, _| {
        Err(OrderFlowError::Conflict { order_id: id, expected: from })
    });
    cfg.service(ConfirmOrderRoute::<MockStorefrontDb>::new())
        .app_data(web::Data::new(OrderFlowApi::new(db, EventPublishers::default())));
}

fn configure_submitted_order(cfg: &mut ServiceConfig) {
    let mut db = MockStorefrontDb::new();
    db.expect_fetch_order()
        .returning(|id| Ok(Some(order_fixture(id.0, OrderStatus::Submitted, 3, Some(2)))));
    db.expect_transition_order()
        .withf(|_, from, to| *from == OrderStatus::Submitted && *to == OrderStatus::Approved)
        .returning(|id, _, _| Ok(order_fixture(id.0, OrderStatus::Approved, 3, Some(2))));
    db.expect_fetch_user().returning(|id| Ok(Some(user(id.0, Role::Client))));
    cfg.service(ConfirmOrderRoute::<MockStorefrontDb>::new())
        .app_data(web::Data::new(OrderFlowApi::new(db, EventPublishers::default())));
}

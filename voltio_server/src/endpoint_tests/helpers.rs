use actix_web::{
    body::MessageBody, http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App,
};
use chrono::Utc;
use log::debug;
use serde_json::Value;
use voltio_common::{Money, Secret};
use voltio_engine::db_types::{
    Currency, Order, OrderCode, OrderId, OrderStatus, OrderType, Role, UserId, UserInfo,
};

use crate::{
    auth::{TokenIssuer, TokenVerifier},
    config::AuthConfig,
};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig { jwt_secret: Secret::new("endpoint-test-secret-0123456789abcdef".to_string()) }
}

pub fn user(id: i64, role: Role) -> UserInfo {
    UserInfo { id: UserId(id), role, email: format!("user{id}@voltio.test"), name: format!("User {id}") }
}

pub fn issue_token(user: &UserInfo) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(user, None).expect("Failed to sign token")
}

pub fn order_fixture(id: i64, status: OrderStatus, client: i64, seller: Option<i64>) -> Order {
    Order {
        id: OrderId(id),
        code: Some(OrderCode(format!("ORD-{id}"))),
        order_type: OrderType::Order,
        status,
        currency: Currency::Ars,
        subtotal: Money::from_units(200),
        tax_total: Money::from_units(42),
        total: Money::from_units(242),
        client_id: Some(UserId(client)),
        seller_id: seller.map(UserId),
        contact_name: None,
        contact_email: None,
        contact_phone: None,
        contact_message: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        submitted_at: Some(Utc::now()),
    }
}

async fn send(
    req: TestRequest,
    auth_header: &str,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    let req = if auth_header.is_empty() {
        req
    } else {
        req.insert_header(("Authorization", format!("Bearer {auth_header}")))
    };
    let req = req.to_request();
    let verifier = TokenVerifier::new(&get_auth_config());
    let app = App::new().app_data(web::Data::new(verifier)).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req).await {
        Ok(res) => {
            let (_, res) = res.into_parts();
            let status = res.status();
            let body =
                String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
            (status, body)
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body =
                String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
            (status, body)
        },
    }
}

pub async fn get_request(
    auth_header: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    send(TestRequest::get().uri(path), auth_header, configure).await
}

pub async fn patch_request(
    auth_header: &str,
    path: &str,
    body: Value,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    send(TestRequest::patch().uri(path).set_json(body), auth_header, configure).await
}

/// The machine-readable error code of a structured error body, if any.
pub fn error_code(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value["error"]["code"].as_str().map(|s| s.to_string())
}

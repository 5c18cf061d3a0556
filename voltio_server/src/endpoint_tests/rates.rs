use actix_web::{http::StatusCode, web, web::ServiceConfig};
use voltio_common::Money;
use voltio_engine::{
    db_types::{Currency, ExchangeRate},
    traits::ExchangeRateError,
    ExchangeRateApi,
};

use super::{
    helpers::{error_code, get_request},
    mocks::MockRatesDb,
};
use crate::routes::ExchangeRateRoute;

#[actix_web::test]
async fn exchange_rate_is_public_and_returns_the_stored_rate() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/exchange-rate", configure_with_rate).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"sell\":137250"));
}

#[actix_web::test]
async fn missing_rate_is_404_with_a_machine_readable_code() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/exchange-rate", configure_without_rate).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    // the storefront reads this code and keeps showing USD prices in USD,
    // never an invented ARS figure
    assert_eq!(error_code(&body).as_deref(), Some("rate_unavailable"));
}

fn configure_with_rate(cfg: &mut ServiceConfig) {
    let mut db = MockRatesDb::new();
    db.expect_fetch_last_rate().returning(|currency| {
        Ok(ExchangeRate::new(currency, Money::from(135_250), Money::from(137_250), "BNA"))
    });
    cfg.service(ExchangeRateRoute::<MockRatesDb>::new())
        .app_data(web::Data::new(ExchangeRateApi::new(db)));
}

fn configure_without_rate(cfg: &mut ServiceConfig) {
    let mut db = MockRatesDb::new();
    db.expect_fetch_last_rate().returning(|currency| Err(ExchangeRateError::RateDoesNotExist(currency)));
    cfg.service(ExchangeRateRoute::<MockRatesDb>::new())
        .app_data(web::Data::new(ExchangeRateApi::new(db)));
}

use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use voltio_engine::{
    events::{EventHandlers, EventPublishers},
    CartApi, ExchangeRateApi, OrderFlowApi, SqliteDatabase,
};

use crate::{
    auth::{TokenIssuer, TokenVerifier},
    config::ServerConfig,
    errors::ServerError,
    integrations::BnaClient,
    notifier::notification_hooks,
    rate_worker::start_rate_worker,
    routes::{
        health, AssignOrderRoute, CancelOrderRoute, CartPatchRoute, ClientCancelRoute,
        ConfirmOrderRoute, DeliverOrderRoute, ExchangeRateRoute, FulfillOrderRoute, MyCartRoute,
        OrderByIdRoute, OrdersSearchRoute, RejectOrderRoute, ShipOrderRoute, SubmitQuoteRoute,
        UpdateExchangeRateRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(128, notification_hooks());
    let publishers = handlers.publishers();
    handlers.start_handlers().await;
    let bna = BnaClient::new(config.bna_url.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.disable_rate_worker {
        info!("🕰️ Exchange-rate worker disabled by configuration");
    } else {
        start_rate_worker(db.clone(), bna.clone(), config.rate_refresh_interval);
    }
    let srv = create_server_instance(config, db, publishers, bna)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    publishers: EventPublishers,
    bna: BnaClient,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let flow_api = OrderFlowApi::new(db.clone(), publishers.clone());
        let cart_api = CartApi::new(db.clone());
        let rate_api = ExchangeRateApi::new(db.clone());
        let verifier = TokenVerifier::new(&config.auth);
        let issuer = TokenIssuer::new(&config.auth);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("voltio::access_log"))
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(cart_api))
            .app_data(web::Data::new(rate_api))
            .app_data(web::Data::new(verifier))
            .app_data(web::Data::new(issuer))
            .app_data(web::Data::new(bna.clone()))
            .service(health)
            // cart + client order surface
            .service(MyCartRoute::<SqliteDatabase>::new())
            .service(CartPatchRoute::<SqliteDatabase>::new())
            .service(ClientCancelRoute::<SqliteDatabase>::new())
            // guest quotes
            .service(SubmitQuoteRoute::<SqliteDatabase>::new())
            // staff order surface ("/orders/all" must register before "/orders/{id}")
            .service(OrdersSearchRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(ConfirmOrderRoute::<SqliteDatabase>::new())
            .service(RejectOrderRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new())
            .service(AssignOrderRoute::<SqliteDatabase>::new())
            .service(FulfillOrderRoute::<SqliteDatabase>::new())
            .service(ShipOrderRoute::<SqliteDatabase>::new())
            .service(DeliverOrderRoute::<SqliteDatabase>::new())
            // exchange rate
            .service(ExchangeRateRoute::<SqliteDatabase>::new())
            .service(UpdateExchangeRateRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}

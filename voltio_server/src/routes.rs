//! Request handler definitions.
//!
//! Define each route and its handler here. Handlers stay thin: normalize the
//! payload, hand it to the engine API, serialize the result. All status
//! logic lives in the engine's lifecycle module — nothing in this file
//! compares order statuses.
//!
//! Actix cannot register generic handlers directly, so each route gets a
//! small `HttpServiceFactory` struct via the `route!` macro. The `requires`
//! form wraps the route in the ACL middleware so only the listed roles get
//! through.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use voltio_engine::{
    db_types::{Currency, OrderId, Role},
    traits::{ExchangeRates, StorefrontDatabase},
    CartApi, ExchangeRateApi, OrderFlowApi,
};

use crate::{
    auth::JwtClaims,
    data_objects::{AssignRequest, CancelRequest, CartPatchRequest, OrderSearchQuery, QuoteRequest},
    errors::ServerError,
    integrations::BnaClient,
};
use voltio_common::normalize;

#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>); }
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>); }
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Cart  ----------------------------------------------------
route!(my_cart => Get "/orders" impl StorefrontDatabase where requires [Role::Client]);
/// The client's current draft order (their server-side cart), or JSON `null`
/// when no draft exists. The storefront probes this on every page load to
/// decide between the server cart and the local one.
pub async fn my_cart<A>(
    claims: JwtClaims,
    api: web::Data<CartApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: StorefrontDatabase,
{
    trace!("💻️ GET /orders for client #{}", claims.sub);
    let cart = api.current_cart(claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(cart_patch => Patch "/orders" impl StorefrontDatabase where requires [Role::Client]);
/// One cart mutation against the draft order, discriminated by `action`.
/// `submit` runs the full submission pipeline and returns the frozen order.
pub async fn cart_patch<A>(
    claims: JwtClaims,
    cart_api: web::Data<CartApi<A>>,
    flow_api: web::Data<OrderFlowApi<A>>,
    body: web::Json<CartPatchRequest>,
) -> Result<HttpResponse, ServerError>
where
    A: StorefrontDatabase,
{
    let actor = claims.user_info();
    let cart = match body.into_inner() {
        CartPatchRequest::AddItem { product_id, quantity } => {
            cart_api.add_item(&actor, product_id, normalize::to_quantity(&quantity)).await?
        },
        CartPatchRequest::UpdateQty { item_id, quantity } => {
            cart_api.update_quantity(&actor, item_id, normalize::to_quantity(&quantity)).await?
        },
        CartPatchRequest::RemoveItem { item_id } => cart_api.remove_item(&actor, item_id).await?,
        CartPatchRequest::Submit => flow_api.submit_order(&actor).await?,
    };
    Ok(HttpResponse::Ok().json(cart))
}

route!(client_cancel => Post "/orders/cancel" impl StorefrontDatabase where requires [Role::Client]);
/// Client self-cancel. The engine only allows it while the order is still
/// DRAFT or SUBMITTED; later cancellation needs staff.
pub async fn client_cancel<A>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<A>>,
    body: web::Json<CancelRequest>,
) -> Result<HttpResponse, ServerError>
where
    A: StorefrontDatabase,
{
    let order = api.cancel_order(&claims.user_info(), body.order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Quotes  ----------------------------------------------------
route!(submit_quote => Post "/quotes" impl StorefrontDatabase);
/// Guest quote submission: no session required, items may be unpriced.
pub async fn submit_quote<A>(
    api: web::Data<OrderFlowApi<A>>,
    body: web::Json<QuoteRequest>,
) -> Result<HttpResponse, ServerError>
where
    A: StorefrontDatabase,
{
    let (contact, lines) = body.into_inner().into_parts();
    let quote = api.submit_quote(&contact, &lines).await?;
    Ok(HttpResponse::Created().json(quote))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(orders_search => Get "/orders/all" impl StorefrontDatabase where requires [Role::Admin, Role::Seller]);
/// Staff listing. Sellers only ever see orders assigned to them; the engine
/// narrows the filter.
pub async fn orders_search<A>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<A>>,
    query: web::Query<OrderSearchQuery>,
) -> Result<HttpResponse, ServerError>
where
    A: StorefrontDatabase,
{
    let result = api.search(&claims.user_info(), query.into_inner().into_filter()).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(order_by_id => Get "/orders/{id}" impl StorefrontDatabase);
pub async fn order_by_id<A>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<A>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServerError>
where
    A: StorefrontDatabase,
{
    let order = api.order_for(&claims.user_info(), OrderId(path.into_inner())).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(confirm_order => Patch "/orders/{id}/confirm" impl StorefrontDatabase where requires [Role::Admin, Role::Seller]);
pub async fn confirm_order<A>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<A>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServerError>
where
    A: StorefrontDatabase,
{
    let order = api.confirm_order(&claims.user_info(), OrderId(path.into_inner())).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(reject_order => Patch "/orders/{id}/reject" impl StorefrontDatabase where requires [Role::Admin, Role::Seller]);
pub async fn reject_order<A>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<A>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServerError>
where
    A: StorefrontDatabase,
{
    let order = api.reject_order(&claims.user_info(), OrderId(path.into_inner())).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(cancel_order => Patch "/orders/{id}/cancel" impl StorefrontDatabase where requires [Role::Admin, Role::Seller]);
pub async fn cancel_order<A>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<A>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServerError>
where
    A: StorefrontDatabase,
{
    let order = api.cancel_order(&claims.user_info(), OrderId(path.into_inner())).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(assign_order => Patch "/orders/{id}/assign" impl StorefrontDatabase where requires [Role::Admin]);
pub async fn assign_order<A>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<A>>,
    path: web::Path<i64>,
    body: web::Json<AssignRequest>,
) -> Result<HttpResponse, ServerError>
where
    A: StorefrontDatabase,
{
    let order =
        api.assign_order(&claims.user_info(), OrderId(path.into_inner()), body.seller_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(fulfill_order => Patch "/orders/{id}/fulfill" impl StorefrontDatabase where requires [Role::Admin, Role::Seller]);
pub async fn fulfill_order<A>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<A>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServerError>
where
    A: StorefrontDatabase,
{
    let order = api.fulfill_order(&claims.user_info(), OrderId(path.into_inner())).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(ship_order => Patch "/orders/{id}/ship" impl StorefrontDatabase where requires [Role::Admin, Role::Seller]);
pub async fn ship_order<A>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<A>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServerError>
where
    A: StorefrontDatabase,
{
    let order = api.ship_order(&claims.user_info(), OrderId(path.into_inner())).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(deliver_order => Patch "/orders/{id}/deliver" impl StorefrontDatabase where requires [Role::Admin, Role::Seller]);
pub async fn deliver_order<A>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<A>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServerError>
where
    A: StorefrontDatabase,
{
    let order = api.deliver_order(&claims.user_info(), OrderId(path.into_inner())).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Exchange rate  ----------------------------------------------------
route!(exchange_rate => Get "/exchange-rate" impl ExchangeRates);
/// The last stored USD sell rate. 404 with code `rate_unavailable` when no
/// rate has ever been fetched — the storefront then shows USD prices in USD.
pub async fn exchange_rate<A>(api: web::Data<ExchangeRateApi<A>>) -> Result<HttpResponse, ServerError>
where A: ExchangeRates {
    let rate = api.fetch_last_rate(Currency::Usd).await?;
    Ok(HttpResponse::Ok().json(rate))
}

route!(update_exchange_rate => Post "/exchange-rate/update" impl ExchangeRates where requires [Role::Admin]);
/// Admin-triggered refresh from the bank. A failed fetch leaves the stored
/// rate untouched and reports the upstream error.
pub async fn update_exchange_rate<A>(
    api: web::Data<ExchangeRateApi<A>>,
    bna: web::Data<BnaClient>,
) -> Result<HttpResponse, ServerError>
where
    A: ExchangeRates,
{
    let rate = bna.fetch_usd_rate().await.map_err(|e| ServerError::UpstreamError(e.to_string()))?;
    api.set_exchange_rate(&rate).await?;
    info!("💱️ Exchange rate updated: {rate}");
    Ok(HttpResponse::Ok().json(rate))
}

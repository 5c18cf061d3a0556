use mockall::mock;
use voltio_engine::{
    db_types::{
        CatalogProduct, Currency, ExchangeRate, Order, OrderId, OrderStatus, OrderWithItems,
        ProductId, QuoteContact, QuoteLine, UserId, UserInfo,
    },
    order_objects::OrderQueryFilter,
    traits::{ExchangeRateError, ExchangeRates, StorefrontDatabase},
    OrderFlowError,
};

mock! {
    pub StorefrontDb {}
    impl StorefrontDatabase for StorefrontDb {
        fn url(&self) -> &str;
        async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, OrderFlowError>;
        async fn fetch_order_with_items(&self, id: OrderId) -> Result<Option<OrderWithItems>, OrderFlowError>;
        async fn fetch_draft_order(&self, client_id: UserId) -> Result<Option<OrderWithItems>, OrderFlowError>;
        async fn fetch_product(&self, id: ProductId) -> Result<Option<CatalogProduct>, OrderFlowError>;
        async fn fetch_user(&self, id: UserId) -> Result<Option<UserInfo>, OrderFlowError>;
        async fn upsert_draft_line(&self, client: &UserInfo, product_id: ProductId, quantity: i64) -> Result<OrderWithItems, OrderFlowError>;
        async fn replace_draft_item(&self, client_id: UserId, item_id: i64, quantity: i64) -> Result<OrderWithItems, OrderFlowError>;
        async fn remove_draft_item(&self, client_id: UserId, item_id: i64) -> Result<OrderWithItems, OrderFlowError>;
        async fn clear_draft(&self, client_id: UserId) -> Result<(), OrderFlowError>;
        async fn submit_draft(&self, client: &UserInfo) -> Result<OrderWithItems, OrderFlowError>;
        async fn transition_order(&self, id: OrderId, from: OrderStatus, to: OrderStatus) -> Result<Order, OrderFlowError>;
        async fn assign_order(&self, id: OrderId, from: OrderStatus, seller_id: UserId) -> Result<Order, OrderFlowError>;
        async fn insert_quote(&self, contact: &QuoteContact, lines: &[QuoteLine]) -> Result<OrderWithItems, OrderFlowError>;
        async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError>;
    }
}

mock! {
    pub RatesDb {}
    impl ExchangeRates for RatesDb {
        async fn fetch_last_rate(&self, currency: Currency) -> Result<ExchangeRate, ExchangeRateError>;
        async fn set_exchange_rate(&self, rate: &ExchangeRate) -> Result<(), ExchangeRateError>;
    }
}

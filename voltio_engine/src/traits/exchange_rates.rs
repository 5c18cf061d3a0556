use thiserror::Error;

use crate::db_types::{Currency, ExchangeRate};

#[derive(Debug, Clone, Error)]
pub enum ExchangeRateError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("No exchange rate has been stored for {0}")]
    RateDoesNotExist(Currency),
}

#[allow(async_fn_in_trait)]
pub trait ExchangeRates {
    /// Fetch the most recently stored rate for the given currency. If none has
    /// ever been stored, [`ExchangeRateError::RateDoesNotExist`] is returned —
    /// callers must degrade (display USD as USD) rather than assume a rate.
    async fn fetch_last_rate(&self, currency: Currency) -> Result<ExchangeRate, ExchangeRateError>;

    /// Persist a freshly fetched rate, replacing the previous one for the same
    /// currency and source.
    async fn set_exchange_rate(&self, rate: &ExchangeRate) -> Result<(), ExchangeRateError>;
}

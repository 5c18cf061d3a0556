//! Session-cached access to the USD sell rate.
//!
//! The first successful fetch is cached for the lifetime of the gateway (one
//! page session). A failed fetch yields `None`: USD-priced lines are then
//! displayed in USD with no ARS equivalent — a missing rate is never shown
//! as zero, and never invented.
use std::sync::Arc;

use log::*;
use reqwest::Client;
use tokio::sync::Mutex;
use voltio_common::Money;
use voltio_engine::db_types::ExchangeRate;

pub struct RateGateway {
    client: Arc<Client>,
    base_url: String,
    cache: Mutex<Option<ExchangeRate>>,
}

impl std::fmt::Debug for RateGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RateGateway ({})", self.base_url)
    }
}

impl RateGateway {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self { client: Arc::new(Client::new()), base_url: base_url.into(), cache: Mutex::new(None) }
    }

    /// The current sell rate, fetched once per session.
    pub async fn sell_rate(&self) -> Option<ExchangeRate> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = self.fetch().await;
        }
        cache.clone()
    }

    /// The ARS display value of a USD amount, when a rate is available.
    pub async fn ars_equivalent(&self, usd: Money) -> Option<Money> {
        self.sell_rate().await.map(|rate| rate.convert_to_ars(usd))
    }

    async fn fetch(&self) -> Option<ExchangeRate> {
        let url = format!("{}/exchange-rate", self.base_url);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("💱️ Exchange rate fetch failed: {e}. USD prices stay in USD.");
                return None;
            },
        };
        if !response.status().is_success() {
            debug!("💱️ Exchange rate endpoint returned {}. USD prices stay in USD.", response.status());
            return None;
        }
        match response.json::<ExchangeRate>().await {
            Ok(rate) => {
                debug!("💱️ Cached session rate: {rate}");
                Some(rate)
            },
            Err(e) => {
                warn!("💱️ Exchange rate payload unreadable: {e}. USD prices stay in USD.");
                None
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn failed_fetch_yields_no_rate_not_zero() {
        let _ = env_logger::try_init();
        // nothing listens here; the gateway must answer None, never a zero rate
        let gateway = RateGateway::new("http://127.0.0.1:1");
        assert!(gateway.sell_rate().await.is_none());
        assert!(gateway.ars_equivalent(Money::from_units(10)).await.is_none());
    }
}

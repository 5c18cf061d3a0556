//! Banco de la Nación Argentina quote-board scraper.
//!
//! The bank publishes its USD board rate as an HTML table, buy column then
//! sell column, in Argentine number format. A fetch either yields both
//! figures or an error — a rate is never guessed, defaulted or carried over
//! from a partial parse; on failure the previously stored rate simply stays
//! in effect.
use std::sync::Arc;

use log::*;
use regex::Regex;
use reqwest::Client;
use thiserror::Error;
use voltio_common::{normalize, Money};
use voltio_engine::db_types::{Currency, ExchangeRate};

const BNA_QUOTE_URL: &str = "https://www.bna.com.ar/Cotizador/MonedasHistorico";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const BNA_SOURCE: &str = "BNA";

#[derive(Debug, Clone, Error)]
pub enum BnaError {
    #[error("Could not reach the BNA quote board: {0}")]
    Http(String),
    #[error("Could not find the USD quote in the BNA page: {0}")]
    Parse(String),
}

#[derive(Clone)]
pub struct BnaClient {
    client: Arc<Client>,
    url: String,
}

impl BnaClient {
    pub fn new(url: Option<String>) -> Result<Self, BnaError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| BnaError::Http(e.to_string()))?;
        Ok(Self { client: Arc::new(client), url: url.unwrap_or_else(|| BNA_QUOTE_URL.to_string()) })
    }

    /// Fetches and parses the current USD buy/sell board rates.
    pub async fn fetch_usd_rate(&self) -> Result<ExchangeRate, BnaError> {
        trace!("💱️ Fetching USD quote from {}", self.url);
        let response =
            self.client.get(&self.url).send().await.map_err(|e| BnaError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(BnaError::Http(format!("status {}", response.status())));
        }
        let html = response.text().await.map_err(|e| BnaError::Http(e.to_string()))?;
        let (buy, sell) = parse_usd_row(&html)?;
        debug!("💱️ BNA USD quote: buy {buy}, sell {sell}");
        Ok(ExchangeRate::new(Currency::Usd, buy, sell, BNA_SOURCE))
    }
}

/// Extracts the buy and sell figures from the "Dolar U.S.A." table row.
fn parse_usd_row(html: &str) -> Result<(Money, Money), BnaError> {
    let pattern = Regex::new(
        r"(?is)D[oó]lar\s+U\.?S\.?A\.?\s*</td>\s*<td[^>]*>\s*([\d.,]+)\s*</td>\s*<td[^>]*>\s*([\d.,]+)\s*</td>",
    )
    .map_err(|e| BnaError::Parse(e.to_string()))?;
    let captures = pattern
        .captures(html)
        .ok_or_else(|| BnaError::Parse("no USD row matched the quote table".to_string()))?;
    let buy = normalize::amount_from_str(&captures[1]);
    let sell = normalize::amount_from_str(&captures[2]);
    if buy.is_zero() || sell.is_zero() {
        return Err(BnaError::Parse(format!(
            "quote parsed to zero (buy: {}, sell: {})",
            &captures[1], &captures[2]
        )));
    }
    Ok((buy, sell))
}

#[cfg(test)]
mod test {
    use super::*;

    const SAMPLE: &str = r#"
        <table class="table cotizacion">
          <tr>
            <td class="tit">Dolar U.S.A.</td>
            <td class="dest">1.352,50</td>
            <td class="dest">1.372,50</td>
          </tr>
        </table>
    "#;

    #[test]
    fn parses_the_usd_row_in_argentine_format() {
        let (buy, sell) = parse_usd_row(SAMPLE).unwrap();
        assert_eq!(buy, Money::from(135_250));
        assert_eq!(sell, Money::from(137_250));
    }

    #[test]
    fn missing_row_is_an_error_not_a_zero_rate() {
        let err = parse_usd_row("<html><body>mantenimiento</body></html>").unwrap_err();
        assert!(matches!(err, BnaError::Parse(_)));
    }

    #[test]
    fn zero_figures_are_rejected() {
        let html = SAMPLE.replace("1.352,50", "0,00");
        let err = parse_usd_row(&html).unwrap_err();
        assert!(matches!(err, BnaError::Parse(_)));
    }
}

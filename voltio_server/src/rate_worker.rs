//! Background refresh of the USD sell rate.
//!
//! Polls the BNA quote board on an interval, but only during the bank's
//! publication window (weekdays, business hours, Buenos Aires time). A failed
//! fetch logs and leaves the stored rate in place; the storefront keeps
//! presenting the last known figure rather than an invented one.
use chrono::{DateTime, Datelike, Duration, FixedOffset, Timelike, Utc};
use log::*;
use tokio::task::JoinHandle;
use voltio_engine::{ExchangeRateApi, SqliteDatabase};

use crate::integrations::BnaClient;

/// Buenos Aires is UTC-3 year-round (no DST).
const ART_OFFSET_SECS: i32 = -3 * 3600;

/// Starts the rate worker. Do not await the returned JoinHandle, as it will
/// run indefinitely.
pub fn start_rate_worker(db: SqliteDatabase, bna: BnaClient, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let api = ExchangeRateApi::new(db);
        let period = interval.to_std().unwrap_or(std::time::Duration::from_secs(30 * 60));
        let mut timer = tokio::time::interval(period);
        info!("🕰️ Exchange-rate worker started (every {interval})");
        loop {
            timer.tick().await;
            if !within_publication_window(Utc::now()) {
                trace!("🕰️ Outside the BNA publication window, skipping refresh");
                continue;
            }
            match bna.fetch_usd_rate().await {
                Ok(rate) => match api.set_exchange_rate(&rate).await {
                    Ok(()) => info!("🕰️ Stored fresh rate: {rate}"),
                    Err(e) => error!("🕰️ Could not store the fetched rate: {e}"),
                },
                Err(e) => {
                    warn!("🕰️ Rate refresh failed, keeping the previous rate: {e}");
                },
            }
        }
    })
}

/// The bank updates its board on weekday mornings and mid-afternoons; there
/// is nothing new to fetch outside Monday–Friday 10:00–16:00 ART.
fn within_publication_window(now: DateTime<Utc>) -> bool {
    let Some(offset) = FixedOffset::east_opt(ART_OFFSET_SECS) else {
        return false;
    };
    let art = now.with_timezone(&offset);
    let weekday = art.weekday().number_from_monday();
    let hour = art.hour();
    (1..=5).contains(&weekday) && (10..16).contains(&hour)
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn window_covers_weekday_business_hours_in_buenos_aires() {
        // Wednesday 2024-09-04 14:00 UTC = 11:00 ART
        let wednesday = Utc.with_ymd_and_hms(2024, 9, 4, 14, 0, 0).unwrap();
        assert!(within_publication_window(wednesday));

        // Wednesday 20:30 UTC = 17:30 ART, after the board closes
        let evening = Utc.with_ymd_and_hms(2024, 9, 4, 20, 30, 0).unwrap();
        assert!(!within_publication_window(evening));

        // Saturday midday
        let saturday = Utc.with_ymd_and_hms(2024, 9, 7, 15, 0, 0).unwrap();
        assert!(!within_publication_window(saturday));
    }
}

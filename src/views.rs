//! Sensor-facing views derived from a [`Snapshot`]
//!
//! Everything here is a pure function of the snapshot, the area timezone
//! and the current instant. Empty buckets produce empty lists or `None`.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EntsoeError, Result};
use crate::prices::{PricePoint, PriceSeries, Snapshot, round3, start_of_day};

/// Rendering of an hour start, e.g. `2024-03-10 00:00:00+01:00`
pub const HOUR_LABEL_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// One `{time, price}` attribute entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TimedPrice {
    pub time: String,
    pub price: f64,
}

/// What sensors read on every update
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProcessedData {
    pub prices_today: Vec<TimedPrice>,
    pub prices_tomorrow: Vec<TimedPrice>,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub time_today: DateTime<FixedOffset>,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub time_tomorrow: DateTime<FixedOffset>,
}

pub fn hour_label(start: &DateTime<FixedOffset>, tz: Tz) -> String {
    start.with_timezone(&tz).format(HOUR_LABEL_FORMAT).to_string()
}

pub fn timed_prices(series: &PriceSeries, tz: Tz) -> Vec<TimedPrice> {
    series
        .iter()
        .map(|p| TimedPrice {
            time: hour_label(&p.start, tz),
            price: p.price,
        })
        .collect()
}

/// Inverse of [`timed_prices`], used when restoring persisted attributes
pub fn parse_timed_prices(list: &[TimedPrice]) -> Result<PriceSeries> {
    let points = list
        .iter()
        .map(|tp| {
            DateTime::parse_from_str(&tp.time, HOUR_LABEL_FORMAT)
                .map(|start| PricePoint::new(start, tp.price))
                .map_err(|e| {
                    EntsoeError::validation("time".to_string(), format!("{:?}: {}", tp.time, e))
                })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(PriceSeries::new(points))
}

pub fn prices_today_list(snapshot: &Snapshot, tz: Tz) -> Vec<TimedPrice> {
    timed_prices(&snapshot.today, tz)
}

pub fn prices_tomorrow_list(snapshot: &Snapshot, tz: Tz) -> Vec<TimedPrice> {
    timed_prices(&snapshot.tomorrow, tz)
}

/// Price of the today entry whose `[start, start + 1h)` contains `now`
pub fn current_price(snapshot: &Snapshot, now: DateTime<Utc>) -> Option<f64> {
    snapshot
        .today
        .iter()
        .find(|p| p.start <= now && now < p.start + Duration::hours(1))
        .map(|p| p.price)
}

pub fn today_start_instant(tz: Tz, now: DateTime<Utc>) -> DateTime<FixedOffset> {
    let today = now.with_timezone(&tz).date_naive();
    start_of_day(tz, today).fixed_offset()
}

pub fn tomorrow_start_instant(tz: Tz, now: DateTime<Utc>) -> DateTime<FixedOffset> {
    let tomorrow = now.with_timezone(&tz).date_naive() + Duration::days(1);
    start_of_day(tz, tomorrow).fixed_offset()
}

pub fn processed_data(snapshot: &Snapshot, tz: Tz, now: DateTime<Utc>) -> ProcessedData {
    ProcessedData {
        prices_today: prices_today_list(snapshot, tz),
        prices_tomorrow: prices_tomorrow_list(snapshot, tz),
        time_today: today_start_instant(tz, now),
        time_tomorrow: tomorrow_start_instant(tz, now),
    }
}

/// Mean of today's prices, rounded to 3 decimals
pub fn today_average(snapshot: &Snapshot) -> Option<f64> {
    if snapshot.today.is_empty() {
        return None;
    }
    let sum: f64 = snapshot.today.iter().map(|p| p.price).sum();
    #[allow(clippy::cast_precision_loss)]
    Some(round3(sum / snapshot.today.len() as f64))
}

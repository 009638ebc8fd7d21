#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use entsoe::areas::AreaConfig;
use entsoe::client::PriceSource;
use entsoe::config::CoordinatorConfig;
use entsoe::coordinator::Coordinator;
use entsoe::error::{EntsoeError, Result};
use entsoe::prices::{PricePoint, PriceSeries};

/// A price source that replays canned responses in order
#[derive(Default)]
pub struct ScriptedSource {
    responses: Mutex<VecDeque<Result<PriceSeries>>>,
    calls: Mutex<Vec<(DateTime<Utc>, DateTime<Utc>)>>,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_ok(&self, series: PriceSeries) {
        self.responses.lock().unwrap().push_back(Ok(series));
    }

    pub fn push_err(&self, err: EntsoeError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PriceSource for ScriptedSource {
    async fn fetch(
        &self,
        _area: &AreaConfig,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceSeries> {
        self.calls.lock().unwrap().push((start, end));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(EntsoeError::transport("script exhausted")))
    }
}

/// 2024-03-10 00:00 in Amsterdam
pub fn local_midnight() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 9, 23, 0, 0).unwrap()
}

/// 2024-03-10 09:30 in Amsterdam
pub fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 8, 30, 0).unwrap()
}

/// `hours` consecutive hourly prices in currency/MWh starting at `from`
pub fn hourly(from: DateTime<Utc>, hours: i64, price: impl Fn(i64) -> f64) -> PriceSeries {
    PriceSeries::new(
        (0..hours)
            .map(|h| PricePoint::new((from + Duration::hours(h)).fixed_offset(), price(h)))
            .collect(),
    )
}

pub fn area() -> AreaConfig {
    AreaConfig::new("NL", "test-token", None).unwrap()
}

pub fn coordinator(source: Arc<ScriptedSource>) -> Coordinator {
    Coordinator::new(area(), CoordinatorConfig::default(), source)
}

/// Blocks inside `fetch` until released, to observe in-flight behavior
#[derive(Default)]
pub struct GatedSource {
    pub entered: tokio::sync::Notify,
    pub release: tokio::sync::Notify,
    pub series: Mutex<Option<PriceSeries>>,
}

#[async_trait::async_trait]
impl PriceSource for GatedSource {
    async fn fetch(
        &self,
        _area: &AreaConfig,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<PriceSeries> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.series.lock().unwrap().take().unwrap_or_default())
    }
}

/// Local midnight of the current day in Amsterdam, in UTC
pub fn today_midnight() -> DateTime<Utc> {
    let tz = area().timezone;
    let today = Utc::now().with_timezone(&tz).date_naive();
    entsoe::prices::start_of_day(tz, today).with_timezone(&Utc)
}

/// Poll `check` until it holds or two seconds pass
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    false
}

//! Update coordinator
//!
//! Owns the single authoritative [`Snapshot`] for one area. On every tick it
//! fetches the request window, normalizes the prices and swaps the snapshot
//! in one step. When the upstream fails it keeps serving cached prices for
//! as long as they still cover the future.
//!
//! Readers never lock: the snapshot and the [`UpdateStatus`] are published
//! through `watch` channels and cloned out as `Arc`s.

mod status;
mod window;

pub use status::{RefreshOutcome, UpdateStatus};
pub use window::request_window;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::sync::{mpsc, watch};
use tokio::time::{Duration, MissedTickBehavior, interval};

use crate::areas::AreaConfig;
use crate::client::PriceSource;
use crate::config::CoordinatorConfig;
use crate::error::{EntsoeError, Result};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::prices::{PriceSeries, Snapshot, SnapshotOrigin, mwh_to_cents_per_kwh};
use crate::views::{self, ProcessedData};

/// Commands accepted by a running coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorCommand {
    /// Refresh now instead of waiting for the next tick
    Refresh,
}

pub struct Coordinator {
    area: AreaConfig,
    settings: CoordinatorConfig,
    source: Arc<dyn PriceSource>,
    snapshot_tx: watch::Sender<Option<Arc<Snapshot>>>,
    status_tx: watch::Sender<UpdateStatus>,
    commands_rx: mpsc::UnboundedReceiver<CoordinatorCommand>,
    commands_tx: mpsc::UnboundedSender<CoordinatorCommand>,
    shutdown_rx: mpsc::UnboundedReceiver<()>,
    shutdown_tx: mpsc::UnboundedSender<()>,
    torn_down: Arc<AtomicBool>,
    logger: StructuredLogger,
}

impl Coordinator {
    pub fn new(area: AreaConfig, settings: CoordinatorConfig, source: Arc<dyn PriceSource>) -> Self {
        let (snapshot_tx, _) = watch::channel(None);
        let (status_tx, _) = watch::channel(UpdateStatus::default());
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
        let logger = get_logger_with_context(
            LogContext::new("coordinator").with_area(area.area.key),
        );
        Self {
            area,
            settings,
            source,
            snapshot_tx,
            status_tx,
            commands_rx,
            commands_tx,
            shutdown_rx,
            shutdown_tx,
            torn_down: Arc::new(AtomicBool::new(false)),
            logger,
        }
    }

    /// Cheap, cloneable access for readers and controllers
    pub fn handle(&self) -> CoordinatorHandle {
        CoordinatorHandle {
            snapshot_rx: self.snapshot_tx.subscribe(),
            status_rx: self.status_tx.subscribe(),
            commands_tx: self.commands_tx.clone(),
            shutdown_tx: self.shutdown_tx.clone(),
            torn_down: self.torn_down.clone(),
            timezone: self.area.timezone,
        }
    }

    pub fn area(&self) -> &AreaConfig {
        &self.area
    }

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot_tx.borrow().clone()
    }

    pub fn is_primed(&self) -> bool {
        self.snapshot_tx.borrow().is_some()
    }

    /// Splice persisted price lists into memory before the first live fetch.
    ///
    /// Returns false (and changes nothing) once the coordinator is primed,
    /// when there is nothing to restore or when the stored prices no longer
    /// reach past `now`.
    pub fn restore_at(&self, today: &PriceSeries, tomorrow: &PriceSeries, now: DateTime<Utc>) -> bool {
        if self.is_primed() || (today.is_empty() && tomorrow.is_empty()) {
            return false;
        }
        let all = today.merged(tomorrow).in_timezone(self.area.timezone);
        let snapshot = Snapshot::partition(
            all,
            self.area.timezone,
            now,
            self.settings.min_tomorrow_hours,
            SnapshotOrigin::Restored,
        );
        if snapshot.is_expired_at(now) {
            self.logger.info(&format!(
                "Ignoring stored prices; the newest stored hour {} has already started",
                snapshot
                    .all
                    .newest_start()
                    .map_or_else(|| "-".to_string(), |t| t.to_rfc3339())
            ));
            return false;
        }
        self.logger.info(&format!(
            "Restored {} prices for today and {} for tomorrow from stored state",
            snapshot.today.len(),
            snapshot.tomorrow.len()
        ));
        self.snapshot_tx.send_replace(Some(Arc::new(snapshot)));
        true
    }

    pub fn restore(&self, today: &PriceSeries, tomorrow: &PriceSeries) -> bool {
        self.restore_at(today, tomorrow, Utc::now())
    }

    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        self.refresh_at(Utc::now()).await
    }

    /// One update cycle as of `now`.
    ///
    /// `Err` carries the fatal cases: an authentication failure or cached
    /// prices that no longer cover the future.
    pub async fn refresh_at(&self, now: DateTime<Utc>) -> Result<RefreshOutcome> {
        if self.torn_down.load(Ordering::SeqCst) {
            return Ok(RefreshOutcome::Discarded);
        }

        let tz = self.area.timezone;
        let (start, end) = request_window(self.settings.window, tz, now);
        self.logger.debug(&format!(
            "Fetching ENTSO-e data for {} ({}) in {}",
            self.area.area.key, self.area.area.code, tz
        ));
        self.status_tx.send_modify(|s| s.last_attempt = Some(now));

        let fetched = self.source.fetch(&self.area, start, end).await;

        if self.torn_down.load(Ordering::SeqCst) {
            self.logger.debug("Coordinator torn down during fetch; discarding result");
            return Ok(RefreshOutcome::Discarded);
        }

        match fetched {
            Ok(raw) => {
                let normalized = raw.map_prices(mwh_to_cents_per_kwh).in_timezone(tz);
                let snapshot = Snapshot::partition(
                    normalized,
                    tz,
                    now,
                    self.settings.min_tomorrow_hours,
                    SnapshotOrigin::Live,
                );
                self.logger.info(&format!(
                    "Fetched {} prices ({} today, {} tomorrow)",
                    snapshot.all.len(),
                    snapshot.today.len(),
                    snapshot.tomorrow.len()
                ));
                self.snapshot_tx.send_replace(Some(Arc::new(snapshot)));
                self.record(now, RefreshOutcome::Updated, None);
                Ok(RefreshOutcome::Updated)
            }
            Err(err) if err.is_recoverable_fetch_failure() => self.degrade(err, now),
            Err(err) => {
                if matches!(err, EntsoeError::Auth { .. }) {
                    self.logger.error(&format!("Authentication rejected: {}", err));
                } else {
                    self.logger.error(&format!("Fetching prices failed: {}", err));
                }
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    fn degrade(&self, err: EntsoeError, now: DateTime<Utc>) -> Result<RefreshOutcome> {
        let Some(snapshot) = self.snapshot() else {
            self.logger.warn(&format!(
                "No up-to-date local data; entities stay unavailable until a fetch succeeds: {}",
                err
            ));
            self.record(now, RefreshOutcome::Unavailable, Some(err.to_string()));
            return Ok(RefreshOutcome::Unavailable);
        };

        if snapshot.is_expired_at(now) {
            self.logger.error(&format!(
                "Latest available data is older than the current time; entities will no longer update: {}",
                err
            ));
            let stale = EntsoeError::stale_data_expired(format!(
                "Unexpected error when fetching ENTSO-e prices: {}",
                err
            ));
            self.record_failure(&stale);
            return Err(stale);
        }

        if self.settings.rollover && snapshot.rollover_due(self.area.timezone, now) {
            self.logger
                .info("Shifting cached tomorrow prices into today");
            self.snapshot_tx
                .send_replace(Some(Arc::new(snapshot.rolled_over())));
        }

        self.logger.warn(&format!(
            "Running in degraded mode (falling back on stored data) since fetching the latest prices failed: {}",
            err
        ));
        self.record(now, RefreshOutcome::Degraded, Some(err.to_string()));
        Ok(RefreshOutcome::Degraded)
    }

    fn record(&self, now: DateTime<Utc>, outcome: RefreshOutcome, error: Option<String>) {
        self.status_tx.send_modify(|s| {
            s.last_update_success = true;
            s.last_outcome = Some(outcome);
            if outcome == RefreshOutcome::Updated {
                s.last_success = Some(now);
            }
            s.last_error = error;
        });
    }

    fn record_failure(&self, err: &EntsoeError) {
        self.status_tx.send_modify(|s| {
            s.last_update_success = false;
            s.last_outcome = None;
            s.last_error = Some(err.to_string());
        });
    }

    async fn refresh_logged(&self) {
        if let Err(e) = self.refresh().await {
            self.logger.error(&format!("Update failed: {}", e));
        }
    }

    /// Run the refresh loop until shutdown is requested
    pub async fn run(&mut self) -> Result<()> {
        let period = self.settings.update_interval().max(Duration::from_secs(1));
        self.logger.info(&format!(
            "Starting coordinator loop; interval {} min, window {:?}",
            period.as_secs() / 60,
            self.settings.window
        ));

        // The first tick completes immediately
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh_logged().await;
                }
                Some(cmd) = self.commands_rx.recv() => match cmd {
                    CoordinatorCommand::Refresh => {
                        self.logger.debug("On-demand refresh requested");
                        self.refresh_logged().await;
                        ticker.reset();
                    }
                },
                _ = self.shutdown_rx.recv() => {
                    self.logger.info("Shutdown signal received");
                    break;
                }
            }
        }

        self.teardown();
        Ok(())
    }

    fn teardown(&self) {
        self.torn_down.store(true, Ordering::SeqCst);
        self.snapshot_tx.send_replace(None);
        self.logger.info("Coordinator shutdown complete");
    }
}

/// Read side of a [`Coordinator`], plus refresh and shutdown requests
#[derive(Clone)]
pub struct CoordinatorHandle {
    snapshot_rx: watch::Receiver<Option<Arc<Snapshot>>>,
    status_rx: watch::Receiver<UpdateStatus>,
    commands_tx: mpsc::UnboundedSender<CoordinatorCommand>,
    shutdown_tx: mpsc::UnboundedSender<()>,
    torn_down: Arc<AtomicBool>,
    timezone: Tz,
}

impl CoordinatorHandle {
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot_rx.borrow().clone()
    }

    pub fn status(&self) -> UpdateStatus {
        self.status_rx.borrow().clone()
    }

    /// Entities show values only while this holds
    pub fn is_available(&self) -> bool {
        self.status_rx.borrow().last_update_success && self.snapshot_rx.borrow().is_some()
    }

    pub fn subscribe_snapshot(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.snapshot_rx.clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<UpdateStatus> {
        self.status_rx.clone()
    }

    pub fn processed_data_at(&self, now: DateTime<Utc>) -> Option<ProcessedData> {
        self.snapshot()
            .map(|s| views::processed_data(&s, self.timezone, now))
    }

    pub fn processed_data(&self) -> Option<ProcessedData> {
        self.processed_data_at(Utc::now())
    }

    pub fn current_price(&self) -> Option<f64> {
        self.snapshot()
            .and_then(|s| views::current_price(&s, Utc::now()))
    }

    /// Ask the running loop for an immediate refresh
    pub fn request_refresh(&self) -> Result<()> {
        self.commands_tx
            .send(CoordinatorCommand::Refresh)
            .map_err(|_| EntsoeError::generic("coordinator is not running"))
    }

    /// Flag teardown and wake the loop. An in-flight fetch completes but its
    /// result is dropped.
    pub fn shutdown(&self) {
        self.torn_down.store(true, Ordering::SeqCst);
        self.shutdown_tx.send(()).ok();
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }
}

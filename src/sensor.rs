//! Sensor entities
//!
//! Each sensor runs as its own task. It recomputes its value whenever the
//! coordinator publishes a new snapshot or status, and on its own schedule
//! at every refresh boundary (top of the hour by default), independently of
//! the coordinator's fetch interval. After every update the state is
//! published to a shared registry and persisted for restoration.

mod entity;
mod schedule;

pub use entity::{
    ATTRIBUTION, DOMAIN, DeviceClass, ICON, Reading, SensorKind, SensorState, display_name,
    entity_id, read,
};
pub use schedule::{PointInTimeTimer, next_refresh_boundary};

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::sync::{Mutex, RwLock, mpsc, watch};
use tokio::task::JoinHandle;

use crate::areas::AreaConfig;
use crate::coordinator::CoordinatorHandle;
use crate::logging::{LogContext, StructuredLogger, get_logger, get_logger_with_context};
use crate::persistence::{PersistenceManager, RestoredState};
use crate::prices::{PriceSeries, Snapshot};
use crate::views::{self, TimedPrice};

/// Latest state of every sensor, keyed by entity id
pub type SensorRegistry = Arc<RwLock<BTreeMap<String, SensorState>>>;

/// One sensor entity and its last published state
pub struct Sensor {
    kind: SensorKind,
    timezone: Tz,
    state: SensorState,
    logger: StructuredLogger,
}

impl Sensor {
    pub fn new(kind: SensorKind, area: &AreaConfig) -> Self {
        let state = SensorState::new(kind, area.name.as_deref());
        let logger = get_logger_with_context(
            LogContext::new("sensor")
                .with_area(area.area.key)
                .with_field("entity_id", state.entity_id.clone()),
        );
        Self {
            kind,
            timezone: area.timezone,
            state,
            logger,
        }
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn entity_id(&self) -> &str {
        &self.state.entity_id
    }

    pub fn state(&self) -> &SensorState {
        &self.state
    }

    /// Seed value and attributes from a stored payload
    pub fn restore(&mut self, stored: &RestoredState) {
        self.state.native_value = stored.native_value.clone();
        if let Some(attrs) = &stored.extra_state_attributes {
            self.state.extra_state_attributes = attrs.clone();
        }
    }

    /// Recompute from the current snapshot.
    ///
    /// A processing failure keeps the previous value and attributes.
    pub fn update(&mut self, snapshot: Option<&Snapshot>, available: bool, now: DateTime<Utc>) {
        self.state.available = available && snapshot.is_some();
        if let Some(snapshot) = snapshot {
            match read(self.kind, snapshot, self.timezone, now) {
                Ok(reading) => {
                    self.state.native_value = reading.native_value;
                    self.state.extra_state_attributes = reading.attributes;
                }
                Err(e) => self.logger.warn(&format!(
                    "Unable to update entity due to data processing error: {}",
                    e
                )),
            }
        }
        self.state.last_updated = Some(now);
        self.logger.trace("Sensor updated");
    }
}

/// Previously published today/tomorrow lists for this area, for
/// [`Coordinator::restore`](crate::coordinator::Coordinator::restore)
pub fn stored_price_lists(store: &PersistenceManager, area: &AreaConfig) -> (PriceSeries, PriceSeries) {
    let logger = get_logger("sensor");
    let load = |kind: SensorKind| {
        let id = entity_id(kind, area.name.as_deref());
        let Some(list) = store
            .get(&id)
            .and_then(|s| s.attribute::<Vec<TimedPrice>>(kind.key()))
        else {
            return PriceSeries::empty();
        };
        views::parse_timed_prices(&list).unwrap_or_else(|e| {
            logger.warn(&format!("Ignoring stored prices of {}: {}", id, e));
            PriceSeries::empty()
        })
    };
    (load(SensorKind::PricesToday), load(SensorKind::PricesTomorrow))
}

/// The running sensor tasks of one coordinator
pub struct SensorSet {
    registry: SensorRegistry,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SensorSet {
    /// Start one task per sensor kind
    pub fn spawn(
        handle: &CoordinatorHandle,
        area: &AreaConfig,
        refresh_interval_minutes: u32,
        store: Option<Arc<Mutex<PersistenceManager>>>,
    ) -> Self {
        let registry: SensorRegistry = Arc::new(RwLock::new(BTreeMap::new()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let tasks = SensorKind::ALL
            .iter()
            .map(|&kind| {
                let sensor = Sensor::new(kind, area);
                tokio::spawn(run_sensor(
                    sensor,
                    handle.clone(),
                    registry.clone(),
                    store.clone(),
                    refresh_interval_minutes,
                    shutdown_rx.clone(),
                ))
            })
            .collect();

        Self {
            registry,
            shutdown_tx,
            tasks,
        }
    }

    pub fn registry(&self) -> SensorRegistry {
        self.registry.clone()
    }

    /// Stop every sensor task and cancel pending timers
    pub async fn shutdown(self) {
        self.shutdown_tx.send_replace(true);
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

async fn run_sensor(
    mut sensor: Sensor,
    handle: CoordinatorHandle,
    registry: SensorRegistry,
    store: Option<Arc<Mutex<PersistenceManager>>>,
    refresh_interval_minutes: u32,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    if let Some(store) = &store {
        let stored = store.lock().await.get(sensor.entity_id()).cloned();
        if let Some(stored) = stored {
            sensor.restore(&stored);
        }
    }

    let (fire_tx, mut fire_rx) = mpsc::unbounded_channel();
    let mut timer = PointInTimeTimer::new(fire_tx);
    let mut snapshots = handle.subscribe_snapshot();
    let mut statuses = handle.subscribe_status();

    loop {
        let now = Utc::now();
        let snapshot = snapshots.borrow_and_update().clone();
        let available = statuses.borrow_and_update().last_update_success;
        sensor.update(snapshot.as_deref(), available, now);
        publish(&sensor, &registry, store.as_ref()).await;

        timer.arm_at(next_refresh_boundary(now, refresh_interval_minutes));

        tokio::select! {
            Some(()) = fire_rx.recv() => {}
            Ok(()) = snapshots.changed() => {}
            Ok(()) = statuses.changed() => {}
            _ = shutdown_rx.changed() => break,
        }
    }

    timer.cancel();
}

async fn publish(
    sensor: &Sensor,
    registry: &SensorRegistry,
    store: Option<&Arc<Mutex<PersistenceManager>>>,
) {
    registry
        .write()
        .await
        .insert(sensor.entity_id().to_string(), sensor.state().clone());

    if let Some(store) = store {
        let mut store = store.lock().await;
        store.set(sensor.entity_id(), sensor.state().to_restored());
        if let Err(e) = store.save() {
            sensor
                .logger
                .warn(&format!("Failed to persist sensor state: {}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::{PricePoint, SnapshotOrigin};
    use chrono::{Duration, TimeZone};

    fn snapshot(now: DateTime<Utc>, hours: i64) -> Snapshot {
        let tz = Tz::Europe__Amsterdam;
        let start = Utc.with_ymd_and_hms(2024, 3, 9, 23, 0, 0).unwrap();
        let all = PriceSeries::new(
            (0..hours)
                .map(|h| PricePoint::new((start + Duration::hours(h)).fixed_offset(), 5.0))
                .collect(),
        );
        Snapshot::partition(all.in_timezone(tz), tz, now, 23, SnapshotOrigin::Live)
    }

    #[test]
    fn tomorrow_sensor_has_no_value_without_tomorrow_prices() {
        let area = AreaConfig::new("NL", "key", Some("home".to_string())).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 8, 30, 0).unwrap();
        let mut sensor = Sensor::new(SensorKind::PricesTomorrow, &area);
        assert_eq!(sensor.entity_id(), "entsoe.home_prices_tomorrow");

        sensor.update(Some(&snapshot(now, 30)), true, now);
        assert!(sensor.state().available);
        assert!(sensor.state().native_value.is_none());

        sensor.update(Some(&snapshot(now, 48)), true, now);
        assert_eq!(
            sensor.state().native_value,
            Some(serde_json::json!("2024-03-11T00:00:00+01:00"))
        );
        let list = sensor.state().extra_state_attributes["prices_tomorrow"]
            .as_array()
            .unwrap()
            .len();
        assert_eq!(list, 24);
    }

    #[test]
    fn unavailable_without_snapshot_keeps_previous_value() {
        let area = AreaConfig::new("NL", "key", None).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 8, 30, 0).unwrap();
        let mut sensor = Sensor::new(SensorKind::CurrentPrice, &area);
        sensor.update(Some(&snapshot(now, 48)), true, now);
        assert_eq!(sensor.state().native_value, Some(serde_json::json!(5.0)));

        sensor.update(None, true, now);
        assert!(!sensor.state().available);
        assert_eq!(sensor.state().native_value, Some(serde_json::json!(5.0)));
    }
}

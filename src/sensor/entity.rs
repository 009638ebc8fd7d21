use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::persistence::RestoredState;
use crate::prices::{PRICE_UNIT, Snapshot};
use crate::views;

pub const DOMAIN: &str = "entsoe";
pub const ATTRIBUTION: &str = "Data provided by ENTSO-e Transparency Platform";
pub const ICON: &str = "mdi:currency-eur";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Timestamp,
    Monetary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    PricesToday,
    PricesTomorrow,
    CurrentPrice,
    AveragePriceToday,
}

impl SensorKind {
    pub const ALL: [SensorKind; 4] = [
        SensorKind::PricesToday,
        SensorKind::PricesTomorrow,
        SensorKind::CurrentPrice,
        SensorKind::AveragePriceToday,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SensorKind::PricesToday => "prices_today",
            SensorKind::PricesTomorrow => "prices_tomorrow",
            SensorKind::CurrentPrice => "current_price",
            SensorKind::AveragePriceToday => "average_price_today",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SensorKind::PricesToday => "Prices Today",
            SensorKind::PricesTomorrow => "Prices Tomorrow",
            SensorKind::CurrentPrice => "Current Price",
            SensorKind::AveragePriceToday => "Average Price Today",
        }
    }

    pub fn device_class(self) -> DeviceClass {
        match self {
            SensorKind::PricesToday | SensorKind::PricesTomorrow => DeviceClass::Timestamp,
            SensorKind::CurrentPrice | SensorKind::AveragePriceToday => DeviceClass::Monetary,
        }
    }

    pub fn unit(self) -> Option<&'static str> {
        match self.device_class() {
            DeviceClass::Timestamp => None,
            DeviceClass::Monetary => Some(PRICE_UNIT),
        }
    }
}

/// `entsoe.<name>_<key>`, or `entsoe.<key>` without a name
pub fn entity_id(kind: SensorKind, name: Option<&str>) -> String {
    match name {
        Some(n) if !n.is_empty() => format!("{}.{}_{}", DOMAIN, n, kind.key()),
        _ => format!("{}.{}", DOMAIN, kind.key()),
    }
}

pub fn display_name(kind: SensorKind, name: Option<&str>) -> String {
    match name {
        Some(n) if !n.is_empty() => format!("[ENTSO-e] {} ({})", kind.name(), n),
        _ => format!("[ENTSO-e] {}", kind.name()),
    }
}

/// Published state of one sensor entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    pub entity_id: String,
    pub name: String,
    pub kind: SensorKind,
    pub device_class: DeviceClass,
    pub available: bool,
    pub native_value: Option<Value>,
    pub native_unit_of_measurement: Option<String>,
    pub extra_state_attributes: Map<String, Value>,
    pub attribution: &'static str,
    pub icon: &'static str,
    pub last_updated: Option<DateTime<Utc>>,
}

impl SensorState {
    pub fn new(kind: SensorKind, name: Option<&str>) -> Self {
        Self {
            entity_id: entity_id(kind, name),
            name: display_name(kind, name),
            kind,
            device_class: kind.device_class(),
            available: false,
            native_value: None,
            native_unit_of_measurement: kind.unit().map(str::to_string),
            extra_state_attributes: Map::new(),
            attribution: ATTRIBUTION,
            icon: ICON,
            last_updated: None,
        }
    }

    pub fn to_restored(&self) -> RestoredState {
        RestoredState {
            native_value: self.native_value.clone(),
            native_unit_of_measurement: self.native_unit_of_measurement.clone(),
            extra_state_attributes: Some(self.extra_state_attributes.clone()),
        }
    }
}

/// Value and attributes of a sensor for one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub native_value: Option<Value>,
    pub attributes: Map<String, Value>,
}

pub fn read(kind: SensorKind, snapshot: &Snapshot, tz: Tz, now: DateTime<Utc>) -> Result<Reading> {
    let mut attributes = Map::new();
    let native_value = match kind {
        SensorKind::PricesToday => {
            let list = views::prices_today_list(snapshot, tz);
            attributes.insert(kind.key().to_string(), serde_json::to_value(&list)?);
            Some(Value::String(
                views::today_start_instant(tz, now).to_rfc3339(),
            ))
        }
        SensorKind::PricesTomorrow => {
            let list = views::prices_tomorrow_list(snapshot, tz);
            let value = (!list.is_empty()).then(|| {
                Value::String(views::tomorrow_start_instant(tz, now).to_rfc3339())
            });
            attributes.insert(kind.key().to_string(), serde_json::to_value(&list)?);
            value
        }
        SensorKind::CurrentPrice => views::current_price(snapshot, now).map(Value::from),
        SensorKind::AveragePriceToday => views::today_average(snapshot).map(Value::from),
    };
    Ok(Reading {
        native_value,
        attributes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_and_names() {
        assert_eq!(
            entity_id(SensorKind::PricesToday, Some("home")),
            "entsoe.home_prices_today"
        );
        assert_eq!(
            entity_id(SensorKind::PricesTomorrow, None),
            "entsoe.prices_tomorrow"
        );
        assert_eq!(
            display_name(SensorKind::CurrentPrice, Some("home")),
            "[ENTSO-e] Current Price (home)"
        );
        assert_eq!(
            display_name(SensorKind::PricesToday, Some("")),
            "[ENTSO-e] Prices Today"
        );
    }

    #[test]
    fn units_follow_device_class() {
        assert_eq!(SensorKind::PricesToday.unit(), None);
        assert_eq!(SensorKind::AveragePriceToday.unit(), Some("c/kWh"));
        let state = SensorState::new(SensorKind::CurrentPrice, None);
        assert_eq!(state.attribution, ATTRIBUTION);
        assert!(!state.available);
    }
}

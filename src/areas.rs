//! Bidding zone registry
//!
//! Static mapping of user-facing area keys to the codes the Transparency
//! Platform understands, a display name and the local timezone used to cut
//! the price series into calendar days.

use chrono_tz::Europe;
use chrono_tz::Tz;

use crate::error::{EntsoeError, Result};

/// A supported bidding zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    /// Key used in configuration and entity naming (e.g. `DK_1`)
    pub key: &'static str,
    /// Upstream area code (several keys may share one, e.g. `DE_LU`)
    pub code: &'static str,
    /// EIC domain code used in API requests
    pub eic: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// Currency of the published prices
    pub currency: &'static str,
    /// Local timezone of the zone
    pub timezone: Tz,
}

const fn area(
    key: &'static str,
    code: &'static str,
    eic: &'static str,
    name: &'static str,
    timezone: Tz,
) -> Area {
    Area {
        key,
        code,
        eic,
        name,
        currency: "EUR",
        timezone,
    }
}

static AREAS: &[Area] = &[
    area("FI", "FI", "10YFI-1--------U", "Finland", Europe::Helsinki),
    area("AT", "AT", "10YAT-APG------L", "Austria", Europe::Vienna),
    area("BE", "BE", "10YBE----------2", "Belgium", Europe::Brussels),
    area("BG", "BG", "10YCA-BULGARIA-R", "Bulgaria", Europe::Sofia),
    area("HR", "HR", "10YHR-HEP------M", "Croatia", Europe::Zagreb),
    area("CZ", "CZ", "10YCZ-CEPS-----N", "Czech Republic", Europe::Prague),
    area("DK_1", "DK_1", "10YDK-1--------W", "Denmark Western (DK1)", Europe::Copenhagen),
    area("DK_2", "DK_2", "10YDK-2--------M", "Denmark Eastern (DK2)", Europe::Copenhagen),
    area("EE", "EE", "10Y1001A1001A39I", "Estonia", Europe::Tallinn),
    area("FR", "FR", "10YFR-RTE------C", "France", Europe::Paris),
    area("DE", "DE_LU", "10Y1001A1001A82H", "Germany", Europe::Berlin),
    area("GR", "GR", "10YGR-HTSO-----Y", "Greece", Europe::Athens),
    area("HU", "HU", "10YHU-MAVIR----U", "Hungary", Europe::Budapest),
    area("IT_CNOR", "IT_CNOR", "10Y1001A1001A70O", "Italy Centre North", Europe::Rome),
    area("IT_CSUD", "IT_CSUD", "10Y1001A1001A71M", "Italy Centre South", Europe::Rome),
    area("IT_NORD", "IT_NORD", "10Y1001A1001A73I", "Italy North", Europe::Rome),
    area("IT_SUD", "IT_SUD", "10Y1001A1001A788", "Italy South", Europe::Rome),
    area("IT_SICI", "IT_SICI", "10Y1001A1001A75E", "Italy Sicilia", Europe::Rome),
    area("IT_SARD", "IT_SARD", "10Y1001A1001A74G", "Italy Sardinia", Europe::Rome),
    area("IT_CALA", "IT_CALA", "10Y1001C--00096J", "Italy Calabria", Europe::Rome),
    area("LV", "LV", "10YLV-1001A00074", "Latvia", Europe::Riga),
    area("LT", "LT", "10YLT-1001A0008Q", "Lithuania", Europe::Vilnius),
    area("LU", "DE_LU", "10Y1001A1001A82H", "Luxembourg", Europe::Luxembourg),
    area("NL", "NL", "10YNL----------L", "Netherlands", Europe::Amsterdam),
    area("NO_1", "NO_1", "10YNO-1--------2", "Norway Oslo (NO1)", Europe::Oslo),
    area("NO_2", "NO_2", "10YNO-2--------T", "Norway Kr.Sand (NO2)", Europe::Oslo),
    area("NO_3", "NO_3", "10YNO-3--------J", "Norway Tr.heim (NO3)", Europe::Oslo),
    area("NO_4", "NO_4", "10YNO-4--------9", "Norway Tromsø (NO4)", Europe::Oslo),
    area("NO_5", "NO_5", "10Y1001A1001A48H", "Norway Bergen (NO5)", Europe::Oslo),
    area("PL", "PL", "10YPL-AREA-----S", "Poland", Europe::Warsaw),
    area("PT", "PT", "10YPT-REN------W", "Portugal", Europe::Lisbon),
    area("RO", "RO", "10YRO-TEL------P", "Romania", Europe::Bucharest),
    area("RS", "RS", "10YCS-SERBIATSOV", "Serbia", Europe::Belgrade),
    area("SK", "SK", "10YSK-SEPS-----K", "Slovakia", Europe::Bratislava),
    area("SI", "SI", "10YSI-ELES-----O", "Slovenia", Europe::Ljubljana),
    area("ES", "ES", "10YES-REE------0", "Spain", Europe::Madrid),
    area("SE_1", "SE_1", "10Y1001A1001A44P", "Sweden Luleå (SE1)", Europe::Stockholm),
    area("SE_2", "SE_2", "10Y1001A1001A45N", "Sweden Sundsvall (SE2)", Europe::Stockholm),
    area("SE_3", "SE_3", "10Y1001A1001A46L", "Sweden Stockholm (SE3)", Europe::Stockholm),
    area("SE_4", "SE_4", "10Y1001A1001A47J", "Sweden Malmö (SE4)", Europe::Stockholm),
    area("CH", "CH", "10YCH-SWISSGRIDZ", "Switzerland", Europe::Zurich),
];

/// All supported areas in table order
pub fn all() -> &'static [Area] {
    AREAS
}

/// Look up an area by key (case-insensitive)
pub fn lookup(key: &str) -> Option<&'static Area> {
    let key = key.trim();
    AREAS.iter().find(|a| a.key.eq_ignore_ascii_case(key))
}

/// Immutable per-instance configuration resolved once at startup
#[derive(Debug, Clone)]
pub struct AreaConfig {
    pub area: &'static Area,
    pub api_key: String,
    /// Optional entity name prefix; empty means unqualified entity ids
    pub name: Option<String>,
    pub timezone: Tz,
}

impl AreaConfig {
    /// Resolve an area key into a full configuration
    pub fn new(area_key: &str, api_key: impl Into<String>, name: Option<String>) -> Result<Self> {
        let area = lookup(area_key).ok_or_else(|| {
            EntsoeError::validation("entsoe.area".to_string(), format!("Unknown area: {}", area_key))
        })?;
        let name = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        Ok(Self {
            area,
            api_key: api_key.into(),
            name,
            timezone: area.timezone,
        })
    }

    pub fn from_config(cfg: &crate::config::EntsoeConfig) -> Result<Self> {
        Self::new(&cfg.area, cfg.api_key.clone(), cfg.name.clone())
    }
}

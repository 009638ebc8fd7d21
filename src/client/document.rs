//! Transparency Platform XML documents
//!
//! A day-ahead query answers with either a `Publication_MarketDocument`
//! holding one or more price curves, or an `Acknowledgement_MarketDocument`
//! explaining why there is nothing to return.

use std::collections::BTreeMap;

use chrono::{DateTime, DurationRound, NaiveDateTime, TimeDelta, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Deserialize;

use crate::error::{EntsoeError, Result};
use crate::prices::{PricePoint, PriceSeries};

/// Acknowledgement reason code for "no matching data found"
pub const NO_MATCHING_DATA: &str = "999";

const INTERVAL_FORMAT: &str = "%Y-%m-%dT%H:%MZ";

#[derive(Debug, Deserialize)]
struct PublicationDocument {
    #[serde(rename = "TimeSeries", default)]
    time_series: Vec<TimeSeries>,
}

#[derive(Debug, Deserialize)]
struct TimeSeries {
    #[serde(rename = "Period", default)]
    periods: Vec<Period>,
}

#[derive(Debug, Deserialize)]
struct Period {
    #[serde(rename = "timeInterval")]
    time_interval: TimeInterval,
    resolution: String,
    #[serde(rename = "Point", default)]
    points: Vec<Point>,
}

#[derive(Debug, Deserialize)]
struct TimeInterval {
    start: String,
    end: String,
}

#[derive(Debug, Deserialize)]
struct Point {
    position: u32,
    #[serde(rename = "price.amount")]
    price_amount: f64,
}

#[derive(Debug, Deserialize)]
struct AcknowledgementDocument {
    #[serde(rename = "Reason", default)]
    reasons: Vec<Reason>,
}

#[derive(Debug, Deserialize)]
struct Reason {
    code: String,
    #[serde(default)]
    text: Option<String>,
}

/// Parse a response body into hourly prices (currency per MWh, UTC).
///
/// Returns `NoData` for a "no matching data" acknowledgement or a
/// publication without points, `Transport` for anything unreadable.
pub fn parse_document(xml: &str) -> Result<PriceSeries> {
    match root_element(xml)?.as_str() {
        "Publication_MarketDocument" => parse_publication(xml),
        "Acknowledgement_MarketDocument" => Err(parse_acknowledgement(xml)),
        other => Err(EntsoeError::transport(format!(
            "unexpected document type: {}",
            other
        ))),
    }
}

fn root_element(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) => return Err(EntsoeError::transport("empty response document")),
            Ok(_) => {}
            Err(e) => {
                return Err(EntsoeError::transport(format!(
                    "malformed document: {}",
                    e
                )));
            }
        }
    }
}

fn parse_acknowledgement(xml: &str) -> EntsoeError {
    let doc: AcknowledgementDocument = match quick_xml::de::from_str(xml) {
        Ok(doc) => doc,
        Err(e) => return e.into(),
    };
    let text = doc
        .reasons
        .iter()
        .filter_map(|r| r.text.as_deref())
        .collect::<Vec<_>>()
        .join("; ");
    if doc.reasons.iter().any(|r| r.code.trim() == NO_MATCHING_DATA) {
        EntsoeError::no_data(text)
    } else {
        let codes = doc
            .reasons
            .iter()
            .map(|r| r.code.trim())
            .collect::<Vec<_>>()
            .join(",");
        EntsoeError::transport(format!("request rejected ({}): {}", codes, text))
    }
}

fn parse_publication(xml: &str) -> Result<PriceSeries> {
    let doc: PublicationDocument = quick_xml::de::from_str(xml)?;
    let mut hourly = Vec::new();
    for period in doc.time_series.iter().flat_map(|ts| ts.periods.iter()) {
        hourly.extend(period_to_hourly(period)?);
    }
    if hourly.is_empty() {
        return Err(EntsoeError::no_data("publication document contains no prices"));
    }
    Ok(PriceSeries::new(hourly))
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s.trim(), INTERVAL_FORMAT)
        .map(|dt| dt.and_utc())
        .map_err(|e| EntsoeError::transport(format!("bad interval instant {:?}: {}", s, e)))
}

/// Minutes per point for the resolutions the day-ahead market uses
pub fn resolution_minutes(resolution: &str) -> Result<i64> {
    match resolution.trim() {
        "PT15M" => Ok(15),
        "PT30M" => Ok(30),
        "PT60M" | "PT1H" => Ok(60),
        other => Err(EntsoeError::transport(format!(
            "unsupported resolution: {}",
            other
        ))),
    }
}

/// Expand a period into one price per slot, then average slots per hour.
///
/// Positions missing from a curve repeat the previous price until the
/// interval end; slots before the first listed position stay empty.
fn period_to_hourly(period: &Period) -> Result<Vec<PricePoint>> {
    let start = parse_instant(&period.time_interval.start)?;
    let end = parse_instant(&period.time_interval.end)?;
    let step = TimeDelta::minutes(resolution_minutes(&period.resolution)?);
    let slots = (end - start).num_minutes() / step.num_minutes();

    let by_position: BTreeMap<i64, f64> = period
        .points
        .iter()
        .map(|p| (i64::from(p.position), p.price_amount))
        .collect();

    let mut buckets: BTreeMap<DateTime<Utc>, (f64, u32)> = BTreeMap::new();
    let mut current: Option<f64> = None;
    for position in 1..=slots {
        if let Some(price) = by_position.get(&position) {
            current = Some(*price);
        }
        let Some(price) = current else { continue };
        let slot_start = start + step * i32::try_from(position - 1).unwrap_or(i32::MAX);
        let hour = slot_start
            .duration_trunc(TimeDelta::hours(1))
            .map_err(|e| EntsoeError::transport(format!("bad slot start: {}", e)))?;
        let entry = buckets.entry(hour).or_insert((0.0, 0));
        entry.0 += price;
        entry.1 += 1;
    }

    Ok(buckets
        .into_iter()
        .map(|(hour, (sum, count))| PricePoint::new(hour.fixed_offset(), sum / f64::from(count)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publication(resolution: &str, start: &str, end: &str, points: &[(u32, f64)]) -> String {
        let points: String = points
            .iter()
            .map(|(pos, price)| {
                format!(
                    "<Point><position>{}</position><price.amount>{}</price.amount></Point>",
                    pos, price
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Publication_MarketDocument xmlns="urn:iec62325.351:tc57wg16:451-3:publicationdocument:7:3">
  <mRID>doc</mRID>
  <type>A44</type>
  <TimeSeries>
    <mRID>1</mRID>
    <curveType>A03</curveType>
    <Period>
      <timeInterval><start>{start}</start><end>{end}</end></timeInterval>
      <resolution>{resolution}</resolution>
      {points}
    </Period>
  </TimeSeries>
</Publication_MarketDocument>"#
        )
    }

    #[test]
    fn hourly_curve_parses() {
        let xml = publication(
            "PT60M",
            "2024-03-09T23:00Z",
            "2024-03-10T02:00Z",
            &[(1, 50.5), (2, 60.0), (3, 70.25)],
        );
        let series = parse_document(&xml).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.first().unwrap().start.to_rfc3339(), "2024-03-09T23:00:00+00:00");
        assert_eq!(series.last().unwrap().price, 70.25);
    }

    #[test]
    fn missing_positions_repeat_previous_price() {
        let xml = publication(
            "PT60M",
            "2024-03-09T23:00Z",
            "2024-03-10T03:00Z",
            &[(1, 10.0), (3, 30.0)],
        );
        let prices: Vec<f64> = parse_document(&xml).unwrap().iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![10.0, 10.0, 30.0, 30.0]);
    }

    #[test]
    fn quarter_hours_average_into_hours() {
        let xml = publication(
            "PT15M",
            "2024-03-09T23:00Z",
            "2024-03-10T01:00Z",
            &[(1, 10.0), (2, 20.0), (3, 30.0), (4, 40.0), (5, 100.0)],
        );
        let series = parse_document(&xml).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[0].price, 25.0);
        assert_eq!(series.points()[1].price, 100.0);
    }

    #[test]
    fn acknowledgement_999_is_no_data() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<Acknowledgement_MarketDocument xmlns="urn:iec62325.351:tc57wg16:451-1:acknowledgementdocument:7:0">
  <mRID>ack</mRID>
  <Reason>
    <code>999</code>
    <text>No matching data found for Data item Day-ahead Prices</text>
  </Reason>
</Acknowledgement_MarketDocument>"#;
        let err = parse_document(xml).unwrap_err();
        assert!(matches!(err, EntsoeError::NoData { .. }));
        assert!(err.to_string().contains("No matching data"));
    }

    #[test]
    fn other_acknowledgements_and_garbage_are_transport() {
        let xml = "<Acknowledgement_MarketDocument><Reason><code>A01</code><text>bad</text></Reason></Acknowledgement_MarketDocument>";
        assert!(matches!(parse_document(xml), Err(EntsoeError::Transport { .. })));
        assert!(matches!(parse_document(""), Err(EntsoeError::Transport { .. })));
        assert!(matches!(parse_document("<html></html>"), Err(EntsoeError::Transport { .. })));
    }

    #[test]
    fn empty_publication_is_no_data() {
        let xml = "<Publication_MarketDocument><mRID>x</mRID></Publication_MarketDocument>";
        assert!(matches!(parse_document(xml), Err(EntsoeError::NoData { .. })));
    }
}

use chrono::{DateTime, FixedOffset, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// One hourly price starting at `start`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub start: DateTime<FixedOffset>,
    pub price: f64,
}

impl PricePoint {
    pub fn new(start: DateTime<FixedOffset>, price: f64) -> Self {
        Self { start, price }
    }

    /// Calendar date of the start instant in `tz`
    pub fn local_date(&self, tz: Tz) -> NaiveDate {
        self.start.with_timezone(&tz).date_naive()
    }
}

/// Hourly prices ordered by start with no duplicate hours.
///
/// Every constructor goes through [`PriceSeries::new`], so the ordering
/// holds for deserialized values too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<PricePoint>", into = "Vec<PricePoint>")]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Sort by start; among duplicate starts the later entry wins
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.sort_by(|a, b| a.start.cmp(&b.start));
        let mut out: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match out.last_mut() {
                Some(last) if last.start == point.start => *last = point,
                _ => out.push(point),
            }
        }
        Self { points: out }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PricePoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Start of the newest hour
    pub fn newest_start(&self) -> Option<DateTime<FixedOffset>> {
        self.points.last().map(|p| p.start)
    }

    /// Apply `f` to every price, keeping the starts
    pub fn map_prices(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            points: self
                .points
                .iter()
                .map(|p| PricePoint::new(p.start, f(p.price)))
                .collect(),
        }
    }

    /// Re-express every start in the offset `tz` uses at that instant
    pub fn in_timezone(&self, tz: Tz) -> Self {
        Self {
            points: self
                .points
                .iter()
                .map(|p| PricePoint::new(p.start.with_timezone(&tz).fixed_offset(), p.price))
                .collect(),
        }
    }

    /// Entries whose local date in `tz` is `date`
    pub fn on_date(&self, tz: Tz, date: NaiveDate) -> Self {
        Self {
            points: self
                .points
                .iter()
                .filter(|p| p.local_date(tz) == date)
                .copied()
                .collect(),
        }
    }

    /// The newest `n` entries
    pub fn last_n(&self, n: usize) -> Self {
        let skip = self.points.len().saturating_sub(n);
        Self {
            points: self.points[skip..].to_vec(),
        }
    }

    /// Merge two series; on a shared hour `other` wins
    pub fn merged(&self, other: &PriceSeries) -> Self {
        let mut points = self.points.clone();
        points.extend_from_slice(&other.points);
        Self::new(points)
    }
}

impl From<Vec<PricePoint>> for PriceSeries {
    fn from(points: Vec<PricePoint>) -> Self {
        Self::new(points)
    }
}

impl From<PriceSeries> for Vec<PricePoint> {
    fn from(series: PriceSeries) -> Self {
        series.points
    }
}

impl<'a> IntoIterator for &'a PriceSeries {
    type Item = &'a PricePoint;
    type IntoIter = std::slice::Iter<'a, PricePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

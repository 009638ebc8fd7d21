use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::series::PriceSeries;

/// Where the data in a [`Snapshot`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotOrigin {
    /// Fetched from the upstream
    Live,
    /// Spliced back from persisted sensor attributes
    Restored,
    /// Shifted forward a day while serving cached data
    RolledOver,
}

/// The coordinator's authoritative price data.
///
/// Never mutated once built; the coordinator swaps whole values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub all: PriceSeries,
    pub today: PriceSeries,
    pub tomorrow: PriceSeries,
    pub fetched_at: DateTime<Utc>,
    pub origin: SnapshotOrigin,
}

impl Snapshot {
    /// Cut `all` into today's and tomorrow's local calendar days.
    ///
    /// Tomorrow stays empty unless it has at least `min_tomorrow_hours`
    /// entries, so a partially published day is never shown.
    pub fn partition(
        all: PriceSeries,
        tz: Tz,
        now: DateTime<Utc>,
        min_tomorrow_hours: usize,
        origin: SnapshotOrigin,
    ) -> Self {
        let today_date = now.with_timezone(&tz).date_naive();
        let today = all.on_date(tz, today_date);
        let tomorrow = today_date
            .succ_opt()
            .map(|d| all.on_date(tz, d))
            .filter(|s| s.len() >= min_tomorrow_hours)
            .unwrap_or_default();
        Self {
            all,
            today,
            tomorrow,
            fetched_at: now,
            origin,
        }
    }

    /// Whether the newest hour has already started at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.all.newest_start().is_none_or(|newest| newest <= now)
    }

    /// Whether the stored tomorrow bucket has become today by wall clock
    pub fn rollover_due(&self, tz: Tz, now: DateTime<Utc>) -> bool {
        let today = now.with_timezone(&tz).date_naive();
        self.tomorrow
            .first()
            .is_some_and(|p| p.local_date(tz) == today)
    }

    /// Tomorrow becomes today, tomorrow empties and `all` keeps its newest 24 hours
    pub fn rolled_over(&self) -> Self {
        Self {
            all: self.all.last_n(24),
            today: self.tomorrow.clone(),
            tomorrow: PriceSeries::empty(),
            fetched_at: self.fetched_at,
            origin: SnapshotOrigin::RolledOver,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::PricePoint;
    use chrono::{Duration, TimeZone};

    fn hourly(from: DateTime<Utc>, hours: i64) -> PriceSeries {
        PriceSeries::new(
            (0..hours)
                .map(|h| PricePoint::new((from + Duration::hours(h)).fixed_offset(), h as f64))
                .collect(),
        )
    }

    #[test]
    fn partition_is_disjoint_and_covers_two_days() {
        let tz = Tz::Europe__Amsterdam;
        // 2024-03-10 00:00 local is 2024-03-09 23:00 UTC
        let start = Utc.with_ymd_and_hms(2024, 3, 9, 23, 0, 0).unwrap();
        let now = start + Duration::hours(10);
        let snap = Snapshot::partition(hourly(start, 48), tz, now, 23, SnapshotOrigin::Live);

        assert_eq!(snap.today.len(), 24);
        assert_eq!(snap.tomorrow.len(), 24);
        let last_today = snap.today.last().unwrap().start;
        let first_tomorrow = snap.tomorrow.first().unwrap().start;
        assert!(last_today < first_tomorrow);
        assert_eq!(snap.today.merged(&snap.tomorrow), snap.all);
    }

    #[test]
    fn short_tomorrow_is_dropped() {
        let tz = Tz::Europe__Amsterdam;
        let start = Utc.with_ymd_and_hms(2024, 3, 9, 23, 0, 0).unwrap();
        let snap = Snapshot::partition(hourly(start, 34), tz, start, 23, SnapshotOrigin::Live);
        assert_eq!(snap.today.len(), 24);
        assert!(snap.tomorrow.is_empty());
        assert_eq!(snap.all.len(), 34);
    }

    #[test]
    fn rollover_shifts_tomorrow_into_today() {
        let tz = Tz::Europe__Amsterdam;
        let start = Utc.with_ymd_and_hms(2024, 3, 9, 23, 0, 0).unwrap();
        let snap = Snapshot::partition(hourly(start, 48), tz, start, 23, SnapshotOrigin::Live);

        assert!(!snap.rollover_due(tz, start + Duration::hours(23)));
        let next_day = start + Duration::hours(25);
        assert!(snap.rollover_due(tz, next_day));

        let rolled = snap.rolled_over();
        assert_eq!(rolled.today, snap.tomorrow);
        assert!(rolled.tomorrow.is_empty());
        assert_eq!(rolled.all.len(), 24);
        assert_eq!(rolled.origin, SnapshotOrigin::RolledOver);
        assert!(!rolled.is_expired_at(next_day));
    }
}

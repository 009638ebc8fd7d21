//! Price series and the coordinator snapshot
//!
//! Prices travel through the bridge as [`PriceSeries`] values: raw
//! currency/MWh in UTC straight from a [`PriceSource`](crate::client::PriceSource),
//! then cents/kWh in the area's local offset once the coordinator has
//! normalized them into a [`Snapshot`].

mod series;
mod snapshot;
mod units;

pub use series::{PricePoint, PriceSeries};
pub use snapshot::{Snapshot, SnapshotOrigin};
pub use units::{PRICE_UNIT, mwh_to_cents_per_kwh, round3};

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;

/// Local midnight of `date` in `tz`.
///
/// European zones never skip midnight, but a gap resolves to the same wall
/// time interpreted as UTC rather than failing.
pub fn start_of_day(tz: Tz, date: NaiveDate) -> DateTime<Tz> {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Offset;

    #[test]
    fn midnight_follows_dst_offset() {
        let winter = start_of_day(Tz::Europe__Amsterdam, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(winter.offset().fix().local_minus_utc(), 3600);

        let summer = start_of_day(Tz::Europe__Amsterdam, NaiveDate::from_ymd_opt(2024, 7, 15).unwrap());
        assert_eq!(summer.offset().fix().local_minus_utc(), 7200);
        assert_eq!(summer.to_rfc3339(), "2024-07-15T00:00:00+02:00");
    }
}

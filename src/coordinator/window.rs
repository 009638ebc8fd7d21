use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use crate::config::WindowStrategy;
use crate::prices::start_of_day;

/// UTC bounds of the request for a refresh at `now`
pub fn request_window(
    strategy: WindowStrategy,
    tz: Tz,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.with_timezone(&tz).date_naive();
    match strategy {
        WindowStrategy::TodayTomorrow => (
            start_of_day(tz, today).with_timezone(&Utc),
            start_of_day(tz, today + Duration::days(2)).with_timezone(&Utc),
        ),
        WindowStrategy::Trailing72h => {
            let start = start_of_day(tz, today - Duration::days(1)).with_timezone(&Utc);
            (start, start + Duration::hours(71))
        }
    }
}

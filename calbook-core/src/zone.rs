//! Time-zone helpers for wall-clock event times.

use chrono::{DateTime, Duration, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{DomainError, Outcome};

/// Resolve an IANA zone identifier such as "America/New_York".
pub fn parse_zone(name: &str) -> Outcome<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| DomainError::InvalidTimezone(name.to_string()))
}

/// The instant a wall-clock time denotes in `zone`.
///
/// Ambiguous times (clocks turned back) resolve to the earlier instant. Times inside a gap
/// (clocks turned forward) are read with the offset in force before the gap.
pub fn to_instant(zone: Tz, wall: NaiveDateTime) -> DateTime<Utc> {
    if let Some(local) = zone.from_local_datetime(&wall).earliest() {
        return local.with_timezone(&Utc);
    }

    let before_gap = zone
        .offset_from_utc_datetime(&(wall - Duration::days(1)))
        .fix();
    let utc = wall - Duration::seconds(i64::from(before_gap.local_minus_utc()));
    Utc.from_utc_datetime(&utc)
}

/// Wall-clock time in `to` for the instant that `wall` denotes in `from`.
pub fn convert(wall: NaiveDateTime, from: Tz, to: Tz) -> NaiveDateTime {
    if from == to {
        return wall;
    }
    to_instant(from, wall).with_timezone(&to).naive_local()
}

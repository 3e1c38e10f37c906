use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

/// Converts a UTC `NaiveDateTime` to `DateTime<FixedOffset>` for the given timezone.
/// Accounts for historical timezone changes, including DST.
pub fn time_convert_utc_naive_to_fixed_offset(
    time_zone: &Tz,
    utc_time: NaiveDateTime,
) -> DateTime<FixedOffset> {
    let timezone_aware_datetime = time_zone.from_utc_datetime(&utc_time);
    let fixed_offset = time_zone.offset_from_utc_datetime(&utc_time).fix();
    timezone_aware_datetime.with_timezone(&fixed_offset)
}

/// Converts a `DateTime<Utc>` to `DateTime<FixedOffset>` for the given timezone.
/// Accounts for historical timezone changes, including DST.
pub fn time_convert_utc_datetime_to_fixed_offset(
    time_zone: &Tz,
    utc_datetime: DateTime<Utc>,
) -> DateTime<FixedOffset> {
    time_convert_utc_naive_to_fixed_offset(time_zone, utc_datetime.naive_utc())
}

/// Rounds a local (fixed-offset) time down to the most recent boundary of `size`.
///
/// `size` is assumed to divide evenly into a day (seconds/minutes/hours resolutions);
/// the rounding is anchored to local midnight so the same wall-clock boundaries line
/// up across days regardless of DST shifts.
pub fn round_down_to_duration(time: DateTime<FixedOffset>, size: Duration) -> DateTime<FixedOffset> {
    let size_secs = size.num_seconds().max(1);
    let midnight = time
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let offset = *time.offset();
    let midnight = offset.from_local_datetime(&midnight).unwrap();
    let elapsed = (time - midnight).num_seconds();
    let rounded_elapsed = elapsed - (elapsed.rem_euclid(size_secs));
    midnight + Duration::seconds(rounded_elapsed)
}

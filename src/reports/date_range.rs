//! Date-window to ObjectId-range translation.
//!
//! Order and batch `_id`s are time-ordered: the first 4 bytes are a
//! big-endian whole-second UTC Unix timestamp. A local date window
//! therefore maps to an inclusive `$gte`/`$lte` pair of boundary ids whose
//! remaining 8 bytes are zero. Any change to the identifier scheme breaks
//! this strategy.

use chrono::{LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use mongodb::bson::oid::ObjectId;

/// Fixed business timezone; report windows are entered as local dates here.
pub const BUSINESS_TZ: Tz = chrono_tz::Asia::Riyadh;

/// Translates a local window into inclusive `_id` bounds.
///
/// Performs no ordering validation; callers reject start > end before
/// getting here.
pub fn object_id_bounds(start: NaiveDateTime, end: NaiveDateTime) -> (ObjectId, ObjectId) {
    (boundary_object_id(start), boundary_object_id(end))
}

/// Builds the boundary id for one business-local instant. Sub-second
/// precision is silently dropped.
pub fn boundary_object_id(local: NaiveDateTime) -> ObjectId {
    let utc = match BUSINESS_TZ.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // Riyadh has no DST transitions, so local times never fall in a gap.
        LocalResult::None => Utc.from_utc_datetime(&local),
    };

    let secs = utc.timestamp().clamp(0, i64::from(u32::MAX)) as u32;
    let mut bytes = [0u8; 12];
    bytes[..4].copy_from_slice(&secs.to_be_bytes());
    ObjectId::from_bytes(bytes)
}

/// Interprets a stored millisecond epoch as a UTC calendar date.
///
/// This matches the report contract: creation dates are rendered as the
/// UTC day, not the business-timezone day.
pub fn epoch_ms_to_date(ms: i64) -> Option<NaiveDate> {
    chrono::DateTime::from_timestamp_millis(ms).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn embedded_secs(oid: &ObjectId) -> u32 {
        let bytes = oid.bytes();
        u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    fn local_midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::MIN)
    }

    #[test]
    fn riyadh_midnight_maps_to_utc_minus_three_hours() {
        // 2025-01-30 00:00 in Riyadh (UTC+3) is 2025-01-29 21:00 UTC.
        let oid = boundary_object_id(local_midnight(2025, 1, 30));
        let expected = Utc
            .with_ymd_and_hms(2025, 1, 29, 21, 0, 0)
            .unwrap()
            .timestamp() as u32;
        assert_eq!(embedded_secs(&oid), expected);
    }

    #[test]
    fn non_timestamp_bytes_are_zero() {
        let oid = boundary_object_id(local_midnight(2025, 2, 19));
        assert!(oid.bytes()[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn bounds_are_ordered_for_ordered_inputs() {
        let (lower, upper) = object_id_bounds(
            local_midnight(2025, 1, 30),
            local_midnight(2025, 2, 19),
        );
        assert!(lower < upper);

        // Equal instants give equal bounds: the range is inclusive.
        let (lo, hi) = object_id_bounds(local_midnight(2025, 2, 1), local_midnight(2025, 2, 1));
        assert_eq!(lo, hi);
    }

    #[test]
    fn sub_second_precision_is_dropped() {
        let day = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let base = day.and_hms_opt(12, 0, 0).unwrap();
        let with_millis = day.and_hms_milli_opt(12, 0, 0, 750).unwrap();
        assert_eq!(boundary_object_id(base), boundary_object_id(with_millis));
    }

    #[test]
    fn epoch_ms_renders_the_utc_day() {
        // 2025-02-01 23:30 UTC is already 2025-02-02 in Riyadh; the report
        // keeps the UTC day.
        let ms = Utc
            .with_ymd_and_hms(2025, 2, 1, 23, 30, 0)
            .unwrap()
            .timestamp_millis();
        assert_eq!(
            epoch_ms_to_date(ms),
            NaiveDate::from_ymd_opt(2025, 2, 1)
        );
    }
}

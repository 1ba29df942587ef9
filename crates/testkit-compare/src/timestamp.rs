//! Second-granularity timestamp equality
//!
//! Database round trips may drop or round sub-second precision, so two
//! timestamps are equal when they agree after rounding to the second or
//! after truncating to the second.

use chrono::{DateTime, SubsecRound, Utc};

const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

fn rounded(ts: &DateTime<Utc>) -> String {
    ts.round_subsecs(0).format(FORMAT).to_string()
}

fn truncated(ts: &DateTime<Utc>) -> String {
    ts.trunc_subsecs(0).format(FORMAT).to_string()
}

/// Whether two timestamps name the same second
pub fn same_second(actual: &DateTime<Utc>, expected: &DateTime<Utc>) -> bool {
    rounded(actual) == rounded(expected) || truncated(actual) == truncated(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_subsecond_difference_rounds_together() {
        assert!(same_second(
            &ts("2024-01-01T00:00:00.400Z"),
            &ts("2024-01-01T00:00:00.000Z")
        ));
    }

    #[test]
    fn test_truncation_catches_split_rounding() {
        // .6 rounds up, .4 rounds down, both truncate to :00
        assert!(same_second(
            &ts("2024-01-01T00:00:00.600Z"),
            &ts("2024-01-01T00:00:00.400Z")
        ));
    }

    #[test]
    fn test_rounding_catches_carry() {
        assert!(same_second(
            &ts("2024-01-01T00:00:00.999Z"),
            &ts("2024-01-01T00:00:01.000Z")
        ));
    }

    #[test]
    fn test_one_second_apart() {
        assert!(!same_second(
            &ts("2024-01-01T00:00:00.400Z"),
            &ts("2024-01-01T00:00:01.400Z")
        ));
    }

    #[test]
    fn test_offsets_normalised() {
        let local = "2024-01-01T02:00:00+02:00"
            .parse::<DateTime<chrono::FixedOffset>>()
            .unwrap()
            .with_timezone(&Utc);
        assert!(same_second(&local, &ts("2024-01-01T00:00:00Z")));
    }
}

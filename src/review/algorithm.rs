//! SM-2 style review scheduling
//!
//! Ease factor update:
//! `EF' = max(1.3, EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02)))`
//!
//! Interval update uses the ease factor from *before* this response:
//! a failed recall (q < 3) resets to one day, otherwise the previous interval
//! is multiplied by the old ease factor and rounded. A brand-new item has an
//! interval of 0, so a first successful recall keeps it due immediately.
//! Intervals are capped at [`MAX_INTERVAL_DAYS`] so due dates stay within
//! the range that timestamps can be stored and read back in.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::models::Quality;

/// Minimum ease factor allowed
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Longest interval ever scheduled (roughly 100 years)
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// Result of scheduling the next review
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSchedule {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub next_review_at: DateTime<Utc>,
}

/// Compute the next ease factor, interval and due time for one response.
///
/// `ease_factor` and `interval_days` are the values stored before this
/// response (2.5 and 0 for an item never reviewed).
pub fn schedule_next_review(
    quality: Quality,
    ease_factor: f64,
    interval_days: u32,
    now: DateTime<Utc>,
) -> ReviewSchedule {
    let q = quality.value() as f64;
    let miss = 5.0 - q;

    let new_ease_factor = (ease_factor + (0.1 - miss * (0.08 + miss * 0.02))).max(MIN_EASE_FACTOR);

    let new_interval = if quality.is_recalled() {
        (interval_days as f64 * ease_factor)
            .round()
            .min(MAX_INTERVAL_DAYS as f64) as u32
    } else {
        1
    };

    // Only fails when `now` itself sits at the edge of the representable range
    let next_review_at = now
        .checked_add_signed(Duration::days(new_interval as i64))
        .unwrap_or(now);

    ReviewSchedule {
        ease_factor: new_ease_factor,
        interval_days: new_interval,
        next_review_at,
    }
}

/// Format an interval in days to a short human-readable string
pub fn format_interval(days: u32) -> String {
    match days {
        0 => "now".to_string(),
        1..=6 => format!("{}d", days),
        7..=29 => format!("{}w", days / 7),
        30..=364 => format!("{}mo", days / 30),
        _ => format!("{}y", days / 365),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn q(value: i64) -> Quality {
        Quality::new(value).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {}, got {}", expected, actual);
    }

    #[test]
    fn test_perfect_recall() {
        let result = schedule_next_review(q(5), 2.5, 6, now());

        assert_close(result.ease_factor, 2.6);
        // 6 * 2.5 = 15
        assert_eq!(result.interval_days, 15);
        assert_eq!(result.next_review_at, now() + Duration::days(15));
    }

    #[test]
    fn test_blackout_resets_interval() {
        let result = schedule_next_review(q(0), 2.5, 6, now());

        assert_eq!(result.interval_days, 1);
        assert!(result.ease_factor < 2.5);
        // 2.5 + (0.1 - 5 * 0.18) = 1.7
        assert_close(result.ease_factor, 1.7);
        assert_eq!(result.next_review_at, now() + Duration::days(1));
    }

    #[test]
    fn test_ease_factor_minimum() {
        let result = schedule_next_review(q(0), 1.5, 30, now());
        assert_close(result.ease_factor, MIN_EASE_FACTOR);
        assert_eq!(result.interval_days, 1);

        let again = schedule_next_review(q(1), result.ease_factor, result.interval_days, now());
        assert!(again.ease_factor >= MIN_EASE_FACTOR);
    }

    #[test]
    fn test_interval_uses_old_ease_factor() {
        // quality 3 lowers EF to 2.36 but the interval is 10 * 2.5
        let result = schedule_next_review(q(3), 2.5, 10, now());
        assert_close(result.ease_factor, 2.36);
        assert_eq!(result.interval_days, 25);
    }

    #[test]
    fn test_new_item_stays_due_after_first_success() {
        let result = schedule_next_review(q(4), 2.5, 0, now());
        assert_eq!(result.interval_days, 0);
        assert_close(result.ease_factor, 2.5);
        assert_eq!(result.next_review_at, now());
    }

    #[test]
    fn test_interval_rounding() {
        // 3 * 2.5 = 7.5 rounds up
        assert_eq!(schedule_next_review(q(4), 2.5, 3, now()).interval_days, 8);
        // 1 * 1.3 = 1.3 rounds down
        assert_eq!(schedule_next_review(q(5), 1.3, 1, now()).interval_days, 1);
    }

    #[test]
    fn test_interval_is_capped() {
        let mut ease_factor = 1.7;
        let mut interval_days = 1;
        for _ in 0..40 {
            let result = schedule_next_review(q(5), ease_factor, interval_days, now());
            assert!(result.interval_days <= MAX_INTERVAL_DAYS);
            ease_factor = result.ease_factor;
            interval_days = result.interval_days;
        }

        assert_eq!(interval_days, MAX_INTERVAL_DAYS);
        let result = schedule_next_review(q(5), ease_factor, interval_days, now());
        assert_eq!(result.next_review_at, now() + Duration::days(MAX_INTERVAL_DAYS as i64));
    }

    #[test]
    fn test_due_date_never_overflows() {
        let result = schedule_next_review(q(5), 2.5, MAX_INTERVAL_DAYS, DateTime::<Utc>::MAX_UTC);
        assert_eq!(result.interval_days, MAX_INTERVAL_DAYS);
        assert_eq!(result.next_review_at, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_quality_bounds() {
        assert!(Quality::new(-1).is_err());
        assert!(Quality::new(6).is_err());
        assert_eq!(Quality::new(5).unwrap().value(), 5);
        assert!(!q(2).is_recalled());
        assert!(q(3).is_recalled());
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(0), "now");
        assert_eq!(format_interval(1), "1d");
        assert_eq!(format_interval(5), "5d");
        assert_eq!(format_interval(14), "2w");
        assert_eq!(format_interval(90), "3mo");
        assert_eq!(format_interval(730), "2y");
    }
}

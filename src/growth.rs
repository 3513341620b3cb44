use chrono::NaiveDate;

use crate::models::{GrowthResult, ScanRecord};
use crate::series;

pub const GROWTH_WINDOW_DAYS: usize = 7;

pub fn compute_growth(records: &[ScanRecord], window_days: usize, today: NaiveDate) -> GrowthResult {
    assert!(window_days > 0, "growth window must cover at least one day");

    // One bucketed run covers both windows, so duplicate-date resolution
    // stays identical to bucketize.
    let buckets = series::bucketize(records, window_days * 2, today);
    let prior_period_total: u64 = buckets[..window_days].iter().map(|b| b.scans).sum();
    let current_period_total: u64 = buckets[window_days..].iter().map(|b| b.scans).sum();

    let percent = if prior_period_total == 0 {
        if current_period_total > 0 {
            100
        } else {
            0
        }
    } else {
        let delta = current_period_total as f64 - prior_period_total as f64;
        // Rounds half away from zero (f64::round semantics).
        (delta / prior_period_total as f64 * 100.0).round() as i64
    };

    GrowthResult {
        percent,
        current_period_total,
        prior_period_total,
    }
}

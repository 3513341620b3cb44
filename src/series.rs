use std::collections::HashMap;

use chrono::{Duration, NaiveDate};

use crate::models::{ScanBucket, ScanRecord, ViewMode};

pub fn bucketize(records: &[ScanRecord], window_days: usize, today: NaiveDate) -> Vec<ScanBucket> {
    assert!(window_days > 0, "window must cover at least one day");

    // Duplicate dates resolve first-wins, matching linear-scan lookup.
    let mut by_date: HashMap<NaiveDate, u64> = HashMap::with_capacity(records.len());
    for record in records {
        by_date.entry(record.date).or_insert(record.count);
    }

    let start = today - Duration::days(window_days as i64 - 1);
    (0..window_days)
        .map(|offset| {
            let date = start + Duration::days(offset as i64);
            ScanBucket {
                date,
                scans: by_date.get(&date).copied().unwrap_or(0),
            }
        })
        .collect()
}

pub fn apply_view(series: &[ScanBucket], mode: ViewMode) -> Vec<ScanBucket> {
    match mode {
        ViewMode::Daily => series.to_vec(),
        ViewMode::Cumulative => {
            let mut running = 0u64;
            series
                .iter()
                .map(|bucket| {
                    running += bucket.scans;
                    ScanBucket {
                        date: bucket.date,
                        scans: running,
                    }
                })
                .collect()
        }
    }
}

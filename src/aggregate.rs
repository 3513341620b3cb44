use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future;
use uuid::Uuid;

use crate::growth::{self, GROWTH_WINDOW_DAYS};
use crate::models::{AggregatedQrCode, GrowthResult, QrCode, ScanRecord};
use crate::series;

#[derive(Debug, thiserror::Error)]
#[error("scan series unavailable for QR code {qr_id}: {message}")]
pub struct FetchError {
    pub qr_id: Uuid,
    pub message: String,
}

#[async_trait]
pub trait ScanSource {
    async fn fetch_series(&self, qr_id: Uuid) -> Result<Vec<ScanRecord>, FetchError>;
}

pub async fn aggregate_qr_codes<S>(
    codes: &[QrCode],
    source: &S,
    today: NaiveDate,
) -> Vec<AggregatedQrCode>
where
    S: ScanSource + Sync,
{
    // All fetches run concurrently; the join waits for every one to settle
    // rather than failing fast, and keeps input order.
    let fetches = codes.iter().map(|qr| source.fetch_series(qr.id));
    let outcomes = future::join_all(fetches).await;

    codes
        .iter()
        .zip(outcomes)
        .map(|(qr, outcome)| match outcome {
            Ok(records) => AggregatedQrCode {
                qr: qr.clone(),
                series: series::bucketize(&records, GROWTH_WINDOW_DAYS, today),
                growth: growth::compute_growth(&records, GROWTH_WINDOW_DAYS, today),
            },
            Err(err) => {
                log::warn!("degrading {} to a zero series: {err}", qr.code);
                AggregatedQrCode {
                    qr: qr.clone(),
                    series: series::bucketize(&[], GROWTH_WINDOW_DAYS, today),
                    growth: GrowthResult::default(),
                }
            }
        })
        .collect()
}

pub fn top_n(mut aggregated: Vec<AggregatedQrCode>, k: usize) -> Vec<AggregatedQrCode> {
    // Stable sort keeps input order across equal totals.
    aggregated.sort_by(|a, b| b.qr.total_scans.cmp(&a.qr.total_scans));
    aggregated.truncate(k);
    aggregated
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use chrono::Duration;

    use super::*;

    struct FakeScanSource {
        series: HashMap<Uuid, Vec<ScanRecord>>,
        failing: HashSet<Uuid>,
    }

    #[async_trait]
    impl ScanSource for FakeScanSource {
        async fn fetch_series(&self, qr_id: Uuid) -> Result<Vec<ScanRecord>, FetchError> {
            if self.failing.contains(&qr_id) {
                return Err(FetchError {
                    qr_id,
                    message: "connection reset".to_string(),
                });
            }
            Ok(self.series.get(&qr_id).cloned().unwrap_or_default())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    fn qr(code: &str, total_scans: u64) -> QrCode {
        QrCode {
            id: Uuid::new_v4(),
            code: code.to_string(),
            title: code.to_string(),
            total_scans,
        }
    }

    fn aggregated(code: &str, total_scans: u64) -> AggregatedQrCode {
        AggregatedQrCode {
            qr: qr(code, total_scans),
            series: series::bucketize(&[], GROWTH_WINDOW_DAYS, today()),
            growth: GrowthResult::default(),
        }
    }

    #[tokio::test]
    async fn one_failing_fetch_degrades_only_that_code() {
        let codes: Vec<QrCode> = (0..5).map(|i| qr(&format!("qr-{i}"), 10)).collect();
        let mut series_by_id = HashMap::new();
        for code in &codes {
            series_by_id.insert(
                code.id,
                vec![ScanRecord {
                    date: today() - Duration::days(1),
                    count: 4,
                }],
            );
        }
        let source = FakeScanSource {
            series: series_by_id,
            failing: HashSet::from([codes[2].id]),
        };

        let result = aggregate_qr_codes(&codes, &source, today()).await;

        assert_eq!(result.len(), 5);
        for (position, entry) in result.iter().enumerate() {
            assert_eq!(entry.qr.code, codes[position].code);
        }

        let degraded = &result[2];
        assert!(degraded.series.iter().all(|b| b.scans == 0));
        assert_eq!(degraded.growth, GrowthResult::default());

        for entry in [&result[0], &result[1], &result[3], &result[4]] {
            assert_eq!(entry.growth.current_period_total, 4);
            assert_eq!(entry.growth.percent, 100);
            assert_eq!(entry.series.iter().map(|b| b.scans).sum::<u64>(), 4);
        }
    }

    #[tokio::test]
    async fn degraded_series_still_spans_the_window() {
        let codes = vec![qr("qr-offline", 3)];
        let source = FakeScanSource {
            series: HashMap::new(),
            failing: HashSet::from([codes[0].id]),
        };

        let result = aggregate_qr_codes(&codes, &source, today()).await;

        assert_eq!(result[0].series.len(), GROWTH_WINDOW_DAYS);
        assert_eq!(result[0].series.last().unwrap().date, today());
    }

    #[test]
    fn top_n_ranks_by_total_scans_descending() {
        let entries = vec![
            aggregated("mid", 50),
            aggregated("low", 10),
            aggregated("high", 90),
        ];

        let ranked = top_n(entries, 2);

        let codes: Vec<&str> = ranked.iter().map(|e| e.qr.code.as_str()).collect();
        assert_eq!(codes, vec!["high", "mid"]);
    }

    #[test]
    fn top_n_with_k_beyond_len_returns_everything() {
        let entries = vec![aggregated("a", 1), aggregated("b", 7)];

        let ranked = top_n(entries, 10);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].qr.code, "b");
    }

    #[test]
    fn top_n_zero_or_empty_is_empty() {
        assert!(top_n(vec![aggregated("a", 5)], 0).is_empty());
        assert!(top_n(Vec::new(), 3).is_empty());
    }

    #[test]
    fn top_n_ties_keep_input_order() {
        let entries = vec![
            aggregated("first", 20),
            aggregated("second", 20),
            aggregated("third", 30),
        ];

        let ranked = top_n(entries, 3);

        let codes: Vec<&str> = ranked.iter().map(|e| e.qr.code.as_str()).collect();
        assert_eq!(codes, vec!["third", "first", "second"]);
    }
}

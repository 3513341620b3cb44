use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{AggregatedQrCode, OverviewStats};

pub fn build_report(
    today: NaiveDate,
    overview: &OverviewStats,
    top: &[AggregatedQrCode],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# QR Scan Analytics Dashboard");
    let _ = writeln!(
        output,
        "Generated on {} (7-day window vs the prior week)",
        today
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- QR codes tracked: {}", overview.total_qr_codes);
    let _ = writeln!(output, "- Total scans: {}", overview.total_scans);
    let _ = writeln!(output, "- Scans today: {}", overview.scans_today);
    let _ = writeln!(output, "- Scans this week: {}", overview.scans_this_week);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Performers");

    if top.is_empty() {
        let _ = writeln!(output, "No QR codes tracked yet.");
    } else {
        for (position, entry) in top.iter().enumerate() {
            let _ = writeln!(
                output,
                "{}. {} ({}) {} scans total, {} this week vs {} prior ({:+}%)",
                position + 1,
                entry.qr.title,
                entry.qr.code,
                entry.qr.total_scans,
                entry.growth.current_period_total,
                entry.growth.prior_period_total,
                entry.growth.percent
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## 7-Day Trend");

    if top.is_empty() {
        let _ = writeln!(output, "No scan activity to chart.");
    } else {
        for entry in top.iter() {
            let counts = entry
                .series
                .iter()
                .map(|bucket| bucket.scans.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            let _ = writeln!(output, "- {}: {}", entry.qr.code, counts);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::models::{GrowthResult, QrCode, ScanBucket};
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    fn entry(code: &str, total_scans: u64, percent: i64) -> AggregatedQrCode {
        let series = (0..7i64)
            .map(|offset| ScanBucket {
                date: today() - Duration::days(6 - offset),
                scans: offset as u64,
            })
            .collect();

        AggregatedQrCode {
            qr: QrCode {
                id: Uuid::new_v4(),
                code: code.to_string(),
                title: code.to_string(),
                total_scans,
            },
            series,
            growth: GrowthResult {
                percent,
                current_period_total: 21,
                prior_period_total: 14,
            },
        }
    }

    #[test]
    fn report_lists_ranked_codes_with_growth() {
        let overview = OverviewStats {
            total_qr_codes: 2,
            total_scans: 140,
            scans_today: 6,
            scans_this_week: 42,
        };
        let top = vec![entry("launch-poster", 90, 50), entry("menu-table-tent", 50, -50)];

        let report = build_report(today(), &overview, &top);

        assert!(report.contains("# QR Scan Analytics Dashboard"));
        assert!(report.contains("- QR codes tracked: 2"));
        assert!(report.contains("1. launch-poster (launch-poster) 90 scans total"));
        assert!(report.contains("(+50%)"));
        assert!(report.contains("(-50%)"));
        assert!(report.contains("- launch-poster: 0 1 2 3 4 5 6"));
    }

    #[test]
    fn report_handles_an_empty_console() {
        let overview = OverviewStats {
            total_qr_codes: 0,
            total_scans: 0,
            scans_today: 0,
            scans_this_week: 0,
        };

        let report = build_report(today(), &overview, &[]);

        assert!(report.contains("No QR codes tracked yet."));
        assert!(report.contains("No scan activity to chart."));
    }
}

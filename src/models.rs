use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ScanRecord {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanBucket {
    pub date: NaiveDate,
    pub scans: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ViewMode {
    Daily,
    Cumulative,
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewMode::Daily => f.write_str("daily"),
            ViewMode::Cumulative => f.write_str("cumulative"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GrowthResult {
    pub percent: i64,
    pub current_period_total: u64,
    pub prior_period_total: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QrCode {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub total_scans: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregatedQrCode {
    pub qr: QrCode,
    pub series: Vec<ScanBucket>,
    pub growth: GrowthResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewStats {
    pub total_qr_codes: u64,
    pub total_scans: u64,
    pub scans_today: u64,
    pub scans_this_week: u64,
}

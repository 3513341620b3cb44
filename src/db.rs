use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::aggregate::{FetchError, ScanSource};
use crate::models::{OverviewStats, QrCode, ScanRecord};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query("CREATE SCHEMA IF NOT EXISTS qr_analytics")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS qr_analytics.qr_codes (
            id UUID PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            target_url TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS qr_analytics.scans (
            id UUID PRIMARY KEY,
            qr_code_id UUID NOT NULL REFERENCES qr_analytics.qr_codes (id) ON DELETE CASCADE,
            scanned_at TIMESTAMPTZ NOT NULL,
            source_key TEXT UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS scans_code_date_idx \
         ON qr_analytics.scans (qr_code_id, scanned_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let codes = vec![
        (
            Uuid::parse_str("7c9e4a1b-52d8-4f6e-9a3c-1b2d8e4f6a9c")?,
            "launch-poster",
            "Launch Poster",
            "https://example.com/launch",
        ),
        (
            Uuid::parse_str("2f8b6c3d-91a4-4e7b-8c5d-3e9f1a7b2c8d")?,
            "menu-table-tent",
            "Menu Table Tent",
            "https://example.com/menu",
        ),
        (
            Uuid::parse_str("9a1d7e5f-36b2-4c8a-b7e9-5f2a8c4d1e7b")?,
            "storefront-decal",
            "Storefront Decal",
            "https://example.com/store",
        ),
    ];

    for (id, code, title, target_url) in codes {
        sqlx::query(
            r#"
            INSERT INTO qr_analytics.qr_codes (id, code, title, target_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (code) DO UPDATE
            SET title = EXCLUDED.title, target_url = EXCLUDED.target_url
            "#,
        )
        .bind(id)
        .bind(code)
        .bind(title)
        .bind(target_url)
        .execute(pool)
        .await?;
    }

    // Seed scans land relative to now so the 7- and 30-day windows stay
    // populated whenever the seed runs.
    let scans: Vec<(&str, &str, i64)> = vec![
        ("seed-001", "launch-poster", 0),
        ("seed-002", "launch-poster", 1),
        ("seed-003", "launch-poster", 1),
        ("seed-004", "launch-poster", 3),
        ("seed-005", "launch-poster", 9),
        ("seed-006", "menu-table-tent", 0),
        ("seed-007", "menu-table-tent", 5),
        ("seed-008", "menu-table-tent", 12),
        ("seed-009", "storefront-decal", 2),
        ("seed-010", "storefront-decal", 20),
    ];

    for (source_key, code, days_ago) in scans {
        let qr_id: Uuid = sqlx::query("SELECT id FROM qr_analytics.qr_codes WHERE code = $1")
            .bind(code)
            .fetch_one(pool)
            .await?
            .get("id");

        sqlx::query(
            r#"
            INSERT INTO qr_analytics.scans (id, qr_code_id, scanned_at, source_key)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(qr_id)
        .bind(Utc::now() - Duration::days(days_ago))
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn fetch_qr_codes(pool: &PgPool) -> anyhow::Result<Vec<QrCode>> {
    let rows = sqlx::query(
        "SELECT q.id, q.code, q.title, COUNT(s.id) AS total_scans \
         FROM qr_analytics.qr_codes q \
         LEFT JOIN qr_analytics.scans s ON s.qr_code_id = q.id \
         GROUP BY q.id, q.code, q.title, q.created_at \
         ORDER BY q.created_at",
    )
    .fetch_all(pool)
    .await
    .context("failed to list QR codes")?;

    let mut codes = Vec::with_capacity(rows.len());
    for row in rows {
        codes.push(qr_from_row(&row)?);
    }

    Ok(codes)
}

pub async fn fetch_qr_by_code(pool: &PgPool, code: &str) -> anyhow::Result<QrCode> {
    let row = sqlx::query(
        "SELECT q.id, q.code, q.title, COUNT(s.id) AS total_scans \
         FROM qr_analytics.qr_codes q \
         LEFT JOIN qr_analytics.scans s ON s.qr_code_id = q.id \
         WHERE q.code = $1 \
         GROUP BY q.id, q.code, q.title",
    )
    .bind(code)
    .fetch_optional(pool)
    .await?
    .with_context(|| format!("no QR code named {code}"))?;

    qr_from_row(&row)
}

fn qr_from_row(row: &sqlx::postgres::PgRow) -> anyhow::Result<QrCode> {
    let total_scans: i64 = row.get("total_scans");

    Ok(QrCode {
        id: row.get("id"),
        code: row.get("code"),
        title: row.get("title"),
        total_scans: u64::try_from(total_scans)
            .with_context(|| format!("negative scan total {total_scans}"))?,
    })
}

pub async fn fetch_overview(pool: &PgPool, today: NaiveDate) -> anyhow::Result<OverviewStats> {
    let week_start = today - Duration::days(6);

    let total_qr_codes: i64 = sqlx::query("SELECT COUNT(*) AS n FROM qr_analytics.qr_codes")
        .fetch_one(pool)
        .await?
        .get("n");

    let total_scans: i64 = sqlx::query("SELECT COUNT(*) AS n FROM qr_analytics.scans")
        .fetch_one(pool)
        .await?
        .get("n");

    let scans_today: i64 =
        sqlx::query("SELECT COUNT(*) AS n FROM qr_analytics.scans WHERE scanned_at::date = $1")
            .bind(today)
            .fetch_one(pool)
            .await?
            .get("n");

    let scans_this_week: i64 =
        sqlx::query("SELECT COUNT(*) AS n FROM qr_analytics.scans WHERE scanned_at::date >= $1")
            .bind(week_start)
            .fetch_one(pool)
            .await?
            .get("n");

    Ok(OverviewStats {
        total_qr_codes: u64::try_from(total_qr_codes).context("negative QR code count")?,
        total_scans: u64::try_from(total_scans).context("negative scan count")?,
        scans_today: u64::try_from(scans_today).context("negative scan count")?,
        scans_this_week: u64::try_from(scans_this_week).context("negative scan count")?,
    })
}

pub struct PgScanSource {
    pool: PgPool,
}

impl PgScanSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScanSource for PgScanSource {
    async fn fetch_series(&self, qr_id: Uuid) -> Result<Vec<ScanRecord>, FetchError> {
        let rows = sqlx::query(
            "SELECT scanned_at::date AS date, COUNT(*) AS count \
             FROM qr_analytics.scans \
             WHERE qr_code_id = $1 \
             GROUP BY scanned_at::date \
             ORDER BY date",
        )
        .bind(qr_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| FetchError {
            qr_id,
            message: err.to_string(),
        })?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let count: i64 = row.get("count");
            let count = u64::try_from(count).map_err(|_| FetchError {
                qr_id,
                message: format!("negative daily count {count}"),
            })?;
            records.push(ScanRecord {
                date: row.get("date"),
                count,
            });
        }

        Ok(records)
    }
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        code: String,
        title: String,
        target_url: String,
        scanned_at: DateTime<Utc>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let qr_id: Uuid = sqlx::query(
            r#"
            INSERT INTO qr_analytics.qr_codes (id, code, title, target_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (code) DO UPDATE
            SET title = EXCLUDED.title, target_url = EXCLUDED.target_url
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.code)
        .bind(&row.title)
        .bind(&row.target_url)
        .fetch_one(pool)
        .await?
        .get("id");

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO qr_analytics.scans (id, qr_code_id, scanned_at, source_key)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(qr_id)
        .bind(row.scanned_at)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

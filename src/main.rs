use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

mod aggregate;
mod db;
mod growth;
mod models;
mod report;
mod series;

use aggregate::ScanSource;
use models::ViewMode;

#[derive(Parser)]
#[command(name = "qr-scan-analytics")]
#[command(about = "Scan analytics and growth reporting for tracked QR codes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import scan events from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print the gap-filled scan series for one QR code
    Series {
        #[arg(long)]
        code: String,
        #[arg(long, default_value_t = 30)]
        days: usize,
        #[arg(long, value_enum, default_value_t = ViewMode::Daily)]
        view: ViewMode,
        #[arg(long)]
        json: bool,
    },
    /// Compare the latest window against the one before it
    Growth {
        #[arg(long)]
        code: String,
        #[arg(long, default_value_t = 7)]
        window: usize,
    },
    /// Generate the markdown dashboard report
    Dashboard {
        #[arg(long, default_value_t = 5)]
        top: usize,
        #[arg(long, default_value = "dashboard.md")]
        out: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} scans from {}.", csv.display());
        }
        Commands::Series {
            code,
            days,
            view,
            json,
        } => {
            anyhow::ensure!(days > 0, "--days must be positive");

            let today = Utc::now().date_naive();
            let qr = db::fetch_qr_by_code(&pool, &code).await?;
            let records = db::PgScanSource::new(pool.clone())
                .fetch_series(qr.id)
                .await?;
            let daily = series::bucketize(&records, days, today);
            let shaped = series::apply_view(&daily, view);

            if json {
                println!("{}", serde_json::to_string_pretty(&shaped)?);
            } else {
                println!("{} ({}), last {days} days, {view} view:", qr.title, qr.code);
                for bucket in &shaped {
                    println!("{}  {}", bucket.date, bucket.scans);
                }
            }
        }
        Commands::Growth { code, window } => {
            anyhow::ensure!(window > 0, "--window must be positive");

            let today = Utc::now().date_naive();
            let qr = db::fetch_qr_by_code(&pool, &code).await?;
            let records = db::PgScanSource::new(pool.clone())
                .fetch_series(qr.id)
                .await?;
            let result = growth::compute_growth(&records, window, today);

            println!(
                "{} ({}): {:+}% over the last {window} days ({} scans vs {} prior)",
                qr.title,
                qr.code,
                result.percent,
                result.current_period_total,
                result.prior_period_total
            );
        }
        Commands::Dashboard { top, out, json } => {
            let today = Utc::now().date_naive();
            let codes = db::fetch_qr_codes(&pool).await?;
            let overview = db::fetch_overview(&pool, today).await?;
            let source = db::PgScanSource::new(pool.clone());

            let aggregated = aggregate::aggregate_qr_codes(&codes, &source, today).await;
            let ranked = aggregate::top_n(aggregated, top);

            if json {
                println!("{}", serde_json::to_string_pretty(&ranked)?);
            } else {
                let report = report::build_report(today, &overview, &ranked);
                std::fs::write(&out, report)?;
                println!("Dashboard written to {}.", out.display());
            }
        }
    }

    Ok(())
}

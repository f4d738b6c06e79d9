use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::Config;
use crate::dates::QuickRange;
use crate::models::AttendanceStatus;

mod alerts;
mod commands;
mod config;
mod dates;
mod db;
mod error;
mod models;
mod report;
mod summary;
#[cfg(test)]
mod test_support;

#[derive(Parser)]
#[command(name = "attendance-tracker")]
#[command(about = "School attendance tracker with recurring-absence alerts", long_about = None)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct RangeArgs {
    /// First day of the period (YYYY-MM-DD)
    #[arg(long, value_parser = dates::parse_date, requires = "end")]
    pub start: Option<NaiveDate>,

    /// Last day of the period (YYYY-MM-DD)
    #[arg(long, value_parser = dates::parse_date, requires = "start")]
    pub end: Option<NaiveDate>,

    /// Quick period relative to today: today, week or month
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub range: Option<QuickRange>,

    /// Reference date used instead of the local clock
    #[arg(long, value_parser = dates::parse_date)]
    pub today: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a demo roster with a month of attendance
    Seed {
        #[arg(long, value_parser = dates::parse_date)]
        today: Option<NaiveDate>,
    },
    /// Import attendance from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Manage grades
    #[command(subcommand)]
    Grade(GradeCommand),
    /// Manage students
    #[command(subcommand)]
    Student(StudentCommand),
    /// Record and browse attendance
    #[command(subcommand)]
    Attendance(AttendanceCommand),
    /// Student and grade counts
    Stats,
    /// Present/absent totals for a period
    Summary(RangeArgs),
    /// Students with recurring absences this week and this month
    Alerts {
        #[arg(long, value_parser = dates::parse_date)]
        today: Option<NaiveDate>,
    },
    /// Absences in a period, most recent first
    Absences {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Present/absent counts per grade for a period
    ByGrade(RangeArgs),
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long, default_value = "attendance-report.md")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum GradeCommand {
    /// List active grades
    List,
    Show {
        id: Uuid,
    },
    Add {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 0)]
        order: i32,
        #[arg(long)]
        description: Option<String>,
    },
    Update {
        id: Uuid,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        order: Option<i32>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Deactivate a grade
    Remove {
        id: Uuid,
    },
}

#[derive(Subcommand)]
pub enum StudentCommand {
    /// List active students, optionally for one grade
    List {
        #[arg(long)]
        grade: Option<Uuid>,
    },
    Show {
        id: Uuid,
    },
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        grade: Uuid,
    },
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        grade: Option<Uuid>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Deactivate a student
    Remove {
        id: Uuid,
    },
}

#[derive(Args, Debug, Clone)]
pub struct EntryArgs {
    #[arg(long)]
    pub student: Uuid,
    #[arg(long, value_parser = dates::parse_date)]
    pub date: NaiveDate,
    #[arg(long)]
    pub status: AttendanceStatus,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Subcommand)]
pub enum AttendanceCommand {
    /// Attendance taken on one day
    Day {
        #[arg(value_parser = dates::parse_date)]
        date: NaiveDate,
    },
    /// How many students have been marked on one day, and who is missing
    Progress {
        #[arg(value_parser = dates::parse_date)]
        date: NaiveDate,
        /// Limit the roster to one grade
        #[arg(long)]
        grade: Option<Uuid>,
    },
    /// Attendance history of one student
    Student {
        id: Uuid,
        #[arg(long, value_parser = dates::parse_date, requires = "end")]
        start: Option<NaiveDate>,
        #[arg(long, value_parser = dates::parse_date, requires = "start")]
        end: Option<NaiveDate>,
    },
    /// Record attendance, failing if the day is already recorded
    Record(EntryArgs),
    /// Record attendance, overwriting any existing entry for the day
    Mark(EntryArgs),
    Update {
        id: Uuid,
        #[arg(long)]
        status: Option<AttendanceStatus>,
        #[arg(long, conflicts_with = "clear_notes")]
        notes: Option<String>,
        #[arg(long)]
        clear_notes: bool,
    },
    Delete {
        id: Uuid,
    },
}

fn init_tracing(settings: Option<&Config>, verbose: bool) {
    let directive = if verbose {
        "debug".to_string()
    } else {
        settings
            .map(|settings| settings.log_filter.clone())
            .unwrap_or_else(|| config::DEFAULT_LOG_FILTER.to_string())
    };
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();
    init_tracing(config.as_ref().ok(), cli.verbose);
    let config = config?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;

    let out = commands::Output { json: cli.json };

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed { today } => {
            let today = today.unwrap_or_else(dates::today);
            let written = db::seed(&pool, today).await?;
            println!("Seed data inserted ({written} attendance records).");
        }
        Commands::Import { csv } => {
            let written = db::import_csv(&pool, &csv)
                .await
                .with_context(|| format!("failed to import {}", csv.display()))?;
            println!("Imported {written} attendance rows from {}.", csv.display());
        }
        Commands::Grade(command) => commands::grade(&pool, out, command).await?,
        Commands::Student(command) => commands::student(&pool, out, command).await?,
        Commands::Attendance(command) => commands::attendance(&pool, out, command).await?,
        Commands::Stats => commands::stats(&pool, out).await?,
        Commands::Summary(range) => commands::summary(&pool, out, &range).await?,
        Commands::Alerts { today } => {
            commands::alerts(&pool, out, today.unwrap_or_else(dates::today)).await?
        }
        Commands::Absences { range, limit } => {
            commands::absences(&pool, out, &range, limit).await?
        }
        Commands::ByGrade(range) => commands::by_grade(&pool, out, &range).await?,
        Commands::Report { range, out: path } => {
            let report = commands::report(&pool, &range).await?;
            std::fs::write(&path, report)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Report written to {}.", path.display());
        }
    }

    Ok(())
}

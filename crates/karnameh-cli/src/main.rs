use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use dotenvy::dotenv;
use karnameh_cli::offline::{LessonExport, render_table};
use karnameh_cli::seeder::{self, SeedConfig};
use karnameh_config::GradingConfig;
use karnameh_grading::{JalaliDate, SchoolYear};
use karnameh_models::StudentId;
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "karnameh-cli")]
#[command(about = "Karnameh CLI - seeding and offline report tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the database with generated schools and a school year of lessons
    Seed {
        /// Number of schools to create
        #[arg(short = 's', long, default_value = "2")]
        schools: usize,

        /// Number of classes per school
        #[arg(long, default_value = "4")]
        classes: usize,

        /// Number of students per class
        #[arg(long, default_value = "25")]
        students: usize,

        /// Number of teachers per school
        #[arg(long, default_value = "8")]
        teachers: usize,

        /// Number of courses per school
        #[arg(long, default_value = "6")]
        courses: usize,

        /// Jalali year the seeded school year starts in (default: current)
        #[arg(short = 'y', long)]
        school_year: Option<i32>,

        /// Weeks between two lessons of the same course
        #[arg(long, default_value = "1")]
        interval_weeks: u32,
    },
    /// Delete all schools and everything that belongs to them
    ClearSeed,
    /// Compute report cards from a JSON export of lesson records
    Report {
        /// Path to the export file
        file: PathBuf,

        /// Jalali year the school year starts in (default: current)
        #[arg(short = 'y', long)]
        school_year: Option<i32>,

        /// Only print the report of this student
        #[arg(long)]
        student: Option<StudentId>,

        #[arg(short = 'f', long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Convert a Gregorian date (YYYY-MM-DD, default: today) to the Jalali calendar
    Jalali { date: Option<NaiveDate> },
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();
    let grading = GradingConfig::from_env();

    match cli.command {
        Commands::Seed {
            schools,
            classes,
            students,
            teachers,
            courses,
            school_year,
            interval_weeks,
        } => {
            let mut config = SeedConfig::new(schools, resolve_school_year(school_year, &grading))
                .with_classes(classes, students)
                .with_staff(teachers, courses);
            config.lesson_interval_weeks = interval_weeks;
            handle_seed(config).await
        }
        Commands::ClearSeed => handle_clear_seed().await,
        Commands::Report {
            file,
            school_year,
            student,
            format,
        } => handle_report(
            file,
            resolve_school_year(school_year, &grading),
            student,
            format,
            &grading,
        ),
        Commands::Jalali { date } => handle_jalali(date, &grading),
    }
}

fn today(grading: &GradingConfig) -> NaiveDate {
    Utc::now().with_timezone(&grading.offset()).date_naive()
}

fn resolve_school_year(requested: Option<i32>, grading: &GradingConfig) -> SchoolYear {
    requested
        .or(grading.school_year)
        .map(SchoolYear)
        .unwrap_or_else(|| SchoolYear::containing(JalaliDate::from_gregorian(today(grading))))
}

async fn connect() -> PgPool {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("\n❌ DATABASE_URL must be set");
        std::process::exit(1);
    };

    match sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("\n❌ Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    }
}

async fn handle_seed(config: SeedConfig) {
    let pool = connect().await;

    println!("\n📋 Seed configuration:");
    println!("   Schools: {}", config.num_schools);
    println!(
        "   Classes per school: {} ({} students each)",
        config.classes_per_school, config.students_per_class
    );
    println!("   Teachers per school: {}", config.teachers_per_school);
    println!("   Courses per school: {}", config.courses_per_school);
    println!("   School year: {}", config.school_year);
    println!("   Total students: {}\n", config.total_students());

    if let Err(e) = seeder::seed_all(&pool, config).await {
        eprintln!("\n❌ Error seeding database: {}", e);
        std::process::exit(1);
    }
}

async fn handle_clear_seed() {
    let pool = connect().await;

    match seeder::clear_seed(&pool).await {
        Ok(_) => println!("\n✅ Seeded data cleared"),
        Err(e) => {
            eprintln!("\n❌ Error clearing seeded data: {}", e);
            std::process::exit(1);
        }
    }
}

fn handle_report(
    file: PathBuf,
    school_year: SchoolYear,
    student: Option<StudentId>,
    format: OutputFormat,
    grading: &GradingConfig,
) {
    let raw = match std::fs::read_to_string(&file) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("\n❌ Cannot read {}: {}", file.display(), e);
            std::process::exit(1);
        }
    };

    let export = match LessonExport::from_json(&raw) {
        Ok(export) => export,
        Err(e) => {
            eprintln!("\n❌ Invalid export file: {}", e);
            std::process::exit(1);
        }
    };

    let reports: Vec<_> = export
        .report_cards(school_year, grading.offset())
        .into_iter()
        .filter(|r| student.is_none_or(|id| r.student_id == id))
        .collect();

    if reports.is_empty() {
        eprintln!("\n❌ No lesson records found for the requested student");
        std::process::exit(1);
    }

    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(&reports) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("\n❌ Failed to serialize reports: {}", e);
                std::process::exit(1);
            }
        },
        OutputFormat::Table => {
            for report in &reports {
                println!("{}", render_table(report));
            }
        }
    }
}

fn handle_jalali(date: Option<NaiveDate>, grading: &GradingConfig) {
    let date = date.unwrap_or_else(|| today(grading));
    let jalali = JalaliDate::from_gregorian(date);
    let school_year = SchoolYear::containing(jalali);

    println!("{} → {} ({})", date, jalali, jalali.month_name());
    match school_year.slot(jalali) {
        Some(month) => println!(
            "School year {}, month {} of 12",
            school_year,
            month.position() + 1
        ),
        None => println!("School year {}", school_year),
    }
}

//! Database seeding with generated schools and a school year of lessons.

pub mod directory;
pub mod lessons;
pub mod models;

pub use models::{ClassPlan, SeedConfig};

use sqlx::PgPool;
use std::time::Instant;

pub type SeedResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// `($1, $2), ($3, $4), ...` for `rows` rows of `columns` placeholders.
pub(crate) fn values_clause(rows: usize, columns: usize) -> String {
    (0..rows)
        .map(|row| {
            let placeholders: Vec<String> = (1..=columns)
                .map(|col| format!("${}", row * columns + col))
                .collect();
            format!("({})", placeholders.join(", "))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub async fn seed_all(db: &PgPool, config: SeedConfig) -> SeedResult<()> {
    let start_time = Instant::now();
    println!("🌱 Starting database seeding...\n");

    let plans = directory::seed_directory(db, &config).await?;
    lessons::seed_lessons(db, &plans, config.school_year, config.lesson_interval_weeks).await?;

    println!("\n✅ Seeding completed in {:?}", start_time.elapsed());
    Ok(())
}

/// Deletes every school; the rest of the directory and all lesson records
/// and overrides go with them.
pub async fn clear_seed(db: &PgPool) -> SeedResult<u64> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded data...");

    let deleted = sqlx::query("DELETE FROM schools")
        .execute(db)
        .await?
        .rows_affected();

    println!(
        "   ✓ Deleted {} schools in {:?}",
        deleted,
        start_time.elapsed()
    );

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_clause_numbers_placeholders_row_major() {
        assert_eq!(values_clause(2, 3), "($1, $2, $3), ($4, $5, $6)");
        assert_eq!(values_clause(1, 1), "($1)");
        assert_eq!(values_clause(0, 4), "");
    }
}

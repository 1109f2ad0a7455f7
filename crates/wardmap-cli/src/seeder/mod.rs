//! Database seeding.
//!
//! - [`reference`]: lookups, divisions, departments, secret questions and
//!   the starter accounts; safe to run repeatedly
//! - [`demo`]: generated doctors and catalog items spread across the
//!   seeded departments
//! - [`models`]: generated rows and the demo configuration
//!
//! Generation runs in parallel with Rayon; inserts are batched multi-row
//! statements inside one transaction per table.

pub mod demo;
pub mod models;
pub mod reference;

pub use demo::clear_demo;
pub use models::DemoConfig;
pub use reference::{ReferenceSummary, seed_reference};

use sqlx::PgPool;
use std::time::Instant;

use wardmap_models::ids::DepartmentId;

/// Seeds doctors and items. Reference data must already be present.
pub async fn seed_demo(db: &PgPool, config: DemoConfig) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();

    let departments: Vec<DepartmentId> =
        sqlx::query_scalar("SELECT id FROM departments ORDER BY id")
            .fetch_all(db)
            .await?;
    if departments.is_empty() {
        return Err("No departments found. Run `seed` first.".into());
    }

    demo::seed_doctors(db, config.doctors, &departments).await?;
    demo::seed_items(db, config.items, &departments).await?;

    println!("✅ Demo data seeded in {:?}", start_time.elapsed());
    Ok(())
}

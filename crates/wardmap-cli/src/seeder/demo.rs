//! Demo doctors and catalog items.
//!
//! Doctors are only ever created here, so clearing removes them all. Demo
//! items carry [`DEMO_ITEM_SUFFIX`] so that clearing leaves items entered
//! through the API alone.

use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use rayon::prelude::*;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use std::time::Instant;

use wardmap_models::ids::DepartmentId;

use super::models::{DoctorSeed, ItemSeed};

pub const DEMO_ITEM_SUFFIX: &str = "(demo)";

const SPECIALIZATIONS: &[&str] = &[
    "Anesthesiology",
    "Cardiology",
    "Dermatology",
    "Emergency Medicine",
    "Family Medicine",
    "Internal Medicine",
    "Nephrology",
    "Neurology",
    "Obstetrics and Gynecology",
    "Pediatrics",
    "Pulmonology",
    "Radiology",
    "General Surgery",
];

const SUPPLIES: &[&str] = &[
    "Surgical gloves",
    "Disposable syringe 5ml",
    "IV cannula",
    "Gauze pad",
    "Face mask",
    "Normal saline 500ml",
    "Bandage roll",
    "Urinary catheter",
    "Alcohol swab",
    "Suture kit",
    "Oxygen mask",
    "Specimen container",
];

const BATCH_SIZE: usize = 1000;

fn pick<T: Copy>(values: &[T]) -> T {
    values[(0..values.len()).fake::<usize>()]
}

pub fn generate_doctors(count: usize, departments: &[DepartmentId]) -> Vec<DoctorSeed> {
    (0..count)
        .into_par_iter()
        .map(|_| DoctorSeed {
            first_name: FirstName().fake(),
            middle_name: ((0..3).fake::<u8>() == 0).then(|| FirstName().fake()),
            last_name: LastName().fake(),
            specialization: pick(SPECIALIZATIONS).to_string(),
            department_id: pick(departments),
        })
        .collect()
}

/// Prices fall between 1.00 and 5000.00.
pub fn generate_items(count: usize, departments: &[DepartmentId]) -> Vec<ItemSeed> {
    (0..count)
        .into_par_iter()
        .map(|idx| ItemSeed {
            description: format!("{} #{} {}", pick(SUPPLIES), idx + 1, DEMO_ITEM_SUFFIX),
            price: Decimal::new((100..500_000).fake::<i64>(), 2),
            department_id: ((0..5).fake::<u8>() != 0).then(|| pick(departments)),
        })
        .collect()
}

async fn insert_doctors_chunk(
    tx: &mut Transaction<'_, Postgres>,
    doctors: &[DoctorSeed],
) -> Result<u64, Box<dyn std::error::Error>> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "INSERT INTO doctors (first_name, middle_name, last_name, specialization, department_id) ",
    );
    qb.push_values(doctors, |mut row, doctor| {
        row.push_bind(&doctor.first_name)
            .push_bind(&doctor.middle_name)
            .push_bind(&doctor.last_name)
            .push_bind(&doctor.specialization)
            .push_bind(doctor.department_id);
    });

    Ok(qb.build().execute(&mut **tx).await?.rows_affected())
}

async fn insert_items_chunk(
    tx: &mut Transaction<'_, Postgres>,
    items: &[ItemSeed],
) -> Result<u64, Box<dyn std::error::Error>> {
    let mut qb =
        QueryBuilder::<Postgres>::new("INSERT INTO items (description, price, department_id) ");
    qb.push_values(items, |mut row, item| {
        row.push_bind(&item.description)
            .push_bind(item.price)
            .push_bind(item.department_id);
    });

    Ok(qb.build().execute(&mut **tx).await?.rows_affected())
}

pub async fn seed_doctors(
    db: &PgPool,
    count: usize,
    departments: &[DepartmentId],
) -> Result<u64, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🩺 Seeding {} doctors...", count);

    let doctors = generate_doctors(count, departments);
    let mut tx = db.begin().await?;
    let mut inserted = 0;
    for chunk in doctors.chunks(BATCH_SIZE) {
        inserted += insert_doctors_chunk(&mut tx, chunk).await?;
    }
    tx.commit().await?;

    println!("   ✓ Inserted {} doctors in {:?}", inserted, start_time.elapsed());
    Ok(inserted)
}

pub async fn seed_items(
    db: &PgPool,
    count: usize,
    departments: &[DepartmentId],
) -> Result<u64, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("📦 Seeding {} items...", count);

    let items = generate_items(count, departments);
    let mut tx = db.begin().await?;
    let mut inserted = 0;
    for chunk in items.chunks(BATCH_SIZE) {
        inserted += insert_items_chunk(&mut tx, chunk).await?;
    }
    tx.commit().await?;

    println!("   ✓ Inserted {} items in {:?}", inserted, start_time.elapsed());
    Ok(inserted)
}

/// Returns `(doctors, items)` removed.
pub async fn clear_demo(db: &PgPool) -> Result<(u64, u64), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🗑️  Clearing demo doctors and items...");

    let mut tx = db.begin().await?;
    let doctors = sqlx::query("DELETE FROM doctors")
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let items = sqlx::query("DELETE FROM items WHERE description LIKE '%' || $1")
        .bind(DEMO_ITEM_SUFFIX)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    tx.commit().await?;

    println!(
        "   ✓ Deleted {} doctors and {} items in {:?}",
        doctors,
        items,
        start_time.elapsed()
    );
    Ok((doctors, items))
}

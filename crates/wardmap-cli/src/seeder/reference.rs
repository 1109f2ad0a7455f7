//! Reference data every installation needs: audit lookups, divisions,
//! departments, secret questions and the starter accounts.
//!
//! Every insert skips rows that already exist, so seeding can be repeated.

use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Instant;

use wardmap_models::{LogMethod, LogType};

/// `(code, name)`
pub const DIVISIONS: &[(&str, &str)] = &[
    ("ADM", "Admin Division"),
    ("ANC", "Ancillary Division"),
    ("NSD", "Nursing Services Division"),
];

/// `(code, name, division code)`
pub const DEPARTMENTS: &[(&str, &str, &str)] = &[
    ("HR", "Human Resource", "ADM"),
    ("QM", "Quality Management", "ADM"),
    ("IT", "Information Technology", "ADM"),
    ("MRKT", "Marketing", "ADM"),
    ("ACNT", "Accounting", "ADM"),
    ("ANC", "Ancillary", "ADM"),
    ("NSD", "Nursing Services Department", "NSD"),
    ("SC", "Supply Chain", "ADM"),
    ("SSD", "Support Services", "ADM"),
    ("CED", "Customer Experience", "ADM"),
    ("OR", "Operating Room", "NSD"),
    ("ER", "Emergency Room", "NSD"),
    ("NICU", "Nicu", "NSD"),
    ("DIA", "Dialysis", "NSD"),
    ("ICU", "Icu", "NSD"),
    ("ACU", "Acu", "NSD"),
    ("GNU4F", "4th Floor Ward", "NSD"),
    ("GNU5F", "5th Floor Ward", "NSD"),
    ("IMGN", "Imaging", "ANC"),
    ("CRD", "Cardiology", "ANC"),
    ("PULM", "Pulmonary", "ANC"),
    ("PMR", "Physical, Medicine, and Rehab", "ANC"),
    ("LAB", "Laboratory", "ANC"),
    ("DIET", "Dietary", "ANC"),
];

pub const SECRET_QUESTIONS: &[&str] = &[
    "What was the name of your first pet?",
    "What is your mother's maiden name?",
    "What was the name of your first school?",
    "In what city were you born?",
    "What is the name of your favorite childhood teacher?",
    "What is your favorite movie?",
    "What was your childhood nickname?",
    "What is your favorite book?",
    "What is your favorite food?",
    "What is the name of the street you grew up on?",
    "What was your first car?",
    "Who was your childhood best friend?",
    "What is your favorite vacation destination?",
    "What was the name of your first stuffed animal?",
    "What is the middle name of your oldest sibling?",
    "What was the name of your first boss?",
    "What is your favorite sports team?",
    "What is the name of the first concert you attended?",
    "What is the name of your first crush?",
    "What was your dream job as a child?",
];

/// `(employee id, first name, last name, department code)`
pub const STARTER_USERS: &[(&str, &str, &str, &str)] = &[
    ("00001111", "Niel", "Marketing", "MRKT"),
    ("00001112", "Aldrin", "Gabrido", "SC"),
    ("00001113", "Jonathan", "Quebral", "IT"),
];

pub const STARTER_PASSWORD: &str = "abcd_123";

/// Counts of rows actually inserted by one run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReferenceSummary {
    pub divisions: u64,
    pub departments: u64,
    pub secret_questions: u64,
    pub users: u64,
}

pub async fn seed_log_lookups(db: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let mut types = QueryBuilder::<Postgres>::new("INSERT INTO log_types (id, name) ");
    types.push_values(LogType::ALL, |mut row, log_type| {
        row.push_bind(log_type as i32).push_bind(log_type.as_str());
    });
    types.push(" ON CONFLICT DO NOTHING");
    types.build().execute(db).await?;

    let mut methods = QueryBuilder::<Postgres>::new("INSERT INTO log_methods (id, name) ");
    methods.push_values(LogMethod::ALL, |mut row, method| {
        row.push_bind(method as i32).push_bind(method.as_str());
    });
    methods.push(" ON CONFLICT DO NOTHING");
    methods.build().execute(db).await?;

    Ok(())
}

pub async fn seed_divisions(db: &PgPool) -> Result<u64, Box<dyn std::error::Error>> {
    let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO divisions (code, name) ");
    qb.push_values(DIVISIONS, |mut row, (code, name)| {
        row.push_bind(*code).push_bind(*name);
    });
    qb.push(" ON CONFLICT (code) DO NOTHING");

    Ok(qb.build().execute(db).await?.rows_affected())
}

/// Departments are linked to their division by code.
pub async fn seed_departments(db: &PgPool) -> Result<u64, Box<dyn std::error::Error>> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "INSERT INTO departments (code, name, division_id) SELECT v.code, v.name, d.id FROM (",
    );
    qb.push_values(DEPARTMENTS, |mut row, (code, name, division)| {
        row.push_bind(*code).push_bind(*name).push_bind(*division);
    });
    qb.push(
        ") AS v(code, name, division_code) \
         JOIN divisions d ON d.code = v.division_code \
         ON CONFLICT (code) DO NOTHING",
    );

    Ok(qb.build().execute(db).await?.rows_affected())
}

pub async fn seed_secret_questions(db: &PgPool) -> Result<u64, Box<dyn std::error::Error>> {
    let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO secret_questions (question) ");
    qb.push_values(SECRET_QUESTIONS, |mut row, question| {
        row.push_bind(*question);
    });
    qb.push(" ON CONFLICT (question) DO NOTHING");

    Ok(qb.build().execute(db).await?.rows_affected())
}

pub async fn seed_starter_users(
    db: &PgPool,
    password_hash: &str,
) -> Result<u64, Box<dyn std::error::Error>> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "INSERT INTO users (employee_id, first_name, last_name, password, department_id) \
         SELECT v.employee_id, v.first_name, v.last_name, v.password, d.id FROM (",
    );
    qb.push_values(
        STARTER_USERS,
        |mut row, (employee_id, first_name, last_name, department)| {
            row.push_bind(*employee_id)
                .push_bind(*first_name)
                .push_bind(*last_name)
                .push_bind(password_hash)
                .push_bind(*department);
        },
    );
    qb.push(
        ") AS v(employee_id, first_name, last_name, password, department_code) \
         LEFT JOIN departments d ON d.code = v.department_code \
         ON CONFLICT DO NOTHING",
    );

    Ok(qb.build().execute(db).await?.rows_affected())
}

pub async fn seed_reference(db: &PgPool) -> Result<ReferenceSummary, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🌱 Seeding reference data...");

    seed_log_lookups(db).await?;
    let divisions = seed_divisions(db).await?;
    let departments = seed_departments(db).await?;
    let secret_questions = seed_secret_questions(db).await?;

    let password_hash = wardmap_core::hash_password(STARTER_PASSWORD)
        .map_err(|e| format!("Failed to hash password: {}", e.error))?;
    let users = seed_starter_users(db, &password_hash).await?;

    let summary = ReferenceSummary {
        divisions,
        departments,
        secret_questions,
        users,
    };

    println!(
        "   ✓ {} divisions, {} departments, {} secret questions, {} users in {:?}",
        summary.divisions,
        summary.departments,
        summary.secret_questions,
        summary.users,
        start_time.elapsed()
    );

    Ok(summary)
}

//! # Wardmap CLI
//!
//! Reference-data seeding, demo data and user administration for Wardmap.
//!
//! ## Usage
//!
//! ```ignore
//! use wardmap_cli::seeder::{seed_reference, seed_demo, DemoConfig};
//!
//! seed_reference(&pool).await?;
//! seed_demo(&pool, DemoConfig { doctors: 50, items: 200 }).await?;
//! ```

pub mod seeder;

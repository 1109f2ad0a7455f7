//! # Wardmap API
//!
//! Facility-management backend for a hospital: floors, rooms and their
//! photos, departments, doctors, catalog items and staff users, built on
//! Axum and PostgreSQL.
//!
//! Every mutation follows the same discipline:
//!
//! 1. the bearer token names the acting user ([`middleware::auth::AuthUser`])
//! 2. the actor, the target and any parent are checked ([`utils::guard`])
//! 3. the change and its audit entry commit together ([`utils::audit`],
//!    [`utils::lifecycle`])
//!
//! Floors, rooms and users are soft-deletable; floors and rooms can also be
//! purged. Reads only see active records unless `is_deleted=true` is asked for.
//!
//! ```text
//! src/
//! ├── middleware/    # bearer token extractor
//! ├── modules/       # one folder per resource: controller, service, router, model
//! └── utils/         # guard, audit logger, lifecycle, upload helpers
//! ```
//!
//! API documentation is served at `/swagger-ui` and `/scalar`.

pub mod docs;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod utils;
pub mod validator;

pub use wardmap_auth;
pub use wardmap_config;
pub use wardmap_core;
pub use wardmap_db;
pub use wardmap_models;

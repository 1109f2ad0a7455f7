//! # Wardmap Core
//!
//! Foundational types shared by every Wardmap crate:
//!
//! - [`errors`]: the application error and its HTTP response mapping
//! - [`pagination`]: list parameters and response metadata
//! - [`password`]: bcrypt hashing for passwords and secret answers
//! - [`file_storage`]: upload storage behind a trait
//! - [`serde`]: query-string deserializers

pub mod errors;
pub mod file_storage;
pub mod pagination;
pub mod password;
pub mod serde;

pub use errors::AppError;
pub use pagination::{PaginationMeta, PaginationParams, SortOrder};
pub use password::{hash_password, verify_password};

//! Cross-cutting pieces every mutating service composes:
//!
//! - [`guard`]: existence, lifecycle and uniqueness checks plus database error mapping
//! - [`audit`]: appends rows to the `logs` table
//! - [`lifecycle`]: soft delete, retrieve and purge for floors, rooms and users
//! - [`uploads`]: multipart collection, validation and storage of images

pub mod audit;
pub mod guard;
pub mod lifecycle;
pub mod uploads;

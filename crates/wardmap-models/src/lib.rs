//! # Wardmap Models
//!
//! Rows, DTOs and response envelopes for every Wardmap resource, plus the
//! audit vocabulary and the soft-delete lifecycle rules.

pub mod audit;
pub mod auth;
pub mod common;
pub mod departments;
pub mod doctors;
pub mod floors;
pub mod ids;
pub mod items;
pub mod lifecycle;
pub mod rooms;
pub mod secret_questions;
pub mod users;

pub use audit::{LogMethod, LogType};
pub use common::MessageResponse;
pub use lifecycle::{LifecycleState, Plan, Requirement, Transition};

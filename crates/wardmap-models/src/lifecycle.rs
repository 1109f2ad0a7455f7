//! Soft-delete lifecycle shared by floors, rooms and users.
//!
//! ```text
//!   create ──► Active ──soft delete──► SoftDeleted
//!                ▲                         │
//!                └──────── retrieve ───────┘
//!   Active | SoftDeleted ──purge──► (row removed)
//! ```
//!
//! Planning is pure: given the state read from the database, a
//! [`Transition`] says whether to write, to succeed without writing, or to
//! report the target as missing.

use serde_json::{Value, json};

use crate::audit::LogMethod;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Active,
    SoftDeleted,
}

impl LifecycleState {
    pub fn from_deleted(is_deleted: bool) -> Self {
        if is_deleted {
            LifecycleState::SoftDeleted
        } else {
            LifecycleState::Active
        }
    }

    pub fn is_deleted(self) -> bool {
        self == LifecycleState::SoftDeleted
    }
}

/// Which states an operation accepts its target in. A target in any other
/// state is reported as not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Any,
    Active,
    SoftDeleted,
}

impl Requirement {
    pub fn admits(self, state: LifecycleState) -> bool {
        match self {
            Requirement::Any => true,
            Requirement::Active => state == LifecycleState::Active,
            Requirement::SoftDeleted => state == LifecycleState::SoftDeleted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    SoftDelete,
    Retrieve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// Flip the flag and append the audit entry.
    Apply,
    /// Already in the target state; succeed without writing.
    NoOp,
    NotFound,
}

impl Transition {
    pub fn plan(self, state: LifecycleState) -> Plan {
        match (self, state) {
            (Transition::SoftDelete, LifecycleState::Active) => Plan::Apply,
            (Transition::SoftDelete, LifecycleState::SoftDeleted) => Plan::NoOp,
            (Transition::Retrieve, LifecycleState::SoftDeleted) => Plan::Apply,
            (Transition::Retrieve, LifecycleState::Active) => Plan::NotFound,
        }
    }

    pub fn target(self) -> LifecycleState {
        match self {
            Transition::SoftDelete => LifecycleState::SoftDeleted,
            Transition::Retrieve => LifecycleState::Active,
        }
    }

    pub fn method(self) -> LogMethod {
        match self {
            Transition::SoftDelete => LogMethod::SoftDelete,
            Transition::Retrieve => LogMethod::Retrieve,
        }
    }

    /// Audit payload: the flag as it was before the transition.
    pub fn marker(self) -> Value {
        json!({ "is_deleted": !self.target().is_deleted() })
    }
}

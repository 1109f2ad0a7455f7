//! Rows produced by the generators before they are inserted.

use rust_decimal::Decimal;
use wardmap_models::ids::DepartmentId;

pub struct DoctorSeed {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub specialization: String,
    pub department_id: DepartmentId,
}

pub struct ItemSeed {
    pub description: String,
    pub price: Decimal,
    pub department_id: Option<DepartmentId>,
}

/// How much demo data `seed-demo` generates.
#[derive(Clone, Debug)]
pub struct DemoConfig {
    pub doctors: usize,
    pub items: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            doctors: 25,
            items: 100,
        }
    }
}

pub mod controller;
pub mod router;

pub use router::init_server_status_router;

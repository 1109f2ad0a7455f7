pub mod auth;
pub mod departments;
pub mod doctors;
pub mod floors;
pub mod items;
pub mod rooms;
pub mod secret_questions;
pub mod server_status;
pub mod users;

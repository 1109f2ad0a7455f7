pub use wardmap_models::auth::*;

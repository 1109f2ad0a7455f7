pub use wardmap_models::users::*;

pub use wardmap_models::doctors::*;

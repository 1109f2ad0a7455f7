pub use wardmap_models::floors::*;

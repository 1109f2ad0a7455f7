pub use wardmap_models::items::*;

pub use wardmap_models::rooms::*;

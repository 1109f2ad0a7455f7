pub use wardmap_models::departments::*;

pub use wardmap_models::secret_questions::*;

//! Response envelopes.
//!
//! Mutations answer `{message}`, single reads `{message, data}` and lists
//! `{message, data, meta}`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Rejects text that is empty once surrounding whitespace is trimmed.
/// Services store names trimmed, so `"   "` would otherwise persist as `""`.
pub fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        Err(validator::ValidationError::new("blank"))
    } else {
        Ok(())
    }
}

/// Declares the single-read and list envelopes for a payload type.
macro_rules! envelopes {
    ($item:ty => $single:ident, $list:ident) => {
        #[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
        pub struct $single {
            pub message: String,
            pub data: $item,
        }

        impl $single {
            pub fn new(message: impl Into<String>, data: $item) -> Self {
                Self {
                    message: message.into(),
                    data,
                }
            }
        }

        #[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
        pub struct $list {
            pub message: String,
            pub data: Vec<$item>,
            pub meta: wardmap_core::PaginationMeta,
        }

        impl $list {
            pub fn new(
                message: impl Into<String>,
                data: Vec<$item>,
                meta: wardmap_core::PaginationMeta,
            ) -> Self {
                Self {
                    message: message.into(),
                    data,
                    meta,
                }
            }
        }
    };
}

pub(crate) use envelopes;

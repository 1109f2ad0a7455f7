use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::common::envelopes;
use crate::ids::SecretQuestionId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SecretQuestion {
    pub id: SecretQuestionId,
    pub question: String,
}

envelopes!(SecretQuestion => SecretQuestionResponse, SecretQuestionListResponse);

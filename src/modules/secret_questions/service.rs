use sqlx::PgPool;
use tracing::instrument;

use wardmap_core::{AppError, PaginationMeta, PaginationParams};
use wardmap_models::ids::SecretQuestionId;

use crate::modules::secret_questions::model::SecretQuestion;
use crate::utils::guard::not_found;

const KIND: &str = "Secret question";

pub struct SecretQuestionService;

impl SecretQuestionService {
    #[instrument(skip(db))]
    pub async fn get_secret_questions(
        db: &PgPool,
        pagination: PaginationParams,
    ) -> Result<(Vec<SecretQuestion>, PaginationMeta), AppError> {
        let (total, questions) = tokio::try_join!(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM secret_questions").fetch_one(db),
            sqlx::query_as::<_, SecretQuestion>(
                "SELECT id, question FROM secret_questions ORDER BY id LIMIT $1 OFFSET $2",
            )
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(db)
        )?;

        Ok((questions, pagination.meta(total)))
    }

    #[instrument(skip(db))]
    pub async fn get_secret_question(
        db: &PgPool,
        id: SecretQuestionId,
    ) -> Result<SecretQuestion, AppError> {
        sqlx::query_as::<_, SecretQuestion>(
            "SELECT id, question FROM secret_questions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| not_found(KIND, id))
    }

    pub async fn ensure_exists(db: &PgPool, id: SecretQuestionId) -> Result<(), AppError> {
        Self::get_secret_question(db, id).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "./migrations")]
    async fn test_list_and_get(pool: PgPool) {
        sqlx::query(
            "INSERT INTO secret_questions (question) VALUES ('First pet?'), ('Birth city?')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let (questions, meta) =
            SecretQuestionService::get_secret_questions(&pool, PaginationParams::default())
                .await
                .unwrap();
        assert_eq!(meta.total, 2);
        assert_eq!(questions[1].question, "Birth city?");

        let question = SecretQuestionService::get_secret_question(&pool, questions[0].id)
            .await
            .unwrap();
        assert_eq!(question.question, "First pet?");

        let err = SecretQuestionService::ensure_exists(&pool, SecretQuestionId(999))
            .await
            .unwrap_err();
        assert_eq!(err.error.to_string(), "Secret question with the id 999 not found.");
    }
}

use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use wardmap_core::{AppError, PaginationMeta};
use wardmap_models::ids::{DepartmentId, DoctorId};

use crate::modules::doctors::model::{Doctor, DoctorFilterParams};
use crate::utils::guard::not_found;

const DOCTOR_COLUMNS: &str =
    "id, first_name, middle_name, last_name, specialization, department_id, created_at, updated_at";

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &DoctorFilterParams) {
    qb.push(" WHERE TRUE");

    if let Some(department_id) = filters.department_id {
        qb.push(" AND department_id = ")
            .push_bind(DepartmentId(department_id));
    }

    if let Some(search) = filters
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let pattern = format!("%{}%", search);
        qb.push(" AND (first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR middle_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Doctors are read-only over HTTP; the CLI seeds them.
pub struct DoctorService;

impl DoctorService {
    #[instrument(skip(db))]
    pub async fn get_doctors(
        db: &PgPool,
        filters: DoctorFilterParams,
    ) -> Result<(Vec<Doctor>, PaginationMeta), AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();
        let sort_by = filters.sort_by.unwrap_or_default();
        let sort_order = filters.sort_order.unwrap_or_default();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM doctors");
        push_filters(&mut count, &filters);
        let total: i64 = count.build_query_scalar().fetch_one(db).await?;

        let mut query =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM doctors", DOCTOR_COLUMNS));
        push_filters(&mut query, &filters);
        query
            .push(format!(
                " ORDER BY {} {}, id ASC LIMIT ",
                sort_by.column(),
                sort_order.as_sql()
            ))
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let doctors = query.build_query_as::<Doctor>().fetch_all(db).await?;

        Ok((doctors, filters.pagination.meta(total)))
    }

    #[instrument(skip(db))]
    pub async fn get_doctor(db: &PgPool, id: DoctorId) -> Result<Doctor, AppError> {
        sqlx::query_as::<_, Doctor>(&format!(
            "SELECT {} FROM doctors WHERE id = $1",
            DOCTOR_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| not_found("Doctor", id))
    }
}

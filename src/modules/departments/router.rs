use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_department, delete_department, get_department, get_departments, get_divisions,
    update_department,
};

pub fn init_department_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_department).get(get_departments))
        .route("/divisions", get(get_divisions))
        .route(
            "/{id}",
            get(get_department)
                .patch(update_department)
                .delete(delete_department),
        )
}

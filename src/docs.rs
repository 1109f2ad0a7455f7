use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use wardmap_core::{PaginationMeta, PaginationParams, SortOrder};
use wardmap_models::MessageResponse;

/// Request and response bodies named by the handlers below are collected
/// automatically; only the shared types are listed here.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register_user,
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::refresh_token,
        crate::modules::auth::controller::logout_user,
        crate::modules::auth::controller::forgot_password,
        crate::modules::auth::controller::reset_password,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::get_user_secret,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::change_password,
        crate::modules::users::controller::update_user_secret,
        crate::modules::users::controller::verify_password,
        crate::modules::users::controller::soft_delete_user,
        crate::modules::users::controller::retrieve_user,
        crate::modules::floors::controller::create_floor,
        crate::modules::floors::controller::get_floors,
        crate::modules::floors::controller::get_floor,
        crate::modules::floors::controller::get_floor_rooms,
        crate::modules::floors::controller::get_floor_room,
        crate::modules::floors::controller::update_floor,
        crate::modules::floors::controller::upload_floor_map,
        crate::modules::floors::controller::soft_delete_floor,
        crate::modules::floors::controller::retrieve_floor,
        crate::modules::floors::controller::purge_floor,
        crate::modules::rooms::controller::create_room,
        crate::modules::rooms::controller::get_rooms,
        crate::modules::rooms::controller::get_room,
        crate::modules::rooms::controller::get_room_photos,
        crate::modules::rooms::controller::update_room,
        crate::modules::rooms::controller::add_directions,
        crate::modules::rooms::controller::upload_room_images,
        crate::modules::rooms::controller::delete_room_images,
        crate::modules::rooms::controller::retrieve_room_images,
        crate::modules::rooms::controller::soft_delete_room,
        crate::modules::rooms::controller::retrieve_room,
        crate::modules::rooms::controller::purge_room,
        crate::modules::departments::controller::create_department,
        crate::modules::departments::controller::get_departments,
        crate::modules::departments::controller::get_divisions,
        crate::modules::departments::controller::get_department,
        crate::modules::departments::controller::update_department,
        crate::modules::departments::controller::delete_department,
        crate::modules::items::controller::create_item,
        crate::modules::items::controller::get_items,
        crate::modules::items::controller::get_item,
        crate::modules::items::controller::update_item,
        crate::modules::items::controller::delete_item,
        crate::modules::doctors::controller::get_doctors,
        crate::modules::doctors::controller::get_doctor,
        crate::modules::secret_questions::controller::get_secret_questions,
        crate::modules::secret_questions::controller::get_secret_question,
        crate::modules::server_status::controller::get_server_status,
    ),
    components(
        schemas(
            MessageResponse,
            PaginationMeta,
            PaginationParams,
            SortOrder,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login, token refresh and password recovery"),
        (name = "Users", description = "Staff accounts"),
        (name = "Floors", description = "Floors and their maps"),
        (name = "Rooms", description = "Rooms, directions and photos"),
        (name = "Departments", description = "Departments and divisions"),
        (name = "Items", description = "Catalog items"),
        (name = "Doctors", description = "Doctor directory"),
        (name = "Secret Questions", description = "Password recovery questions"),
        (name = "Server Status", description = "Liveness check")
    ),
    info(
        title = "Wardmap API",
        version = "0.1.0",
        description = "Hospital facility-management API built with Rust, Axum, and PostgreSQL.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

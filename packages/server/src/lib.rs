pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sharepile API",
        version = "1.0.0",
        description = "API for the Sharepile file storage service"
    ),
    tags(
        (name = "Auth", description = "Authentication and user management"),
        (name = "Files", description = "File upload, metadata, and delivery"),
        (name = "Sharing", description = "Public sharing of files"),
        (name = "Public", description = "Unauthenticated access to shared files"),
    ),
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::me,
        handlers::file::upload_file,
        handlers::file::list_files,
        handlers::file::get_file,
        handlers::file::update_file,
        handlers::file::delete_file,
        handlers::file::download_file,
        handlers::file::preview_file,
        handlers::file::enable_sharing,
        handlers::file::disable_sharing,
        handlers::public::public_file_info,
        handlers::public::public_download,
    ),
    components(schemas(
        error::ErrorBody,
        models::auth::RegisterRequest,
        models::auth::RegisterResponse,
        models::auth::LoginRequest,
        models::auth::LoginResponse,
        models::auth::MeResponse,
        models::file::FileResponse,
        models::file::FileListResponse,
        models::file::UpdateFileRequest,
        models::file::ShareResponse,
    )),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    axum::Router::new()
        .nest("/api", routes::api_routes())
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/files", file_routes())
        .nest("/public/files", public_routes())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/me", get(handlers::auth::me))
}

fn file_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::file::list_files).post(handlers::file::upload_file),
        )
        .route(
            "/{id}",
            get(handlers::file::get_file)
                .patch(handlers::file::update_file)
                .delete(handlers::file::delete_file),
        )
        .route("/{id}/download", get(handlers::file::download_file))
        .route("/{id}/preview", get(handlers::file::preview_file))
        .route(
            "/{id}/share",
            post(handlers::file::enable_sharing).delete(handlers::file::disable_sharing),
        )
        .layer(handlers::file::upload_body_limit())
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/{public_id}", get(handlers::public::public_file_info))
        .route(
            "/{public_id}/download",
            get(handlers::public::public_download),
        )
}

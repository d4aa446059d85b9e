//! Unauthenticated access to shared files. Every failure here is a plain
//! `NOT_FOUND`; nothing on this surface reveals whether an id exists.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::Response;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::handlers::file::delivery_response;
use crate::models::file::FileResponse;
use crate::services::delivery::{self, DeliveryMode};
use crate::services::access;
use crate::state::AppState;

/// Parse a public id. Malformed ids collapse into `NotFound` like unknown
/// ones, since a prober learns nothing from the distinction.
fn parse_public_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("File not found".into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/public/files/{public_id}",
    tag = "Public",
    operation_id = "publicFileInfo",
    summary = "Get metadata of a shared file",
    description = "Returns metadata for a publicly shared file. No authentication required. \
        Unknown, unshared, and malformed ids are indistinguishable 404s.",
    params(("public_id" = String, Path, description = "Public file ID (UUID)")),
    responses(
        (status = 200, description = "File metadata", body = FileResponse),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn public_file_info(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    let public_id = parse_public_id(&public_id)?;
    let record = access::resolve_public(&state.db, public_id).await?;
    Ok(Json(FileResponse::from(record)))
}

#[utoipa::path(
    get,
    path = "/api/v1/public/files/{public_id}/download",
    tag = "Public",
    operation_id = "publicDownload",
    summary = "Download a shared file",
    description = "Streams a publicly shared file as an attachment and stamps the \
        last-download time. No authentication required.",
    params(("public_id" = String, Path, description = "Public file ID (UUID)")),
    responses(
        (status = 200, description = "File content"),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Stored content missing (STORAGE_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn public_download(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<Response, AppError> {
    let public_id = parse_public_id(&public_id)?;
    let record = access::resolve_public(&state.db, public_id).await?;
    let delivery =
        delivery::deliver(&state.db, &*state.blob_store, &record, DeliveryMode::Attachment).await?;
    delivery_response(delivery)
}

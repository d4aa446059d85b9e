use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, body::Body};
use storage::BoxReader;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::user_file;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::JsonBody;
use crate::models::file::{
    FileListResponse, FileResponse, ListFilesQuery, ShareResponse, UpdateFileRequest,
    validate_comment, validate_display_name,
};
use crate::services::{access, delivery, registry};
use crate::services::delivery::{Delivery, DeliveryMode};
use crate::state::AppState;

pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(128 * 1024 * 1024) // 128 MB
}

#[utoipa::path(
    post,
    path = "/api/v1/files",
    tag = "Files",
    operation_id = "uploadFile",
    summary = "Upload a file",
    description = "Uploads a file owned by the caller. The `file` multipart field is required \
        and must carry a filename; an optional `comment` field attaches a text comment. \
        The stored size is measured from the bytes received, and a fresh public id is \
        assigned with sharing disabled.",
    request_body(content_type = "multipart/form-data", description = "File upload with optional comment"),
    responses(
        (status = 201, description = "File created", body = FileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn upload_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut file_temp: Option<(std::path::PathBuf, String)> = None;
    let mut comment = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| {
                        AppError::Validation("File field must have a filename".into())
                    })?;
                let temp_path = spool_field_to_temp(field).await?;
                file_temp = Some((temp_path, filename));
            }
            Some("comment") => {
                comment = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read comment: {e}")))?;
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let (temp_path, filename) =
        file_temp.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;

    let result = async {
        let filename = validate_display_name(&filename)?.to_string();
        validate_comment(&comment)?;

        let file = tokio::fs::File::open(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?;
        let reader: BoxReader = Box::new(file);

        registry::create(
            &state.db,
            &*state.blob_store,
            auth_user.user_id,
            &filename,
            reader,
            comment,
        )
        .await
    }
    .await;

    // Best effort.
    let _ = tokio::fs::remove_file(&temp_path).await;

    let record = result?;
    Ok((StatusCode::CREATED, Json(FileResponse::from(record))))
}

#[utoipa::path(
    get,
    path = "/api/v1/files",
    tag = "Files",
    operation_id = "listFiles",
    summary = "List files",
    description = "Lists the caller's own files, newest first. Admins may pass `scope=all` \
        for every file in the system, or `user_id` to list one user's files.",
    params(ListFilesQuery),
    responses(
        (status = 200, description = "File list", body = FileListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_files(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<FileListResponse>, AppError> {
    let records = match (query.scope.as_deref(), query.user_id) {
        (Some("all"), _) => {
            if !auth_user.is_admin {
                return Err(AppError::PermissionDenied);
            }
            registry::list_all(&state.db).await?
        }
        (Some(other), _) => {
            return Err(AppError::Validation(format!("Unknown scope '{other}'")));
        }
        (None, Some(user_id)) => {
            if !auth_user.is_admin && user_id != auth_user.user_id {
                return Err(AppError::PermissionDenied);
            }
            registry::list_by_owner(&state.db, user_id).await?
        }
        (None, None) => registry::list_by_owner(&state.db, auth_user.user_id).await?,
    };

    let total = records.len() as u64;
    let files = records.into_iter().map(FileResponse::from).collect();

    Ok(Json(FileListResponse { files, total }))
}

#[utoipa::path(
    get,
    path = "/api/v1/files/{id}",
    tag = "Files",
    operation_id = "getFile",
    summary = "Get file metadata",
    params(("id" = String, Path, description = "File ID (UUID)")),
    responses(
        (status = 200, description = "File metadata", body = FileResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, file_id = %id))]
pub async fn get_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    let record = find_accessible(&state, &auth_user, &id).await?;
    Ok(Json(FileResponse::from(record)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/files/{id}",
    tag = "Files",
    operation_id = "updateFile",
    summary = "Update file metadata",
    description = "Updates the comment. Renaming via `original_name` is honored only when \
        the server is configured with `storage.allow_rename`.",
    params(("id" = String, Path, description = "File ID (UUID)")),
    request_body = UpdateFileRequest,
    responses(
        (status = 200, description = "Updated metadata", body = FileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, file_id = %id))]
pub async fn update_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateFileRequest>,
) -> Result<Json<FileResponse>, AppError> {
    let mut record = find_accessible(&state, &auth_user, &id).await?;

    if let Some(name) = payload.original_name {
        if !state.config.storage.allow_rename {
            return Err(AppError::Validation("Renaming files is disabled".into()));
        }
        let name = validate_display_name(&name)?.to_string();
        record = registry::rename(&state.db, record.id, name).await?;
    }

    if let Some(comment) = payload.comment {
        validate_comment(&comment)?;
        record = registry::update_comment(&state.db, record.id, comment).await?;
    }

    Ok(Json(FileResponse::from(record)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/files/{id}",
    tag = "Files",
    operation_id = "deleteFile",
    summary = "Delete a file",
    description = "Removes the stored content and the metadata record. An already-missing \
        blob does not block deletion of the record.",
    params(("id" = String, Path, description = "File ID (UUID)")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, file_id = %id))]
pub async fn delete_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = find_accessible(&state, &auth_user, &id).await?;
    registry::delete(&state.db, &*state.blob_store, &record).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/files/{id}/download",
    tag = "Files",
    operation_id = "downloadFile",
    summary = "Download a file",
    description = "Streams the file content as an attachment and stamps the last-download time.",
    params(("id" = String, Path, description = "File ID (UUID)")),
    responses(
        (status = 200, description = "File content"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Stored content missing (STORAGE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, file_id = %id))]
pub async fn download_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let record = find_accessible(&state, &auth_user, &id).await?;
    let delivery =
        delivery::deliver(&state.db, &*state.blob_store, &record, DeliveryMode::Attachment).await?;
    delivery_response(delivery)
}

#[utoipa::path(
    get,
    path = "/api/v1/files/{id}/preview",
    tag = "Files",
    operation_id = "previewFile",
    summary = "Preview a file inline",
    description = "Streams the file content for inline rendering. Content without a \
        recognized extension downloads as an attachment instead. Stamps the \
        last-download time like a download.",
    params(("id" = String, Path, description = "File ID (UUID)")),
    responses(
        (status = 200, description = "File content"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Stored content missing (STORAGE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, file_id = %id))]
pub async fn preview_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let record = find_accessible(&state, &auth_user, &id).await?;
    let delivery =
        delivery::deliver(&state.db, &*state.blob_store, &record, DeliveryMode::Inline).await?;
    delivery_response(delivery)
}

#[utoipa::path(
    post,
    path = "/api/v1/files/{id}/share",
    tag = "Sharing",
    operation_id = "enableSharing",
    summary = "Enable public sharing",
    description = "Marks the file publicly accessible and returns its public URL. Idempotent; \
        the URL is stable across disable/re-enable cycles.",
    params(("id" = String, Path, description = "File ID (UUID)")),
    responses(
        (status = 200, description = "Sharing enabled", body = ShareResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, file_id = %id))]
pub async fn enable_sharing(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ShareResponse>, AppError> {
    let record = find_record(&state, &id).await?;
    let public_url = access::enable_sharing(&state.db, auth_user.identity(), &record).await?;
    Ok(Json(ShareResponse { public_url }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/files/{id}/share",
    tag = "Sharing",
    operation_id = "disableSharing",
    summary = "Disable public sharing",
    description = "Retracts public access. The public id is kept, so re-enabling restores \
        the same URL.",
    params(("id" = String, Path, description = "File ID (UUID)")),
    responses(
        (status = 204, description = "Sharing disabled"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, file_id = %id))]
pub async fn disable_sharing(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = find_record(&state, &id).await?;
    access::disable_sharing(&state.db, auth_user.identity(), &record).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Parse the path id and load the record.
async fn find_record(state: &AppState, id: &str) -> Result<user_file::Model, AppError> {
    let file_id =
        Uuid::parse_str(id).map_err(|_| AppError::Validation("Invalid file ID".into()))?;
    registry::get(&state.db, file_id).await
}

/// Load the record and enforce owner-or-admin access.
async fn find_accessible(
    state: &AppState,
    auth_user: &AuthUser,
    id: &str,
) -> Result<user_file::Model, AppError> {
    let record = find_record(state, id).await?;
    access::ensure_can_access(auth_user.identity(), &record)?;
    Ok(record)
}

/// Build a streaming response from a resolved delivery.
pub fn delivery_response(delivery: Delivery) -> Result<Response, AppError> {
    let Delivery {
        reader,
        content_type,
        disposition,
        size,
    } = delivery;

    let stream = ReaderStream::new(reader);
    let body = Body::from_stream(stream);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, size.to_string())
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

/// Spool a multipart field to a temp file so the blob store sees a plain
/// reader. Size limits are enforced by the store itself.
async fn spool_field_to_temp(
    mut field: axum::extract::multipart::Field<'_>,
) -> Result<std::path::PathBuf, AppError> {
    let temp_path = std::env::temp_dir().join(format!("sharepile-upload-{}", Uuid::new_v4()));

    let result = async {
        let mut temp_file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            temp_file
                .write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
        }

        temp_file
            .flush()
            .await
            .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;

        Ok(())
    }
    .await;

    if let Err(err) = result {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(err);
    }

    Ok(temp_path)
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::user_file;
use crate::error::AppError;

/// File metadata as returned by all file endpoints.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FileResponse {
    pub id: Uuid,
    /// ID of the owning user.
    pub owner_id: i32,
    /// Display name supplied at upload time.
    #[schema(example = "report.pdf")]
    pub original_name: String,
    /// Size in bytes, measured from the uploaded payload.
    #[schema(example = 10240)]
    pub size: i64,
    pub created_at: DateTime<Utc>,
    /// Time of the most recent download or preview, if any.
    pub last_downloaded_at: Option<DateTime<Utc>>,
    pub comment: String,
    /// Token under which the file is reachable while sharing is enabled.
    pub public_id: Uuid,
    pub is_public: bool,
}

impl From<user_file::Model> for FileResponse {
    fn from(record: user_file::Model) -> Self {
        Self {
            id: record.id,
            owner_id: record.owner_id,
            original_name: record.original_name,
            size: record.size,
            created_at: record.created_at,
            last_downloaded_at: record.last_downloaded_at,
            comment: record.comment,
            public_id: record.public_id,
            is_public: record.is_public,
        }
    }
}

/// Response for file listings.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FileListResponse {
    pub files: Vec<FileResponse>,
    pub total: u64,
}

/// Request body for metadata updates.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateFileRequest {
    /// New comment, if changing.
    pub comment: Option<String>,
    /// New display name. Only honored when renaming is enabled.
    pub original_name: Option<String>,
}

/// Response for enabling sharing.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ShareResponse {
    /// Relative URL for unauthenticated access.
    #[schema(example = "/api/v1/public/files/0192a1b2-...")]
    pub public_url: String,
}

/// Query parameters for file listings.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListFilesQuery {
    /// `all` to list every user's files (admins only).
    pub scope: Option<String>,
    /// Restrict the listing to one user's files (admins only).
    pub user_id: Option<i32>,
}

const MAX_NAME_LEN: usize = 255;
const MAX_COMMENT_LEN: usize = 2000;

/// Validate a display name: flat, printable, and header-safe.
pub fn validate_display_name(name: &str) -> Result<&str, AppError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(AppError::Validation("Filename must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Filename must be at most {MAX_NAME_LEN} characters"
        )));
    }
    // Control characters would allow HTTP header injection through
    // Content-Disposition.
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(AppError::Validation(
            "Filename must not contain control characters".into(),
        ));
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(AppError::Validation(
            "Filename must not contain path separators".into(),
        ));
    }
    if trimmed == ".." {
        return Err(AppError::Validation("Invalid filename".into()));
    }

    Ok(trimmed)
}

pub fn validate_comment(comment: &str) -> Result<(), AppError> {
    if comment.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::Validation(format!(
            "Comment must be at most {MAX_COMMENT_LEN} characters"
        )));
    }
    Ok(())
}

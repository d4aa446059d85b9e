//! Authorization decisions: ownership checks, public-sharing issuance and
//! retraction, and public-id resolution.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entity::user_file;
use crate::error::AppError;
use crate::services::registry;

/// Caller identity as resolved by the auth layer.
#[derive(Clone, Copy, Debug)]
pub struct Identity {
    pub user_id: i32,
    pub is_admin: bool,
}

/// Owner-or-admin predicate, applied uniformly to read, update, delete,
/// and delivery of a single record.
pub fn can_access(identity: Identity, owner_id: i32) -> bool {
    identity.is_admin || identity.user_id == owner_id
}

/// Like [`can_access`], but as a guard returning `PermissionDenied`.
pub fn ensure_can_access(identity: Identity, record: &user_file::Model) -> Result<(), AppError> {
    if can_access(identity, record.owner_id) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

/// Relative URL under which a shared file is publicly reachable.
pub fn public_url(public_id: Uuid) -> String {
    format!("/api/v1/public/files/{public_id}")
}

/// Mark a file as publicly shared and return its public URL.
///
/// Idempotent: the URL embeds the record's fixed `public_id`, so repeated
/// calls (and re-enabling after a disable) always yield the same URL.
pub async fn enable_sharing<C: ConnectionTrait>(
    db: &C,
    identity: Identity,
    record: &user_file::Model,
) -> Result<String, AppError> {
    ensure_can_access(identity, record)?;
    let updated = registry::set_visibility(db, record.id, true).await?;
    Ok(public_url(updated.public_id))
}

/// Retract public sharing. The `public_id` is deliberately not rotated, so
/// re-enabling restores the previous URL.
pub async fn disable_sharing<C: ConnectionTrait>(
    db: &C,
    identity: Identity,
    record: &user_file::Model,
) -> Result<(), AppError> {
    ensure_can_access(identity, record)?;
    registry::set_visibility(db, record.id, false).await?;
    Ok(())
}

/// Resolve a public id to its record.
///
/// Succeeds only for records that exist AND are currently shared; both
/// failure cases collapse into the same `NotFound` so an outside prober
/// cannot distinguish "never existed" from "exists but unshared".
pub async fn resolve_public<C: ConnectionTrait>(
    db: &C,
    public_id: Uuid,
) -> Result<user_file::Model, AppError> {
    user_file::Entity::find()
        .filter(user_file::Column::PublicId.eq(public_id))
        .filter(user_file::Column::IsPublic.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))
}

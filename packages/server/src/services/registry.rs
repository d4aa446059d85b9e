//! File-metadata lifecycle: creation tied to a successful blob write,
//! comment/rename/visibility updates, download stamping, and deletion
//! with blob cleanup.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use storage::{BlobStore, BoxReader, StorageKey};
use uuid::Uuid;

use crate::entity::user_file;
use crate::error::AppError;

/// Create a file record from an uploaded byte stream.
///
/// The stream is written to the blob store first; `size` is taken from the
/// bytes actually written, never from a caller-supplied length. If the
/// metadata insert fails after a successful blob write, the blob is removed
/// again so no record ever exists without its blob and vice versa.
pub async fn create<C: ConnectionTrait>(
    db: &C,
    store: &dyn BlobStore,
    owner_id: i32,
    original_name: &str,
    reader: BoxReader,
    comment: String,
) -> Result<user_file::Model, AppError> {
    let (key, size) = store.put_stream(reader).await?;

    if size == 0 {
        let _ = store.delete(&key).await;
        return Err(AppError::Validation("Uploaded file must not be empty".into()));
    }

    let model = user_file::ActiveModel {
        id: Set(Uuid::now_v7()),
        owner_id: Set(owner_id),
        original_name: Set(original_name.to_string()),
        storage_key: Set(key.as_str().to_string()),
        size: Set(i64::try_from(size).unwrap_or(i64::MAX)),
        created_at: Set(Utc::now()),
        last_downloaded_at: Set(None),
        comment: Set(comment),
        public_id: Set(Uuid::new_v4()),
        is_public: Set(false),
    };

    match model.insert(db).await {
        Ok(record) => Ok(record),
        Err(err) => {
            // Best-effort compensating delete so the blob doesn't orphan.
            if let Err(cleanup) = store.delete(&key).await {
                tracing::warn!("Failed to remove blob {key} after insert error: {cleanup}");
            }
            Err(err.into())
        }
    }
}

pub async fn get<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<user_file::Model, AppError> {
    user_file::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))
}

/// All files of one owner, newest first.
pub async fn list_by_owner<C: ConnectionTrait>(
    db: &C,
    owner_id: i32,
) -> Result<Vec<user_file::Model>, AppError> {
    Ok(user_file::Entity::find()
        .filter(user_file::Column::OwnerId.eq(owner_id))
        .order_by_desc(user_file::Column::CreatedAt)
        .all(db)
        .await?)
}

/// Every file in the system, newest first. Admin-scope query; the caller
/// is responsible for authorization.
pub async fn list_all<C: ConnectionTrait>(db: &C) -> Result<Vec<user_file::Model>, AppError> {
    Ok(user_file::Entity::find()
        .order_by_desc(user_file::Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn update_comment<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    comment: String,
) -> Result<user_file::Model, AppError> {
    let mut active: user_file::ActiveModel = get(db, id).await?.into();
    active.comment = Set(comment);
    Ok(active.update(db).await?)
}

/// Change the display name. The storage key is untouched; the content type
/// of future deliveries follows the new name.
pub async fn rename<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    original_name: String,
) -> Result<user_file::Model, AppError> {
    let mut active: user_file::ActiveModel = get(db, id).await?.into();
    active.original_name = Set(original_name);
    Ok(active.update(db).await?)
}

pub async fn set_visibility<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    is_public: bool,
) -> Result<user_file::Model, AppError> {
    let mut active: user_file::ActiveModel = get(db, id).await?.into();
    active.is_public = Set(is_public);
    Ok(active.update(db).await?)
}

/// Stamp `last_downloaded_at` with the current time. Concurrent stamps are
/// last-write-wins; the value never moves backwards from a reader's
/// perspective beyond sub-second races.
pub async fn record_download<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), AppError> {
    let mut active: user_file::ActiveModel = get(db, id).await?.into();
    active.last_downloaded_at = Set(Some(Utc::now()));
    active.update(db).await?;
    Ok(())
}

/// Delete a file: blob first, then metadata.
///
/// A blob that is already gone is not fatal; the record is removed anyway.
/// Any other blob error keeps the record so the delete can be retried.
pub async fn delete<C: ConnectionTrait>(
    db: &C,
    store: &dyn BlobStore,
    record: &user_file::Model,
) -> Result<(), AppError> {
    let key = StorageKey::parse(&record.storage_key)?;

    match store.delete(&key).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!(file_id = %record.id, storage_key = %key, "Blob already absent during delete");
        }
        Err(err) => return Err(err.into()),
    }

    user_file::Entity::delete_by_id(record.id).exec(db).await?;
    Ok(())
}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_file")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Uploading user. Immutable after creation.
    pub owner_id: i32,

    #[sea_orm(belongs_to, from = "owner_id", to = "id")]
    pub owner: Option<super::user::Entity>,

    /// User-supplied display name.
    pub original_name: String,

    /// Opaque blob store location. Never derived from the display name.
    pub storage_key: String,

    /// Byte count actually persisted at `storage_key` at creation time.
    pub size: i64,

    pub created_at: DateTimeUtc,

    /// Stamped on every successful delivery, download or preview.
    pub last_downloaded_at: Option<DateTimeUtc>,

    pub comment: String,

    /// Unguessable token for unauthenticated access. Assigned at creation,
    /// never rotated.
    #[sea_orm(unique)]
    pub public_id: Uuid,

    /// Gates whether `public_id` lookups succeed.
    pub is_public: bool,
}

impl ActiveModelBehavior for ActiveModel {}

//! Resolves a file record to a byte stream plus the headers describing it,
//! and accounts the access.

use sea_orm::ConnectionTrait;
use storage::{BlobStore, BoxReader, StorageError, StorageKey};

use crate::entity::user_file;
use crate::error::AppError;
use crate::services::registry;

/// Requested rendering mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Force a download.
    Attachment,
    /// Render in the browser where the content type allows it.
    Inline,
}

/// A resolved delivery: the blob stream and the headers describing it.
pub struct Delivery {
    pub reader: BoxReader,
    pub content_type: &'static str,
    pub disposition: String,
    pub size: i64,
}

/// Content type from the display name's extension, case-insensitive,
/// against a fixed table. A presentation hint only; never used for
/// security decisions.
pub fn content_type_for(name: &str) -> &'static str {
    let ext = match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => return "application/octet-stream",
    };
    match ext.as_str() {
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Build a safe `Content-Disposition` header value.
///
/// Unrecognized content always downloads as an attachment regardless of
/// the requested mode.
pub fn disposition_value(mode: DeliveryMode, content_type: &str, filename: &str) -> String {
    let kind = if content_type == "application/octet-stream" {
        "attachment"
    } else {
        match mode {
            DeliveryMode::Attachment => "attachment",
            DeliveryMode::Inline => "inline",
        }
    };

    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => String::from(b as char),
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("{kind}; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}

/// Open the record's blob for streaming and stamp the download.
///
/// A missing blob under an existing record is a consistency violation and
/// surfaces as a storage fault, never as `NotFound`. The stamp happens
/// exactly once per successful open, before streaming begins; a client
/// disconnect mid-stream does not roll it back. A delete racing this call
/// fails it instead of yielding a stream over a removed blob.
pub async fn deliver<C: ConnectionTrait>(
    db: &C,
    store: &dyn BlobStore,
    record: &user_file::Model,
    mode: DeliveryMode,
) -> Result<Delivery, AppError> {
    let key = StorageKey::parse(&record.storage_key)?;

    let reader = match store.open_read(&key).await {
        Ok(reader) => reader,
        Err(StorageError::NotFound(_)) => {
            tracing::error!(
                file_id = %record.id,
                storage_key = %record.storage_key,
                "Metadata record exists but blob is missing"
            );
            return Err(AppError::Storage(format!(
                "blob missing for file {}",
                record.id
            )));
        }
        Err(err) => return Err(err.into()),
    };

    registry::record_download(db, record.id).await?;

    let content_type = content_type_for(&record.original_name);
    Ok(Delivery {
        reader,
        content_type,
        disposition: disposition_value(mode, content_type, &record.original_name),
        size: record.size,
    })
}

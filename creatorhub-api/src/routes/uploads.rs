/// File uploads
///
/// ```text
/// POST /api/uploads/:bucket
/// Content-Type: multipart/form-data; boundary=...
///
/// file=<binary>
/// ```
///
/// Buckets: `avatars`, `workflows` (users) and `content` (admins, for news
/// and event images). Files are validated against the bucket's MIME
/// allow-list and the configured size limit, then written to the object
/// store under `<bucket>/<user_id>/<uuid>.<ext>`.

use axum::extract::{Multipart, State};
use creatorhub_shared::auth::{authorization::require_admin, middleware::AuthContext};
use creatorhub_shared::storage::{store_upload, Bucket, StoredObject};

use crate::app::AppState;
use crate::error::{ApiError, ApiPath, ApiResult, Created};

/// Multipart field carrying the file
const FILE_FIELD: &str = "file";

pub async fn upload(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(bucket): ApiPath<String>,
    mut multipart: Multipart,
) -> ApiResult<Created<StoredObject>> {
    let bucket: Bucket = bucket.parse()?;

    if bucket.requires_admin() {
        require_admin(&state.db, auth.user_id).await?;
    }

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .map(str::to_string)
            .ok_or_else(|| ApiError::invalid_field(FILE_FIELD, "File content type is required"))?;

        let data = field.bytes().await?;

        let stored = store_upload(
            state.store.as_ref(),
            bucket,
            auth.user_id,
            &content_type,
            data,
            state.config.storage.max_upload_bytes,
        )
        .await?;

        return Ok(Created(stored));
    }

    Err(ApiError::invalid_field(FILE_FIELD, "Multipart field 'file' is required"))
}

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Path, State},
};
use axum_extra::extract::WithRejection;
use chrono::SecondsFormat;
use tracing::{debug, error, info, warn};

use guestbook_types::api::{SuccessResponse, UploadResponse, UploadedFile};
use guestbook_types::models::StoredFile;

use crate::error::ApiError;
use crate::{AppState, run_blocking};

/// Multipart field that carries uploaded files.
pub const UPLOAD_FIELD: &str = "files";

/// POST /api/upload — multipart body with one or more `files` parts.
///
/// Every file in the batch shares one upload timestamp. Returns the original
/// name and access path of each stored file.
pub async fn upload_files(
    State(state): State<AppState>,
    WithRejection(mut multipart, _): WithRejection<Multipart, ApiError>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut incoming: Vec<(String, Bytes)> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }
        let Some(name) = field.file_name().map(str::to_string) else {
            debug!("Skipping '{}' part without a file name", UPLOAD_FIELD);
            continue;
        };
        let content = field.bytes().await?;
        incoming.push((name, content));
    }

    if incoming.is_empty() {
        return Err(ApiError::validation("No files uploaded"));
    }

    let upload_time = chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let mut files = Vec::with_capacity(incoming.len());

    for (name, content) in incoming {
        let access_path = state.storage.store(&content, &name).await.map_err(|e| {
            error!("Failed to store {}: {:#}", name, e);
            ApiError::Store("Upload failed")
        })?;

        let (record_name, record_path, record_time) =
            (name.clone(), access_path.clone(), upload_time.clone());
        let inserted = run_blocking(&state, "Upload failed", move |db| {
            db.insert_file(&record_name, &record_path, &record_time)
        })
        .await;

        match inserted {
            Ok(id) => info!("Uploaded {} as {} (file {})", name, access_path, id),
            Err(e) => {
                // Without a record nothing can reach the blob again
                if let Err(cleanup) = state.storage.delete(&access_path).await {
                    warn!("Failed to remove orphaned blob {}: {:#}", access_path, cleanup);
                }
                return Err(e);
            }
        }

        files.push(UploadedFile {
            name,
            data: access_path,
        });
    }

    Ok(Json(UploadResponse {
        success: true,
        files,
    }))
}

/// GET /api/files — newest first.
pub async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<StoredFile>>, ApiError> {
    let rows = run_blocking(&state, "Failed to load files", |db| db.list_files()).await?;

    Ok(Json(
        rows.into_iter()
            .map(|row| StoredFile {
                id: row.id,
                name: row.name,
                path: row.path,
                comment: row.comment,
                upload_time: row.upload_time,
            })
            .collect(),
    ))
}

/// DELETE /api/files/{id} — removes the blob (if still present) and then the
/// record. Unknown ids succeed.
pub async fn delete_file(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let path = run_blocking(&state, "Failed to delete file", move |db| db.get_file_path(id)).await?;

    if let Some(path) = path {
        // The record goes regardless of what happened to the blob
        if let Err(e) = state.storage.delete(&path).await {
            warn!("Failed to delete blob {} for file {}: {:#}", path, id, e);
        }
    }

    run_blocking(&state, "Failed to delete file", move |db| db.delete_file(id)).await?;
    debug!("Deleted file {}", id);
    Ok(Json(SuccessResponse::ok()))
}

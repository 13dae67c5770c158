use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::extract::WithRejection;
use tracing::debug;

use guestbook_types::api::{PostMessageRequest, SuccessResponse};
use guestbook_types::models::Message;

use crate::error::ApiError;
use crate::{AppState, run_blocking};

/// Server-local wall clock, e.g. `2026/10/18 09:05:31`.
fn local_timestamp() -> String {
    chrono::Local::now().format("%Y/%-m/%-d %H:%M:%S").to_string()
}

/// GET /api/messages — newest first; pinned messages are flagged, not reordered.
pub async fn list_messages(State(state): State<AppState>) -> Result<Json<Vec<Message>>, ApiError> {
    let rows = run_blocking(&state, "Failed to load messages", |db| db.list_messages()).await?;

    let messages = rows
        .into_iter()
        .map(|row| Message {
            id: row.id,
            author: row.author,
            content: row.content,
            timestamp: row.timestamp,
            is_pinned: row.is_pinned,
        })
        .collect();

    Ok(Json(messages))
}

pub async fn post_message(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<PostMessageRequest>, ApiError>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if req.author.is_empty() || req.content.is_empty() {
        return Err(ApiError::validation("Author and content are required"));
    }

    let timestamp = local_timestamp();
    let id = run_blocking(&state, "Failed to post message", move |db| {
        db.insert_message(&req.author, &req.content, &timestamp)
    })
    .await?;

    debug!("Posted message {}", id);
    Ok(Json(SuccessResponse::ok()))
}

/// DELETE /api/messages/{id} — no ownership check, succeeds for unknown ids.
pub async fn delete_message(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<SuccessResponse>, ApiError> {
    run_blocking(&state, "Failed to delete message", move |db| db.delete_message(id)).await?;
    debug!("Deleted message {}", id);
    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/messages/{id}/pin — flips the pin flag.
pub async fn toggle_pin(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<SuccessResponse>, ApiError> {
    run_blocking(&state, "Failed to update message", move |db| db.toggle_message_pin(id)).await?;
    Ok(Json(SuccessResponse::ok()))
}

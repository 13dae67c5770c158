use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::services::ServeDir;

use crate::storage::UPLOADS_PREFIX;
use crate::{AppState, admin, files, messages, users};

/// All API routes plus read-only serving of uploaded blobs under `/uploads`.
pub fn router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.storage.dir());

    Router::new()
        .route("/api/register", post(users::register))
        .route("/api/login", post(users::login))
        .route("/api/messages", get(messages::list_messages).post(messages::post_message))
        .route("/api/messages/{id}", delete(messages::delete_message))
        .route("/api/messages/{id}/pin", post(messages::toggle_pin))
        .route("/api/upload", post(files::upload_files))
        .route("/api/files", get(files::list_files))
        .route("/api/files/{id}", delete(files::delete_file))
        .route("/api/users", get(admin::list_users))
        .route("/api/users/action", post(admin::user_action))
        .route("/health", get(health))
        .nest_service(UPLOADS_PREFIX, uploads)
        .with_state(state)
}

pub async fn health() -> &'static str {
    "ok"
}

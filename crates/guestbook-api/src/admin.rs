use axum::{Json, extract::State};
use axum_extra::extract::WithRejection;
use tracing::{info, warn};

use guestbook_types::api::{SuccessResponse, UserAction, UserActionRequest};
use guestbook_types::models::UserSummary;

use crate::error::ApiError;
use crate::{AppState, run_blocking};

/// GET /api/users — every non-admin account with its ban flag.
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let rows = run_blocking(&state, "Failed to load users", |db| db.list_non_admin_users()).await?;

    Ok(Json(
        rows.into_iter()
            .map(|row| UserSummary {
                username: row.username,
                is_banned: row.is_banned,
            })
            .collect(),
    ))
}

/// POST /api/users/action — ban, unban or delete a user.
///
/// Ban and delete each issue two separate statements (account, then messages)
/// with no transaction around them. Unknown usernames and actions succeed
/// without touching anything.
pub async fn user_action(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<UserActionRequest>, ApiError>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let UserActionRequest { username, action } = req;

    match action {
        UserAction::Ban => {
            let name = username.clone();
            run_blocking(&state, "Action failed", move |db| db.set_user_banned(&name, true)).await?;
            let removed = remove_messages_by(&state, &username).await?;
            info!("Banned {} and removed {} messages", username, removed);
        }
        UserAction::Unban => {
            let name = username.clone();
            run_blocking(&state, "Action failed", move |db| db.set_user_banned(&name, false))
                .await?;
            info!("Unbanned {}", username);
        }
        UserAction::Delete => {
            let name = username.clone();
            run_blocking(&state, "Action failed", move |db| db.delete_user(&name)).await?;
            let removed = remove_messages_by(&state, &username).await?;
            info!("Deleted user {} and {} messages", username, removed);
        }
        UserAction::Unknown => {
            warn!("Ignoring unknown user action for {}", username);
        }
    }

    Ok(Json(SuccessResponse::ok()))
}

async fn remove_messages_by(state: &AppState, author: &str) -> Result<usize, ApiError> {
    let author = author.to_string();
    run_blocking(state, "Action failed", move |db| db.delete_messages_by_author(&author)).await
}

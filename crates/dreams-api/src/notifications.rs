use axum::{Extension, Json, extract::State};

use dreams_types::api::NotificationsResponse;

use crate::auth::AppState;
use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::store::with_db;

/// The caller's 20 most recent notifications, newest first.
pub async fn notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<NotificationsResponse>> {
    let notifications = with_db(&state, move |db| db.notifications(user.user_id)).await?;
    Ok(Json(NotificationsResponse { notifications }))
}

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use dreams_types::models::{SessionId, UserId};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::store::with_db;

/// The caller of a protected route, inserted as a request extension.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: UserId,
    pub session_id: SessionId,
}

/// Extract the bearer token, decode it and check that its session is still
/// open.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let claims = state.sessions.decode(token).ok_or(ApiError::Unauthorized)?;

    let (user_id, session_id) = (claims.sub, claims.sid);
    match with_db(&state, move |db| db.validate_session(user_id, session_id)).await {
        Ok(()) => {}
        Err(ApiError::Forbidden(_)) => {
            warn!("Rejected closed session for user {}", user_id);
            return Err(ApiError::Unauthorized);
        }
        Err(e) => return Err(e),
    }

    req.extensions_mut().insert(AuthUser {
        user_id,
        session_id,
    });
    Ok(next.run(req).await)
}

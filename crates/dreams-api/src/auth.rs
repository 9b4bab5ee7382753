use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;

use dreams_db::Database;
use dreams_types::api::{AuthResponse, LoginRequest, LogoutResponse, RegisterRequest};

use crate::error::ApiResult;
use crate::extract::JsonBody;
use crate::middleware::AuthUser;
use crate::session::SessionService;
use crate::store::with_db;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub sessions: SessionService,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: &str) -> AppState {
        Arc::new(Self {
            db,
            sessions: SessionService::new(jwt_secret),
        })
    }
}

pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    // Hashing and the session write share one trip to the blocking pool
    let (user_id, session_id) = with_db(&state, move |db| {
        let user_id = db.register(&req.email, &req.password, &req.name_first, &req.name_last)?;
        let session_id = db.open_session(user_id)?;
        Ok((user_id, session_id))
    })
    .await?;

    let token = state.sessions.issue(user_id, session_id)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            auth_user_id: user_id,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (user_id, session_id) =
        with_db(&state, move |db| db.login(&req.email, &req.password)).await?;

    let token = state.sessions.issue(user_id, session_id)?;
    Ok(Json(AuthResponse {
        auth_user_id: user_id,
        token,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<LogoutResponse>> {
    with_db(&state, move |db| db.close_session(user.user_id, user.session_id)).await?;
    Ok(Json(LogoutResponse { is_success: true }))
}

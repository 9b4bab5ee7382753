pub mod auth;
pub mod channels;
pub mod dms;
pub mod error;
pub mod extract;
pub mod messages;
pub mod middleware;
pub mod notifications;
pub mod reactions;
pub mod session;
pub mod store;
pub mod users;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

pub use auth::{AppState, AppStateInner};
pub use error::{ApiError, ApiResult};

async fn health() -> &'static str {
    "ok"
}

/// Every route of the API. Everything except registration, login and the
/// health check sits behind `require_auth`.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        // Users
        .route("/users", get(users::list_users))
        .route("/users/{u_id}", get(users::get_user))
        .route("/users/me/name", put(users::set_name))
        .route("/users/me/email", put(users::set_email))
        .route("/users/me/handle", put(users::set_handle))
        // Channels
        .route(
            "/channels",
            get(channels::list_channels).post(channels::create_channel),
        )
        .route("/channels/all", get(channels::list_all_channels))
        .route("/channels/{channel_id}", get(channels::channel_details))
        .route("/channels/{channel_id}/invite", post(channels::invite))
        .route("/channels/{channel_id}/join", post(channels::join))
        .route("/channels/{channel_id}/leave", post(channels::leave))
        .route("/channels/{channel_id}/owners", post(channels::add_owner))
        .route(
            "/channels/{channel_id}/owners/{u_id}",
            delete(channels::remove_owner),
        )
        .route(
            "/channels/{channel_id}/messages",
            get(messages::channel_messages).post(messages::send_channel_message),
        )
        // DMs
        .route("/dms", get(dms::list_dms).post(dms::create_dm))
        .route("/dms/{dm_id}", get(dms::dm_details).delete(dms::remove_dm))
        .route("/dms/{dm_id}/invite", post(dms::invite))
        .route("/dms/{dm_id}/leave", post(dms::leave))
        .route(
            "/dms/{dm_id}/messages",
            get(messages::dm_messages).post(messages::send_dm_message),
        )
        // Messages
        .route(
            "/messages/{message_id}",
            put(messages::edit_message).delete(messages::remove_message),
        )
        .route("/messages/{message_id}/pin", post(messages::pin_message))
        .route("/messages/{message_id}/unpin", post(messages::unpin_message))
        .route("/messages/{message_id}/react", post(reactions::react))
        .route("/messages/{message_id}/unreact", post(reactions::unreact))
        .route("/messages/{message_id}/share", post(messages::share_message))
        .route("/search", get(messages::search))
        .route("/notifications", get(notifications::notifications))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

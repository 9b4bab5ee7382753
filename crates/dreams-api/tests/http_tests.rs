use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use dreams_api::{AppStateInner, router};
use dreams_db::Database;

fn app() -> Router {
    router(AppStateInner::new(Database::in_memory(), "http-test-secret"))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn register(app: &Router, email: &str, first: &str, last: &str) -> (u64, String) {
    let (status, body) = call(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": "abcdef",
            "name_first": first,
            "name_last": last,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (
        body["auth_user_id"].as_u64().unwrap(),
        body["token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn health_is_public() {
    let app = app();
    let (status, _) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_need_a_live_token() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/channels", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "invalid_token");

    let (status, _) = call(&app, Method::GET, "/channels", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, token) = register(&app, "a@x.com", "Cari", "Coleman").await;
    let (status, body) = call(&app, Method::POST, "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_success"], true);

    let (status, _) = call(&app, Method::GET, "/channels", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_login_and_profile() {
    let app = app();
    let (id, _) = register(&app, "a@x.com", "Cari", "Coleman").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "abcdef" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["auth_user_id"].as_u64(), Some(id));
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = call(&app, Method::GET, &format!("/users/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["handle_str"], "caricoleman");
    assert!(body["user"].get("password").is_none());

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "wrong!" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn channel_flow_over_http() {
    let app = app();
    let (_, owner) = register(&app, "a@x.com", "Steve", "Irwin").await;
    let (b_id, member) = register(&app, "b@x.com", "Jonah", "Lomu").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/channels",
        Some(&owner),
        Some(json!({ "name": "General", "is_public": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let channel_id = body["channel_id"].as_u64().unwrap();

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/channels/{}/join", channel_id),
        Some(&member),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/channels/{}/messages", channel_id),
        Some(&owner),
        Some(json!({ "message": "hi @jonahlomu" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let message_id = body["message_id"].as_u64().unwrap();

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/channels/{}/messages?start=0", channel_id),
        Some(&member),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["end"], -1);
    assert_eq!(body["messages"][0]["message_id"].as_u64(), Some(message_id));
    assert_eq!(body["messages"][0]["message"], "hi @jonahlomu");

    let (status, body) = call(&app, Method::GET, "/notifications", Some(&member), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["notifications"][0]["notification_message"],
        "steveirwin tagged you in General: hi @jonahlomu"
    );
    assert_eq!(body["notifications"][0]["container"], json!({ "channel": channel_id }));

    // The member may not edit the owner's message
    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/messages/{}", message_id),
        Some(&member),
        Some(json!({ "message": "changed" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "access_denied");

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/messages/{}/react", message_id),
        Some(&member),
        Some(json!({ "react_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/channels/{}/owners/{}", channel_id, b_id),
        Some(&owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dm_share_and_search() {
    let app = app();
    let (_, a) = register(&app, "a@x.com", "Steve", "Irwin").await;
    let (b_id, b) = register(&app, "b@x.com", "Jonah", "Lomu").await;

    let (status, body) = call(&app, Method::POST, "/dms", Some(&a), Some(json!({ "u_ids": [b_id] }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["dm_name"], "jonahlomu, steveirwin");
    let dm_id = body["dm_id"].as_u64().unwrap();

    let (_, body) = call(
        &app,
        Method::POST,
        &format!("/dms/{}/messages", dm_id),
        Some(&a),
        Some(json!({ "message": "original" })),
    )
    .await;
    let message_id = body["message_id"].as_u64().unwrap();

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/messages/{}/share", message_id),
        Some(&b),
        Some(json!({ "message": "seen", "target": { "dm": dm_id } })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["shared_message_id"].as_u64().unwrap() > message_id);

    let (status, body) = call(&app, Method::GET, "/search?query_str=orig", Some(&b), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messages"][0]["message"], "original | seen");
    assert_eq!(body["messages"][1]["message"], "original");

    let (status, _) = call(&app, Method::DELETE, &format!("/dms/{}", dm_id), Some(&b), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = call(&app, Method::DELETE, &format!("/dms/{}", dm_id), Some(&a), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, Method::GET, &format!("/dms/{}", dm_id), Some(&a), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn malformed_requests_are_validation_errors() {
    let app = app();

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "email": "a@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
    assert!(body["message"].is_string());

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "email": "a@x.com",
            "password": "abcdef",
            "name_first": "Cari",
            "name_last": "Coleman",
            "x": 1,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let (_, token) = register(&app, "a@x.com", "Cari", "Coleman").await;
    let (status, body) = call(&app, Method::GET, "/channels/abc", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let (status, body) = call(
        &app,
        Method::GET,
        "/channels/0/messages?start=-1",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
}

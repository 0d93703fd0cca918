use super::*;
use axum::{body, body::Body, http::Request};
use serde_json::json;
use tower::ServiceExt;

async fn test_app(api_prefix: &str) -> (Router, Storage) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let api = ApiContext {
        storage: storage.clone(),
    };
    let app = build_router(Arc::new(AppState { api }), api_prefix);
    (app, storage)
}

fn json_request(method: &str, uri: &str, value: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(value.to_string()))
        .expect("request")
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let (app, _storage) = test_app("/api").await;
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn create_then_list_round_trip_under_prefix() {
    let (app, _storage) = test_app("/api").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/actions",
            json!({ "description": "Biked to work", "date": "2024-05-01", "points": 15 }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Action = read_json(response).await;
    assert_eq!(created.description, "Biked to work");

    let response = app
        .oneshot(
            Request::get("/api/actions")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let listed: Vec<Action> = read_json(response).await;
    assert_eq!(listed, vec![created]);
}

#[tokio::test]
async fn routes_answer_with_and_without_trailing_slash() {
    let (app, storage) = test_app("").await;
    let created = storage
        .create_action(&ActionPayload {
            description: "Took the bus".into(),
            date: chrono::NaiveDate::from_ymd_opt(2024, 5, 3).expect("date"),
            points: 8.0,
        })
        .await
        .expect("seed");

    for uri in ["/actions", "/actions/"] {
        let response = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
    }

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/actions/{}/", created.id),
            json!({ "description": "Took the train", "date": "2024-05-03", "points": 9.5 }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Action = read_json(response).await;
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.points, 9.5);

    let response = app
        .oneshot(
            Request::delete(format!("/actions/{}", created.id))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(storage.list_actions().await.expect("list").is_empty());
}

#[tokio::test]
async fn missing_action_returns_not_found_error_body() {
    let (app, _storage) = test_app("/api").await;
    let response = app
        .oneshot(
            Request::delete("/api/actions/77")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let err: ApiError = read_json(response).await;
    assert_eq!(err.code, ErrorCode::NotFound);
    assert_eq!(err.message, "action 77 not found");
}

#[tokio::test]
async fn malformed_body_returns_validation_error_body() {
    let (app, _storage) = test_app("/api").await;
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/actions",
            json!({ "description": "No date", "points": 3 }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err: ApiError = read_json(response).await;
    assert_eq!(err.code, ErrorCode::Validation);
    assert!(!err.message.is_empty());
}

#[tokio::test]
async fn blank_description_is_rejected_with_message() {
    let (app, _storage) = test_app("/api").await;
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/actions",
            json!({ "description": " ", "date": "2024-05-01", "points": 3 }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err: ApiError = read_json(response).await;
    assert_eq!(err.message, "description must not be empty");
}

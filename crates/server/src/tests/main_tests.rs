use super::*;
use axum::{body, body::Body, http::Request};
use tower::ServiceExt;

use crate::config::Settings;

fn test_app(seed_users: usize) -> Router {
    let settings = Settings {
        seed_users,
        ..Settings::default()
    };
    build_router(Arc::new(AppState::from_settings(&settings)))
}

fn form_post(uri: &str, form: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .expect("request")
}

async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = test_app(0).oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn search_route_pages_and_echoes_configuration() {
    let app = test_app(15);
    let response = app
        .oneshot(form_post("/users/search", "page=1&size=10&search=&sort=id%2Casc"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let result: SearchResult<UserRecord> = json_body(response).await;
    let SearchResult::Success { users, pagination } = result else {
        panic!("expected success");
    };
    assert_eq!(pagination.total_items, 15);
    assert_eq!(pagination.current_page, Some(1));
    assert_eq!(pagination.items_per_page, Some(10));
    assert_eq!(users.len(), 5);
    assert_eq!(users[0].id.0, 11);
}

#[tokio::test]
async fn unknown_sort_field_yields_failure_body_with_422() {
    let response = test_app(3)
        .oneshot(form_post("/users/search", "page=0&size=10&sort=salary%2Cdesc"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let result: SearchResult<UserRecord> = json_body(response).await;
    assert_eq!(result, SearchResult::failure("invalid sort field: salary"));
}

#[tokio::test]
async fn delete_route_removes_user_then_reports_not_found() {
    let app = test_app(3);

    let response = app
        .clone()
        .oneshot(form_post("/users/delete", "id=2"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let result: ActionResult = json_body(response).await;
    assert_eq!(result, ActionResult::Success);

    let response = app
        .clone()
        .oneshot(form_post("/users/delete", "id=2"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let result: ActionResult = json_body(response).await;
    assert!(matches!(result, ActionResult::Failure { error: Some(_) }));

    let response = app
        .oneshot(form_post("/users/search", "page=0&size=10&sort=id%2Casc"))
        .await
        .expect("response");
    let result: SearchResult<UserRecord> = json_body(response).await;
    let SearchResult::Success { pagination, .. } = result else {
        panic!("expected success");
    };
    assert_eq!(pagination.total_items, 2);
}

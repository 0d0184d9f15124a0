use axum::{body::Body, http::Request, http::StatusCode};
use tower::ServiceExt;

#[tokio::test]
async fn livez_healthy_and_matching_requires_auth() {
    let state = bc_api::test_state("test-key");
    let app = bc_api::create_router(state);

    let livez_response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/livez")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(livez_response.status(), StatusCode::OK);

    let unauthorized = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/matching/run")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"algorithm":"WEIGHTED","scope":"ALL_STUDENTS"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn results_routes_require_auth() {
    let state = bc_api::test_state("test-key");
    let app = bc_api::create_router(state);

    let unauthorized = app
        .oneshot(
            Request::builder()
                .uri("/api/results/students/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_run_requests_are_rejected_before_touching_the_engine() {
    let state = bc_api::test_state("test-key");
    let app = bc_api::create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/matching/run")
                .header("x-api-key", "test-key")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"algorithm":"SIMULATED_ANNEALING"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    // Unknown algorithm names fail enum deserialization.
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

//! End-to-end requests through the router.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use fakeacc::web::{AppState, INVALID_URL, create_router};
use fakeacc::{Config, TrainOutcome};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn test_state() -> (TempDir, Arc<AppState>) {
    let dir = tempfile::tempdir().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let config = Config {
        model_path: dir.path().join("model.msgpack"),
        train_data: fixtures.join("trainData.json"),
        test_data: fixtures.join("testData.json"),
        ..Config::default()
    };
    (dir, Arc::new(AppState::new(config)))
}

fn post(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, String) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

const VALID: &str = "url=https%3A%2F%2Finstagram.com%2Ftest_user1&followers=100&following=50\
&bio_length=20&media_count=10&profile_pic=1&is_private=0";

#[tokio::test]
async fn get_renders_empty_form() {
    let (_dir, state) = test_state();
    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(create_router(state.clone()), req).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Fake Account Detector"));
    assert!(!body.contains("Prediction:"));
    assert!(!state.config.model_path.exists());
}

#[tokio::test]
async fn post_returns_a_label() {
    let (_dir, state) = test_state();
    let (status, body) = send(create_router(state.clone()), post(VALID)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(
        body.contains("Prediction: Fake Account") || body.contains("Prediction: Real Account"),
        "unexpected body: {body}"
    );
    assert!(state.config.model_path.exists());
}

#[tokio::test]
async fn unknown_domain_renders_invalid_url() {
    let (_dir, state) = test_state();
    let body = "url=https%3A%2F%2Fexample.com%2Fnobody&followers=100&following=50\
&bio_length=20&media_count=10&profile_pic=1&is_private=0";
    let (status, body) = send(create_router(state), post(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(INVALID_URL));
    assert!(!body.contains("Account</div>"));
}

#[tokio::test]
async fn non_numeric_field_is_bad_request() {
    let (_dir, state) = test_state();
    let body = VALID.replace("followers=100", "followers=many");
    let (status, body) = send(create_router(state), post(&body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("followers"));
}

#[tokio::test]
async fn missing_field_is_rejected() {
    let (_dir, state) = test_state();
    let body = VALID.replace("&is_private=0", "");
    let (status, _) = send(create_router(state), post(&body)).await;

    assert!(status.is_client_error());
}

#[tokio::test]
async fn missing_dataset_is_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        model_path: dir.path().join("model.msgpack"),
        train_data: dir.path().join("absent.json"),
        test_data: dir.path().join("absent.json"),
        ..Config::default()
    };
    let app = create_router(Arc::new(AppState::new(config)));
    let (status, _) = send(app, post(VALID)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn concurrent_first_requests_share_one_training_run() {
    let (_dir, state) = test_state();
    let (a, b) = tokio::join!(state.ensure_model(), state.ensure_model());

    assert!(matches!(a.unwrap(), TrainOutcome::Trained { .. }));
    assert!(matches!(b.unwrap(), TrainOutcome::Trained { .. }));
    assert_eq!(state.init_runs(), 1);
}

#[tokio::test]
async fn concurrent_posts_train_once() {
    let (_dir, state) = test_state();
    let app = create_router(state.clone());
    let (r1, r2, r3) = tokio::join!(
        send(app.clone(), post(VALID)),
        send(app.clone(), post(VALID)),
        send(app, post(VALID)),
    );

    for (status, _) in [r1, r2, r3] {
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(state.init_runs(), 1);
}

#[tokio::test]
async fn later_requests_do_not_rewrite_the_artifact() {
    let (_dir, state) = test_state();
    let (status, _) = send(create_router(state.clone()), post(VALID)).await;
    assert_eq!(status, StatusCode::OK);
    let written = std::fs::metadata(&state.config.model_path)
        .unwrap()
        .modified()
        .unwrap();

    let (status, _) = send(create_router(state.clone()), post(VALID)).await;
    assert_eq!(status, StatusCode::OK);
    let after = std::fs::metadata(&state.config.model_path)
        .unwrap()
        .modified()
        .unwrap();
    assert_eq!(written, after);
    assert_eq!(state.init_runs(), 1);
}

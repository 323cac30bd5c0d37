use super::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use shared::protocol::TokenQuery;
use tokio::net::TcpListener;

#[derive(Clone)]
struct TokenServerState {
    secret_configured: bool,
    issued_for: Option<&'static str>,
    hits: Arc<AtomicUsize>,
}

async fn token_handler(
    State(state): State<TokenServerState>,
    Query(q): Query<TokenQuery>,
) -> Result<Json<TokenResponse>, (StatusCode, Json<ApiError>)> {
    let n = state.hits.fetch_add(1, Ordering::SeqCst) + 1;
    if !state.secret_configured {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new("API_SECRET is not set")),
        ));
    }
    let user_id = state
        .issued_for
        .map(str::to_string)
        .or(q.user_id)
        .unwrap_or_else(|| "demo-user".to_string());
    Ok(Json(TokenResponse {
        token: format!("token-{n}"),
        user_id,
    }))
}

async fn spawn_token_server(state: TokenServerState) -> String {
    let app = Router::new()
        .route("/api/token", get(token_handler))
        .with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}/api/token")
}

#[tokio::test]
async fn each_call_fetches_a_fresh_token() {
    let hits = Arc::new(AtomicUsize::new(0));
    let endpoint = spawn_token_server(TokenServerState {
        secret_configured: true,
        issued_for: None,
        hits: hits.clone(),
    })
    .await;
    let provider =
        HttpCredentialProvider::new(&endpoint, UserId::new("demo-user")).expect("provider");

    assert_eq!(provider.provide().await.expect("first"), "token-1");
    assert_eq!(provider.provide().await.expect("second"), "token-2");
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn server_error_surfaces_status_text() {
    let endpoint = spawn_token_server(TokenServerState {
        secret_configured: false,
        issued_for: None,
        hits: Arc::new(AtomicUsize::new(0)),
    })
    .await;
    let provider =
        HttpCredentialProvider::new(&endpoint, UserId::new("demo-user")).expect("provider");

    let err = provider.provide().await.expect_err("should fail");
    assert_eq!(
        err,
        FetchError::Status {
            status_text: "Internal Server Error".into()
        }
    );
}

#[tokio::test]
async fn token_for_another_subject_is_rejected() {
    let endpoint = spawn_token_server(TokenServerState {
        secret_configured: true,
        issued_for: Some("mallory"),
        hits: Arc::new(AtomicUsize::new(0)),
    })
    .await;
    let provider =
        HttpCredentialProvider::new(&endpoint, UserId::new("demo-user")).expect("provider");

    let err = provider.provide().await.expect_err("mismatch");
    assert!(matches!(err, FetchError::MalformedResponse(_)));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let provider = HttpCredentialProvider::new(
        &format!("http://{addr}/api/token"),
        UserId::new("demo-user"),
    )
    .expect("provider");
    let err = provider.provide().await.expect_err("unreachable");
    assert!(matches!(err, FetchError::Transport(_)));
}

#[test]
fn request_url_carries_user_id_query() {
    let provider = HttpCredentialProvider::new(
        "http://127.0.0.1:3000/api/token",
        UserId::new("demo user"),
    )
    .expect("provider");
    assert_eq!(
        provider.request_url().as_str(),
        "http://127.0.0.1:3000/api/token?user_id=demo+user"
    );
}

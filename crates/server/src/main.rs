use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use shared::{
    cue::parse_cue_payload,
    error::ApiError,
    protocol::{TokenQuery, TokenResponse, CUES_ROUTE, CUES_WS_ROUTE, TOKEN_ROUTE},
};
use tokio::sync::broadcast;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, error, info, warn};

mod app_state;
mod config;
mod credentials;

use app_state::AppState;
use config::load_settings;
use credentials::{CredentialIssuer, IssueError, IssuerConfig};

const MAX_CUE_BODY_BYTES: usize = 16 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let issuer = CredentialIssuer::new(IssuerConfig::from(&settings));
    if !issuer.is_configured() {
        warn!("API_SECRET is not set; token requests will fail until it is configured");
    }
    if settings.api_key.is_empty() {
        warn!("API_KEY is not set; issued tokens will carry an empty issuer");
    }
    let (cues, _) = broadcast::channel(256);

    let state = AppState { issuer, cues };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, default_user_id = %settings.default_user_id, "credential server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(TOKEN_ROUTE, get(issue_token))
        .route(CUES_ROUTE, post(relay_cue))
        .route(CUES_WS_ROUTE, get(cue_ws_handler))
        .layer(RequestBodyLimitLayer::new(MAX_CUE_BODY_BYTES))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn issue_token(
    State(state): State<Arc<AppState>>,
    Query(q): Query<TokenQuery>,
) -> Result<Json<TokenResponse>, (StatusCode, Json<ApiError>)> {
    let credential = state.issuer.issue(q.user_id.as_deref()).map_err(|err| {
        match &err {
            IssueError::Config => error!("refusing token request: API_SECRET is not set"),
            IssueError::Auth(source) => error!(%source, "failed to sign credential"),
        }
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(err.public_message())),
        )
    })?;

    debug!(
        user_id = %credential.subject,
        expires_at = %credential.expires_at,
        "issued credential"
    );
    Ok(Json(TokenResponse {
        token: credential.token,
        user_id: credential.subject.0,
    }))
}

async fn relay_cue(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let cue = parse_cue_payload(&body).map_err(|err| {
        warn!(%err, "rejected cue from producer");
        (StatusCode::BAD_REQUEST, Json(ApiError::new(err.to_string())))
    })?;

    let listeners = state.cues.send(cue).unwrap_or(0);
    debug!(listeners, "relayed cue");
    Ok(StatusCode::ACCEPTED)
}

async fn cue_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| cue_ws_connection(state, socket))
}

async fn cue_ws_connection(state: Arc<AppState>, socket: axum::extract::ws::WebSocket) {
    use axum::extract::ws::Message;
    use futures::{SinkExt, StreamExt};

    let (mut sender, mut receiver) = socket.split();
    let mut cues_rx = state.cues.subscribe();

    let send_task = tokio::spawn(async move {
        loop {
            let cue = match cues_rx.recv().await {
                Ok(cue) => cue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "cue subscriber lagged; dropping oldest cues");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            let text = match serde_json::to_string(&cue) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(_msg)) = receiver.next().await {}

    send_task.abort();
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pagegrab_core::{ChangeEndpoint, Config, EndpointReply, EndpointRoute, OpencodeClient};

#[derive(Clone)]
struct AppState {
    endpoint: Arc<ChangeEndpoint>,
}

pub fn router(endpoint: Arc<ChangeEndpoint>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/opencode/{route}", post(change_request))
        .with_state(AppState { endpoint })
}

pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let listen: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("invalid listen address {:?}", config.listen))?;

    let assistant = Arc::new(OpencodeClient::new(&config.assistant_url));
    let endpoint = Arc::new(ChangeEndpoint::from_config(config, assistant));

    if endpoint.mode().is_development() {
        let routes: Vec<String> = EndpointRoute::all().iter().map(EndpointRoute::path).collect();
        tracing::info!(
            assistant = %config.assistant_url,
            project_dir = config.project_dir.as_deref().unwrap_or("-"),
            routes = %routes.join(", "),
            "change endpoints enabled"
        );
    } else {
        tracing::warn!("not in development mode; change endpoints will answer 404");
    }

    let app = router(endpoint);
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .context("bind server listener failed")?;
    tracing::info!("pagegrab-server listening on http://{}", listen);
    axum::serve(listener, app)
        .await
        .context("server terminated with error")
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status":"ok"}))
}

async fn change_request(
    State(state): State<AppState>,
    Path(route): Path<String>,
    body: Bytes,
) -> Response {
    let Some(route) = EndpointRoute::from_str(&route) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    reply_response(state.endpoint.handle(route, &body).await)
}

fn reply_response(reply: EndpointReply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match reply.body {
        Some(body) => (status, Json(body)).into_response(),
        None => status.into_response(),
    }
}

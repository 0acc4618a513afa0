use crate::{
    config::Config,
    errors::into_response,
    mcp::{
        dispatch::dispatch,
        registry::ToolRegistry,
        types::{Health, ServiceInfo, ToolInfo, ToolListing},
    },
    security,
};
use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use std::{convert::Infallible, sync::Arc, time::Instant};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::info;

pub const SERVICE_NAME: &str = "Relevance AI MCP Server";

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub registry: Arc<ToolRegistry>,
}

pub async fn serve(cfg: Config, registry: ToolRegistry) -> anyhow::Result<()> {
    let shared = AppState { cfg: Arc::new(cfg), registry: Arc::new(registry) };
    let app = build_router(shared.clone())?;

    let bind = (shared.cfg.server.bind_addr.as_str(), shared.cfg.server.port);
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {}:{}", bind.0, bind.1))?;

    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("{SERVICE_NAME} shutting down");
    Ok(())
}

pub fn build_router(shared: AppState) -> anyhow::Result<Router> {
    let limit_bytes = shared.cfg.limits.max_request_kb * 1024;
    let cors = security::cors_layer(&shared.cfg)?;
    Ok(Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/tools", get(list_tools))
        .route(
            "/mcp",
            post(mcp)
                .layer::<_, Infallible>(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(limit_bytes)),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(shared))
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        message: "Relevance AI MCP Server is running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: SERVICE_NAME,
        description: "API server for Relevance AI integration via MCP",
        endpoints: [
            ("/mcp", "MCP-compatible endpoint for tool calls"),
            ("/health", "Health check endpoint"),
            ("/tools", "List available tools"),
        ]
        .into_iter()
        .collect(),
        tools: state.registry.list_names(),
        documentation: "See README.md for usage details",
    })
}

async fn list_tools(State(state): State<AppState>) -> Json<ToolListing> {
    let tool_info = state
        .registry
        .iter()
        .map(|t| (t.name().to_string(), ToolInfo { description: Some(t.description().to_string()) }))
        .collect();
    Json(ToolListing { tools: state.registry.list_names(), tool_info })
}

/// Tool-call endpoint. Outcomes are always answered with 200 and an envelope;
/// only a failed bearer check (when one is configured) is answered otherwise.
async fn mcp(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let started = Instant::now();
    let request_id = uuid::Uuid::new_v4().to_string();
    let origin = headers
        .get("Origin")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let token_present = security::extract_bearer(&headers).is_some();

    if let Some(expected) = state.cfg.auth.bearer_token.as_deref() {
        if let Err(e) = security::require_bearer(&headers, expected) {
            audit_end(&request_id, &origin, token_present, "", "deny", e.code(), elapsed_ms(started), 0);
            return into_response(e).into_response();
        }
    }

    let outcome = dispatch(&state.registry, &body).await;
    let tool = outcome.tool.clone().unwrap_or_default();
    let (decision, code) = match &outcome.result {
        Ok(_) => ("allow", "OK"),
        Err(e) => ("error", e.code()),
    };
    if let Err(e) = &outcome.result {
        tracing::warn!(
            request_id = %request_id,
            tool = %tool,
            upstream_status = ?e.upstream_status(),
            error = %e,
            "tool call failed"
        );
    }

    let body = match serde_json::to_vec(&outcome.into_envelope()) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "failed to encode envelope");
            audit_end(&request_id, &origin, token_present, &tool, "error", "Internal", elapsed_ms(started), 0);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    audit_end(&request_id, &origin, token_present, &tool, decision, code, elapsed_ms(started), body.len() as u64);
    (StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[allow(clippy::too_many_arguments)]
fn audit_end(
    request_id: &str,
    origin: &str,
    token_present: bool,
    tool: &str,
    decision: &str,
    code: &str,
    duration_ms: u64,
    bytes_out: u64,
) {
    tracing::info!(
        request_id = request_id,
        origin = origin,
        token_present = token_present,
        tool = tool,
        decision = decision,
        code = code,
        duration_ms = duration_ms,
        bytes_out = bytes_out,
        "audit"
    );
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

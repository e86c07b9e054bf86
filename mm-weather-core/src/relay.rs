//! The `/weather` slash command endpoint.

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::any,
};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
    service::TowerToHyperService,
};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::{
    auth::CommandToken,
    config::Settings,
    format::{FieldPolicy, extract_snapshot, render_message},
    model::ChatResponse,
    provider::{WeatherApiProvider, WeatherProvider},
};

/// Asks the provider to infer the location from the caller's address.
pub const DEFAULT_LOCATION: &str = "auto:ip";

/// Shared, read-only state handed to every request.
#[derive(Debug, Clone)]
pub struct AppState {
    provider: Arc<dyn WeatherProvider>,
    field_policy: FieldPolicy,
    command_token: Option<CommandToken>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        field_policy: FieldPolicy,
        command_token: Option<CommandToken>,
    ) -> Self {
        Self {
            provider,
            field_policy,
            command_token,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let provider = WeatherApiProvider::new(settings.api_key.clone());
        let command_token = settings
            .command_token
            .as_deref()
            .map(CommandToken::new)
            .transpose()
            .context("Invalid command token")?;
        Ok(Self::new(
            Arc::new(provider),
            settings.field_policy,
            command_token,
        ))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/weather", any(handle_weather))
        .with_state(state)
}

/// Bind on all interfaces.
pub async fn bind(port: &str) -> Result<TcpListener> {
    let addr = format!("0.0.0.0:{port}");
    debug!("Listen address: {addr}");
    TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))
}

/// Serve until the process is killed or the listener fails.
///
/// Each connection runs on its own task. A connection that fails after the
/// handler has answered, e.g. while the response is written, is logged there.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let app = router(state);
    loop {
        let (socket, peer) = listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        let app = app.clone();
        tokio::spawn(async move {
            if let Err(err) = serve_connection(socket, app).await {
                error!("Error posting response to {peer}: {err}");
            }
        });
    }
}

async fn serve_connection(
    socket: TcpStream,
    app: Router,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    auto::Builder::new(TokioExecutor::new())
        .serve_connection(TokioIo::new(socket), TowerToHyperService::new(app))
        .await
}

fn first_param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn internal_error(message: String) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
}

/// Any method, `?text=<location>`.
pub async fn handle_weather(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    info!("Received inbound request");

    if let Some(expected) = &state.command_token {
        if !first_param(&params, "token").is_some_and(|token| expected.matches(token)) {
            warn!("Rejected request with missing or invalid command token");
            return (StatusCode::UNAUTHORIZED, "invalid command token").into_response();
        }
    }

    let text = first_param(&params, "text").unwrap_or_default();
    debug!("Text: {text}");
    let location = if text.is_empty() { DEFAULT_LOCATION } else { text };

    let doc = match state.provider.fetch_weather(location).await {
        Ok(doc) => doc,
        Err(err) => return internal_error(err.to_string()),
    };

    let snapshot = match extract_snapshot(&doc, state.field_policy) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            error!("{err}");
            return internal_error(err.to_string());
        }
    };

    let payload = ChatResponse::in_channel(render_message(&snapshot));

    match serde_json::to_vec(&payload) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(err) => {
            error!("Failed to encode response: {err}");
            internal_error(err.to_string())
        }
    }
}

//! HTTP transport for ClinicChat.
//!
//! Routes:
//! - `POST /api/chat` (patients only) runs one assistant exchange
//! - `GET /health` reports liveness and the active provider
//!
//! Layers applied to every route: request body limit, CORS for the
//! chat widget's origins, and HTTP trace logging. There is no rate
//! limiting or queueing in front of the provider.

pub mod auth;
pub mod chat;

use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Method, header},
    middleware,
    response::Json,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use clinicchat_assistant::MedicalAssistant;
use clinicchat_config::{AppConfig, GatewayConfig};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::auth::{Authorizer, StaticTokenAuthorizer};

/// Shared state for all handlers.
pub struct GatewayState {
    pub assistant: Arc<MedicalAssistant>,
    pub authorizer: Arc<dyn Authorizer>,
    pub expose_error_detail: bool,
    pub started_at: DateTime<Utc>,
}

impl GatewayState {
    pub fn new(
        assistant: Arc<MedicalAssistant>,
        authorizer: Arc<dyn Authorizer>,
        expose_error_detail: bool,
    ) -> Self {
        Self {
            assistant,
            authorizer,
            expose_error_detail,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<GatewayState>;

/// JSON body for every non-success response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: None,
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Build the router with all routes and layers.
pub fn build_router(state: SharedState, gateway: &GatewayConfig) -> Router {
    let chat = Router::new()
        .route("/api/chat", post(chat::chat_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_patient,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .merge(chat)
        .with_state(state)
        .layer(DefaultBodyLimit::max(gateway.body_limit_bytes))
        .layer(cors_layer(&gateway.allowed_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the HTTP server and run until the process is stopped.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let provider = clinicchat_providers::build_from_config(&config)?;
    if !config.has_api_key() {
        warn!(provider = %config.provider, "No API key configured; provider calls will likely fail");
    }

    let assistant = Arc::new(MedicalAssistant::from_config(provider, &config));
    let authorizer = Arc::new(StaticTokenAuthorizer::from_config(&config.auth));
    let state = Arc::new(GatewayState::new(
        assistant,
        authorizer,
        config.gateway.expose_error_detail,
    ));

    let app = build_router(state, &config.gateway);

    info!(
        addr = %addr,
        provider = %config.provider,
        model = %config.assistant.model,
        require_auth = config.auth.require_auth,
        "ClinicChat gateway listening"
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    provider: String,
    model: String,
    uptime_secs: i64,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.assistant.provider_name().to_string(),
        model: state.assistant.settings().model.clone(),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}

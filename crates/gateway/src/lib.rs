//! HTTP surface for Aura.
//!
//! Routes:
//! - `POST /api/chat`: one routed turn through the Router
//! - `POST /api/{content,analytics,ugc,static-ad,email,message}`: one
//!   Structured Agent, no routing
//! - `POST /api/brain/upload` (multipart), `POST /api/brain/documents`,
//!   `POST /api/brain/query`
//! - `GET /health`, `GET /`
//!
//! Built on Axum. Domain errors are mapped to status codes in [`error`].

pub mod agents;
pub mod brain;
pub mod chat;
pub mod error;

use aura_agent::AgentSet;
use aura_config::{AppConfig, GatewayConfig};
use aura_core::knowledge::KnowledgeStore;
use aura_knowledge::Ingestor;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::response::Json;
use axum::routing::{get, post};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::{CancellationToken, DropGuard};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

pub use error::ApiError;

/// Shared, read-only application state.
pub struct AppState {
    pub agents: AgentSet,
    pub ingestor: Ingestor,
    pub knowledge: Arc<dyn KnowledgeStore>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(agents: AgentSet, knowledge: Arc<dyn KnowledgeStore>, ingestor: Ingestor) -> Self {
        Self {
            agents,
            ingestor,
            knowledge,
        }
    }

    /// Build every subsystem once from config. Missing credentials or a
    /// missing database degrade the dependent features; startup succeeds.
    pub async fn from_config(config: &AppConfig) -> Self {
        let provider = aura_providers::build_from_config(config);
        let knowledge = aura_knowledge::build_from_config(&config.knowledge, provider.clone()).await;
        let capabilities = Arc::new(aura_tools::default_capabilities(config.request_timeout()));

        let agents = AgentSet::build(config, provider, knowledge.clone(), capabilities);
        let ingestor = Ingestor::new(knowledge.clone(), config.knowledge_timeout());
        Self::new(agents, knowledge, ingestor)
    }
}

/// Cancels the request's token when the handler future is dropped, which
/// is what happens when the client disconnects.
pub(crate) struct RequestGuard {
    token: CancellationToken,
    _guard: DropGuard,
}

impl RequestGuard {
    pub(crate) fn new() -> Self {
        let token = CancellationToken::new();
        Self {
            _guard: token.clone().drop_guard(),
            token,
        }
    }

    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// Build the Axum router with every route and layer.
pub fn build_router(state: SharedState, gateway: &GatewayConfig) -> axum::Router {
    axum::Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/api/chat", post(chat::chat))
        .route("/api/content", post(agents::content))
        .route("/api/analytics", post(agents::analytics))
        .route("/api/ugc", post(agents::ugc))
        .route("/api/static-ad", post(agents::static_ad))
        .route("/api/email", post(agents::email))
        .route("/api/message", post(agents::message))
        .route("/api/brain/upload", post(brain::upload))
        .route("/api/brain/documents", post(brain::documents))
        .route("/api/brain/query", post(brain::query))
        .with_state(state)
        .layer(DefaultBodyLimit::max(gateway.max_upload_bytes))
        .layer(cors_layer(&gateway.allowed_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Start the HTTP server and run until it fails.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let state = Arc::new(AppState::from_config(&config).await);
    info!(
        knowledge = state.knowledge.name(),
        agents = ?state.agents.names(),
        "Subsystems ready"
    );
    let app = build_router(state, &config.gateway);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct RootResponse {
    message: &'static str,
}

async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Aura AI Backend is running with Multi-Agent Support",
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

//! One mapping from the domain error taxonomy to HTTP responses.

use aura_agent::{AgentError, RoutingError};
use aura_core::error::{IngestError, KnowledgeError, ProviderError};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, info, warn};

/// Non-standard "client closed request" status.
const CLIENT_CLOSED: u16 = 499;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("Agent output did not match the expected format: {error}")]
    Malformed { raw: String, error: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Agent(e) => agent_status(e),
            Self::Routing(RoutingError::Classification(e)) => provider_status(e),
            Self::Routing(RoutingError::Dispatch { source, .. }) => agent_status(source),
            Self::Routing(RoutingError::Cancelled) => client_closed(),
            Self::Ingest(IngestError::UnsupportedDocumentType(_)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            Self::Ingest(IngestError::EmptyExtraction(_)) => StatusCode::BAD_REQUEST,
            Self::Ingest(IngestError::ExtractionFailed { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Ingest(IngestError::Store(e)) => knowledge_status(e),
            Self::Malformed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

fn agent_status(e: &AgentError) -> StatusCode {
    match e {
        AgentError::EmptyPrompt => StatusCode::BAD_REQUEST,
        AgentError::Gateway(p) => provider_status(p),
        AgentError::Knowledge(k) => knowledge_status(k),
        AgentError::Cancelled => client_closed(),
    }
}

fn provider_status(e: &ProviderError) -> StatusCode {
    match e {
        ProviderError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        ProviderError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn knowledge_status(e: &KnowledgeError) -> StatusCode {
    match e {
        KnowledgeError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn client_closed() -> StatusCode {
    StatusCode::from_u16(CLIENT_CLOSED).unwrap_or(StatusCode::REQUEST_TIMEOUT)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.as_u16() == CLIENT_CLOSED {
            info!("Client went away; request cancelled");
        } else if status.is_server_error() {
            error!(status = status.as_u16(), "{self}");
        } else {
            warn!(status = status.as_u16(), "{self}");
        }

        let body = match &self {
            Self::Malformed { raw, error } => json!({ "error": error, "raw": raw }),
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_errors_are_5xx() {
        let unconfigured = ApiError::Agent(AgentError::Gateway(ProviderError::NotConfigured("no key".into())));
        assert_eq!(unconfigured.status(), StatusCode::SERVICE_UNAVAILABLE);

        let down = ApiError::Routing(RoutingError::Classification(ProviderError::Network("reset".into())));
        assert_eq!(down.status(), StatusCode::BAD_GATEWAY);

        let slow = ApiError::Agent(AgentError::Gateway(ProviderError::Timeout("120s".into())));
        assert_eq!(slow.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn dispatch_error_uses_agent_cause() {
        let err = ApiError::Routing(RoutingError::Dispatch {
            tool: "email".into(),
            source: AgentError::Gateway(ProviderError::RateLimited { retry_after_secs: 5 }),
        });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn ingestion_rejections() {
        assert_eq!(
            ApiError::Ingest(IngestError::UnsupportedDocumentType("exe".into())).status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            ApiError::Ingest(IngestError::EmptyExtraction("a.txt".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Ingest(IngestError::Store(KnowledgeError::Unavailable("none".into()))).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn cancelled_maps_to_client_closed() {
        assert_eq!(ApiError::Agent(AgentError::Cancelled).status().as_u16(), 499);
        assert_eq!(ApiError::Routing(RoutingError::Cancelled).status().as_u16(), 499);
    }

    #[test]
    fn malformed_is_unprocessable() {
        let err = ApiError::Malformed {
            raw: "{oops".into(),
            error: "invalid JSON".into(),
        };
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

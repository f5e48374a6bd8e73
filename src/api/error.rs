use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::services::PokemonError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    ValidationError(String),

    /// The provider failed. `message` is what the client sees.
    ExternalApiError {
        service: String,
        message: String,
        cause: String,
    },

    /// `message` is what the client sees; `cause` is only logged.
    InternalError { message: String, cause: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::ExternalApiError { service, cause, .. } => {
                write!(f, "{service} error: {cause}")
            }
            Self::InternalError { cause, .. } => write!(f, "Internal error: {cause}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::ExternalApiError {
                service,
                message,
                cause,
            } => {
                tracing::warn!("{} API error: {}", service, cause);
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            Self::InternalError { message, cause } => {
                tracing::error!("Internal error: {}", cause);
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred", err)
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn internal(message: impl Into<String>, cause: impl fmt::Display) -> Self {
        Self::InternalError {
            message: message.into(),
            cause: cause.to_string(),
        }
    }

    /// Maps a service error onto a response, hiding any failure behind
    /// `failure_message`.
    pub fn from_pokemon(err: PokemonError, failure_message: &str) -> Self {
        match err {
            PokemonError::BadRequest(msg) => Self::ValidationError(msg),
            PokemonError::NotFound(identifier) => {
                Self::NotFound(format!("Pokemon not found: {identifier}"))
            }
            PokemonError::Fetch(cause) => Self::ExternalApiError {
                service: "PokeAPI".to_string(),
                message: failure_message.to_string(),
                cause,
            },
            PokemonError::Internal(cause) => Self::internal(failure_message, cause),
        }
    }
}

use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{AuthUser, ServerConfig, ServerState, router, run, run_with_listener, spawn_with_listener};

mod auth;
mod exchange;
mod nbp;
mod rates;
mod server;
mod transactions;
mod user;
mod wallet;

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    /// Credential or token failure; deliberately uninformative.
    Unauthorized,
    /// The upstream rate source has no publication for the requested date.
    NoPublication(String),
    /// The upstream rate source failed; safe for the caller to retry.
    Upstream(String),
    Internal(String),
    Generic(String),
}

//TODO: Find a better solution
#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) | EngineError::RateUnavailable(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_)
        | EngineError::InvalidCurrency(_)
        | EngineError::InsufficientFunds(_)
        | EngineError::InsufficientCurrencyFunds(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            ServerError::NoPublication(msg) => (StatusCode::NOT_FOUND, msg),
            ServerError::Upstream(msg) => {
                tracing::error!("upstream rate source error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream rate source unavailable".to_string(),
                )
            }
            ServerError::Internal(msg) => {
                tracing::error!("{msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<nbp::NbpError> for ServerError {
    fn from(value: nbp::NbpError) -> Self {
        match value {
            nbp::NbpError::NoPublication => ServerError::NoPublication(
                "no upstream publication for this date (weekend or holiday)".to_string(),
            ),
            nbp::NbpError::Format(msg) => ServerError::Upstream(msg),
            nbp::NbpError::Transport(err) => ServerError::Upstream(err.to_string()),
        }
    }
}

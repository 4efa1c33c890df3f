//! Registration and login endpoints.

use api_types::auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use axum::{Json, extract::State, http::StatusCode};

use crate::{ServerError, auth, server::ServerState};

const MIN_PASSWORD_LEN: usize = 6;

/// Creates a user and their zero-balance wallet.
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ServerError> {
    if payload.email.trim().is_empty() {
        return Err(ServerError::Generic("email is required".to_string()));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(ServerError::Generic(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let password_hash = auth::hash_password(&payload.password)?;
    let user = state
        .engine
        .create_user(
            &payload.email,
            &password_hash,
            payload.first_name.as_deref(),
            payload.last_name.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id: user.id }),
    ))
}

/// Exchanges credentials for a bearer token.
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ServerError> {
    // Every failure collapses to the same response; the caller never learns
    // which factor was wrong.
    let user = state
        .engine
        .user_by_email(&payload.email)
        .await
        .map_err(|_| ServerError::Unauthorized)?
        .ok_or(ServerError::Unauthorized)?;

    auth::verify_password(&user.password_hash, &payload.password)?;

    let access_token = state.tokens.issue(user.id)?;
    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.expires_in(),
    }))
}

//! Staff login.

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{AppendHeaders, IntoResponse, Response};
use serde::Deserialize;

use crate::db::StaffRepository;
use crate::error::Result;
use crate::services::auth::{AuthError, AuthService, verify_password};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /api/auth/login`
///
/// Checks the credentials against the staff table and, on success, sets
/// the `Authorization` cookie. A wrong email and a wrong password are
/// indistinguishable to the caller.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response> {
    let repo = StaffRepository::new(state.pool());
    let user = repo
        .get_by_email(&body.email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(&body.password, &user.password_hash)? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.auth().issue_token(&user.email)?;
    tracing::info!(staff = %user.email, "staff login");

    Ok((
        StatusCode::OK,
        AppendHeaders([(header::SET_COOKIE, AuthService::auth_cookie(&token))]),
    )
        .into_response())
}

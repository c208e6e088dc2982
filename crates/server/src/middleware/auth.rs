//! Staff authentication extractor.
//!
//! Protected routes take [`RequireStaff`] as an argument; the extractor
//! verifies the `Authorization` cookie before the handler body runs, so an
//! unauthorized request never reaches the database.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::{AUTH_COOKIE, StaffClaims};
use crate::state::AppState;

/// Extractor that requires a valid staff token.
///
/// # Example
///
/// ```rust,ignore
/// async fn toggle_payment(
///     RequireStaff(claims): RequireStaff,
///     State(state): State<AppState>,
/// ) -> Result<Json<bool>> { /* ... */ }
/// ```
pub struct RequireStaff(pub StaffClaims);

impl<S> FromRequestParts<S> for RequireStaff
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let token = parts
            .headers
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(token_from_cookies)
            .ok_or_else(|| AppError::Unauthorized("missing staff token".to_owned()))?;

        let claims = state
            .auth()
            .verify_token(token)
            .map_err(|_| AppError::Unauthorized("invalid staff token".to_owned()))?;

        Ok(Self(claims))
    }
}

/// Pull the staff token out of a `Cookie` header value.
fn token_from_cookies(header_value: &str) -> Option<&str> {
    header_value
        .split(';')
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(AUTH_COOKIE)?.strip_prefix('='))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_the_auth_cookie_among_others() {
        let header = "theme=dark; Authorization=abc.def.ghi; lang=nl";
        assert_eq!(token_from_cookies(header), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_cookie_yields_none() {
        assert_eq!(token_from_cookies("theme=dark"), None);
        assert_eq!(token_from_cookies(""), None);
    }

    #[test]
    fn prefix_must_match_exactly() {
        // "AuthorizationX=..." is not the auth cookie
        assert_eq!(token_from_cookies("AuthorizationX=abc"), None);
    }
}

//! Staff authentication: argon2 password verification and the signed,
//! time-limited token carried in the `Authorization` cookie.
//!
//! Tokens are stateless HS256 JWTs; the only server-side state is the
//! staff account table. The middleware verifies the token before any
//! database interaction happens on a protected route.

mod error;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

pub use error::AuthError;

/// How long a staff token stays valid.
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Name of the cookie carrying the staff token.
pub const AUTH_COOKIE: &str = "Authorization";

/// The claims carried by a staff token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffClaims {
    /// Staff email address.
    pub sub: String,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

/// Issues and verifies staff tokens.
#[derive(Clone)]
pub struct AuthService {
    secret: SecretString,
}

impl AuthService {
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Sign a token for a staff member, valid for [`TOKEN_TTL_SECS`].
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if encoding fails.
    pub fn issue_token(&self, email: &str) -> Result<String, AuthError> {
        let now = chrono::Utc::now().timestamp();
        let claims = StaffClaims {
            sub: email.to_owned(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )
        .map_err(|_| AuthError::TokenSigning)
    }

    /// Verify a token's signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for anything short of a valid,
    /// unexpired token.
    pub fn verify_token(&self, token: &str) -> Result<StaffClaims, AuthError> {
        decode::<StaffClaims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidToken)
    }

    /// Build the `Set-Cookie` value carrying a freshly issued token.
    #[must_use]
    pub fn auth_cookie(token: &str) -> String {
        format!(
            "{AUTH_COOKIE}={token}; HttpOnly; Secure; SameSite=Strict; Max-Age={TOKEN_TTL_SECS}; Path=/"
        )
    }
}

/// Hash a password for storage (argon2id, random salt).
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Check a password against a stored argon2 hash.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if the stored hash is malformed.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| AuthError::PasswordHash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(SecretString::from("0123456789abcdef0123456789abcdef"))
    }

    #[test]
    fn issued_tokens_verify() {
        let auth = service();
        let token = auth.issue_token("praeses@moederlambik.be").unwrap();
        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "praeses@moederlambik.be");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let auth = service();
        let token = auth.issue_token("praeses@moederlambik.be").unwrap();
        let other = AuthService::new(SecretString::from("ffffffffffffffffffffffffffffffff"));
        assert!(matches!(
            other.verify_token(&token),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            auth.verify_token("not-a-token"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("kram-kram-kram").unwrap();
        assert!(verify_password("kram-kram-kram", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn cookie_attributes() {
        let cookie = AuthService::auth_cookie("abc");
        assert!(cookie.starts_with("Authorization=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Max-Age=3600"));
    }
}

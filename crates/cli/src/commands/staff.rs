//! Staff account management.
//!
//! ```bash
//! krambam staff create -e praeses@moederlambik.be -p <password>
//! ```

use krambam_core::types::Email;
use krambam_server::db::StaffRepository;
use krambam_server::services::auth::hash_password;

use super::{CliError, connect};

/// Create a staff account with an argon2-hashed password.
///
/// # Errors
///
/// Returns `CliError::InvalidInput` for a malformed email or a password
/// hashing failure, `CliError::Repository` if the email already exists.
pub async fn create(email: &str, password: &str) -> Result<(), CliError> {
    let email = Email::parse(email).map_err(|e| CliError::InvalidInput(e.to_string()))?;
    let hash =
        hash_password(password).map_err(|e| CliError::InvalidInput(e.to_string()))?;

    let pool = connect().await?;
    let repo = StaffRepository::new(&pool);
    let id = repo.create(email.as_str(), &hash).await?;

    tracing::info!(%id, email = email.as_str(), "Staff account created");
    Ok(())
}

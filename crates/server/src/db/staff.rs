//! Staff user repository.
//!
//! Staff accounts are created through the CLI; the server only ever reads
//! them to check login credentials.

use sqlx::PgPool;

use krambam_core::types::StaffUserId;

use super::RepositoryError;

/// A staff account row.
#[derive(Debug, Clone)]
pub struct StaffUser {
    pub id: StaffUserId,
    pub email: String,
    pub password_hash: String,
}

#[derive(sqlx::FromRow)]
struct StaffUserRow {
    id: i32,
    email: String,
    password_hash: String,
}

/// Repository for staff accounts.
pub struct StaffRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StaffRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Look up a staff user by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<StaffUser>, RepositoryError> {
        let row: Option<StaffUserRow> = sqlx::query_as(
            r"
            SELECT id, email, password_hash
            FROM staff_users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|row| StaffUser {
            id: StaffUserId::new(row.id),
            email: row.email,
            password_hash: row.password_hash,
        }))
    }

    /// Create a staff account with an already-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<StaffUserId, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO staff_users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id
            ",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::Conflict("email already exists".to_owned())
            }
            _ => RepositoryError::Database(e),
        })?;

        Ok(StaffUserId::new(id))
    }
}

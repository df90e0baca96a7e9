use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{User, UserRole};

/// Default read projection: sensitive columns come back as NULL.
const PUBLIC_COLUMNS: &str = "id, name, email, NULL::text AS password_hash, role, \
     password_changed_at, NULL::text AS password_reset_token, \
     NULL::timestamptz AS password_reset_expires, created_at";

/// Verification paths explicitly re-include the secrets.
const SECRET_COLUMNS: &str = "id, name, email, password_hash, role, \
     password_changed_at, password_reset_token, password_reset_expires, created_at";

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {PUBLIC_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_email_with_secrets(
        db: &PgPool,
        email: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {SECRET_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {PUBLIC_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_id_with_secrets(
        db: &PgPool,
        id: Uuid,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {SECRET_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Reset lookup: stored hash must match AND the expiry must still be in
    /// the future. No row means the token is invalid or expired.
    pub async fn find_by_reset_token(
        db: &PgPool,
        hashed_token: &str,
        now: OffsetDateTime,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {PUBLIC_COLUMNS} FROM users \
             WHERE password_reset_token = $1 AND password_reset_expires > $2"
        ))
        .bind(hashed_token)
        .bind(now)
        .fetch_optional(db)
        .await
    }

    /// Insert a new user. Email uniqueness is the store's constraint; a
    /// duplicate surfaces as a unique violation for the caller to map.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash, role) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {PUBLIC_COLUMNS}"
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(db)
        .await
    }

    /// Persist a new password hash, stamp the change time, and drop any
    /// outstanding reset token in the same statement.
    pub async fn update_password(
        db: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET password_hash = $2, password_changed_at = now(), \
             password_reset_token = NULL, password_reset_expires = NULL \
             WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Persist the hashed reset token + expiry. Deliberately skips the full
    /// record validation path: only the two reset fields change.
    pub async fn set_reset_token(
        db: &PgPool,
        id: Uuid,
        hashed_token: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET password_reset_token = $2, password_reset_expires = $3 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(hashed_token)
        .bind(expires_at)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Compensating cleanup when the reset email cannot be sent.
    pub async fn clear_reset_token(db: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET password_reset_token = NULL, password_reset_expires = NULL \
             WHERE id = $1",
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }
}

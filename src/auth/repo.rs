use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub created_at: OffsetDateTime,
    pub last_login_at: Option<OffsetDateTime>,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expires_at: Option<OffsetDateTime>,
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, age, gender,
                   created_at, last_login_at, reset_token, reset_token_expires_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, age, gender,
                   created_at, last_login_at, reset_token, reset_token_expires_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn create(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        name: Option<&str>,
        age: Option<i32>,
        gender: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name, age, gender)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, name, age, gender,
                      created_at, last_login_at, reset_token, reset_token_expires_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(age)
        .bind(gender)
        .fetch_one(db)
        .await
    }

    pub async fn touch_last_login(db: &PgPool, id: Uuid) -> Result<OffsetDateTime, sqlx::Error> {
        sqlx::query_scalar::<_, OffsetDateTime>(
            "UPDATE users SET last_login_at = now() WHERE id = $1 RETURNING last_login_at",
        )
        .bind(id)
        .fetch_one(db)
        .await
    }

    pub async fn set_reset_token(
        db: &PgPool,
        id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET reset_token = $1, reset_token_expires_at = $2 WHERE id = $3",
        )
        .bind(token)
        .bind(expires_at)
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Only matches a token that has not expired; unknown and stale tokens
    /// are indistinguishable to the caller.
    pub async fn find_by_reset_token(
        db: &PgPool,
        token: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, age, gender,
                   created_at, last_login_at, reset_token, reset_token_expires_at
            FROM users
            WHERE reset_token = $1 AND reset_token_expires_at > now()
            "#,
        )
        .bind(token)
        .fetch_optional(db)
        .await
    }

    /// Replace the password hash and clear any outstanding reset token.
    pub async fn update_password(
        db: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $1, reset_token = NULL, reset_token_expires_at = NULL
            WHERE id = $2
            "#,
        )
        .bind(password_hash)
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }
}

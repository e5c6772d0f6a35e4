use rand::RngCore;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

pub const REASON_ROTATED: &str = "Replaced by new token";
pub const REASON_REVOKED: &str = "Revoked by user";

/// Opaque refresh credential. Rows transition `active -> revoked` exactly
/// once and are never deleted; rotation links the chain through
/// `replaced_by_token`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
    pub revoked_at: Option<OffsetDateTime>,
    pub replaced_by_token: Option<String>,
    pub reason_revoked: Option<String>,
}

impl RefreshToken {
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() >= self.expires_at
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_active(&self) -> bool {
        !self.is_revoked() && !self.is_expired()
    }
}

/// 40 random bytes, hex-encoded. Collisions are negligible at this entropy,
/// so there is no uniqueness retry loop.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 40];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub async fn issue(
    db: &PgPool,
    user_id: Uuid,
    ttl: Duration,
) -> Result<RefreshToken, sqlx::Error> {
    let token = generate_token();
    let expires_at = OffsetDateTime::now_utc() + ttl;
    sqlx::query_as::<_, RefreshToken>(
        r#"
        INSERT INTO refresh_tokens (user_id, token, expires_at)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, token, expires_at, created_at,
                  revoked_at, replaced_by_token, reason_revoked
        "#,
    )
    .bind(user_id)
    .bind(&token)
    .bind(expires_at)
    .fetch_one(db)
    .await
}

pub async fn find(db: &PgPool, token: &str) -> Result<Option<RefreshToken>, sqlx::Error> {
    sqlx::query_as::<_, RefreshToken>(
        r#"
        SELECT id, user_id, token, expires_at, created_at,
               revoked_at, replaced_by_token, reason_revoked
        FROM refresh_tokens
        WHERE token = $1
        "#,
    )
    .bind(token)
    .fetch_optional(db)
    .await
}

/// Revoke the old token and insert its replacement in one transaction. The
/// conditional `revoked_at IS NULL` update is the optimistic-concurrency
/// check: of any number of concurrent refreshes with the same token, exactly
/// one sees a row affected. Losers get `None` and the caller answers 401.
pub async fn rotate(
    db: &PgPool,
    old_token: &str,
    user_id: Uuid,
    ttl: Duration,
) -> Result<Option<RefreshToken>, sqlx::Error> {
    let mut tx = db.begin().await?;

    let new_token = generate_token();
    let revoked = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked_at = now(), reason_revoked = $1, replaced_by_token = $2
        WHERE token = $3 AND revoked_at IS NULL
        "#,
    )
    .bind(REASON_ROTATED)
    .bind(&new_token)
    .bind(old_token)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if revoked == 0 {
        tx.rollback().await?;
        return Ok(None);
    }

    let expires_at = OffsetDateTime::now_utc() + ttl;
    let row = sqlx::query_as::<_, RefreshToken>(
        r#"
        INSERT INTO refresh_tokens (user_id, token, expires_at)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, token, expires_at, created_at,
                  revoked_at, replaced_by_token, reason_revoked
        "#,
    )
    .bind(user_id)
    .bind(&new_token)
    .bind(expires_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(row))
}

/// Conditional revoke; returns whether this call performed the transition.
pub async fn revoke(db: &PgPool, token: &str, reason: &str) -> Result<bool, sqlx::Error> {
    let affected = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked_at = now(), reason_revoked = $1
        WHERE token = $2 AND revoked_at IS NULL
        "#,
    )
    .bind(reason)
    .bind(token)
    .execute(db)
    .await?
    .rows_affected();
    Ok(affected == 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(expires_in: Duration) -> RefreshToken {
        let now = OffsetDateTime::now_utc();
        RefreshToken {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token: generate_token(),
            expires_at: now + expires_in,
            created_at: now,
            revoked_at: None,
            replaced_by_token: None,
            reason_revoked: None,
        }
    }

    #[test]
    fn generated_token_is_80_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 80);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_tokens_differ() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn fresh_token_is_active() {
        let token = sample(Duration::days(7));
        assert!(token.is_active());
        assert!(!token.is_revoked());
        assert!(!token.is_expired());
    }

    #[test]
    fn expired_token_is_inactive() {
        let token = sample(Duration::seconds(-1));
        assert!(token.is_expired());
        assert!(!token.is_active());
    }

    #[test]
    fn revoked_token_is_inactive_even_before_expiry() {
        let mut token = sample(Duration::days(7));
        token.revoked_at = Some(OffsetDateTime::now_utc());
        token.reason_revoked = Some(REASON_REVOKED.into());
        assert!(token.is_revoked());
        assert!(!token.is_active());
    }
}

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: OffsetDateTime,
}

impl Task {
    pub async fn list(
        db: &PgPool,
        user_id: Uuid,
        status: Option<&str>,
        title: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, description, status, created_at
            FROM tasks
            WHERE user_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR title ILIKE '%' || $3 || '%')
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(user_id)
        .bind(status)
        .bind(title)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }

    /// Total matching rows for the same filters as `list`.
    pub async fn count(
        db: &PgPool,
        user_id: Uuid,
        status: Option<&str>,
        title: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM tasks
            WHERE user_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR title ILIKE '%' || $3 || '%')
            "#,
        )
        .bind(user_id)
        .bind(status)
        .bind(title)
        .fetch_one(db)
        .await
    }

    /// Scoped to the owner; a task belonging to someone else is absent.
    pub async fn get(
        db: &PgPool,
        user_id: Uuid,
        task_id: Uuid,
    ) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, description, status, created_at
            FROM tasks
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        title: &str,
        description: Option<&str>,
        status: &str,
    ) -> Result<Task, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (user_id, title, description, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, description, status, created_at
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(description)
        .bind(status)
        .fetch_one(db)
        .await
    }
}

//! Comment storage.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct CommentStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    #[serde(rename = "user")]
    pub user_id: String,
    #[serde(rename = "post")]
    pub post_id: String,
    pub text: String,
    pub created_at: String,
    pub updated_at: String,
}

impl CommentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a comment on a post, owned by `user_id`.
    pub async fn create(
        &self,
        user_id: &str,
        post_id: &str,
        text: &str,
    ) -> Result<Comment, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO comments (id, user_id, post_id, text) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(user_id)
            .bind(post_id)
            .bind(text)
            .execute(&self.pool)
            .await?;

        self.get_by_id(&id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Comment>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, user_id, post_id, text, created_at, updated_at FROM comments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// List comments of a post, oldest first.
    pub async fn list_by_post(
        &self,
        post_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, user_id, post_id, text, created_at, updated_at FROM comments
             WHERE post_id = ?
             ORDER BY created_at ASC, rowid ASC
             LIMIT ? OFFSET ?",
        )
        .bind(post_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    /// Replace the text of a comment. Returns None if it no longer exists.
    pub async fn update_text(&self, id: &str, text: &str) -> Result<Option<Comment>, sqlx::Error> {
        let result =
            sqlx::query("UPDATE comments SET text = ?, updated_at = datetime('now') WHERE id = ?")
                .bind(text)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

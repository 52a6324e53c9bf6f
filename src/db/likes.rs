//! Like storage. A user can like a given post at most once.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct LikeStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Like {
    pub id: String,
    #[serde(rename = "user")]
    pub user_id: String,
    #[serde(rename = "post")]
    pub post_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl LikeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Like a post. Fails with a unique violation if the user already likes it.
    pub async fn create(&self, user_id: &str, post_id: &str) -> Result<Like, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO likes (id, user_id, post_id) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(user_id)
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        self.get_by_id(&id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Like>, sqlx::Error> {
        sqlx::query_as("SELECT id, user_id, post_id, created_at, updated_at FROM likes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM likes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

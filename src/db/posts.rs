//! Post storage.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct PostStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Post {
    pub id: String,
    #[serde(rename = "user")]
    pub user_id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "imagePath")]
    pub image_path: String,
    #[serde(rename = "videoPath")]
    pub video_path: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A post together with its like and comment totals, as returned by reads.
#[derive(Debug, Clone, Serialize)]
pub struct PostWithCounts {
    #[serde(flatten)]
    pub post: Post,
    pub like_count: i64,
    pub comment_count: i64,
}

#[derive(sqlx::FromRow)]
struct PostWithCountsRow {
    id: String,
    user_id: String,
    title: String,
    content: String,
    image_path: String,
    video_path: String,
    created_at: String,
    updated_at: String,
    like_count: i64,
    comment_count: i64,
}

impl From<PostWithCountsRow> for PostWithCounts {
    fn from(row: PostWithCountsRow) -> Self {
        Self {
            post: Post {
                id: row.id,
                user_id: row.user_id,
                title: row.title,
                content: row.content,
                image_path: row.image_path,
                video_path: row.video_path,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            like_count: row.like_count,
            comment_count: row.comment_count,
        }
    }
}

/// Fields an update may change. `None` keeps the stored value.
/// There is intentionally no owner field: ownership never changes after creation.
#[derive(Debug, Default)]
pub struct PostChanges<'a> {
    pub title: Option<&'a str>,
    pub content: Option<&'a str>,
    pub image_path: Option<&'a str>,
    pub video_path: Option<&'a str>,
}

impl PostStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new post owned by `user_id`.
    /// Fails with a unique violation if the title is already used.
    pub async fn create(
        &self,
        user_id: &str,
        title: &str,
        content: &str,
        image_path: &str,
        video_path: &str,
    ) -> Result<Post, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO posts (id, user_id, title, content, image_path, video_path) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(title)
        .bind(content)
        .bind(image_path)
        .bind(video_path)
        .execute(&self.pool)
        .await?;

        self.get_by_id(&id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    /// Get a post by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Post>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, user_id, title, content, image_path, video_path, created_at, updated_at
             FROM posts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Get a post by ID with its like and comment counts.
    pub async fn get_with_counts(&self, id: &str) -> Result<Option<PostWithCounts>, sqlx::Error> {
        let row: Option<PostWithCountsRow> = sqlx::query_as(
            "SELECT p.id, p.user_id, p.title, p.content, p.image_path, p.video_path, p.created_at, p.updated_at,
                    (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
                    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
             FROM posts p WHERE p.id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(PostWithCounts::from))
    }

    /// List posts, newest first.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<PostWithCounts>, sqlx::Error> {
        let rows: Vec<PostWithCountsRow> = sqlx::query_as(
            "SELECT p.id, p.user_id, p.title, p.content, p.image_path, p.video_path, p.created_at, p.updated_at,
                    (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
                    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
             FROM posts p
             ORDER BY p.created_at DESC, p.rowid DESC
             LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PostWithCounts::from).collect())
    }

    /// List the posts owned by a user, newest first.
    pub async fn list_by_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostWithCounts>, sqlx::Error> {
        let rows: Vec<PostWithCountsRow> = sqlx::query_as(
            "SELECT p.id, p.user_id, p.title, p.content, p.image_path, p.video_path, p.created_at, p.updated_at,
                    (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
                    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
             FROM posts p WHERE p.user_id = ?
             ORDER BY p.created_at DESC, p.rowid DESC
             LIMIT ? OFFSET ?",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PostWithCounts::from).collect())
    }

    /// Apply a partial update. Returns the updated post, or None if it no longer exists.
    pub async fn update(
        &self,
        id: &str,
        changes: &PostChanges<'_>,
    ) -> Result<Option<Post>, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE posts SET
                title = COALESCE(?, title),
                content = COALESCE(?, content),
                image_path = COALESCE(?, image_path),
                video_path = COALESCE(?, video_path),
                updated_at = datetime('now')
             WHERE id = ?",
        )
        .bind(changes.title)
        .bind(changes.content)
        .bind(changes.image_path)
        .bind(changes.video_path)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Delete a post (comments and likes cascade). Returns true if a row was removed.
    pub async fn delete(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::{Database, NewUser};

    use super::*;

    async fn setup() -> (Database, String) {
        let db = Database::open(":memory:").await.unwrap();
        let user = db
            .users()
            .create(&NewUser {
                name: "Alice",
                email: "alice@example.com",
                password_hash: "hash",
            })
            .await
            .unwrap();
        (db, user.id)
    }

    #[tokio::test]
    async fn test_update_keeps_unchanged_fields_and_owner() {
        let (db, user_id) = setup().await;
        let post = db
            .posts()
            .create(&user_id, "Title", "Body", "a.jpg", "a.mp4")
            .await
            .unwrap();

        let updated = db
            .posts()
            .update(
                &post.id,
                &PostChanges {
                    content: Some("New body"),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "Title");
        assert_eq!(updated.content, "New body");
        assert_eq!(updated.image_path, "a.jpg");
        assert_eq!(updated.user_id, user_id);
        assert_eq!(updated.created_at, post.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_post() {
        let (db, _) = setup().await;

        let result = db
            .posts()
            .update("missing", &PostChanges::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_list_with_counts_and_pagination() {
        let (db, user_id) = setup().await;
        let first = db
            .posts()
            .create(&user_id, "First", "1", "1.jpg", "1.mp4")
            .await
            .unwrap();
        db.posts()
            .create(&user_id, "Second", "2", "2.jpg", "2.mp4")
            .await
            .unwrap();
        db.likes().create(&user_id, &first.id).await.unwrap();
        db.comments().create(&user_id, &first.id, "hi").await.unwrap();

        let page = db.posts().list(10, 0).await.unwrap();
        assert_eq!(page.len(), 2);
        // Newest first
        assert_eq!(page[0].post.title, "Second");
        assert_eq!(page[1].like_count, 1);
        assert_eq!(page[1].comment_count, 1);

        let second_page = db.posts().list(1, 1).await.unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].post.id, first.id);
    }

    #[tokio::test]
    async fn test_list_by_user_only_returns_own_posts() {
        let (db, user_id) = setup().await;
        let other = db
            .users()
            .create(&NewUser {
                name: "Bob",
                email: "bob@example.com",
                password_hash: "hash",
            })
            .await
            .unwrap();
        db.posts()
            .create(&user_id, "Mine", "x", "x", "x")
            .await
            .unwrap();
        db.posts()
            .create(&other.id, "Theirs", "y", "y", "y")
            .await
            .unwrap();

        let mine = db.posts().list_by_user(&user_id, 10, 0).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].post.title, "Mine");
    }
}

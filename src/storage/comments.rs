//! Comment and comment-like repository.
//!
//! Multi-statement writes (discussion thread creation, like counters) run inside a
//! single transaction; the transaction rolls back if it is dropped before commit.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::constants::{
    DISCUSSION_FILE_ORDER, DISCUSSION_FILE_TITLE, DISCUSSION_FILE_TYPE, DISCUSSION_FILE_URL,
};
use crate::error::{CourseHubError, Result};

/// Comment row with author details and the viewer's like state
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CommentRecord {
    pub id: String,
    pub file_id: String,
    pub user_id: String,
    pub parent_id: Option<String>,
    pub comment: String,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
    pub user_name: Option<String>,
    pub user_role: Option<String>,
    pub is_liked: bool,
}

/// Where a new comment is attached
#[derive(Debug, Clone)]
pub enum CommentTarget {
    /// A specific course file
    File(String),
    /// The course's discussion thread, created on first use
    Course(String),
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub user_id: String,
    pub parent_id: Option<String>,
    pub comment: String,
}

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.file_id, c.user_id, c.parent_id, c.comment, c.likes, c.created_at,
           u.name AS user_name, u.role AS user_role,
           EXISTS(
               SELECT 1 FROM comment_likes cl WHERE cl.comment_id = c.id AND cl.user_id = ?
           ) AS is_liked
    FROM comments c
    LEFT JOIN users u ON c.user_id = u.id
"#;

/// Repository for comment operations.
pub struct CommentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CommentRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Comments on one file (oldest first), or all comments when no file is given
    pub async fn list(&self, file_id: Option<&str>, viewer_id: &str) -> Result<Vec<CommentRecord>> {
        let rows = match file_id {
            Some(file_id) => {
                sqlx::query_as::<_, CommentRecord>(&format!(
                    "{} WHERE c.file_id = ? ORDER BY c.created_at ASC, c.rowid ASC",
                    COMMENT_SELECT
                ))
                .bind(viewer_id)
                .bind(file_id)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, CommentRecord>(&format!(
                    "{} ORDER BY c.created_at ASC, c.rowid ASC",
                    COMMENT_SELECT
                ))
                .bind(viewer_id)
                .fetch_all(self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    pub async fn get(&self, id: &str, viewer_id: &str) -> Result<Option<CommentRecord>> {
        let row = sqlx::query_as::<_, CommentRecord>(&format!("{} WHERE c.id = ?", COMMENT_SELECT))
            .bind(viewer_id)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Author of a comment, read fresh for ownership checks
    pub async fn author(&self, id: &str) -> Result<Option<String>> {
        let user_id = sqlx::query_scalar::<_, String>("SELECT user_id FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(user_id)
    }

    /// Insert a comment, creating the course discussion thread if needed.
    ///
    /// Thread lookup/creation and the comment insert commit together; the partial
    /// unique index on discussion files makes concurrent first comments converge on
    /// a single thread.
    pub async fn create(&self, target: &CommentTarget, new: &NewComment) -> Result<CommentRecord> {
        let mut tx = self.pool.begin().await?;

        let file_id = match target {
            CommentTarget::File(file_id) => file_id.clone(),
            CommentTarget::Course(course_id) => Self::discussion_file(&mut tx, course_id).await?,
        };

        if let Some(ref parent_id) = new.parent_id {
            let parent_file = sqlx::query_scalar::<_, String>(
                "SELECT file_id FROM comments WHERE id = ?",
            )
            .bind(parent_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CourseHubError::not_found("Parent comment not found"))?;

            if parent_file != file_id {
                return Err(CourseHubError::validation(
                    "Parent comment belongs to a different thread",
                ));
            }
        }

        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO comments (id, file_id, user_id, parent_id, comment, likes, created_at)
            VALUES (?, ?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(&id)
        .bind(&file_id)
        .bind(&new.user_id)
        .bind(&new.parent_id)
        .bind(&new.comment)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get(&id, &new.user_id).await?.ok_or_else(|| {
            CourseHubError::StorageError(format!("Comment {} vanished after insert", id))
        })
    }

    async fn discussion_file(tx: &mut Transaction<'_, Sqlite>, course_id: &str) -> Result<String> {
        sqlx::query(
            r#"
            INSERT INTO course_files (id, course_id, title, file_type, file_url, file_order, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(course_id)
        .bind(DISCUSSION_FILE_TITLE)
        .bind(DISCUSSION_FILE_TYPE)
        .bind(DISCUSSION_FILE_URL)
        .bind(DISCUSSION_FILE_ORDER)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;

        let file_id = sqlx::query_scalar::<_, String>(
            "SELECT id FROM course_files WHERE course_id = ? AND file_type = ?",
        )
        .bind(course_id)
        .bind(DISCUSSION_FILE_TYPE)
        .fetch_one(&mut **tx)
        .await?;
        Ok(file_id)
    }

    /// Replace a comment's text; `false` when it no longer exists.
    pub async fn update_text(&self, id: &str, comment: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE comments SET comment = ? WHERE id = ?")
            .bind(comment)
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a like and bump the counter; a repeated like is a conflict.
    pub async fn like(&self, comment_id: &str, user_id: &str) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO comment_likes (comment_id, user_id, created_at) VALUES (?, ?, ?)")
            .bind(comment_id)
            .bind(user_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(|e| match CourseHubError::from(e) {
                CourseHubError::Conflict(_) => CourseHubError::conflict("Already liked"),
                other => other,
            })?;

        let likes = sqlx::query_scalar::<_, i64>(
            "UPDATE comments SET likes = likes + 1 WHERE id = ? RETURNING likes",
        )
        .bind(comment_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(likes)
    }

    /// Remove a like and decrement the counter; no like on record is not-found.
    pub async fn unlike(&self, comment_id: &str, user_id: &str) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM comment_likes WHERE comment_id = ? AND user_id = ?")
            .bind(comment_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if removed.rows_affected() == 0 {
            return Err(CourseHubError::not_found("Like not found"));
        }

        let likes = sqlx::query_scalar::<_, i64>(
            "UPDATE comments SET likes = MAX(likes - 1, 0) WHERE id = ? RETURNING likes",
        )
        .bind(comment_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(likes)
    }
}

//! Course file repository.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CourseFileRecord {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub file_type: String,
    pub file_url: String,
    pub file_order: i64,
}

/// Editable course file columns
#[derive(Debug, Clone)]
pub struct FileFields {
    pub course_id: String,
    pub title: String,
    pub file_type: String,
    pub file_url: String,
    pub file_order: i64,
}

/// Repository for course file operations.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Files of one course in display order, or every file when no course is given
    pub async fn list(&self, course_id: Option<&str>) -> Result<Vec<CourseFileRecord>> {
        let files = match course_id {
            Some(course_id) => {
                sqlx::query_as::<_, CourseFileRecord>(
                    r#"
                    SELECT id, course_id, title, file_type, file_url, file_order
                    FROM course_files
                    WHERE course_id = ?
                    ORDER BY file_order ASC, created_at ASC
                    "#,
                )
                .bind(course_id)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, CourseFileRecord>(
                    r#"
                    SELECT id, course_id, title, file_type, file_url, file_order
                    FROM course_files
                    ORDER BY course_id, file_order ASC
                    "#,
                )
                .fetch_all(self.pool)
                .await?
            }
        };
        Ok(files)
    }

    pub async fn get(&self, id: &str) -> Result<Option<CourseFileRecord>> {
        let file = sqlx::query_as::<_, CourseFileRecord>(
            "SELECT id, course_id, title, file_type, file_url, file_order FROM course_files WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(file)
    }

    pub async fn create(&self, fields: &FileFields) -> Result<CourseFileRecord> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO course_files (id, course_id, title, file_type, file_url, file_order, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&fields.course_id)
        .bind(&fields.title)
        .bind(&fields.file_type)
        .bind(&fields.file_url)
        .bind(fields.file_order)
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        Ok(CourseFileRecord {
            id,
            course_id: fields.course_id.clone(),
            title: fields.title.clone(),
            file_type: fields.file_type.clone(),
            file_url: fields.file_url.clone(),
            file_order: fields.file_order,
        })
    }

    /// Overwrite a file row; `Ok(None)` when it does not exist.
    pub async fn update(&self, id: &str, fields: &FileFields) -> Result<Option<CourseFileRecord>> {
        let result = sqlx::query(
            r#"
            UPDATE course_files
            SET course_id = ?, title = ?, file_type = ?, file_url = ?, file_order = ?
            WHERE id = ?
            "#,
        )
        .bind(&fields.course_id)
        .bind(&fields.title)
        .bind(&fields.file_type)
        .bind(&fields.file_url)
        .bind(fields.file_order)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    /// Delete a file row and hand back what was removed.
    pub async fn delete(&self, id: &str) -> Result<Option<CourseFileRecord>> {
        let removed = sqlx::query_as::<_, CourseFileRecord>(
            r#"
            DELETE FROM course_files WHERE id = ?
            RETURNING id, course_id, title, file_type, file_url, file_order
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(removed)
    }

    /// The discussion thread file of a course, if one has been started
    pub async fn find_discussion(&self, course_id: &str) -> Result<Option<String>> {
        let id = sqlx::query_scalar::<_, String>(
            "SELECT id FROM course_files WHERE course_id = ? AND file_type = 'discussion' LIMIT 1",
        )
        .bind(course_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(id)
    }
}

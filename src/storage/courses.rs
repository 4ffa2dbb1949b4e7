//! Course repository.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use super::pagination::{ListQuery, Pagination};
use crate::auth::user::Identity;
use crate::error::{CourseHubError, Result};

/// Course row joined with its teacher's name and enrollment count
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CourseRecord {
    pub id: String,
    pub teacher_id: String,
    pub title: String,
    pub description: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub teacher_name: Option<String>,
    pub enrolled_count: i64,
}

/// The columns the access policy needs about a course
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CourseOwnership {
    pub teacher_id: String,
    pub is_published: bool,
}

/// Full set of editable course fields
#[derive(Debug, Clone)]
pub struct CourseFields {
    pub teacher_id: String,
    pub title: String,
    pub description: String,
    pub is_published: bool,
}

const COURSE_SELECT: &str = r#"
    SELECT c.id, c.teacher_id, c.title, c.description, c.is_published, c.created_at,
           u.name AS teacher_name,
           (SELECT COUNT(*) FROM enrollments e WHERE e.course_id = c.id) AS enrolled_count
    FROM courses c
    LEFT JOIN users u ON c.teacher_id = u.id
"#;

/// Repository for course operations.
pub struct CourseRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CourseRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, fields: &CourseFields) -> Result<CourseRecord> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO courses (id, teacher_id, title, description, is_published, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&fields.teacher_id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.is_published)
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        self.get(&id).await?.ok_or_else(|| {
            CourseHubError::StorageError(format!("Course {} vanished after insert", id))
        })
    }

    pub async fn get(&self, id: &str) -> Result<Option<CourseRecord>> {
        let course = sqlx::query_as::<_, CourseRecord>(&format!("{} WHERE c.id = ?", COURSE_SELECT))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(course)
    }

    /// Ownership and visibility of a course, read fresh for each policy check
    pub async fn ownership(&self, id: &str) -> Result<Option<CourseOwnership>> {
        let row = sqlx::query_as::<_, CourseOwnership>(
            "SELECT teacher_id, is_published FROM courses WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Page through the courses `viewer` may see, newest first.
    ///
    /// Published courses are visible to everyone, unpublished ones to admins and
    /// to the teacher who owns them.
    pub async fn list(
        &self,
        viewer: Option<&Identity>,
        query: &ListQuery,
    ) -> Result<(Vec<CourseRecord>, Pagination)> {
        let window = query.window();
        let pattern = query.search_pattern();
        let see_all = viewer.is_some_and(|v| v.is_admin());
        let owner_id = viewer
            .filter(|v| v.role.is_staff())
            .map(|v| v.id.clone())
            .unwrap_or_default();

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM courses c WHERE 1 = 1");
        let mut select = QueryBuilder::<Sqlite>::new(COURSE_SELECT);
        select.push(" WHERE 1 = 1");

        for builder in [&mut count, &mut select] {
            if !see_all {
                builder
                    .push(" AND (c.is_published = 1 OR c.teacher_id = ")
                    .push_bind(owner_id.clone())
                    .push(")");
            }
            if let Some(ref pattern) = pattern {
                builder
                    .push(" AND (c.title LIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR c.description LIKE ")
                    .push_bind(pattern.clone())
                    .push(")");
            }
        }

        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        select
            .push(" ORDER BY c.created_at DESC LIMIT ")
            .push_bind(window.limit())
            .push(" OFFSET ")
            .push_bind(window.offset());
        let courses = select
            .build_query_as::<CourseRecord>()
            .fetch_all(self.pool)
            .await?;

        Ok((courses, Pagination::new(window, total)))
    }

    /// Overwrite a course; `false` when it no longer exists.
    pub async fn update(&self, id: &str, fields: &CourseFields) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE courses SET teacher_id = ?, title = ?, description = ?, is_published = ?
            WHERE id = ?
            "#,
        )
        .bind(&fields.teacher_id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.is_published)
        .bind(id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

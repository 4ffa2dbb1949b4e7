//! Enrollment repository.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{CourseHubError, Result};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EnrollmentRecord {
    pub id: String,
    pub student_id: String,
    pub course_id: String,
    pub enrolled_at: DateTime<Utc>,
}

/// A course as seen from a student's enrollment list
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EnrolledCourse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub teacher_id: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub teacher_name: Option<String>,
    pub enrolled_at: DateTime<Utc>,
}

fn enrollment_conflict(err: sqlx::Error) -> CourseHubError {
    match CourseHubError::from(err) {
        CourseHubError::Conflict(_) => CourseHubError::conflict("Already enrolled in this course"),
        other => other,
    }
}

/// Repository for enrollment operations.
pub struct EnrollmentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> EnrollmentRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Enroll a student; the (student, course) pair is unique.
    pub async fn create(&self, student_id: &str, course_id: &str) -> Result<EnrollmentRecord> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO enrollments (id, student_id, course_id, enrolled_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(student_id)
        .bind(course_id)
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(enrollment_conflict)?;

        Ok(EnrollmentRecord {
            id,
            student_id: student_id.to_string(),
            course_id: course_id.to_string(),
            enrolled_at: now,
        })
    }

    pub async fn get(&self, id: &str) -> Result<Option<EnrollmentRecord>> {
        let row = sqlx::query_as::<_, EnrollmentRecord>(
            "SELECT id, student_id, course_id, enrolled_at FROM enrollments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    pub async fn find(&self, student_id: &str, course_id: &str) -> Result<Option<EnrollmentRecord>> {
        let row = sqlx::query_as::<_, EnrollmentRecord>(
            r#"
            SELECT id, student_id, course_id, enrolled_at FROM enrollments
            WHERE student_id = ? AND course_id = ?
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Every enrollment, or only one student's when `student_id` is given
    pub async fn list(&self, student_id: Option<&str>) -> Result<Vec<EnrollmentRecord>> {
        let rows = match student_id {
            Some(student_id) => {
                sqlx::query_as::<_, EnrollmentRecord>(
                    r#"
                    SELECT id, student_id, course_id, enrolled_at FROM enrollments
                    WHERE student_id = ? ORDER BY enrolled_at DESC
                    "#,
                )
                .bind(student_id)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, EnrollmentRecord>(
                    "SELECT id, student_id, course_id, enrolled_at FROM enrollments ORDER BY enrolled_at DESC",
                )
                .fetch_all(self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    /// Courses a student is enrolled in, most recent enrollment first
    pub async fn courses_for_student(&self, student_id: &str) -> Result<Vec<EnrolledCourse>> {
        let rows = sqlx::query_as::<_, EnrolledCourse>(
            r#"
            SELECT c.id, c.title, c.description, c.teacher_id, c.is_published, c.created_at,
                   u.name AS teacher_name, e.enrolled_at
            FROM enrollments e
            JOIN courses c ON e.course_id = c.id
            LEFT JOIN users u ON c.teacher_id = u.id
            WHERE e.student_id = ?
            ORDER BY e.enrolled_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Move an enrollment to another course; `false` when it does not exist.
    pub async fn update_course(&self, id: &str, course_id: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE enrollments SET course_id = ? WHERE id = ?")
            .bind(course_id)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(enrollment_conflict)?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM enrollments WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

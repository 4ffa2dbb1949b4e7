//! User repository: the credential store plus admin user management.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use super::pagination::{ListQuery, Pagination};
use super::traits::StoredCredentials;
use crate::auth::user::{Identity, UserRole};
use crate::error::{CourseHubError, Result};

/// Public view of a user row (never carries the password hash)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn identity(&self) -> Identity {
        Identity::new(self.id.clone(), self.email.clone(), self.name.clone(), self.role)
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: String,
    email: String,
    password_hash: String,
    name: String,
    #[sqlx(try_from = "String")]
    role: UserRole,
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.name.is_none()
            && self.role.is_none()
            && self.password_hash.is_none()
    }
}

fn email_conflict(err: sqlx::Error) -> CourseHubError {
    match CourseHubError::from(err) {
        CourseHubError::Conflict(_) => {
            CourseHubError::conflict("User with this email already exists")
        }
        other => other,
    }
}

/// Repository for user operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user; duplicate emails are a conflict.
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
        role: UserRole,
    ) -> Result<UserRecord> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, role, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(role.as_str())
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(email_conflict)?;

        Ok(UserRecord {
            id,
            email: email.to_string(),
            name: name.to_string(),
            role,
            created_at: now,
        })
    }

    pub async fn get(&self, id: &str) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, name, role, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_identity(&self, id: &str) -> Result<Option<Identity>> {
        Ok(self.get(id).await?.map(|user| user.identity()))
    }

    pub async fn find_credentials(&self, email: &str) -> Result<Option<StoredCredentials>> {
        let row = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, email, password_hash, name, role FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| StoredCredentials {
            id: r.id,
            email: r.email,
            password_hash: r.password_hash,
            name: r.name,
            role: r.role,
        }))
    }

    /// Page through users, newest first, optionally filtered by name/email and role.
    pub async fn list(&self, query: &ListQuery) -> Result<(Vec<UserRecord>, Pagination)> {
        let window = query.window();
        let pattern = query.search_pattern();
        let role = query
            .role
            .as_deref()
            .and_then(|r| r.parse::<UserRole>().ok());

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM users WHERE 1 = 1");
        let mut select = QueryBuilder::<Sqlite>::new(
            "SELECT id, email, name, role, created_at FROM users WHERE 1 = 1",
        );

        for builder in [&mut count, &mut select] {
            if let Some(ref pattern) = pattern {
                builder
                    .push(" AND (name LIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR email LIKE ")
                    .push_bind(pattern.clone())
                    .push(")");
            }
            if let Some(role) = role {
                builder.push(" AND role = ").push_bind(role.as_str());
            }
        }

        let total: i64 = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        select
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(window.limit())
            .push(" OFFSET ")
            .push_bind(window.offset());
        let users = select
            .build_query_as::<UserRecord>()
            .fetch_all(self.pool)
            .await?;

        Ok((users, Pagination::new(window, total)))
    }

    /// Apply a partial update; `Ok(None)` when the user does not exist.
    pub async fn update(&self, id: &str, changes: &UserChanges) -> Result<Option<UserRecord>> {
        if changes.is_empty() {
            return self.get(id).await;
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE users SET ");
        let mut fields = builder.separated(", ");
        if let Some(ref email) = changes.email {
            fields.push("email = ").push_bind_unseparated(email.clone());
        }
        if let Some(ref name) = changes.name {
            fields.push("name = ").push_bind_unseparated(name.clone());
        }
        if let Some(role) = changes.role {
            fields.push("role = ").push_bind_unseparated(role.as_str());
        }
        if let Some(ref hash) = changes.password_hash {
            fields.push("password_hash = ").push_bind_unseparated(hash.clone());
        }
        builder.push(" WHERE id = ").push_bind(id);

        let result = builder
            .build()
            .execute(self.pool)
            .await
            .map_err(email_conflict)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    /// Delete a user; `false` when no row matched.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::UserChanges;
    use crate::auth::user::UserRole;
    use crate::error::CourseHubError;
    use crate::storage::pagination::ListQuery;
    use crate::storage::Database;

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = Database::connect(":memory:").await.unwrap();
        let user = db
            .users()
            .create("a@x.com", "hash", "Admin", UserRole::Admin)
            .await
            .unwrap();

        let identity = db.users().find_identity(&user.id).await.unwrap().unwrap();
        assert_eq!(identity.email, "a@x.com");
        assert_eq!(identity.role, UserRole::Admin);

        let creds = db.users().find_credentials("a@x.com").await.unwrap().unwrap();
        assert_eq!(creds.password_hash, "hash");
        assert!(db.users().find_credentials("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let db = Database::connect(":memory:").await.unwrap();
        db.users().create("a@x.com", "h", "A", UserRole::Student).await.unwrap();
        let err = db
            .users()
            .create("a@x.com", "h", "B", UserRole::Teacher)
            .await
            .unwrap_err();
        assert!(matches!(err, CourseHubError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_filters_and_paginates() {
        let db = Database::connect(":memory:").await.unwrap();
        for i in 0..5 {
            db.users()
                .create(&format!("s{}@x.com", i), "h", &format!("Student {}", i), UserRole::Student)
                .await
                .unwrap();
        }
        db.users().create("t@x.com", "h", "Teacher", UserRole::Teacher).await.unwrap();

        let query = ListQuery {
            page: Some(1),
            per_page: Some(2),
            role: Some("student".to_string()),
            ..Default::default()
        };
        let (users, pagination) = db.users().list(&query).await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(pagination.total, 5);
        assert_eq!(pagination.total_pages, 3);
        assert!(users.iter().all(|u| u.role == UserRole::Student));

        let query = ListQuery {
            search: Some("teach".to_string()),
            ..Default::default()
        };
        let (users, _) = db.users().list(&query).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, "t@x.com");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = Database::connect(":memory:").await.unwrap();
        let user = db.users().create("a@x.com", "h", "A", UserRole::Student).await.unwrap();

        let changes = UserChanges {
            role: Some(UserRole::Teacher),
            ..Default::default()
        };
        let updated = db.users().update(&user.id, &changes).await.unwrap().unwrap();
        assert_eq!(updated.role, UserRole::Teacher);

        assert!(db.users().update("missing", &changes).await.unwrap().is_none());
        assert!(db.users().delete(&user.id).await.unwrap());
        assert!(!db.users().delete(&user.id).await.unwrap());
    }
}

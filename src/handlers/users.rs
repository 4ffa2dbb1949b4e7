//! Admin-only user management

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Rejection;

use super::{json_response, non_empty};
use crate::auth::password::{hash_password, validate_password};
use crate::auth::user::{Identity, UserRole};
use crate::error::CourseHubError;
use crate::security_logger::{log_security_event, SecurityEvent};
use crate::server::AppState;
use crate::storage::users::UserChanges;
use crate::storage::ListQuery;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
}

impl UpdateUserRequest {
    /// Validate and turn the request into column changes
    fn into_changes(self) -> Result<UserChanges, CourseHubError> {
        let mut changes = UserChanges::default();

        if let Some(email) = self.email {
            changes.email = Some(
                non_empty(Some(email)).ok_or_else(|| CourseHubError::validation("Email cannot be empty"))?,
            );
        }
        if let Some(name) = self.name {
            changes.name = Some(
                non_empty(Some(name)).ok_or_else(|| CourseHubError::validation("Name cannot be empty"))?,
            );
        }
        if let Some(role) = self.role {
            changes.role = Some(role.parse::<UserRole>()?);
        }
        if let Some(password) = self.password {
            validate_password(&password)?;
            changes.password_hash = Some(hash_password(&password)?);
        }

        if changes.is_empty() {
            return Err(CourseHubError::validation("No fields to update"));
        }
        Ok(changes)
    }
}

/// GET /api/users/
pub async fn list_users(_admin: Identity, query: ListQuery, state: AppState) -> Result<Response, Rejection> {
    let (users, pagination) = state.db.users().list(&query).await?;
    Ok(json_response(
        StatusCode::OK,
        &json!({ "users": users, "pagination": pagination }),
    ))
}

/// GET /api/users/{id}
pub async fn get_user(id: Uuid, _admin: Identity, state: AppState) -> Result<Response, Rejection> {
    let user = state
        .db
        .users()
        .get(&id.to_string())
        .await?
        .ok_or_else(|| CourseHubError::not_found("User not found"))?;
    Ok(json_response(StatusCode::OK, &user))
}

/// POST /api/users/
pub async fn create_user(
    admin: Identity,
    body: CreateUserRequest,
    state: AppState,
) -> Result<Response, Rejection> {
    let (Some(email), Some(name), Some(role), Some(password)) = (
        non_empty(body.email),
        non_empty(body.name),
        non_empty(body.role),
        body.password,
    ) else {
        return Err(CourseHubError::validation("Email, name, role, and password are required").into());
    };

    let role = role.parse::<UserRole>()?;
    validate_password(&password)?;
    let hash = hash_password(&password)?;

    let user = state.db.users().create(&email, &hash, &name, role).await?;
    log_security_event(SecurityEvent::AccountChanged {
        actor_id: admin.id,
        target_id: user.id.clone(),
        change: format!("created as {}", role),
    });

    Ok(json_response(
        StatusCode::CREATED,
        &json!({ "id": user.id, "message": "User created successfully", "user": user }),
    ))
}

/// PUT /api/users/{id}
pub async fn update_user(
    id: Uuid,
    admin: Identity,
    body: UpdateUserRequest,
    state: AppState,
) -> Result<Response, Rejection> {
    let id = id.to_string();
    if state.db.users().get(&id).await?.is_none() {
        return Err(CourseHubError::not_found("User not found").into());
    }

    let changes = body.into_changes()?;
    let user = state
        .db
        .users()
        .update(&id, &changes)
        .await?
        .ok_or_else(|| CourseHubError::not_found("User not found"))?;

    if let Some(role) = changes.role {
        log_security_event(SecurityEvent::AccountChanged {
            actor_id: admin.id,
            target_id: id.clone(),
            change: format!("role set to {}", role),
        });
    }

    Ok(json_response(
        StatusCode::OK,
        &json!({ "id": id, "message": "User updated successfully", "user": user }),
    ))
}

/// DELETE /api/users/{id}
pub async fn delete_user(id: Uuid, admin: Identity, state: AppState) -> Result<Response, Rejection> {
    let id = id.to_string();
    if !state.db.users().delete(&id).await? {
        return Err(CourseHubError::not_found("User not found").into());
    }

    log_security_event(SecurityEvent::AccountChanged {
        actor_id: admin.id,
        target_id: id.clone(),
        change: "deleted".to_string(),
    });

    Ok(json_response(
        StatusCode::OK,
        &json!({ "id": id, "message": "User deleted successfully" }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_update_is_rejected() {
        let err = UpdateUserRequest::default().into_changes().unwrap_err();
        assert!(matches!(err, CourseHubError::ValidationError(_)));
    }

    #[test]
    fn test_update_validates_fields() {
        let bad_role = UpdateUserRequest {
            role: Some("root".to_string()),
            ..Default::default()
        };
        assert!(bad_role.into_changes().is_err());

        let short_password = UpdateUserRequest {
            password: Some("123".to_string()),
            ..Default::default()
        };
        assert!(short_password.into_changes().is_err());

        let ok = UpdateUserRequest {
            name: Some(" New Name ".to_string()),
            role: Some("teacher".to_string()),
            ..Default::default()
        };
        let changes = ok.into_changes().unwrap();
        assert_eq!(changes.name.as_deref(), Some("New Name"));
        assert_eq!(changes.role, Some(UserRole::Teacher));
    }
}

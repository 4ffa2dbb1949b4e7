//! Course endpoints

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Rejection;

use super::{json_response, non_empty};
use crate::auth::policy::{authorize, course_teacher_for_create, Action, Resource};
use crate::auth::user::Identity;
use crate::error::{CourseHubError, Result};
use crate::server::AppState;
use crate::storage::courses::CourseFields;
use crate::storage::ListQuery;

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_published: Option<bool>,
    pub teacher_id: Option<String>,
}

/// Partial course update; omitted fields keep their stored values
#[derive(Debug, Deserialize)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_published: Option<bool>,
    pub teacher_id: Option<String>,
}

/// A course can only be assigned to an existing teacher or admin
async fn ensure_assignable_teacher(state: &AppState, teacher_id: &str) -> Result<()> {
    match state.db.users().get(teacher_id).await? {
        Some(user) if user.role.is_staff() => Ok(()),
        _ => Err(CourseHubError::validation(
            "teacher_id must reference an existing teacher or admin",
        )),
    }
}

/// GET /api/courses/
pub async fn list_courses(
    viewer: Option<Identity>,
    query: ListQuery,
    state: AppState,
) -> std::result::Result<Response, Rejection> {
    let (courses, pagination) = state.db.courses().list(viewer.as_ref(), &query).await?;
    Ok(json_response(
        StatusCode::OK,
        &json!({ "courses": courses, "pagination": pagination }),
    ))
}

/// GET /api/courses/{id}
pub async fn get_course(
    id: Uuid,
    viewer: Option<Identity>,
    state: AppState,
) -> std::result::Result<Response, Rejection> {
    let course = state
        .db
        .courses()
        .get(&id.to_string())
        .await?
        .ok_or_else(|| CourseHubError::not_found("Course not found"))?;

    authorize(
        viewer.as_ref(),
        Action::ViewCourse,
        &Resource::Course {
            teacher_id: &course.teacher_id,
            is_published: course.is_published,
        },
    )?;

    Ok(json_response(StatusCode::OK, &course))
}

/// POST /api/courses/
pub async fn create_course(
    identity: Identity,
    body: CreateCourseRequest,
    state: AppState,
) -> std::result::Result<Response, Rejection> {
    authorize(Some(&identity), Action::CreateCourse, &Resource::None)?;

    let teacher_id = course_teacher_for_create(&identity, body.teacher_id.as_deref())?;
    let title = non_empty(body.title).ok_or_else(|| CourseHubError::validation("Title is required"))?;
    if teacher_id != identity.id {
        ensure_assignable_teacher(&state, &teacher_id).await?;
    }

    let course = state
        .db
        .courses()
        .create(&CourseFields {
            teacher_id,
            title,
            description: body.description.unwrap_or_default(),
            is_published: body.is_published.unwrap_or(false),
        })
        .await?;
    log::info!("Course {} created by {}", course.id, identity.id);

    Ok(json_response(
        StatusCode::CREATED,
        &json!({ "id": course.id, "message": "Course created successfully", "course": course }),
    ))
}

/// PUT /api/courses/{id}
pub async fn update_course(
    id: Uuid,
    identity: Identity,
    body: UpdateCourseRequest,
    state: AppState,
) -> std::result::Result<Response, Rejection> {
    let id = id.to_string();
    let existing = state
        .db
        .courses()
        .get(&id)
        .await?
        .ok_or_else(|| CourseHubError::not_found("Course not found"))?;

    authorize(
        Some(&identity),
        Action::UpdateCourse,
        &Resource::Course {
            teacher_id: &existing.teacher_id,
            is_published: existing.is_published,
        },
    )?;

    // Only admins may hand a course to another teacher
    let teacher_id = match non_empty(body.teacher_id) {
        Some(requested) if identity.is_admin() && requested != existing.teacher_id => {
            ensure_assignable_teacher(&state, &requested).await?;
            requested
        }
        _ => existing.teacher_id.clone(),
    };

    let title = match body.title {
        Some(title) => non_empty(Some(title))
            .ok_or_else(|| CourseHubError::validation("Title cannot be empty"))?,
        None => existing.title,
    };

    let fields = CourseFields {
        teacher_id,
        title,
        description: body.description.unwrap_or(existing.description),
        is_published: body.is_published.unwrap_or(existing.is_published),
    };

    if !state.db.courses().update(&id, &fields).await? {
        return Err(CourseHubError::not_found("Course not found").into());
    }
    let course = state.db.courses().get(&id).await?;

    Ok(json_response(
        StatusCode::OK,
        &json!({ "id": id, "message": "Course updated successfully", "course": course }),
    ))
}

/// DELETE /api/courses/{id}
pub async fn delete_course(
    id: Uuid,
    identity: Identity,
    state: AppState,
) -> std::result::Result<Response, Rejection> {
    let id = id.to_string();
    let ownership = state
        .db
        .courses()
        .ownership(&id)
        .await?
        .ok_or_else(|| CourseHubError::not_found("Course not found"))?;

    authorize(
        Some(&identity),
        Action::DeleteCourse,
        &Resource::Course {
            teacher_id: &ownership.teacher_id,
            is_published: ownership.is_published,
        },
    )?;

    if !state.db.courses().delete(&id).await? {
        return Err(CourseHubError::not_found("Course not found").into());
    }
    log::info!("Course {} deleted by {}", id, identity.id);

    Ok(json_response(
        StatusCode::OK,
        &json!({ "id": id, "message": "Course deleted successfully" }),
    ))
}

//! Enrollment endpoints

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Rejection;

use super::{json_response, non_empty};
use crate::auth::policy::{allowed, authorize, Action, Resource};
use crate::auth::user::Identity;
use crate::error::{CourseHubError, Result};
use crate::server::AppState;
use crate::storage::enrollments::EnrollmentRecord;

#[derive(Debug, Deserialize)]
pub struct EnrollmentRequest {
    pub course_id: Option<String>,
}

/// Load an enrollment and check the caller may manage it
async fn owned_enrollment(state: &AppState, identity: &Identity, id: &str) -> Result<EnrollmentRecord> {
    let enrollment = state
        .db
        .enrollments()
        .get(id)
        .await?
        .ok_or_else(|| CourseHubError::not_found("Enrollment not found"))?;

    authorize(
        Some(identity),
        Action::ManageEnrollment,
        &Resource::Enrollment {
            student_id: &enrollment.student_id,
        },
    )?;
    Ok(enrollment)
}

/// GET /api/enrollments/
pub async fn list_enrollments(identity: Identity, state: AppState) -> std::result::Result<Response, Rejection> {
    let scope = if allowed(Some(&identity), Action::ListAllEnrollments, &Resource::None) {
        None
    } else {
        Some(identity.id.as_str())
    };
    let enrollments = state.db.enrollments().list(scope).await?;
    Ok(json_response(StatusCode::OK, &enrollments))
}

/// GET /api/enrollments/my-courses
pub async fn my_courses(identity: Identity, state: AppState) -> std::result::Result<Response, Rejection> {
    authorize(Some(&identity), Action::ViewOwnEnrollments, &Resource::None)?;
    let courses = state.db.enrollments().courses_for_student(&identity.id).await?;
    Ok(json_response(StatusCode::OK, &courses))
}

/// GET /api/enrollments/check/{course_id}
pub async fn check_enrollment(
    course_id: Uuid,
    identity: Identity,
    state: AppState,
) -> std::result::Result<Response, Rejection> {
    let enrollment = state
        .db
        .enrollments()
        .find(&identity.id, &course_id.to_string())
        .await?;

    Ok(json_response(
        StatusCode::OK,
        &json!({
            "enrolled": enrollment.is_some(),
            "enrollment_id": enrollment.map(|e| e.id),
        }),
    ))
}

/// POST /api/enrollments/ (enroll the caller)
pub async fn create_enrollment(
    identity: Identity,
    body: EnrollmentRequest,
    state: AppState,
) -> std::result::Result<Response, Rejection> {
    let course_id =
        non_empty(body.course_id).ok_or_else(|| CourseHubError::validation("course_id is required"))?;

    let course = state
        .db
        .courses()
        .ownership(&course_id)
        .await?
        .ok_or_else(|| CourseHubError::not_found("Course not found"))?;

    authorize(
        Some(&identity),
        Action::EnrollSelf,
        &Resource::Course {
            teacher_id: &course.teacher_id,
            is_published: course.is_published,
        },
    )?;

    let enrollment = state.db.enrollments().create(&identity.id, &course_id).await?;
    log::info!("Student {} enrolled in {}", identity.id, course_id);

    Ok(json_response(
        StatusCode::CREATED,
        &json!({
            "id": enrollment.id,
            "message": "Enrolled successfully",
            "enrollment": enrollment,
        }),
    ))
}

/// GET /api/enrollments/{id}
pub async fn get_enrollment(id: Uuid, identity: Identity, state: AppState) -> std::result::Result<Response, Rejection> {
    let enrollment = owned_enrollment(&state, &identity, &id.to_string()).await?;
    Ok(json_response(StatusCode::OK, &enrollment))
}

/// PUT /api/enrollments/{id} (move the enrollment to another course)
pub async fn update_enrollment(
    id: Uuid,
    identity: Identity,
    body: EnrollmentRequest,
    state: AppState,
) -> std::result::Result<Response, Rejection> {
    let id = id.to_string();
    let enrollment = owned_enrollment(&state, &identity, &id).await?;

    let course_id =
        non_empty(body.course_id).ok_or_else(|| CourseHubError::validation("course_id is required"))?;
    let course = state
        .db
        .courses()
        .ownership(&course_id)
        .await?
        .ok_or_else(|| CourseHubError::not_found("Course not found"))?;
    if !course.is_published {
        return Err(CourseHubError::forbidden("Course is not open for enrollment").into());
    }

    if !state.db.enrollments().update_course(&enrollment.id, &course_id).await? {
        return Err(CourseHubError::not_found("Enrollment not found").into());
    }
    let updated = state.db.enrollments().get(&id).await?;

    Ok(json_response(
        StatusCode::OK,
        &json!({ "id": id, "message": "Enrollment updated successfully", "enrollment": updated }),
    ))
}

/// DELETE /api/enrollments/{id}
pub async fn delete_enrollment(
    id: Uuid,
    identity: Identity,
    state: AppState,
) -> std::result::Result<Response, Rejection> {
    let id = id.to_string();
    owned_enrollment(&state, &identity, &id).await?;

    if !state.db.enrollments().delete(&id).await? {
        return Err(CourseHubError::not_found("Enrollment not found").into());
    }

    Ok(json_response(
        StatusCode::OK,
        &json!({ "id": id, "message": "Enrollment deleted successfully" }),
    ))
}

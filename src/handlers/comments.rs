//! Comment and like endpoints

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Rejection;

use super::{json_response, non_empty};
use crate::auth::policy::{authorize, Action, Resource};
use crate::auth::user::Identity;
use crate::error::{CourseHubError, Result};
use crate::server::AppState;
use crate::storage::comments::{CommentTarget, NewComment};

#[derive(Debug, Default, Deserialize)]
pub struct CommentQuery {
    pub file_id: Option<String>,
    pub course_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub file_id: Option<String>,
    pub course_id: Option<String>,
    pub parent_id: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub comment: Option<String>,
}

/// Load a comment's author and check the caller wrote it
async fn authored_comment(state: &AppState, identity: &Identity, id: &str, action: Action) -> Result<()> {
    let author = state
        .db
        .comments()
        .author(id)
        .await?
        .ok_or_else(|| CourseHubError::not_found("Comment not found"))?;

    authorize(Some(identity), action, &Resource::Comment { user_id: &author })
}

/// GET /api/comments/
pub async fn list_comments(
    identity: Identity,
    query: CommentQuery,
    state: AppState,
) -> std::result::Result<Response, Rejection> {
    authorize(Some(&identity), Action::ViewComments, &Resource::None)?;

    let comments = match (non_empty(query.file_id), non_empty(query.course_id)) {
        (Some(file_id), _) => state.db.comments().list(Some(&file_id), &identity.id).await?,
        (None, Some(course_id)) => match state.db.files().find_discussion(&course_id).await? {
            Some(thread) => state.db.comments().list(Some(&thread), &identity.id).await?,
            None => Vec::new(),
        },
        (None, None) => state.db.comments().list(None, &identity.id).await?,
    };

    Ok(json_response(StatusCode::OK, &json!({ "comments": comments })))
}

/// GET /api/comments/{id}
pub async fn get_comment(id: Uuid, identity: Identity, state: AppState) -> std::result::Result<Response, Rejection> {
    let comment = state
        .db
        .comments()
        .get(&id.to_string(), &identity.id)
        .await?
        .ok_or_else(|| CourseHubError::not_found("Comment not found"))?;
    Ok(json_response(StatusCode::OK, &comment))
}

/// POST /api/comments/
///
/// Comments attach to a file, or to the course's discussion thread when only a course is given.
pub async fn create_comment(
    identity: Identity,
    body: CreateCommentRequest,
    state: AppState,
) -> std::result::Result<Response, Rejection> {
    authorize(Some(&identity), Action::CreateComment, &Resource::None)?;

    let text = non_empty(body.comment).ok_or_else(|| CourseHubError::validation("Comment text is required"))?;

    let target = match (non_empty(body.file_id), non_empty(body.course_id)) {
        (Some(file_id), _) => {
            if state.db.files().get(&file_id).await?.is_none() {
                return Err(CourseHubError::not_found("File not found").into());
            }
            CommentTarget::File(file_id)
        }
        (None, Some(course_id)) => {
            if state.db.courses().ownership(&course_id).await?.is_none() {
                return Err(CourseHubError::not_found("Course not found").into());
            }
            CommentTarget::Course(course_id)
        }
        (None, None) => {
            return Err(CourseHubError::validation("file_id or course_id is required").into());
        }
    };

    let comment = state
        .db
        .comments()
        .create(
            &target,
            &NewComment {
                user_id: identity.id.clone(),
                parent_id: non_empty(body.parent_id),
                comment: text,
            },
        )
        .await?;

    Ok(json_response(
        StatusCode::CREATED,
        &json!({ "id": comment.id, "message": "Comment created successfully", "comment": comment }),
    ))
}

/// PUT /api/comments/{id}
pub async fn update_comment(
    id: Uuid,
    identity: Identity,
    body: UpdateCommentRequest,
    state: AppState,
) -> std::result::Result<Response, Rejection> {
    let id = id.to_string();
    authored_comment(&state, &identity, &id, Action::UpdateComment).await?;

    let text = non_empty(body.comment).ok_or_else(|| CourseHubError::validation("Comment text is required"))?;
    if !state.db.comments().update_text(&id, &text).await? {
        return Err(CourseHubError::not_found("Comment not found").into());
    }

    Ok(json_response(
        StatusCode::OK,
        &json!({ "id": id, "message": "Comment updated successfully" }),
    ))
}

/// DELETE /api/comments/{id}
pub async fn delete_comment(id: Uuid, identity: Identity, state: AppState) -> std::result::Result<Response, Rejection> {
    let id = id.to_string();
    authored_comment(&state, &identity, &id, Action::DeleteComment).await?;

    if !state.db.comments().delete(&id).await? {
        return Err(CourseHubError::not_found("Comment not found").into());
    }

    Ok(json_response(
        StatusCode::OK,
        &json!({ "id": id, "message": "Comment deleted successfully" }),
    ))
}

async fn ensure_comment_exists(state: &AppState, id: &str) -> Result<()> {
    match state.db.comments().author(id).await? {
        Some(_) => Ok(()),
        None => Err(CourseHubError::not_found("Comment not found")),
    }
}

/// POST /api/comments/{id}/like
pub async fn like_comment(id: Uuid, identity: Identity, state: AppState) -> std::result::Result<Response, Rejection> {
    let id = id.to_string();
    authorize(Some(&identity), Action::LikeComment, &Resource::None)?;
    ensure_comment_exists(&state, &id).await?;

    let likes = state.db.comments().like(&id, &identity.id).await?;
    Ok(json_response(
        StatusCode::OK,
        &json!({ "message": "Like added successfully", "likes": likes }),
    ))
}

/// DELETE /api/comments/{id}/like
pub async fn unlike_comment(id: Uuid, identity: Identity, state: AppState) -> std::result::Result<Response, Rejection> {
    let id = id.to_string();
    authorize(Some(&identity), Action::LikeComment, &Resource::None)?;
    ensure_comment_exists(&state, &id).await?;

    let likes = state.db.comments().unlike(&id, &identity.id).await?;
    Ok(json_response(
        StatusCode::OK,
        &json!({ "message": "Like removed successfully", "likes": likes }),
    ))
}

//! Course file endpoints, including multipart uploads into the blob store

use futures_util::TryStreamExt;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use warp::http::StatusCode;
use warp::multipart::{FormData, Part};
use warp::reply::Response;
use warp::{Buf, Rejection};

use super::{json_response, non_empty};
use crate::auth::user::Identity;
use crate::constants::DISCUSSION_FILE_TYPE;
use crate::error::{CourseHubError, Result};
use crate::server::AppState;
use crate::storage::files::FileFields;

const DEFAULT_UPLOAD_FILE_TYPE: &str = "document";

#[derive(Debug, Default, Deserialize)]
pub struct FileQuery {
    pub course_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateFileRequest {
    pub course_id: Option<String>,
    pub title: Option<String>,
    pub file_type: Option<String>,
    pub file_url: Option<String>,
    pub file_order: Option<i64>,
}

/// Partial file update; omitted fields keep their stored values
#[derive(Debug, Deserialize)]
pub struct UpdateFileRequest {
    pub course_id: Option<String>,
    pub title: Option<String>,
    pub file_type: Option<String>,
    pub file_url: Option<String>,
    pub file_order: Option<i64>,
}

/// The discussion type is reserved for the course thread the comment store creates
fn client_file_type(file_type: String) -> Result<String> {
    if file_type.eq_ignore_ascii_case(DISCUSSION_FILE_TYPE) {
        return Err(CourseHubError::validation(format!(
            "file_type '{}' is reserved",
            DISCUSSION_FILE_TYPE
        )));
    }
    Ok(file_type)
}

async fn ensure_course_exists(state: &AppState, course_id: &str) -> Result<()> {
    match state.db.courses().ownership(course_id).await? {
        Some(_) => Ok(()),
        None => Err(CourseHubError::not_found("Course not found")),
    }
}

/// GET /api/files/
pub async fn list_files(_identity: Identity, query: FileQuery, state: AppState) -> std::result::Result<Response, Rejection> {
    let course_id = non_empty(query.course_id);
    let files = state.db.files().list(course_id.as_deref()).await?;
    Ok(json_response(StatusCode::OK, &json!({ "files": files })))
}

/// GET /api/files/{id}
pub async fn get_file(id: Uuid, _identity: Identity, state: AppState) -> std::result::Result<Response, Rejection> {
    let file = state
        .db
        .files()
        .get(&id.to_string())
        .await?
        .ok_or_else(|| CourseHubError::not_found("File not found"))?;
    Ok(json_response(StatusCode::OK, &file))
}

/// POST /api/files/ (register an externally hosted file)
pub async fn create_file(
    _identity: Identity,
    body: CreateFileRequest,
    state: AppState,
) -> std::result::Result<Response, Rejection> {
    let (Some(course_id), Some(title), Some(file_type), Some(file_url)) = (
        non_empty(body.course_id),
        non_empty(body.title),
        non_empty(body.file_type),
        non_empty(body.file_url),
    ) else {
        return Err(CourseHubError::validation(
            "course_id, title, file_type, and file_url are required",
        )
        .into());
    };

    let file_type = client_file_type(file_type)?;
    ensure_course_exists(&state, &course_id).await?;

    let file = state
        .db
        .files()
        .create(&FileFields {
            course_id,
            title,
            file_type,
            file_url,
            file_order: body.file_order.unwrap_or(0),
        })
        .await?;

    Ok(json_response(
        StatusCode::CREATED,
        &json!({ "id": file.id, "message": "File created successfully", "file": file }),
    ))
}

/// Fields collected from an upload form
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<(String, Vec<u8>)>,
    course_id: Option<String>,
    title: Option<String>,
    file_type: Option<String>,
    file_order: Option<String>,
}

async fn read_part(part: Part) -> Result<Vec<u8>> {
    part.stream()
        .try_fold(Vec::new(), |mut data, chunk| async move {
            data.extend_from_slice(chunk.chunk());
            Ok(data)
        })
        .await
        .map_err(|e| CourseHubError::validation(format!("Failed to read upload: {}", e)))
}

async fn read_text(part: Part) -> Result<String> {
    String::from_utf8(read_part(part).await?)
        .map_err(|_| CourseHubError::validation("Form fields must be valid UTF-8"))
}

async fn collect_form(mut form: FormData) -> Result<UploadForm> {
    let mut upload = UploadForm::default();

    while let Some(part) = form
        .try_next()
        .await
        .map_err(|e| CourseHubError::validation(format!("Invalid multipart body: {}", e)))?
    {
        let name = part.name().to_string();
        match name.as_str() {
            "file" => {
                let filename = part.filename().unwrap_or_default().to_string();
                let data = read_part(part).await?;
                upload.file = Some((filename, data));
            }
            "course_id" => upload.course_id = Some(read_text(part).await?),
            "title" => upload.title = Some(read_text(part).await?),
            "file_type" => upload.file_type = Some(read_text(part).await?),
            "file_order" => upload.file_order = Some(read_text(part).await?),
            other => log::debug!("Ignoring unexpected upload field '{}'", other),
        }
    }

    Ok(upload)
}

/// POST /api/files/upload
pub async fn upload_file(
    identity: Identity,
    form: FormData,
    state: AppState,
) -> std::result::Result<Response, Rejection> {
    let form = collect_form(form).await?;

    let Some((filename, data)) = form.file else {
        return Err(CourseHubError::validation("No file provided").into());
    };
    if filename.trim().is_empty() {
        return Err(CourseHubError::validation("No file selected").into());
    }
    let course_id =
        non_empty(form.course_id).ok_or_else(|| CourseHubError::validation("Course ID is required"))?;
    let file_order = match non_empty(form.file_order) {
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| CourseHubError::validation("file_order must be an integer"))?,
        None => 0,
    };
    let file_type = match non_empty(form.file_type) {
        Some(file_type) => client_file_type(file_type)?,
        None => DEFAULT_UPLOAD_FILE_TYPE.to_string(),
    };

    ensure_course_exists(&state, &course_id).await?;

    let file_url = state.blobs.save(&filename, &data).await?;
    let fields = FileFields {
        course_id,
        title: non_empty(form.title).unwrap_or_else(|| filename.clone()),
        file_type,
        file_url: file_url.clone(),
        file_order,
    };

    let file = match state.db.files().create(&fields).await {
        Ok(file) => file,
        Err(e) => {
            // Do not leave an orphaned blob behind
            if let Err(cleanup) = state.blobs.delete(&file_url).await {
                log::warn!("Failed to remove orphaned upload {}: {}", file_url, cleanup);
            }
            return Err(e.into());
        }
    };
    log::info!(
        "User {} uploaded {} ({} bytes) to course {}",
        identity.id,
        file.file_url,
        data.len(),
        file.course_id
    );

    Ok(json_response(
        StatusCode::CREATED,
        &json!({
            "id": file.id,
            "message": "File uploaded successfully",
            "file_url": file.file_url,
            "file": file,
        }),
    ))
}

/// PUT /api/files/{id}
pub async fn update_file(
    id: Uuid,
    _identity: Identity,
    body: UpdateFileRequest,
    state: AppState,
) -> std::result::Result<Response, Rejection> {
    let id = id.to_string();
    let existing = state
        .db
        .files()
        .get(&id)
        .await?
        .ok_or_else(|| CourseHubError::not_found("File not found"))?;

    let course_id = non_empty(body.course_id).unwrap_or(existing.course_id);
    let fields = FileFields {
        title: non_empty(body.title).unwrap_or(existing.title),
        file_type: match non_empty(body.file_type) {
            Some(file_type) => client_file_type(file_type)?,
            None => existing.file_type,
        },
        file_url: non_empty(body.file_url).unwrap_or(existing.file_url),
        file_order: body.file_order.unwrap_or(existing.file_order),
        course_id,
    };
    ensure_course_exists(&state, &fields.course_id).await?;

    let file = state
        .db
        .files()
        .update(&id, &fields)
        .await?
        .ok_or_else(|| CourseHubError::not_found("File not found"))?;

    Ok(json_response(
        StatusCode::OK,
        &json!({ "id": id, "message": "File updated successfully", "file": file }),
    ))
}

/// DELETE /api/files/{id}
pub async fn delete_file(id: Uuid, identity: Identity, state: AppState) -> std::result::Result<Response, Rejection> {
    let removed = state
        .db
        .files()
        .delete(&id.to_string())
        .await?
        .ok_or_else(|| CourseHubError::not_found("File not found"))?;

    if state.blobs.owns(&removed.file_url) {
        if let Err(e) = state.blobs.delete(&removed.file_url).await {
            log::warn!("File {} removed but its blob was not: {}", removed.id, e);
        }
    }
    log::info!("File {} deleted by {}", removed.id, identity.id);

    Ok(json_response(
        StatusCode::OK,
        &json!({ "id": removed.id, "message": "File deleted successfully" }),
    ))
}

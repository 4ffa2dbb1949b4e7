//! Route tree for the HTTP API.
//!
//! Each filter chain is ordered path, method, identity, body, state, so a request
//! only resolves credentials once it is known to target that route.

use serde::de::DeserializeOwned;
use std::convert::Infallible;
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::reply::{Reply, Response};
use warp::{Filter, Rejection};
use uuid::Uuid;

use crate::auth::guard::{optional_identity, require_identity, require_role};
use crate::auth::user::UserRole;
use crate::constants::MAX_JSON_BODY_BYTES;
use crate::handlers::{self, auth, comments, courses, enrollments, files, users};
use crate::security::{with_api_security_headers, with_upload_security_headers};
use crate::server::{with_state, AppState};

const STAFF: &[UserRole] = &[UserRole::Teacher, UserRole::Admin];
const ADMIN: &[UserRole] = &[UserRole::Admin];

/// Size-limited JSON request body
fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_JSON_BODY_BYTES).and(warp::body::json())
}

fn auth_routes(state: &AppState) -> BoxedFilter<(Response,)> {
    let register = warp::path!("api" / "auth" / "register")
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(auth::register);

    let login = warp::path!("api" / "auth" / "login")
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(auth::login);

    let me = warp::path!("api" / "auth" / "me")
        .and(warp::get())
        .and(require_identity(state.resolver.clone()))
        .and_then(auth::me);

    let logout = warp::path!("api" / "auth" / "logout")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and_then(auth::logout);

    register.or(login).unify().or(me).unify().or(logout).unify().boxed()
}

fn user_routes(state: &AppState) -> BoxedFilter<(Response,)> {
    let admin = || require_role(state.resolver.clone(), ADMIN);

    let list = warp::path!("api" / "users")
        .and(warp::get())
        .and(admin())
        .and(warp::query())
        .and(with_state(state.clone()))
        .and_then(users::list_users);

    let create = warp::path!("api" / "users")
        .and(warp::post())
        .and(admin())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(users::create_user);

    let get = warp::path!("api" / "users" / Uuid)
        .and(warp::get())
        .and(admin())
        .and(with_state(state.clone()))
        .and_then(users::get_user);

    let update = warp::path!("api" / "users" / Uuid)
        .and(warp::put())
        .and(admin())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(users::update_user);

    let delete = warp::path!("api" / "users" / Uuid)
        .and(warp::delete())
        .and(admin())
        .and(with_state(state.clone()))
        .and_then(users::delete_user);

    list.or(create)
        .unify()
        .or(get)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .boxed()
}

fn course_routes(state: &AppState) -> BoxedFilter<(Response,)> {
    let list = warp::path!("api" / "courses")
        .and(warp::get())
        .and(optional_identity(state.resolver.clone()))
        .and(warp::query())
        .and(with_state(state.clone()))
        .and_then(courses::list_courses);

    let create = warp::path!("api" / "courses")
        .and(warp::post())
        .and(require_identity(state.resolver.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(courses::create_course);

    let get = warp::path!("api" / "courses" / Uuid)
        .and(warp::get())
        .and(optional_identity(state.resolver.clone()))
        .and(with_state(state.clone()))
        .and_then(courses::get_course);

    let update = warp::path!("api" / "courses" / Uuid)
        .and(warp::put())
        .and(require_identity(state.resolver.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(courses::update_course);

    let delete = warp::path!("api" / "courses" / Uuid)
        .and(warp::delete())
        .and(require_identity(state.resolver.clone()))
        .and(with_state(state.clone()))
        .and_then(courses::delete_course);

    list.or(create)
        .unify()
        .or(get)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .boxed()
}

fn file_routes(state: &AppState) -> BoxedFilter<(Response,)> {
    let staff = || require_role(state.resolver.clone(), STAFF);

    let list = warp::path!("api" / "files")
        .and(warp::get())
        .and(require_identity(state.resolver.clone()))
        .and(warp::query())
        .and(with_state(state.clone()))
        .and_then(files::list_files);

    let create = warp::path!("api" / "files")
        .and(warp::post())
        .and(staff())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(files::create_file);

    let upload = warp::path!("api" / "files" / "upload")
        .and(warp::post())
        .and(staff())
        .and(warp::multipart::form().max_length(state.config.max_upload_bytes))
        .and(with_state(state.clone()))
        .and_then(files::upload_file);

    let get = warp::path!("api" / "files" / Uuid)
        .and(warp::get())
        .and(require_identity(state.resolver.clone()))
        .and(with_state(state.clone()))
        .and_then(files::get_file);

    let update = warp::path!("api" / "files" / Uuid)
        .and(warp::put())
        .and(staff())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(files::update_file);

    let delete = warp::path!("api" / "files" / Uuid)
        .and(warp::delete())
        .and(staff())
        .and(with_state(state.clone()))
        .and_then(files::delete_file);

    list.or(create)
        .unify()
        .or(upload)
        .unify()
        .or(get)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .boxed()
}

fn enrollment_routes(state: &AppState) -> BoxedFilter<(Response,)> {
    let identity = || require_identity(state.resolver.clone());

    let list = warp::path!("api" / "enrollments")
        .and(warp::get())
        .and(identity())
        .and(with_state(state.clone()))
        .and_then(enrollments::list_enrollments);

    let create = warp::path!("api" / "enrollments")
        .and(warp::post())
        .and(identity())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(enrollments::create_enrollment);

    let my_courses = warp::path!("api" / "enrollments" / "my-courses")
        .and(warp::get())
        .and(identity())
        .and(with_state(state.clone()))
        .and_then(enrollments::my_courses);

    let check = warp::path!("api" / "enrollments" / "check" / Uuid)
        .and(warp::get())
        .and(identity())
        .and(with_state(state.clone()))
        .and_then(enrollments::check_enrollment);

    let get = warp::path!("api" / "enrollments" / Uuid)
        .and(warp::get())
        .and(identity())
        .and(with_state(state.clone()))
        .and_then(enrollments::get_enrollment);

    let update = warp::path!("api" / "enrollments" / Uuid)
        .and(warp::put())
        .and(identity())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(enrollments::update_enrollment);

    let delete = warp::path!("api" / "enrollments" / Uuid)
        .and(warp::delete())
        .and(identity())
        .and(with_state(state.clone()))
        .and_then(enrollments::delete_enrollment);

    list.or(create)
        .unify()
        .or(my_courses)
        .unify()
        .or(check)
        .unify()
        .or(get)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .boxed()
}

fn comment_routes(state: &AppState) -> BoxedFilter<(Response,)> {
    let identity = || require_identity(state.resolver.clone());

    let list = warp::path!("api" / "comments")
        .and(warp::get())
        .and(identity())
        .and(warp::query())
        .and(with_state(state.clone()))
        .and_then(comments::list_comments);

    let create = warp::path!("api" / "comments")
        .and(warp::post())
        .and(identity())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(comments::create_comment);

    let get = warp::path!("api" / "comments" / Uuid)
        .and(warp::get())
        .and(identity())
        .and(with_state(state.clone()))
        .and_then(comments::get_comment);

    let update = warp::path!("api" / "comments" / Uuid)
        .and(warp::put())
        .and(identity())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(comments::update_comment);

    let delete = warp::path!("api" / "comments" / Uuid)
        .and(warp::delete())
        .and(identity())
        .and(with_state(state.clone()))
        .and_then(comments::delete_comment);

    let like = warp::path!("api" / "comments" / Uuid / "like")
        .and(warp::post())
        .and(identity())
        .and(with_state(state.clone()))
        .and_then(comments::like_comment);

    let unlike = warp::path!("api" / "comments" / Uuid / "like")
        .and(warp::delete())
        .and(identity())
        .and(with_state(state.clone()))
        .and_then(comments::unlike_comment);

    list.or(create)
        .unify()
        .or(get)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .or(like)
        .unify()
        .or(unlike)
        .unify()
        .boxed()
}

/// Full route tree with JSON error recovery and request logging
pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let api = auth_routes(&state)
        .or(user_routes(&state))
        .unify()
        .or(course_routes(&state))
        .unify()
        .or(file_routes(&state))
        .unify()
        .or(enrollment_routes(&state))
        .unify()
        .or(comment_routes(&state))
        .unify()
        .map(|reply: Response| with_api_security_headers(reply));

    let uploads = warp::path("static")
        .and(warp::path("uploads"))
        .and(warp::get())
        .and(warp::fs::dir(state.config.upload_dir.clone()))
        .map(|file: warp::fs::File| with_upload_security_headers(file));

    let health = warp::path!("health")
        .and(warp::get())
        .and(with_state(state))
        .then(|state: AppState| async move {
            if state.db.health_check().await {
                warp::reply::with_status("OK", StatusCode::OK)
            } else {
                warp::reply::with_status("Database unavailable", StatusCode::SERVICE_UNAVAILABLE)
            }
        });

    api.or(uploads)
        .or(health)
        .recover(handlers::handle_rejection)
        .with(warp::log("coursehub::http"))
}

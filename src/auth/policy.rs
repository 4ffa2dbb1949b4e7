//! Access policy: a closed table mapping (identity, action, resource) to a decision.
//!
//! Ownership facts are passed in by the caller after a fresh lookup; the policy
//! itself never touches storage.

use std::fmt;

use super::user::{Identity, UserRole};
use crate::error::{CourseHubError, Result};
use crate::security_logger::{log_security_event, SecurityEvent};

/// Everything a caller can ask permission for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ViewCourse,
    CreateCourse,
    UpdateCourse,
    DeleteCourse,
    ViewFiles,
    ManageFiles,
    EnrollSelf,
    ViewOwnEnrollments,
    ListAllEnrollments,
    ManageEnrollment,
    ViewComments,
    CreateComment,
    UpdateComment,
    DeleteComment,
    LikeComment,
    ManageUsers,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ViewCourse => "view_course",
            Action::CreateCourse => "create_course",
            Action::UpdateCourse => "update_course",
            Action::DeleteCourse => "delete_course",
            Action::ViewFiles => "view_files",
            Action::ManageFiles => "manage_files",
            Action::EnrollSelf => "enroll_self",
            Action::ViewOwnEnrollments => "view_own_enrollments",
            Action::ListAllEnrollments => "list_all_enrollments",
            Action::ManageEnrollment => "manage_enrollment",
            Action::ViewComments => "view_comments",
            Action::CreateComment => "create_comment",
            Action::UpdateComment => "update_comment",
            Action::DeleteComment => "delete_comment",
            Action::LikeComment => "like_comment",
            Action::ManageUsers => "manage_users",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ownership facts about the target of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource<'a> {
    None,
    Course { teacher_id: &'a str, is_published: bool },
    Comment { user_id: &'a str },
    Enrollment { student_id: &'a str },
}

impl Resource<'_> {
    fn describe(&self) -> Option<String> {
        match self {
            Resource::None => None,
            Resource::Course { teacher_id, .. } => Some(format!("course of {}", teacher_id)),
            Resource::Comment { user_id } => Some(format!("comment by {}", user_id)),
            Resource::Enrollment { student_id } => Some(format!("enrollment of {}", student_id)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// No identity, and this action needs one
    AuthenticationRequired,
    /// Identity present but not permitted; carries the client-facing reason
    PermissionDenied(&'static str),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::AuthenticationRequired => Err(CourseHubError::AuthenticationRequired),
            Decision::PermissionDenied(reason) => Err(CourseHubError::forbidden(reason)),
        }
    }
}

const STAFF: &[UserRole] = &[UserRole::Teacher, UserRole::Admin];

fn staff_only(identity: &Identity) -> Decision {
    if identity.has_role(STAFF) {
        Decision::Allow
    } else {
        Decision::PermissionDenied("Teacher or admin access required")
    }
}

fn admin_or_owner(identity: &Identity, owner_id: &str) -> Decision {
    if identity.is_admin() || identity.id == owner_id {
        Decision::Allow
    } else {
        Decision::PermissionDenied("Permission denied")
    }
}

/// Evaluate one policy question
pub fn evaluate(identity: Option<&Identity>, action: Action, resource: &Resource<'_>) -> Decision {
    // Published courses are the only thing anonymous callers may see
    if let (Action::ViewCourse, Resource::Course { is_published: true, .. }) = (action, resource) {
        return Decision::Allow;
    }

    let Some(identity) = identity else {
        return Decision::AuthenticationRequired;
    };

    match (action, resource) {
        (Action::ViewCourse, Resource::Course { teacher_id, .. }) => {
            if identity.is_admin() || (identity.role == UserRole::Teacher && identity.id == *teacher_id) {
                Decision::Allow
            } else {
                Decision::PermissionDenied("Course not available")
            }
        }
        (Action::ViewCourse, _) => Decision::Allow,

        (Action::CreateCourse, _) | (Action::ManageFiles, _) => staff_only(identity),

        (Action::UpdateCourse | Action::DeleteCourse, resource) => match staff_only(identity) {
            Decision::Allow => match resource {
                Resource::Course { teacher_id, .. } => admin_or_owner(identity, teacher_id),
                _ => Decision::Allow,
            },
            denied => denied,
        },

        (Action::EnrollSelf, resource) => {
            if identity.role != UserRole::Student {
                return Decision::PermissionDenied("Only students can enroll in courses");
            }
            match resource {
                Resource::Course { is_published: false, .. } => {
                    Decision::PermissionDenied("Course is not open for enrollment")
                }
                _ => Decision::Allow,
            }
        }

        (Action::ListAllEnrollments, _) | (Action::ManageUsers, _) => {
            if identity.is_admin() {
                Decision::Allow
            } else {
                Decision::PermissionDenied("Admin access required")
            }
        }

        (Action::ManageEnrollment, Resource::Enrollment { student_id }) => {
            admin_or_owner(identity, student_id)
        }
        (Action::ManageEnrollment, _) => Decision::Allow,

        // Authors only; admins get no override on other people's words
        (Action::UpdateComment | Action::DeleteComment, Resource::Comment { user_id }) => {
            if identity.id == *user_id {
                Decision::Allow
            } else {
                Decision::PermissionDenied("Permission denied")
            }
        }

        (Action::ViewFiles, _)
        | (Action::ViewOwnEnrollments, _)
        | (Action::ViewComments, _)
        | (Action::CreateComment, _)
        | (Action::UpdateComment, _)
        | (Action::DeleteComment, _)
        | (Action::LikeComment, _) => Decision::Allow,
    }
}

/// Boolean form of `evaluate`
pub fn allowed(identity: Option<&Identity>, action: Action, resource: &Resource<'_>) -> bool {
    evaluate(identity, action, resource).is_allowed()
}

/// Evaluate and turn a refusal into the matching error, logging it as a security event
pub fn authorize(identity: Option<&Identity>, action: Action, resource: &Resource<'_>) -> Result<()> {
    let decision = evaluate(identity, action, resource);
    match (&decision, identity) {
        (Decision::PermissionDenied(_), Some(identity)) => {
            log_security_event(SecurityEvent::PermissionDenied {
                user_id: identity.id.clone(),
                action: action.to_string(),
                resource: resource.describe(),
            });
        }
        (Decision::AuthenticationRequired, _) => {
            log_security_event(SecurityEvent::UnauthorizedAccess {
                resource: action.to_string(),
            });
        }
        _ => {}
    }
    decision.into_result()
}

/// Teacher a new course belongs to.
///
/// Teachers always own what they create; admins must name the teacher explicitly.
pub fn course_teacher_for_create(identity: &Identity, requested: Option<&str>) -> Result<String> {
    match identity.role {
        UserRole::Teacher => Ok(identity.id.clone()),
        UserRole::Admin => requested
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| CourseHubError::validation("teacher_id is required for admin")),
        UserRole::Student => Err(CourseHubError::forbidden("Teacher or admin access required")),
    }
}

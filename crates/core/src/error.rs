//! Domain errors for group operations.

use std::fmt;

use potluck_common::AppError;
use thiserror::Error;

/// Result type for group services.
pub type GroupResult<T> = Result<T, GroupError>;

/// Member-only action a non-member attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberAction {
    Post,
    Like,
    Unlike,
    Comment,
}

impl fmt::Display for MemberAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self {
            Self::Post => "post",
            Self::Like => "like posts",
            Self::Unlike => "unlike posts",
            Self::Comment => "comment on posts",
        };
        f.write_str(action)
    }
}

/// Failures of the group lifecycle and post services.
#[derive(Debug, Error)]
pub enum GroupError {
    #[error("Group not found")]
    GroupNotFound,

    #[error("Post not found")]
    PostNotFound,

    #[error("Comment not found")]
    CommentNotFound,

    #[error("Join request not found")]
    RequestNotFound,

    #[error("Post does not belong to this group")]
    PostNotInGroup,

    #[error("Only group members can {0}")]
    NotMember(MemberAction),

    #[error("Only admins can post in this group")]
    AdminsOnly,

    #[error("Admin privileges required")]
    NotAdmin,

    #[error("Only group creator can delete the group")]
    NotCreator,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("User is already a member of this group")]
    AlreadyMember,

    #[error("Join request already pending")]
    AlreadyPending,

    #[error("No pending request found for this user")]
    NoPendingRequest,

    #[error("Already liked this post")]
    AlreadyLiked,

    #[error("Post not liked yet")]
    NotLiked,

    #[error("Group creator cannot leave the group")]
    CreatorCannotLeave,

    #[error("Recipe title is required")]
    TitleRequired,

    #[error("User ID is required")]
    CallerRequired,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    App(#[from] AppError),
}

impl From<validator::ValidationErrors> for GroupError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<GroupError> for AppError {
    fn from(err: GroupError) -> Self {
        let message = err.to_string();
        match err {
            GroupError::GroupNotFound
            | GroupError::PostNotFound
            | GroupError::CommentNotFound
            | GroupError::RequestNotFound => Self::NotFound(message),

            GroupError::NotMember(_)
            | GroupError::AdminsOnly
            | GroupError::NotAdmin
            | GroupError::NotCreator
            | GroupError::PermissionDenied => Self::Forbidden(message),

            GroupError::AlreadyMember | GroupError::AlreadyPending | GroupError::AlreadyLiked => {
                Self::Conflict(message)
            }

            GroupError::PostNotInGroup
            | GroupError::NoPendingRequest
            | GroupError::NotLiked
            | GroupError::CreatorCannotLeave => Self::BadRequest(message),

            GroupError::TitleRequired | GroupError::CallerRequired | GroupError::Validation(_) => {
                Self::Validation(message)
            }

            GroupError::App(inner) => inner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: GroupError) -> u16 {
        AppError::from(err).status_code().as_u16()
    }

    #[test]
    fn test_taxonomy() {
        assert_eq!(status_of(GroupError::GroupNotFound), 404);
        assert_eq!(status_of(GroupError::NotMember(MemberAction::Post)), 403);
        assert_eq!(status_of(GroupError::AlreadyLiked), 400);
        assert_eq!(status_of(GroupError::CreatorCannotLeave), 400);
        assert_eq!(status_of(GroupError::TitleRequired), 400);
        assert_eq!(
            status_of(GroupError::App(AppError::StoreUnavailable("down".into()))),
            503
        );
    }

    #[test]
    fn test_member_action_messages() {
        assert_eq!(
            GroupError::NotMember(MemberAction::Post).to_string(),
            "Only group members can post"
        );
        assert_eq!(
            GroupError::NotMember(MemberAction::Comment).to_string(),
            "Only group members can comment on posts"
        );
    }
}

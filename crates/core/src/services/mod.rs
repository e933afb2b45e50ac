//! Business logic services.

#![allow(missing_docs)]

pub mod group;
pub mod group_post;

pub use group::GroupService;
pub use group_post::GroupPostService;

use potluck_common::normalize_id;
use potluck_db::store::{UserDirectory, UserSummary};
use tracing::warn;

use crate::error::{GroupError, GroupResult};

/// Placeholder shown when an author or member cannot be resolved.
pub const UNKNOWN_USER: &str = "Unknown User";

/// Longest user id the store columns hold.
pub(crate) const MAX_ID_LEN: usize = 32;

/// Reject ids that cannot be stored.
pub(crate) fn bounded_id(id: String) -> GroupResult<String> {
    if id.chars().count() > MAX_ID_LEN {
        return Err(GroupError::Validation(format!(
            "User ID must be at most {MAX_ID_LEN} characters"
        )));
    }
    Ok(id)
}

/// Turn an optional caller into the normalized id mutations require.
pub(crate) fn require_caller(caller: Option<&str>) -> GroupResult<String> {
    match caller.map(str::trim) {
        Some(id) if !id.is_empty() => bounded_id(normalize_id(id)),
        _ => Err(GroupError::CallerRequired),
    }
}

/// Normalize an optional caller, treating blank ids as anonymous.
pub(crate) fn normalize_caller(caller: Option<&str>) -> Option<String> {
    caller
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(normalize_id)
}

/// Look up display data, degrading lookup failures to "not found".
pub(crate) async fn lookup_user(users: &dyn UserDirectory, user_id: &str) -> Option<UserSummary> {
    match users.find_user(user_id).await {
        Ok(user) => user,
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "User lookup failed, using placeholder");
            None
        }
    }
}

/// Trim an optional text field, dropping it when blank.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

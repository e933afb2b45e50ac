//! Store traits the group services are written against.
//!
//! Every mutation that depends on current membership state is a single
//! conditional operation: the store checks the precondition and writes in
//! one step, and reports which precondition failed instead of leaving the
//! caller to read, decide and write.

use async_trait::async_trait;
use potluck_common::AppResult;

use crate::entities::{
    group, group_join_request, group_member, group_post, group_post_comment, group_post_like,
};

/// A group row loaded together with its members and pending join requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSnapshot {
    /// The group row.
    pub group: group::Model,
    /// Members ordered by `joined_at`.
    pub members: Vec<group_member::Model>,
    /// Pending requests ordered by `requested_at`.
    pub pending: Vec<group_join_request::Model>,
}

/// A post loaded together with its likes and comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSnapshot {
    /// The post row.
    pub post: group_post::Model,
    /// Likes ordered by `created_at`.
    pub likes: Vec<group_post_like::Model>,
    /// Comments ordered by `created_at`.
    pub comments: Vec<group_post_comment::Model>,
}

/// Filter for [`GroupStore::list_groups`].
#[derive(Debug, Clone, Default)]
pub struct GroupQuery {
    /// Caller whose private groups are included when `include_private` is off.
    pub viewer: Option<String>,
    /// Skip the privacy filter entirely.
    pub include_private: bool,
    /// Case-insensitive substring matched against name, description and category.
    pub text: Option<String>,
    /// Maximum number of groups returned.
    pub limit: Option<u64>,
}

/// Result of a conditional membership insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The row was written.
    Added,
    /// The user is already a member; nothing was written.
    AlreadyMember,
    /// The user already has a pending request; nothing was written.
    AlreadyPending,
    /// The group does not exist.
    GroupMissing,
}

/// Display data for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    /// User id.
    pub id: String,
    /// Name shown next to posts, comments and memberships.
    pub full_name: String,
    /// Encoded avatar image.
    pub avatar: Option<String>,
    /// Short profile text.
    pub bio: Option<String>,
}

/// Persistence for groups, members and join requests.
#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Check that the store is reachable.
    async fn ping(&self) -> AppResult<()>;

    /// Load a group with its members and pending requests.
    async fn find_group(&self, group_id: &str) -> AppResult<Option<GroupSnapshot>>;

    /// List groups newest first.
    async fn list_groups(&self, query: GroupQuery) -> AppResult<Vec<GroupSnapshot>>;

    /// Insert a new group together with its initial members and requests.
    async fn insert_group(&self, snapshot: &GroupSnapshot) -> AppResult<()>;

    /// Append a join request unless the user is already a member or pending.
    async fn add_join_request(
        &self,
        request: group_join_request::Model,
    ) -> AppResult<JoinOutcome>;

    /// Append a member unless the user is already a member or pending.
    async fn add_member(&self, member: group_member::Model) -> AppResult<JoinOutcome>;

    /// Move a pending request into the member list.
    ///
    /// Returns `false` when no request from `member.user_id` was pending.
    async fn approve_join_request(&self, member: group_member::Model) -> AppResult<bool>;

    /// Drop a pending request. Returns `false` if there was none.
    async fn remove_join_request(&self, group_id: &str, user_id: &str) -> AppResult<bool>;

    /// Drop a member. Returns `false` if the user was not a member.
    async fn remove_member(&self, group_id: &str, user_id: &str) -> AppResult<bool>;

    /// Delete every post of the group, then the group itself.
    ///
    /// Returns `false` if the group did not exist.
    async fn delete_group_cascade(&self, group_id: &str) -> AppResult<bool>;
}

/// Persistence for group posts, likes and comments.
#[async_trait]
pub trait GroupPostStore: Send + Sync {
    /// Load a post with its likes and comments.
    async fn find_post(&self, post_id: &str) -> AppResult<Option<PostSnapshot>>;

    /// Posts of a group, newest first.
    async fn list_posts(&self, group_id: &str, approved_only: bool)
    -> AppResult<Vec<PostSnapshot>>;

    /// Count the posts of a group.
    async fn count_posts(&self, group_id: &str, approved_only: bool) -> AppResult<u64>;

    /// Insert a new post.
    async fn insert_post(&self, post: group_post::Model) -> AppResult<()>;

    /// Overwrite the editable content of a post.
    ///
    /// Group, author, approval flag and creation time are never touched.
    /// Returns `false` if the post no longer exists.
    async fn update_post(&self, post: &group_post::Model) -> AppResult<bool>;

    /// Delete a post with its likes and comments. Returns `false` if it was gone.
    async fn delete_post(&self, post_id: &str) -> AppResult<bool>;

    /// Add a like unless the user already liked the post.
    ///
    /// Returns `false` when the like already existed.
    async fn add_like(&self, like: group_post_like::Model) -> AppResult<bool>;

    /// Remove a like. Returns `false` when the user had not liked the post.
    async fn remove_like(&self, post_id: &str, user_id: &str) -> AppResult<bool>;

    /// Append a comment.
    async fn add_comment(&self, comment: group_post_comment::Model) -> AppResult<()>;

    /// Remove a comment. Returns `false` when it does not exist on that post.
    async fn remove_comment(&self, post_id: &str, comment_id: &str) -> AppResult<bool>;
}

/// Read-only lookup of user display data.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up display data for one user.
    async fn find_user(&self, user_id: &str) -> AppResult<Option<UserSummary>>;
}

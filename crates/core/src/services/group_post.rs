//! Group post service.
//!
//! Recipes shared inside a group, with likes and comments. Reads filter by
//! visibility; writes check membership and moderation rights through
//! [`crate::authz`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use potluck_common::{IdGenerator, normalize_id};
use potluck_db::entities::{group_post, group_post_comment, group_post_like};
use potluck_db::store::{GroupPostStore, GroupSnapshot, GroupStore, PostSnapshot, UserDirectory};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::Validate;

use super::{UNKNOWN_USER, lookup_user, non_blank, normalize_caller, require_caller};
use crate::authz::{self, PostDenial};
use crate::error::{GroupError, GroupResult, MemberAction};

const DEFAULT_CATEGORY: &str = "General";
const DEFAULT_MEAT_TYPE: &str = "Mixed";
const DEFAULT_PREP_TIME: i32 = 0;
const DEFAULT_SERVINGS: i32 = 1;

/// Comment author name when neither the request nor the directory has one.
const ANONYMOUS_USER: &str = "Anonymous User";

/// Recipe fields for creating or editing a post.
///
/// On edit, absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PostContentInput {
    #[validate(length(max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub ingredients: Option<String>,
    pub instructions: Option<String>,
    #[validate(length(max = 64))]
    pub category: Option<String>,
    #[validate(length(max = 64))]
    pub meat_type: Option<String>,
    #[validate(range(min = 0, message = "Prep time cannot be negative"))]
    pub prep_time: Option<i32>,
    #[validate(range(min = 1, message = "Servings must be at least 1"))]
    pub servings: Option<i32>,
    pub image: Option<String>,
}

impl PostContentInput {
    fn title(&self) -> GroupResult<String> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(ToString::to_string)
            .ok_or(GroupError::TitleRequired)
    }
}

/// Input for adding a comment.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommentInput {
    #[validate(length(max = 2000))]
    pub text: Option<String>,
    #[validate(length(max = 128))]
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<group_post_comment::Model> for CommentView {
    fn from(c: group_post_comment::Model) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            user_name: c.user_name,
            text: c.text,
            created_at: c.created_at.into(),
        }
    }
}

/// Post with author display data, likes and comments.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedPost {
    pub id: String,
    pub group_id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub ingredients: String,
    pub instructions: String,
    pub category: String,
    pub meat_type: String,
    pub prep_time: i32,
    pub servings: i32,
    pub image: Option<String>,
    pub is_approved: bool,
    pub likes: Vec<String>,
    pub likes_count: usize,
    pub comments: Vec<CommentView>,
    pub comments_count: usize,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub user_bio: Option<String>,
    pub group_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Likes of a post after a like or unlike.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeSummary {
    pub likes: Vec<String>,
    pub likes_count: usize,
}

/// A new comment together with the post's updated comment list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAdded {
    pub comment: CommentView,
    pub comments: Vec<CommentView>,
    pub comments_count: usize,
}

/// Service for recipe posts inside groups.
#[derive(Clone)]
pub struct GroupPostService {
    groups: Arc<dyn GroupStore>,
    posts: Arc<dyn GroupPostStore>,
    users: Arc<dyn UserDirectory>,
    id_gen: IdGenerator,
}

impl GroupPostService {
    /// Create a new group post service.
    #[must_use]
    pub fn new(
        groups: Arc<dyn GroupStore>,
        posts: Arc<dyn GroupPostStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            groups,
            posts,
            users,
            id_gen: IdGenerator::new(),
        }
    }

    async fn load_group(&self, group_id: &str) -> GroupResult<GroupSnapshot> {
        self.groups
            .find_group(&normalize_id(group_id))
            .await?
            .ok_or(GroupError::GroupNotFound)
    }

    /// Load a post and check that it lives in `group`.
    async fn load_post(&self, group: &GroupSnapshot, post_id: &str) -> GroupResult<PostSnapshot> {
        let snapshot = self
            .posts
            .find_post(&normalize_id(post_id))
            .await?
            .ok_or(GroupError::PostNotFound)?;

        if !authz::id_equals(&snapshot.post.group_id, &group.group.id) {
            return Err(GroupError::PostNotInGroup);
        }

        Ok(snapshot)
    }

    async fn reload_post(&self, post_id: &str) -> GroupResult<PostSnapshot> {
        self.posts
            .find_post(post_id)
            .await?
            .ok_or(GroupError::PostNotFound)
    }

    async fn enrich(&self, snapshot: PostSnapshot, group_name: &str) -> EnrichedPost {
        let author = lookup_user(self.users.as_ref(), &snapshot.post.user_id).await;
        let likes: Vec<String> = snapshot.likes.into_iter().map(|l| l.user_id).collect();
        let comments: Vec<CommentView> =
            snapshot.comments.into_iter().map(CommentView::from).collect();
        let post = snapshot.post;

        EnrichedPost {
            id: post.id,
            group_id: post.group_id,
            user_id: post.user_id,
            title: post.title,
            description: post.description,
            ingredients: post.ingredients,
            instructions: post.instructions,
            category: post.category,
            meat_type: post.meat_type,
            prep_time: post.prep_time,
            servings: post.servings,
            image: post.image,
            is_approved: post.is_approved,
            likes_count: likes.len(),
            likes,
            comments_count: comments.len(),
            comments,
            user_name: author
                .as_ref()
                .map_or_else(|| UNKNOWN_USER.to_string(), |a| a.full_name.clone()),
            user_avatar: author.as_ref().and_then(|a| a.avatar.clone()),
            user_bio: author.and_then(|a| a.bio),
            group_name: group_name.to_string(),
            created_at: post.created_at.into(),
            updated_at: post.updated_at.map(Into::into),
        }
    }

    /// Approved posts of a group, newest first.
    ///
    /// Private groups yield an empty list for anyone outside the member list.
    pub async fn list_group_posts(
        &self,
        group_id: &str,
        caller: Option<&str>,
    ) -> GroupResult<Vec<EnrichedPost>> {
        let group = self.load_group(group_id).await?;
        let caller = normalize_caller(caller);

        if !authz::can_view_posts(&group, caller.as_deref()) {
            debug!(group_id = %group.group.id, "Private group hidden from caller");
            return Ok(vec![]);
        }

        let snapshots = self.posts.list_posts(&group.group.id, true).await?;
        let group_name = group.group.name.as_str();

        Ok(join_all(snapshots.into_iter().map(|s| self.enrich(s, group_name))).await)
    }

    /// One post, if the caller may see it.
    pub async fn get_group_post(
        &self,
        group_id: &str,
        post_id: &str,
        caller: Option<&str>,
    ) -> GroupResult<EnrichedPost> {
        let group = self.load_group(group_id).await?;
        let snapshot = self.load_post(&group, post_id).await?;
        let caller = normalize_caller(caller);
        let caller = caller.as_deref();

        let visible = authz::can_view_posts(&group, caller)
            && (snapshot.post.is_approved
                || authz::can_moderate_post(&group, &snapshot.post.user_id, caller));
        if !visible {
            return Err(GroupError::PostNotFound);
        }

        Ok(self.enrich(snapshot, &group.group.name).await)
    }

    /// Create a post. Approval is decided once, here.
    pub async fn create_group_post(
        &self,
        group_id: &str,
        caller: Option<&str>,
        input: PostContentInput,
    ) -> GroupResult<EnrichedPost> {
        let user_id = require_caller(caller)?;
        let group = self.load_group(group_id).await?;

        authz::can_create_post(&group, Some(&user_id)).map_err(|denial| match denial {
            PostDenial::NotMember => GroupError::NotMember(MemberAction::Post),
            PostDenial::AdminsOnly => GroupError::AdminsOnly,
        })?;

        let title = input.title()?;
        input.validate()?;

        let is_approved = authz::auto_approve_post(&group, Some(&user_id));
        let post = group_post::Model {
            id: self.id_gen.generate(),
            group_id: group.group.id.clone(),
            user_id: user_id.clone(),
            title,
            description: input.description.unwrap_or_default(),
            ingredients: input.ingredients.unwrap_or_default(),
            instructions: input.instructions.unwrap_or_default(),
            category: non_blank(input.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            meat_type: non_blank(input.meat_type).unwrap_or_else(|| DEFAULT_MEAT_TYPE.to_string()),
            prep_time: input.prep_time.unwrap_or(DEFAULT_PREP_TIME),
            servings: input.servings.unwrap_or(DEFAULT_SERVINGS),
            image: non_blank(input.image),
            is_approved,
            created_at: Utc::now().into(),
            updated_at: None,
        };

        self.posts.insert_post(post.clone()).await?;
        info!(
            group_id = %group.group.id,
            post_id = %post.id,
            user_id = %user_id,
            is_approved,
            "Group post created"
        );

        let snapshot = PostSnapshot {
            post,
            likes: vec![],
            comments: vec![],
        };
        Ok(self.enrich(snapshot, &group.group.name).await)
    }

    /// Edit recipe fields. Author or moderator only; approval is untouched.
    pub async fn edit_group_post(
        &self,
        group_id: &str,
        post_id: &str,
        caller: Option<&str>,
        input: PostContentInput,
    ) -> GroupResult<EnrichedPost> {
        let group = self.load_group(group_id).await?;
        let mut snapshot = self.load_post(&group, post_id).await?;

        let caller = normalize_caller(caller);
        if !authz::can_moderate_post(&group, &snapshot.post.user_id, caller.as_deref()) {
            return Err(GroupError::PermissionDenied);
        }

        let title = input.title()?;
        input.validate()?;

        let post = &mut snapshot.post;
        post.title = title;
        if let Some(description) = input.description {
            post.description = description;
        }
        if let Some(ingredients) = input.ingredients {
            post.ingredients = ingredients;
        }
        if let Some(instructions) = input.instructions {
            post.instructions = instructions;
        }
        if let Some(category) = non_blank(input.category) {
            post.category = category;
        }
        if let Some(meat_type) = non_blank(input.meat_type) {
            post.meat_type = meat_type;
        }
        if let Some(prep_time) = input.prep_time {
            post.prep_time = prep_time;
        }
        if let Some(servings) = input.servings {
            post.servings = servings;
        }
        if let Some(image) = non_blank(input.image) {
            post.image = Some(image);
        }
        post.updated_at = Some(Utc::now().into());

        if !self.posts.update_post(post).await? {
            return Err(GroupError::PostNotFound);
        }
        info!(post_id = %post.id, "Group post updated");

        Ok(self.enrich(snapshot, &group.group.name).await)
    }

    /// Delete a post with its likes and comments. Author or moderator only.
    pub async fn delete_group_post(
        &self,
        group_id: &str,
        post_id: &str,
        caller: Option<&str>,
    ) -> GroupResult<()> {
        let group = self.load_group(group_id).await?;
        let snapshot = self.load_post(&group, post_id).await?;

        let caller = normalize_caller(caller);
        if !authz::can_moderate_post(&group, &snapshot.post.user_id, caller.as_deref()) {
            return Err(GroupError::PermissionDenied);
        }

        if !self.posts.delete_post(&snapshot.post.id).await? {
            return Err(GroupError::PostNotFound);
        }

        info!(group_id = %group.group.id, post_id = %snapshot.post.id, "Group post deleted");
        Ok(())
    }

    /// Load group and post for a member-only reaction.
    async fn member_target(
        &self,
        group_id: &str,
        post_id: &str,
        caller: Option<&str>,
        action: MemberAction,
    ) -> GroupResult<(String, GroupSnapshot, PostSnapshot)> {
        let user_id = require_caller(caller)?;
        let group = self.load_group(group_id).await?;
        let post = self.load_post(&group, post_id).await?;

        if !authz::is_member(&group, Some(&user_id)) {
            return Err(GroupError::NotMember(action));
        }

        Ok((user_id, group, post))
    }

    pub async fn like_post(
        &self,
        group_id: &str,
        post_id: &str,
        caller: Option<&str>,
    ) -> GroupResult<LikeSummary> {
        let (user_id, _, post) = self
            .member_target(group_id, post_id, caller, MemberAction::Like)
            .await?;

        let like = group_post_like::Model {
            id: self.id_gen.generate(),
            post_id: post.post.id.clone(),
            user_id: user_id.clone(),
            created_at: Utc::now().into(),
        };
        if !self.posts.add_like(like).await? {
            return Err(GroupError::AlreadyLiked);
        }
        debug!(post_id = %post.post.id, user_id = %user_id, "Post liked");

        self.like_summary(&post.post.id).await
    }

    pub async fn unlike_post(
        &self,
        group_id: &str,
        post_id: &str,
        caller: Option<&str>,
    ) -> GroupResult<LikeSummary> {
        let (user_id, _, post) = self
            .member_target(group_id, post_id, caller, MemberAction::Unlike)
            .await?;

        if !self.posts.remove_like(&post.post.id, &user_id).await? {
            return Err(GroupError::NotLiked);
        }
        debug!(post_id = %post.post.id, user_id = %user_id, "Post unliked");

        self.like_summary(&post.post.id).await
    }

    async fn like_summary(&self, post_id: &str) -> GroupResult<LikeSummary> {
        let snapshot = self.reload_post(post_id).await?;
        let likes: Vec<String> = snapshot.likes.into_iter().map(|l| l.user_id).collect();
        Ok(LikeSummary {
            likes_count: likes.len(),
            likes,
        })
    }

    pub async fn add_comment(
        &self,
        group_id: &str,
        post_id: &str,
        caller: Option<&str>,
        input: CommentInput,
    ) -> GroupResult<CommentAdded> {
        let (user_id, _, post) = self
            .member_target(group_id, post_id, caller, MemberAction::Comment)
            .await?;

        let text = non_blank(input.text.clone())
            .ok_or_else(|| GroupError::Validation("Comment text is required".to_string()))?;
        input.validate()?;

        let user_name = match non_blank(input.user_name) {
            Some(name) => name,
            None => lookup_user(self.users.as_ref(), &user_id)
                .await
                .map_or_else(|| ANONYMOUS_USER.to_string(), |u| u.full_name),
        };

        let comment = group_post_comment::Model {
            id: self.id_gen.generate(),
            post_id: post.post.id.clone(),
            user_id,
            user_name,
            text,
            created_at: Utc::now().into(),
        };
        self.posts.add_comment(comment.clone()).await?;
        debug!(post_id = %post.post.id, comment_id = %comment.id, "Comment added");

        let comments: Vec<CommentView> = self
            .reload_post(&post.post.id)
            .await?
            .comments
            .into_iter()
            .map(CommentView::from)
            .collect();

        Ok(CommentAdded {
            comment: comment.into(),
            comments_count: comments.len(),
            comments,
        })
    }

    /// Delete a comment and return the remaining ones. Comment author or
    /// group moderator only.
    pub async fn delete_comment(
        &self,
        group_id: &str,
        post_id: &str,
        comment_id: &str,
        caller: Option<&str>,
    ) -> GroupResult<Vec<CommentView>> {
        let group = self.load_group(group_id).await?;
        let post = self.load_post(&group, post_id).await?;

        let comment_id = normalize_id(comment_id);
        let comment = post
            .comments
            .iter()
            .find(|c| c.id == comment_id)
            .ok_or(GroupError::CommentNotFound)?;

        let caller = normalize_caller(caller);
        if !authz::can_moderate_post(&group, &comment.user_id, caller.as_deref()) {
            return Err(GroupError::PermissionDenied);
        }

        if !self.posts.remove_comment(&post.post.id, &comment_id).await? {
            return Err(GroupError::CommentNotFound);
        }

        debug!(post_id = %post.post.id, comment_id = %comment_id, "Comment deleted");

        Ok(self
            .reload_post(&post.post.id)
            .await?
            .comments
            .into_iter()
            .map(CommentView::from)
            .collect())
    }
}

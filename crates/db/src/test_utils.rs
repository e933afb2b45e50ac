//! Test utilities for code written against the store traits.
//!
//! [`MemoryStore`] implements [`GroupStore`], [`GroupPostStore`] and
//! [`UserDirectory`] over plain vectors behind one lock, so every operation
//! is as atomic as its PostgreSQL counterpart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use potluck_common::{AppError, AppResult};
use tokio::sync::RwLock;

use crate::entities::group::GroupSettings;
use crate::entities::{
    group, group_join_request, group_member, group_post, group_post_comment, group_post_like,
};
use crate::store::{
    GroupPostStore, GroupQuery, GroupSnapshot, GroupStore, JoinOutcome, PostSnapshot,
    UserDirectory, UserSummary,
};

#[derive(Debug, Default)]
struct State {
    groups: Vec<group::Model>,
    members: Vec<group_member::Model>,
    requests: Vec<group_join_request::Model>,
    posts: Vec<group_post::Model>,
    likes: Vec<group_post_like::Model>,
    comments: Vec<group_post_comment::Model>,
    users: HashMap<String, UserSummary>,
}

impl State {
    fn snapshot(&self, group: &group::Model) -> GroupSnapshot {
        GroupSnapshot {
            group: group.clone(),
            members: self
                .members
                .iter()
                .filter(|m| m.group_id == group.id)
                .cloned()
                .collect(),
            pending: self
                .requests
                .iter()
                .filter(|r| r.group_id == group.id)
                .cloned()
                .collect(),
        }
    }

    fn post_snapshot(&self, post: &group_post::Model) -> PostSnapshot {
        PostSnapshot {
            post: post.clone(),
            likes: self
                .likes
                .iter()
                .filter(|l| l.post_id == post.id)
                .cloned()
                .collect(),
            comments: self
                .comments
                .iter()
                .filter(|c| c.post_id == post.id)
                .cloned()
                .collect(),
        }
    }

    fn is_member(&self, group_id: &str, user_id: &str) -> bool {
        self.members
            .iter()
            .any(|m| m.group_id == group_id && m.user_id == user_id)
    }

    fn is_pending(&self, group_id: &str, user_id: &str) -> bool {
        self.requests
            .iter()
            .any(|r| r.group_id == group_id && r.user_id == user_id)
    }

    fn admission_conflict(&self, group_id: &str, user_id: &str) -> Option<JoinOutcome> {
        if !self.groups.iter().any(|g| g.id == group_id) {
            Some(JoinOutcome::GroupMissing)
        } else if self.is_member(group_id, user_id) {
            Some(JoinOutcome::AlreadyMember)
        } else if self.is_pending(group_id, user_id) {
            Some(JoinOutcome::AlreadyPending)
        } else {
            None
        }
    }

    fn remove_post(&mut self, post_id: &str) -> bool {
        let before = self.posts.len();
        self.posts.retain(|p| p.id != post_id);
        self.likes.retain(|l| l.post_id != post_id);
        self.comments.retain(|c| c.post_id != post_id);
        self.posts.len() != before
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// In-memory store for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following operation fail as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable("memory store switched off".into()));
        }
        Ok(())
    }

    /// Register a user for the directory.
    pub async fn insert_user(&self, id: &str, full_name: &str) {
        self.state.write().await.users.insert(
            id.to_string(),
            UserSummary {
                id: id.to_string(),
                full_name: full_name.to_string(),
                avatar: None,
                bio: None,
            },
        );
    }

    /// Overwrite the settings document and legacy columns of a group.
    pub async fn set_group_settings(
        &self,
        group_id: &str,
        settings: Option<GroupSettings>,
        legacy_require_approval: Option<bool>,
    ) {
        let mut state = self.state.write().await;
        if let Some(group) = state.groups.iter_mut().find(|g| g.id == group_id) {
            group.settings = settings;
            group.require_approval = legacy_require_approval;
        }
    }

    /// Flip the approval flag of a post, standing in for a moderation tool.
    pub async fn set_post_approved(&self, post_id: &str, approved: bool) {
        let mut state = self.state.write().await;
        if let Some(post) = state.posts.iter_mut().find(|p| p.id == post_id) {
            post.is_approved = approved;
        }
    }

    /// Number of posts stored for a group, approved or not.
    pub async fn post_count(&self, group_id: &str) -> usize {
        self.state
            .read()
            .await
            .posts
            .iter()
            .filter(|p| p.group_id == group_id)
            .count()
    }
}

#[async_trait]
impl GroupStore for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        self.check_available()
    }

    async fn find_group(&self, group_id: &str) -> AppResult<Option<GroupSnapshot>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .groups
            .iter()
            .find(|g| g.id == group_id)
            .map(|g| state.snapshot(g)))
    }

    async fn list_groups(&self, query: GroupQuery) -> AppResult<Vec<GroupSnapshot>> {
        self.check_available()?;
        let state = self.state.read().await;
        let needle = query.text.as_deref().map(str::to_lowercase);

        let mut groups: Vec<&group::Model> = state
            .groups
            .iter()
            .rev()
            .filter(|g| {
                query.include_private
                    || !g.is_private
                    || query
                        .viewer
                        .as_deref()
                        .is_some_and(|viewer| state.is_member(&g.id, viewer))
            })
            .filter(|g| {
                needle.as_deref().is_none_or(|needle| {
                    contains_ignore_case(&g.name, needle)
                        || contains_ignore_case(&g.category, needle)
                        || g
                            .description
                            .as_deref()
                            .is_some_and(|d| contains_ignore_case(d, needle))
                })
            })
            .collect();
        groups.sort_by(|a, b| (&b.created_at, &b.id).cmp(&(&a.created_at, &a.id)));

        if let Some(limit) = query.limit {
            groups.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        Ok(groups.into_iter().map(|g| state.snapshot(g)).collect())
    }

    async fn insert_group(&self, snapshot: &GroupSnapshot) -> AppResult<()> {
        self.check_available()?;
        let mut state = self.state.write().await;
        state.groups.push(snapshot.group.clone());
        state.members.extend(snapshot.members.iter().cloned());
        state.requests.extend(snapshot.pending.iter().cloned());
        Ok(())
    }

    async fn add_join_request(
        &self,
        request: group_join_request::Model,
    ) -> AppResult<JoinOutcome> {
        self.check_available()?;
        let mut state = self.state.write().await;
        if let Some(conflict) = state.admission_conflict(&request.group_id, &request.user_id) {
            return Ok(conflict);
        }
        state.requests.push(request);
        Ok(JoinOutcome::Added)
    }

    async fn add_member(&self, member: group_member::Model) -> AppResult<JoinOutcome> {
        self.check_available()?;
        let mut state = self.state.write().await;
        if let Some(conflict) = state.admission_conflict(&member.group_id, &member.user_id) {
            return Ok(conflict);
        }
        state.members.push(member);
        Ok(JoinOutcome::Added)
    }

    async fn approve_join_request(&self, member: group_member::Model) -> AppResult<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;
        if !state.is_pending(&member.group_id, &member.user_id) {
            return Ok(false);
        }
        state
            .requests
            .retain(|r| !(r.group_id == member.group_id && r.user_id == member.user_id));
        if !state.is_member(&member.group_id, &member.user_id) {
            state.members.push(member);
        }
        Ok(true)
    }

    async fn remove_join_request(&self, group_id: &str, user_id: &str) -> AppResult<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let before = state.requests.len();
        state
            .requests
            .retain(|r| !(r.group_id == group_id && r.user_id == user_id));
        Ok(state.requests.len() != before)
    }

    async fn remove_member(&self, group_id: &str, user_id: &str) -> AppResult<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let before = state.members.len();
        state
            .members
            .retain(|m| !(m.group_id == group_id && m.user_id == user_id));
        Ok(state.members.len() != before)
    }

    async fn delete_group_cascade(&self, group_id: &str) -> AppResult<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;

        let post_ids: Vec<String> = state
            .posts
            .iter()
            .filter(|p| p.group_id == group_id)
            .map(|p| p.id.clone())
            .collect();
        for post_id in &post_ids {
            state.remove_post(post_id);
        }

        let before = state.groups.len();
        state.groups.retain(|g| g.id != group_id);
        state.members.retain(|m| m.group_id != group_id);
        state.requests.retain(|r| r.group_id != group_id);
        Ok(state.groups.len() != before)
    }
}

#[async_trait]
impl GroupPostStore for MemoryStore {
    async fn find_post(&self, post_id: &str) -> AppResult<Option<PostSnapshot>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .map(|p| state.post_snapshot(p)))
    }

    async fn list_posts(
        &self,
        group_id: &str,
        approved_only: bool,
    ) -> AppResult<Vec<PostSnapshot>> {
        self.check_available()?;
        let state = self.state.read().await;
        let mut posts: Vec<&group_post::Model> = state
            .posts
            .iter()
            .rev()
            .filter(|p| p.group_id == group_id && (!approved_only || p.is_approved))
            .collect();
        posts.sort_by(|a, b| (&b.created_at, &b.id).cmp(&(&a.created_at, &a.id)));
        Ok(posts.into_iter().map(|p| state.post_snapshot(p)).collect())
    }

    async fn count_posts(&self, group_id: &str, approved_only: bool) -> AppResult<u64> {
        self.check_available()?;
        let state = self.state.read().await;
        let count = state
            .posts
            .iter()
            .filter(|p| p.group_id == group_id && (!approved_only || p.is_approved))
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn insert_post(&self, post: group_post::Model) -> AppResult<()> {
        self.check_available()?;
        self.state.write().await.posts.push(post);
        Ok(())
    }

    async fn update_post(&self, post: &group_post::Model) -> AppResult<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let Some(stored) = state.posts.iter_mut().find(|p| p.id == post.id) else {
            return Ok(false);
        };
        stored.title.clone_from(&post.title);
        stored.description.clone_from(&post.description);
        stored.ingredients.clone_from(&post.ingredients);
        stored.instructions.clone_from(&post.instructions);
        stored.category.clone_from(&post.category);
        stored.meat_type.clone_from(&post.meat_type);
        stored.prep_time = post.prep_time;
        stored.servings = post.servings;
        stored.image.clone_from(&post.image);
        stored.updated_at = post.updated_at;
        Ok(true)
    }

    async fn delete_post(&self, post_id: &str) -> AppResult<bool> {
        self.check_available()?;
        Ok(self.state.write().await.remove_post(post_id))
    }

    async fn add_like(&self, like: group_post_like::Model) -> AppResult<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;
        if state
            .likes
            .iter()
            .any(|l| l.post_id == like.post_id && l.user_id == like.user_id)
        {
            return Ok(false);
        }
        state.likes.push(like);
        Ok(true)
    }

    async fn remove_like(&self, post_id: &str, user_id: &str) -> AppResult<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let before = state.likes.len();
        state
            .likes
            .retain(|l| !(l.post_id == post_id && l.user_id == user_id));
        Ok(state.likes.len() != before)
    }

    async fn add_comment(&self, comment: group_post_comment::Model) -> AppResult<()> {
        self.check_available()?;
        self.state.write().await.comments.push(comment);
        Ok(())
    }

    async fn remove_comment(&self, post_id: &str, comment_id: &str) -> AppResult<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let before = state.comments.len();
        state
            .comments
            .retain(|c| !(c.post_id == post_id && c.id == comment_id));
        Ok(state.comments.len() != before)
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_user(&self, user_id: &str) -> AppResult<Option<UserSummary>> {
        self.check_available()?;
        Ok(self.state.read().await.users.get(user_id).cloned())
    }
}

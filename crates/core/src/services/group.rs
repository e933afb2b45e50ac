//! Group service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use potluck_common::{IdGenerator, normalize_id};
use potluck_db::entities::group::GroupSettings;
use potluck_db::entities::group_member::GroupRole;
use potluck_db::entities::{group, group_join_request, group_member};
use potluck_db::store::{
    GroupPostStore, GroupQuery, GroupSnapshot, GroupStore, JoinOutcome, UserDirectory,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::Validate;

use super::{UNKNOWN_USER, bounded_id, lookup_user, non_blank, normalize_caller, require_caller};
use crate::authz::{self, EffectiveSettings, MembershipState};
use crate::error::{GroupError, GroupResult};

/// Maximum number of groups returned by a search.
pub const SEARCH_LIMIT: u64 = 50;

const DEFAULT_CATEGORY: &str = "General";

/// Creator name shown when the creator cannot be resolved.
const UNKNOWN_CREATOR: &str = "Unknown";

/// Input for creating a group.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupInput {
    #[serde(default)]
    #[validate(length(max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(length(max = 64))]
    pub category: Option<String>,
    #[validate(length(max = 1000))]
    pub rules: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    pub allow_member_posts: Option<bool>,
    pub require_approval: Option<bool>,
    pub allow_invites: Option<bool>,
    pub creator_id: Option<String>,
}

/// Outcome of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinStatus {
    /// Waiting for a moderator.
    Pending,
    /// Joined immediately.
    Approved,
}

/// Moderator decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestAction {
    Approve,
    Reject,
}

impl std::str::FromStr for RequestAction {
    type Err = GroupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            _ => Err(GroupError::Validation(
                "Action must be approve or reject".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub user_id: String,
    pub role: GroupRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequestView {
    pub user_id: String,
    pub request_date: DateTime<Utc>,
}

/// Member or requester with resolved display fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub user_id: String,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub user_bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<GroupRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_date: Option<DateTime<Utc>>,
}

/// Group enriched with creator data and counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub rules: Option<String>,
    pub image: Option<String>,
    pub is_private: bool,
    pub creator_id: String,
    pub creator_name: String,
    pub creator_avatar: Option<String>,
    pub members_count: usize,
    pub posts_count: u64,
    pub members: Vec<MemberView>,
    pub pending_requests: Vec<PendingRequestView>,
    pub settings: EffectiveSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Single-group view with member and requester details.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetails {
    #[serde(flatten)]
    pub group: GroupResponse,
    pub members_details: Vec<UserDetails>,
    pub pending_requests_details: Vec<UserDetails>,
}

/// Service for the group lifecycle: creation, membership and deletion.
#[derive(Clone)]
pub struct GroupService {
    groups: Arc<dyn GroupStore>,
    posts: Arc<dyn GroupPostStore>,
    users: Arc<dyn UserDirectory>,
    id_gen: IdGenerator,
}

impl GroupService {
    /// Create a new group service.
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

    async fn load(&self, group_id: &str) -> GroupResult<GroupSnapshot> {
        self.groups
            .find_group(&normalize_id(group_id))
            .await?
            .ok_or(GroupError::GroupNotFound)
    }

    async fn enrich(&self, snapshot: GroupSnapshot) -> GroupResult<GroupResponse> {
        let creator = lookup_user(self.users.as_ref(), &snapshot.group.creator_id).await;
        let posts_count = self.posts.count_posts(&snapshot.group.id, true).await?;
        let settings = authz::effective_settings(&snapshot.group);
        let group = snapshot.group;

        Ok(GroupResponse {
            id: group.id,
            name: group.name,
            description: group.description,
            category: group.category,
            rules: group.rules,
            image: group.image,
            is_private: group.is_private,
            creator_id: group.creator_id,
            creator_name: creator
                .as_ref()
                .map_or_else(|| UNKNOWN_CREATOR.to_string(), |c| c.full_name.clone()),
            creator_avatar: creator.and_then(|c| c.avatar),
            members_count: snapshot.members.len(),
            posts_count,
            members: snapshot
                .members
                .into_iter()
                .map(|m| MemberView {
                    user_id: m.user_id,
                    role: m.role,
                    joined_at: m.joined_at.into(),
                })
                .collect(),
            pending_requests: snapshot
                .pending
                .into_iter()
                .map(|r| PendingRequestView {
                    user_id: r.user_id,
                    request_date: r.requested_at.into(),
                })
                .collect(),
            settings,
            created_at: group.created_at.into(),
            updated_at: group.updated_at.map(Into::into),
        })
    }

    async fn enrich_all(&self, snapshots: Vec<GroupSnapshot>) -> GroupResult<Vec<GroupResponse>> {
        join_all(snapshots.into_iter().map(|s| self.enrich(s)))
            .await
            .into_iter()
            .collect()
    }

    async fn user_details(&self, user_id: &str) -> UserDetails {
        let user = lookup_user(self.users.as_ref(), user_id).await;
        UserDetails {
            user_id: user_id.to_string(),
            user_name: user
                .as_ref()
                .map_or_else(|| UNKNOWN_USER.to_string(), |u| u.full_name.clone()),
            user_avatar: user.as_ref().and_then(|u| u.avatar.clone()),
            user_bio: user.and_then(|u| u.bio),
            role: None,
            joined_at: None,
            request_date: None,
        }
    }

    /// Create a group with the creator as its first admin.
    pub async fn create_group(&self, input: CreateGroupInput) -> GroupResult<GroupResponse> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(GroupError::Validation("Group name is required".to_string()));
        }
        let creator_id = normalize_caller(input.creator_id.as_deref())
            .ok_or_else(|| GroupError::Validation("Creator ID is required".to_string()))
            .and_then(bounded_id)?;

        let input = CreateGroupInput { name, ..input };
        input.validate()?;

        let now = Utc::now();
        let group_id = self.id_gen.generate();

        let snapshot = GroupSnapshot {
            group: group::Model {
                id: group_id.clone(),
                creator_id: creator_id.clone(),
                name: input.name,
                description: non_blank(input.description),
                category: non_blank(input.category)
                    .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
                rules: non_blank(input.rules),
                image: non_blank(input.image),
                is_private: input.is_private,
                settings: Some(GroupSettings {
                    allow_member_posts: Some(
                        input.allow_member_posts.unwrap_or(authz::DEFAULT_SWITCH),
                    ),
                    require_approval: Some(
                        input.require_approval.unwrap_or(authz::DEFAULT_SWITCH),
                    ),
                    allow_invites: Some(input.allow_invites.unwrap_or(authz::DEFAULT_SWITCH)),
                }),
                allow_member_posts: None,
                require_approval: None,
                allow_invites: None,
                created_at: now.into(),
                updated_at: None,
            },
            members: vec![group_member::Model {
                id: self.id_gen.generate(),
                group_id: group_id.clone(),
                user_id: creator_id.clone(),
                role: GroupRole::Admin,
                joined_at: now.into(),
            }],
            pending: vec![],
        };

        self.groups.insert_group(&snapshot).await?;
        info!(group_id = %group_id, creator_id = %creator_id, "Group created");

        self.enrich(snapshot).await
    }

    /// Public groups plus private groups the caller belongs to, newest first.
    pub async fn list_groups(&self, caller: Option<&str>) -> GroupResult<Vec<GroupResponse>> {
        let snapshots = self
            .groups
            .list_groups(GroupQuery {
                viewer: normalize_caller(caller),
                ..GroupQuery::default()
            })
            .await?;

        self.enrich_all(snapshots).await
    }

    /// Case-insensitive search over name, description and category.
    pub async fn search_groups(
        &self,
        query: Option<&str>,
        caller: Option<&str>,
        include_private: bool,
    ) -> GroupResult<Vec<GroupResponse>> {
        let text = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| GroupError::Validation("Search query is required".to_string()))?;

        let snapshots = self
            .groups
            .list_groups(GroupQuery {
                viewer: normalize_caller(caller),
                include_private,
                text: Some(text.to_string()),
                limit: Some(SEARCH_LIMIT),
            })
            .await?;
        debug!(query = %text, found = snapshots.len(), "Group search");

        self.enrich_all(snapshots).await
    }

    /// One group with member and pending-request details resolved.
    pub async fn get_group(&self, group_id: &str) -> GroupResult<GroupDetails> {
        let snapshot = self.load(group_id).await?;

        let members_details = join_all(snapshot.members.iter().map(|m| async move {
            UserDetails {
                role: Some(m.role),
                joined_at: Some(m.joined_at.into()),
                ..self.user_details(&m.user_id).await
            }
        }))
        .await;

        let pending_requests_details = join_all(snapshot.pending.iter().map(|r| async move {
            UserDetails {
                request_date: Some(r.requested_at.into()),
                ..self.user_details(&r.user_id).await
            }
        }))
        .await;

        Ok(GroupDetails {
            group: self.enrich(snapshot).await?,
            members_details,
            pending_requests_details,
        })
    }

    /// Join directly, or file a request when the group is private or
    /// requires approval.
    pub async fn request_join(
        &self,
        group_id: &str,
        caller: Option<&str>,
    ) -> GroupResult<JoinStatus> {
        let user_id = require_caller(caller)?;
        let snapshot = self.load(group_id).await?;

        match authz::membership_state(&snapshot, &user_id) {
            MembershipState::Member => return Err(GroupError::AlreadyMember),
            MembershipState::Pending => return Err(GroupError::AlreadyPending),
            MembershipState::NonMember => {}
        }

        let needs_approval = snapshot.group.is_private
            || authz::effective_settings(&snapshot.group).require_approval;
        let now = Utc::now();

        let (outcome, status) = if needs_approval {
            let request = group_join_request::Model {
                id: self.id_gen.generate(),
                group_id: snapshot.group.id.clone(),
                user_id: user_id.clone(),
                requested_at: now.into(),
            };
            (
                self.groups.add_join_request(request).await?,
                JoinStatus::Pending,
            )
        } else {
            let member = group_member::Model {
                id: self.id_gen.generate(),
                group_id: snapshot.group.id.clone(),
                user_id: user_id.clone(),
                role: GroupRole::Member,
                joined_at: now.into(),
            };
            (self.groups.add_member(member).await?, JoinStatus::Approved)
        };

        match outcome {
            JoinOutcome::Added => {
                info!(
                    group_id = %snapshot.group.id,
                    user_id = %user_id,
                    status = ?status,
                    "Join request handled"
                );
                Ok(status)
            }
            JoinOutcome::AlreadyMember => Err(GroupError::AlreadyMember),
            JoinOutcome::AlreadyPending => Err(GroupError::AlreadyPending),
            JoinOutcome::GroupMissing => Err(GroupError::GroupNotFound),
        }
    }

    /// Approve or reject a pending request. Admins only.
    pub async fn decide_request(
        &self,
        group_id: &str,
        target_user_id: &str,
        action: &str,
        admin: Option<&str>,
    ) -> GroupResult<RequestAction> {
        let action: RequestAction = action.parse()?;
        let snapshot = self.load(group_id).await?;

        if !authz::can_decide_requests(&snapshot, admin) {
            return Err(GroupError::NotAdmin);
        }

        let target = normalize_id(target_user_id);
        if !authz::has_pending_request(&snapshot, Some(&target)) {
            return Err(GroupError::RequestNotFound);
        }

        let decided = match action {
            RequestAction::Approve => {
                self.groups
                    .approve_join_request(group_member::Model {
                        id: self.id_gen.generate(),
                        group_id: snapshot.group.id.clone(),
                        user_id: target.clone(),
                        role: GroupRole::Member,
                        joined_at: Utc::now().into(),
                    })
                    .await?
            }
            RequestAction::Reject => {
                self.groups
                    .remove_join_request(&snapshot.group.id, &target)
                    .await?
            }
        };

        if !decided {
            return Err(GroupError::RequestNotFound);
        }

        info!(
            group_id = %snapshot.group.id,
            user_id = %target,
            action = ?action,
            "Join request decided"
        );
        Ok(action)
    }

    /// Withdraw the caller's own pending request.
    pub async fn cancel_join_request(&self, group_id: &str, caller: Option<&str>) -> GroupResult<()> {
        let user_id = require_caller(caller)?;
        let snapshot = self.load(group_id).await?;

        if authz::is_member(&snapshot, Some(&user_id)) {
            return Err(GroupError::AlreadyMember);
        }

        if !self
            .groups
            .remove_join_request(&snapshot.group.id, &user_id)
            .await?
        {
            return Err(GroupError::NoPendingRequest);
        }

        info!(group_id = %snapshot.group.id, user_id = %user_id, "Join request canceled");
        Ok(())
    }

    /// Leave a group. Leaving a group one is not in succeeds without effect.
    pub async fn leave_group(&self, group_id: &str, user_id: &str) -> GroupResult<()> {
        let user_id = require_caller(Some(user_id))?;
        let snapshot = self.load(group_id).await?;

        if authz::is_creator(&snapshot.group, Some(&user_id)) {
            return Err(GroupError::CreatorCannotLeave);
        }

        let removed = self
            .groups
            .remove_member(&snapshot.group.id, &user_id)
            .await?;
        if removed {
            info!(group_id = %snapshot.group.id, user_id = %user_id, "Member left group");
        }

        Ok(())
    }

    /// Delete a group and all of its posts. Creator only.
    pub async fn delete_group(&self, group_id: &str, caller: Option<&str>) -> GroupResult<()> {
        let snapshot = self.load(group_id).await?;

        if !authz::is_creator(&snapshot.group, caller) {
            return Err(GroupError::NotCreator);
        }

        if !self.groups.delete_group_cascade(&snapshot.group.id).await? {
            return Err(GroupError::GroupNotFound);
        }

        info!(group_id = %snapshot.group.id, "Group deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::group_post::{GroupPostService, PostContentInput};
    use potluck_db::test_utils::MemoryStore;

    fn services() -> (Arc<MemoryStore>, GroupService, GroupPostService) {
        let store = Arc::new(MemoryStore::new());
        let groups = GroupService::new(store.clone(), store.clone(), store.clone());
        let posts = GroupPostService::new(store.clone(), store.clone(), store.clone());
        (store, groups, posts)
    }

    fn input(creator: &str, is_private: bool, require_approval: bool) -> CreateGroupInput {
        CreateGroupInput {
            name: "  Sourdough Circle ".to_string(),
            creator_id: Some(creator.to_string()),
            is_private,
            require_approval: Some(require_approval),
            ..CreateGroupInput::default()
        }
    }

    fn recipe(title: &str) -> PostContentInput {
        PostContentInput {
            title: Some(title.to_string()),
            ..PostContentInput::default()
        }
    }

    async fn assert_disjoint(groups: &GroupService, group_id: &str) {
        let details = groups.get_group(group_id).await.unwrap();
        for request in &details.group.pending_requests {
            assert!(
                !details
                    .group
                    .members
                    .iter()
                    .any(|m| m.user_id == request.user_id),
                "{} is both member and pending",
                request.user_id
            );
        }
    }

    #[tokio::test]
    async fn test_create_group_defaults() {
        let (store, groups, _) = services();
        store.insert_user("alice", "Alice Baker").await;

        let created = groups
            .create_group(CreateGroupInput {
                name: " Pie Club ".to_string(),
                creator_id: Some("alice".to_string()),
                ..CreateGroupInput::default()
            })
            .await
            .unwrap();

        assert_eq!(created.name, "Pie Club");
        assert_eq!(created.category, "General");
        assert_eq!(created.creator_name, "Alice Baker");
        assert_eq!(created.members_count, 1);
        assert_eq!(created.members[0].role, GroupRole::Admin);
        assert!(created.pending_requests.is_empty());
        assert!(created.settings.require_approval);
        assert!(created.settings.allow_member_posts);
        assert!(created.settings.allow_invites);
    }

    #[tokio::test]
    async fn test_create_group_requires_name_and_creator() {
        let (_, groups, _) = services();

        let err = groups
            .create_group(CreateGroupInput {
                name: "   ".to_string(),
                creator_id: Some("alice".to_string()),
                ..CreateGroupInput::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GroupError::Validation(_)));

        let err = groups
            .create_group(CreateGroupInput {
                name: "Pie Club".to_string(),
                ..CreateGroupInput::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GroupError::Validation(_)));

        let err = groups
            .create_group(CreateGroupInput {
                name: "x".repeat(101),
                creator_id: Some("alice".to_string()),
                ..CreateGroupInput::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GroupError::Validation(_)));
    }

    #[tokio::test]
    async fn test_join_open_group_is_immediate() {
        let (_, groups, _) = services();
        let group = groups.create_group(input("a", false, false)).await.unwrap();

        let status = groups.request_join(&group.id, Some("b")).await.unwrap();
        assert_eq!(status, JoinStatus::Approved);

        let details = groups.get_group(&group.id).await.unwrap();
        assert!(details.group.members.iter().any(|m| m.user_id == "b"));
        assert!(details.group.pending_requests.is_empty());
    }

    #[tokio::test]
    async fn test_join_private_or_approval_group_is_pending() {
        let (_, groups, _) = services();

        let private = groups.create_group(input("a", true, false)).await.unwrap();
        let status = groups.request_join(&private.id, Some("b")).await.unwrap();
        assert_eq!(status, JoinStatus::Pending);

        let approval = groups.create_group(input("a", false, true)).await.unwrap();
        let status = groups.request_join(&approval.id, Some("b")).await.unwrap();
        assert_eq!(status, JoinStatus::Pending);

        let details = groups.get_group(&approval.id).await.unwrap();
        assert!(!details.group.members.iter().any(|m| m.user_id == "b"));
        assert_eq!(details.group.pending_requests[0].user_id, "b");
    }

    #[tokio::test]
    async fn test_concurrent_joins_admit_once() {
        let (_, groups, _) = services();
        let open = groups.create_group(input("a", false, false)).await.unwrap();
        let gated = groups.create_group(input("a", false, true)).await.unwrap();

        for group_id in [&open.id, &gated.id] {
            let results = join_all([
                groups.request_join(group_id, Some("b")),
                groups.request_join(group_id, Some("B ")),
            ])
            .await;

            assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
            assert!(results.iter().any(|r| matches!(
                r,
                Err(GroupError::AlreadyMember | GroupError::AlreadyPending)
            )));

            let details = groups.get_group(group_id).await.unwrap();
            let entries = details
                .group
                .members
                .iter()
                .filter(|m| m.user_id == "b")
                .count()
                + details
                    .group
                    .pending_requests
                    .iter()
                    .filter(|r| r.user_id == "b")
                    .count();
            assert_eq!(entries, 1);
            assert_disjoint(&groups, group_id).await;
        }
    }

    #[tokio::test]
    async fn test_oversized_ids_and_category_are_rejected() {
        let (_, groups, _) = services();

        let err = groups
            .create_group(CreateGroupInput {
                name: "Pie Club".to_string(),
                creator_id: Some("c".repeat(33)),
                ..CreateGroupInput::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GroupError::Validation(_)));

        let err = groups
            .create_group(CreateGroupInput {
                category: Some("x".repeat(65)),
                ..input("a", false, false)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GroupError::Validation(_)));

        let group = groups.create_group(input("a", false, false)).await.unwrap();
        let err = groups
            .request_join(&group.id, Some(&"u".repeat(33)))
            .await
            .unwrap_err();
        assert!(matches!(err, GroupError::Validation(_)));

        groups
            .request_join(&group.id, Some(&"u".repeat(32)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_join_twice_is_rejected() {
        let (_, groups, _) = services();
        let open = groups.create_group(input("a", false, false)).await.unwrap();
        let gated = groups.create_group(input("a", false, true)).await.unwrap();

        groups.request_join(&open.id, Some("b")).await.unwrap();
        groups.request_join(&gated.id, Some("b")).await.unwrap();

        assert!(matches!(
            groups.request_join(&open.id, Some("B")).await,
            Err(GroupError::AlreadyMember)
        ));
        assert!(matches!(
            groups.request_join(&gated.id, Some("b")).await,
            Err(GroupError::AlreadyPending)
        ));
        assert!(matches!(
            groups.request_join(&open.id, None).await,
            Err(GroupError::CallerRequired)
        ));
        assert!(matches!(
            groups.request_join("missing", Some("b")).await,
            Err(GroupError::GroupNotFound)
        ));

        assert_disjoint(&groups, &gated.id).await;
    }

    #[tokio::test]
    async fn test_decide_request_approve_and_reject() {
        let (_, groups, _) = services();
        let group = groups.create_group(input("a", false, true)).await.unwrap();
        groups.request_join(&group.id, Some("c")).await.unwrap();
        groups.request_join(&group.id, Some("d")).await.unwrap();

        let action = groups
            .decide_request(&group.id, "c", "approve", Some("a"))
            .await
            .unwrap();
        assert_eq!(action, RequestAction::Approve);

        groups
            .decide_request(&group.id, "d", "reject", Some("a"))
            .await
            .unwrap();

        let details = groups.get_group(&group.id).await.unwrap();
        let member_ids: Vec<&str> = details
            .group
            .members
            .iter()
            .map(|m| m.user_id.as_str())
            .collect();
        assert_eq!(member_ids, vec!["a", "c"]);
        assert_eq!(details.group.members[1].role, GroupRole::Member);
        assert!(details.group.pending_requests.is_empty());
        assert_disjoint(&groups, &group.id).await;
    }

    #[tokio::test]
    async fn test_decide_request_checks() {
        let (_, groups, _) = services();
        let group = groups.create_group(input("a", false, true)).await.unwrap();
        groups.request_join(&group.id, Some("c")).await.unwrap();

        assert!(matches!(
            groups.decide_request(&group.id, "c", "approve", Some("c")).await,
            Err(GroupError::NotAdmin)
        ));
        assert!(matches!(
            groups.decide_request(&group.id, "c", "approve", None).await,
            Err(GroupError::NotAdmin)
        ));
        assert!(matches!(
            groups.decide_request(&group.id, "zed", "approve", Some("a")).await,
            Err(GroupError::RequestNotFound)
        ));
        assert!(matches!(
            groups.decide_request(&group.id, "c", "maybe", Some("a")).await,
            Err(GroupError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_join_request() {
        let (_, groups, _) = services();
        let group = groups.create_group(input("a", false, true)).await.unwrap();
        groups.request_join(&group.id, Some("c")).await.unwrap();

        groups.cancel_join_request(&group.id, Some("c")).await.unwrap();
        assert!(matches!(
            groups.cancel_join_request(&group.id, Some("c")).await,
            Err(GroupError::NoPendingRequest)
        ));
        assert!(matches!(
            groups.cancel_join_request(&group.id, Some("a")).await,
            Err(GroupError::AlreadyMember)
        ));
    }

    #[tokio::test]
    async fn test_creator_cannot_leave_but_members_can() {
        let (_, groups, _) = services();
        let group = groups.create_group(input("a", false, false)).await.unwrap();
        groups.request_join(&group.id, Some("b")).await.unwrap();

        assert!(matches!(
            groups.leave_group(&group.id, "A").await,
            Err(GroupError::CreatorCannotLeave)
        ));

        groups.leave_group(&group.id, "b").await.unwrap();
        // Leaving again is a no-op
        groups.leave_group(&group.id, "b").await.unwrap();

        let details = groups.get_group(&group.id).await.unwrap();
        assert_eq!(details.group.members_count, 1);
    }

    #[tokio::test]
    async fn test_delete_group_cascades_posts() {
        let (store, groups, posts) = services();
        let group = groups.create_group(input("a", false, false)).await.unwrap();
        groups.request_join(&group.id, Some("b")).await.unwrap();
        posts
            .create_group_post(&group.id, Some("b"), recipe("Focaccia"))
            .await
            .unwrap();
        posts
            .create_group_post(&group.id, Some("a"), recipe("Bagels"))
            .await
            .unwrap();

        assert!(matches!(
            groups.delete_group(&group.id, Some("b")).await,
            Err(GroupError::NotCreator)
        ));

        groups.delete_group(&group.id, Some("a")).await.unwrap();

        assert_eq!(store.post_count(&group.id).await, 0);
        assert!(matches!(
            groups.get_group(&group.id).await,
            Err(GroupError::GroupNotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_groups_respects_privacy() {
        let (_, groups, _) = services();
        let public = groups.create_group(input("a", false, false)).await.unwrap();
        let private = groups.create_group(input("a", true, false)).await.unwrap();

        let anonymous = groups.list_groups(None).await.unwrap();
        assert_eq!(anonymous.len(), 1);
        assert_eq!(anonymous[0].id, public.id);

        let creator = groups.list_groups(Some("a")).await.unwrap();
        assert_eq!(creator.len(), 2);
        assert_eq!(creator[0].id, private.id);
    }

    #[tokio::test]
    async fn test_search_groups() {
        let (_, groups, _) = services();
        groups.create_group(input("a", false, false)).await.unwrap();
        groups.create_group(input("a", true, false)).await.unwrap();

        assert!(matches!(
            groups.search_groups(Some("  "), None, false).await,
            Err(GroupError::Validation(_))
        ));

        let found = groups
            .search_groups(Some("sourdough"), None, false)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let everything = groups
            .search_groups(Some("SOURDOUGH"), None, true)
            .await
            .unwrap();
        assert_eq!(everything.len(), 2);
    }

    #[tokio::test]
    async fn test_get_group_details_fall_back_for_unknown_users() {
        let (store, groups, _) = services();
        store.insert_user("a", "Alice").await;
        let group = groups.create_group(input("a", false, true)).await.unwrap();
        groups.request_join(&group.id, Some("ghost")).await.unwrap();

        let details = groups.get_group(&group.id).await.unwrap();
        assert_eq!(details.members_details[0].user_name, "Alice");
        assert_eq!(details.members_details[0].role, Some(GroupRole::Admin));
        assert_eq!(details.pending_requests_details[0].user_name, UNKNOWN_USER);
        assert!(details.pending_requests_details[0].request_date.is_some());
    }

    /// Walk-through: open join, gated join, approval, and a stranger trying to post.
    #[tokio::test]
    async fn test_membership_scenario() {
        let (store, groups, posts) = services();
        let g = groups.create_group(input("a", false, false)).await.unwrap();

        assert_eq!(
            groups.request_join(&g.id, Some("b")).await.unwrap(),
            JoinStatus::Approved
        );

        store
            .set_group_settings(
                &g.id,
                Some(GroupSettings {
                    require_approval: Some(true),
                    ..GroupSettings::default()
                }),
                None,
            )
            .await;
        assert_eq!(
            groups.request_join(&g.id, Some("c")).await.unwrap(),
            JoinStatus::Pending
        );
        assert_disjoint(&groups, &g.id).await;

        groups
            .decide_request(&g.id, "c", "approve", Some("a"))
            .await
            .unwrap();
        let details = groups.get_group(&g.id).await.unwrap();
        assert!(details.group.members.iter().any(|m| m.user_id == "c"));
        assert!(details.group.pending_requests.is_empty());

        let err = posts
            .create_group_post(&g.id, Some("d"), recipe("Stolen Stew"))
            .await
            .unwrap_err();
        assert!(matches!(err, GroupError::NotMember(_)));
    }
}

//! Group authorization rules.
//!
//! Every decision about who may see, post into, or moderate a group is made
//! here, as a pure function of a loaded [`GroupSnapshot`] and the caller's
//! id. Nothing in this module touches the store.
//!
//! A caller of `None` is anonymous. Anonymous callers are never members, so
//! every membership-based rule denies them.

use potluck_db::entities::group;
use potluck_db::entities::group_member;
use potluck_db::store::GroupSnapshot;
use serde::Serialize;

pub use potluck_common::id_equals;

/// Default of every group switch when neither the settings document nor
/// the legacy column carries a value.
pub const DEFAULT_SWITCH: bool = true;

/// Group switches after the legacy fallback has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveSettings {
    /// Plain members may create posts.
    pub allow_member_posts: bool,
    /// Joins and member posts wait for a moderator.
    pub require_approval: bool,
    /// Members may invite others.
    pub allow_invites: bool,
}

/// Where a user stands with respect to one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipState {
    /// Neither a member nor waiting for approval.
    NonMember,
    /// Has a join request waiting for a moderator.
    Pending,
    /// In the member list.
    Member,
}

/// Why a caller may not create a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostDenial {
    /// The caller is not in the member list.
    NotMember,
    /// Member posting is switched off and the caller is not a moderator.
    AdminsOnly,
}

/// Resolve `settings.X ?? legacy X ?? default` for every switch.
#[must_use]
pub fn effective_settings(group: &group::Model) -> EffectiveSettings {
    let doc = group.settings.as_ref();

    EffectiveSettings {
        allow_member_posts: doc
            .and_then(|s| s.allow_member_posts)
            .or(group.allow_member_posts)
            .unwrap_or(DEFAULT_SWITCH),
        require_approval: doc
            .and_then(|s| s.require_approval)
            .or(group.require_approval)
            .unwrap_or(DEFAULT_SWITCH),
        allow_invites: doc
            .and_then(|s| s.allow_invites)
            .or(group.allow_invites)
            .unwrap_or(DEFAULT_SWITCH),
    }
}

fn find_member<'a>(
    snapshot: &'a GroupSnapshot,
    user_id: Option<&str>,
) -> Option<&'a group_member::Model> {
    let user_id = user_id?;
    snapshot
        .members
        .iter()
        .find(|m| id_equals(&m.user_id, user_id))
}

/// Whether the user is in the member list.
#[must_use]
pub fn is_member(snapshot: &GroupSnapshot, user_id: Option<&str>) -> bool {
    find_member(snapshot, user_id).is_some()
}

/// Member-list admin check: role `admin` or `owner`.
#[must_use]
pub fn is_admin(snapshot: &GroupSnapshot, user_id: Option<&str>) -> bool {
    find_member(snapshot, user_id).is_some_and(|m| m.role.is_admin())
}

/// Whether the user created the group.
#[must_use]
pub fn is_creator(group: &group::Model, user_id: Option<&str>) -> bool {
    user_id.is_some_and(|id| id_equals(&group.creator_id, id))
}

/// Admin or creator.
#[must_use]
pub fn is_moderator(snapshot: &GroupSnapshot, user_id: Option<&str>) -> bool {
    is_admin(snapshot, user_id) || is_creator(&snapshot.group, user_id)
}

/// Whether the user has a join request waiting.
#[must_use]
pub fn has_pending_request(snapshot: &GroupSnapshot, user_id: Option<&str>) -> bool {
    user_id.is_some_and(|id| {
        snapshot
            .pending
            .iter()
            .any(|r| id_equals(&r.user_id, id))
    })
}

/// Member takes precedence if a user somehow shows up in both lists.
#[must_use]
pub fn membership_state(snapshot: &GroupSnapshot, user_id: &str) -> MembershipState {
    if is_member(snapshot, Some(user_id)) {
        MembershipState::Member
    } else if has_pending_request(snapshot, Some(user_id)) {
        MembershipState::Pending
    } else {
        MembershipState::NonMember
    }
}

/// Public groups are readable by everyone, private ones by members only.
///
/// A denial is reported to clients as an empty listing, never as an error,
/// so private groups cannot be probed through status codes.
#[must_use]
pub fn can_view_posts(snapshot: &GroupSnapshot, user_id: Option<&str>) -> bool {
    !snapshot.group.is_private || is_member(snapshot, user_id)
}

/// Members may post unless member posting is off and they are not moderators.
pub fn can_create_post(snapshot: &GroupSnapshot, user_id: Option<&str>) -> Result<(), PostDenial> {
    if !is_member(snapshot, user_id) {
        return Err(PostDenial::NotMember);
    }

    if !effective_settings(&snapshot.group).allow_member_posts && !is_moderator(snapshot, user_id)
    {
        return Err(PostDenial::AdminsOnly);
    }

    Ok(())
}

/// Decides `is_approved` for a new post.
#[must_use]
pub fn auto_approve_post(snapshot: &GroupSnapshot, user_id: Option<&str>) -> bool {
    !effective_settings(&snapshot.group).require_approval || is_moderator(snapshot, user_id)
}

/// Edit/delete rights over content owned by `owner_id`.
///
/// For comments, `owner_id` is the comment author rather than the post author.
#[must_use]
pub fn can_moderate_post(snapshot: &GroupSnapshot, owner_id: &str, user_id: Option<&str>) -> bool {
    user_id.is_some_and(|id| id_equals(owner_id, id)) || is_moderator(snapshot, user_id)
}

/// Only member-list admins decide join requests; being the creator alone
/// does not qualify.
#[must_use]
pub fn can_decide_requests(snapshot: &GroupSnapshot, user_id: Option<&str>) -> bool {
    is_admin(snapshot, user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use potluck_db::entities::group::GroupSettings;
    use potluck_db::entities::group_join_request;
    use potluck_db::entities::group_member::GroupRole;

    fn snapshot(is_private: bool, settings: Option<GroupSettings>) -> GroupSnapshot {
        GroupSnapshot {
            group: group::Model {
                id: "g1".to_string(),
                creator_id: "creator".to_string(),
                name: "Bread Club".to_string(),
                description: None,
                category: "General".to_string(),
                rules: None,
                image: None,
                is_private,
                settings,
                allow_member_posts: None,
                require_approval: None,
                allow_invites: None,
                created_at: Utc::now().into(),
                updated_at: None,
            },
            members: vec![
                member("creator", GroupRole::Admin),
                member("admin", GroupRole::Admin),
                member("owner", GroupRole::Owner),
                member("plain", GroupRole::Member),
            ],
            pending: vec![group_join_request::Model {
                id: "r1".to_string(),
                group_id: "g1".to_string(),
                user_id: "waiting".to_string(),
                requested_at: Utc::now().into(),
            }],
        }
    }

    fn member(user_id: &str, role: GroupRole) -> group_member::Model {
        group_member::Model {
            id: format!("m-{user_id}"),
            group_id: "g1".to_string(),
            user_id: user_id.to_string(),
            role,
            joined_at: Utc::now().into(),
        }
    }

    fn require_approval(value: bool) -> Option<GroupSettings> {
        Some(GroupSettings {
            require_approval: Some(value),
            ..GroupSettings::default()
        })
    }

    #[test]
    fn test_effective_settings_default_to_true() {
        let s = snapshot(false, None);
        let settings = effective_settings(&s.group);
        assert!(settings.allow_member_posts);
        assert!(settings.require_approval);
        assert!(settings.allow_invites);
    }

    #[test]
    fn test_effective_settings_prefer_document_over_legacy() {
        let mut s = snapshot(false, require_approval(false));
        s.group.require_approval = Some(true);
        s.group.allow_member_posts = Some(false);

        let settings = effective_settings(&s.group);
        assert!(!settings.require_approval);
        // No document value, so the legacy column wins
        assert!(!settings.allow_member_posts);
    }

    #[test]
    fn test_ids_compare_normalized() {
        let s = snapshot(false, None);
        assert!(is_member(&s, Some(" PLAIN ")));
        assert!(is_creator(&s.group, Some("Creator")));
    }

    #[test]
    fn test_roles() {
        let s = snapshot(false, None);
        assert!(is_admin(&s, Some("owner")));
        assert!(is_admin(&s, Some("admin")));
        assert!(!is_admin(&s, Some("plain")));
        assert!(!is_admin(&s, None));
        assert!(is_moderator(&s, Some("creator")));
        assert!(!is_moderator(&s, Some("plain")));
    }

    #[test]
    fn test_creator_dropped_from_members_is_still_moderator_but_not_admin() {
        let mut s = snapshot(false, None);
        s.members.retain(|m| m.user_id != "creator");

        assert!(is_moderator(&s, Some("creator")));
        assert!(!can_decide_requests(&s, Some("creator")));
    }

    #[test]
    fn test_membership_state() {
        let s = snapshot(false, None);
        assert_eq!(membership_state(&s, "plain"), MembershipState::Member);
        assert_eq!(membership_state(&s, "waiting"), MembershipState::Pending);
        assert_eq!(membership_state(&s, "stranger"), MembershipState::NonMember);
    }

    #[test]
    fn test_private_group_hidden_from_outsiders() {
        let private = snapshot(true, None);
        assert!(!can_view_posts(&private, None));
        assert!(!can_view_posts(&private, Some("stranger")));
        assert!(!can_view_posts(&private, Some("waiting")));
        assert!(can_view_posts(&private, Some("plain")));

        let public = snapshot(false, None);
        assert!(can_view_posts(&public, None));
    }

    #[test]
    fn test_can_create_post() {
        let open = snapshot(false, None);
        assert_eq!(can_create_post(&open, Some("plain")), Ok(()));
        assert_eq!(
            can_create_post(&open, Some("stranger")),
            Err(PostDenial::NotMember)
        );
        assert_eq!(can_create_post(&open, None), Err(PostDenial::NotMember));

        let admins_only = snapshot(
            false,
            Some(GroupSettings {
                allow_member_posts: Some(false),
                ..GroupSettings::default()
            }),
        );
        assert_eq!(
            can_create_post(&admins_only, Some("plain")),
            Err(PostDenial::AdminsOnly)
        );
        assert_eq!(can_create_post(&admins_only, Some("admin")), Ok(()));
        assert_eq!(can_create_post(&admins_only, Some("creator")), Ok(()));
    }

    #[test]
    fn test_auto_approve_truth_table() {
        let strict = snapshot(false, require_approval(true));
        let relaxed = snapshot(false, require_approval(false));

        assert!(!auto_approve_post(&strict, Some("plain")));
        assert!(auto_approve_post(&strict, Some("admin")));
        assert!(auto_approve_post(&relaxed, Some("plain")));
        assert!(auto_approve_post(&relaxed, Some("admin")));
    }

    #[test]
    fn test_can_moderate_post() {
        let s = snapshot(false, None);
        assert!(can_moderate_post(&s, "plain", Some("plain")));
        assert!(can_moderate_post(&s, "plain", Some("owner")));
        assert!(!can_moderate_post(&s, "plain", Some("stranger")));
        assert!(!can_moderate_post(&s, "plain", None));
    }
}

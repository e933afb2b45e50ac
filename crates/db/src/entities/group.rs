//! Group entity for recipe-sharing communities.

use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-group switches stored as a JSON document.
///
/// Every field is optional: rows written before the document existed carry
/// the same switches as top-level columns on [`Model`], and a missing value
/// falls back to those.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(rename_all = "camelCase")]
pub struct GroupSettings {
    /// Whether plain members may create posts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_member_posts: Option<bool>,
    /// Whether joining and posting go through moderator approval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_approval: Option<bool>,
    /// Whether members may invite others.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_invites: Option<bool>,
}

/// Group entity.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "group")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// User who created the group. Never changes.
    #[sea_orm(indexed)]
    pub creator_id: String,

    /// Group name.
    pub name: String,

    /// Group description (optional).
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Free-form category, "General" unless given.
    pub category: String,

    /// Group rules (optional).
    #[sea_orm(column_type = "Text", nullable)]
    pub rules: Option<String>,

    /// Encoded cover image (optional).
    #[sea_orm(column_type = "Text", nullable)]
    pub image: Option<String>,

    /// Private groups hide their posts from non-members.
    #[sea_orm(default_value = false)]
    pub is_private: bool,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub settings: Option<GroupSettings>,

    /// Legacy switch, superseded by `settings.allowMemberPosts`.
    #[sea_orm(nullable)]
    pub allow_member_posts: Option<bool>,

    /// Legacy switch, superseded by `settings.requireApproval`.
    #[sea_orm(nullable)]
    pub require_approval: Option<bool>,

    /// Legacy switch, superseded by `settings.allowInvites`.
    #[sea_orm(nullable)]
    pub allow_invites: Option<bool>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_member::Entity")]
    Members,
    #[sea_orm(has_many = "super::group_join_request::Entity")]
    JoinRequests,
    #[sea_orm(has_many = "super::group_post::Entity")]
    Posts,
}

impl Related<super::group_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::group_join_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JoinRequests.def()
    }
}

impl Related<super::group_post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

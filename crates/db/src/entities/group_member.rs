//! Group member entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role of a group member.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    /// Regular member.
    #[default]
    #[sea_orm(string_value = "member")]
    Member,
    /// Admin - decides join requests and moderates content.
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Owner - same rights as admin.
    #[sea_orm(string_value = "owner")]
    Owner,
}

impl GroupRole {
    /// Check if the role carries admin rights.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin | Self::Owner)
    }
}

/// Group member - one row per user in a group, ordered by `joined_at`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "group_member")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The group they belong to.
    #[sea_orm(indexed)]
    pub group_id: String,

    /// The user who is a member.
    #[sea_orm(indexed)]
    pub user_id: String,

    /// Role of the member in the group.
    pub role: GroupRole,

    /// When the user joined the group.
    pub joined_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id",
        on_delete = "Cascade"
    )]
    Group,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Group post like entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Group post like - a record of a user liking a group post.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "group_post_like")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Post that was liked.
    #[sea_orm(indexed)]
    pub post_id: String,

    /// User who liked the post.
    #[sea_orm(indexed)]
    pub user_id: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::group_post::Entity",
        from = "Column::PostId",
        to = "super::group_post::Column::Id",
        on_delete = "Cascade"
    )]
    Post,
}

impl Related<super::group_post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

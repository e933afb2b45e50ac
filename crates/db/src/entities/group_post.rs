//! Group post entity - a recipe shared inside a group.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "group_post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub group_id: String,

    /// Author.
    #[sea_orm(indexed)]
    pub user_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    #[sea_orm(column_type = "Text")]
    pub ingredients: String,

    #[sea_orm(column_type = "Text")]
    pub instructions: String,

    pub category: String,

    pub meat_type: String,

    /// Preparation time in minutes.
    pub prep_time: i32,

    pub servings: i32,

    /// Encoded image (optional).
    #[sea_orm(column_type = "Text", nullable)]
    pub image: Option<String>,

    /// Decided once when the post is created.
    pub is_approved: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
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
    #[sea_orm(has_many = "super::group_post_like::Entity")]
    Likes,
    #[sea_orm(has_many = "super::group_post_comment::Entity")]
    Comments,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::group_post_like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Likes.def()
    }
}

impl Related<super::group_post_comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

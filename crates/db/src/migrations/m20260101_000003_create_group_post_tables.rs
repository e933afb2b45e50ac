//! Create `group_post`, `group_post_like`, and `group_post_comment` tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GroupPost::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupPost::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GroupPost::GroupId).string_len(32).not_null())
                    .col(ColumnDef::new(GroupPost::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(GroupPost::Title).string_len(256).not_null())
                    .col(
                        ColumnDef::new(GroupPost::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(GroupPost::Ingredients)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(GroupPost::Instructions)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(GroupPost::Category)
                            .string_len(64)
                            .not_null()
                            .default("General"),
                    )
                    .col(
                        ColumnDef::new(GroupPost::MeatType)
                            .string_len(64)
                            .not_null()
                            .default("Mixed"),
                    )
                    .col(
                        ColumnDef::new(GroupPost::PrepTime)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(GroupPost::PrepTime).gte(0)),
                    )
                    .col(
                        ColumnDef::new(GroupPost::Servings)
                            .integer()
                            .not_null()
                            .default(1)
                            .check(Expr::col(GroupPost::Servings).gte(1)),
                    )
                    .col(ColumnDef::new(GroupPost::Image).text())
                    .col(
                        ColumnDef::new(GroupPost::IsApproved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(GroupPost::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(GroupPost::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_post_group")
                            .from(GroupPost::Table, GroupPost::GroupId)
                            .to(Group::Table, Group::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Listing reads approved posts of one group, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_group_post_group_approved_created")
                    .table(GroupPost::Table)
                    .col(GroupPost::GroupId)
                    .col(GroupPost::IsApproved)
                    .col(GroupPost::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupPostLike::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupPostLike::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GroupPostLike::PostId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupPostLike::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupPostLike::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_post_like_post")
                            .from(GroupPostLike::Table, GroupPostLike::PostId)
                            .to(GroupPost::Table, GroupPost::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_group_post_like_unique")
                    .table(GroupPostLike::Table)
                    .col(GroupPostLike::PostId)
                    .col(GroupPostLike::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupPostComment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupPostComment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GroupPostComment::PostId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupPostComment::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupPostComment::UserName)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(GroupPostComment::Text).text().not_null())
                    .col(
                        ColumnDef::new(GroupPostComment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_post_comment_post")
                            .from(GroupPostComment::Table, GroupPostComment::PostId)
                            .to(GroupPost::Table, GroupPost::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_group_post_comment_post_id")
                    .table(GroupPostComment::Table)
                    .col(GroupPostComment::PostId)
                    .col(GroupPostComment::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GroupPostComment::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GroupPostLike::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GroupPost::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Group {
    Table,
    Id,
}

#[derive(Iden)]
enum GroupPost {
    Table,
    Id,
    GroupId,
    UserId,
    Title,
    Description,
    Ingredients,
    Instructions,
    Category,
    MeatType,
    PrepTime,
    Servings,
    Image,
    IsApproved,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum GroupPostLike {
    Table,
    Id,
    PostId,
    UserId,
    CreatedAt,
}

#[derive(Iden)]
enum GroupPostComment {
    Table,
    Id,
    PostId,
    UserId,
    UserName,
    Text,
    CreatedAt,
}

//! Create group, `group_member`, and `group_join_request` tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Group::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Group::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Group::CreatorId).string_len(32).not_null())
                    .col(ColumnDef::new(Group::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Group::Description).text())
                    .col(
                        ColumnDef::new(Group::Category)
                            .string_len(64)
                            .not_null()
                            .default("General"),
                    )
                    .col(ColumnDef::new(Group::Rules).text())
                    .col(ColumnDef::new(Group::Image).text())
                    .col(
                        ColumnDef::new(Group::IsPrivate)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Group::Settings).json_binary())
                    .col(ColumnDef::new(Group::AllowMemberPosts).boolean())
                    .col(ColumnDef::new(Group::RequireApproval).boolean())
                    .col(ColumnDef::new(Group::AllowInvites).boolean())
                    .col(
                        ColumnDef::new(Group::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Group::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_group_creator_id")
                    .table(Group::Table)
                    .col(Group::CreatorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_group_created_at")
                    .table(Group::Table)
                    .col(Group::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupMember::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupMember::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GroupMember::GroupId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupMember::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupMember::Role)
                            .string_len(20)
                            .not_null()
                            .default("member"),
                    )
                    .col(
                        ColumnDef::new(GroupMember::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_member_group")
                            .from(GroupMember::Table, GroupMember::GroupId)
                            .to(Group::Table, Group::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_group_member_user_id")
                    .table(GroupMember::Table)
                    .col(GroupMember::UserId)
                    .to_owned(),
            )
            .await?;

        // One membership row per (group_id, user_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_group_member_unique")
                    .table(GroupMember::Table)
                    .col(GroupMember::GroupId)
                    .col(GroupMember::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupJoinRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupJoinRequest::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GroupJoinRequest::GroupId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupJoinRequest::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupJoinRequest::RequestedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_join_request_group")
                            .from(GroupJoinRequest::Table, GroupJoinRequest::GroupId)
                            .to(Group::Table, Group::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_group_join_request_unique")
                    .table(GroupJoinRequest::Table)
                    .col(GroupJoinRequest::GroupId)
                    .col(GroupJoinRequest::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GroupJoinRequest::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GroupMember::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Group::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Group {
    Table,
    Id,
    CreatorId,
    Name,
    Description,
    Category,
    Rules,
    Image,
    IsPrivate,
    Settings,
    AllowMemberPosts,
    RequireApproval,
    AllowInvites,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum GroupMember {
    Table,
    Id,
    GroupId,
    UserId,
    Role,
    JoinedAt,
}

#[derive(Iden)]
enum GroupJoinRequest {
    Table,
    Id,
    GroupId,
    UserId,
    RequestedAt,
}

//! Group repository.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use potluck_common::AppResult;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, OnConflict, Query};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::debug;

use crate::entities::{
    Group, GroupJoinRequest, GroupMember, GroupPost, group, group_join_request, group_member,
    group_post,
};
use crate::map_db_err;
use crate::store::{GroupQuery, GroupSnapshot, GroupStore, JoinOutcome};

/// Repository for group operations.
#[derive(Clone)]
pub struct GroupRepository {
    db: Arc<DatabaseConnection>,
}

impl GroupRepository {
    /// Create a new group repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lock the group row for the rest of the transaction.
    ///
    /// Concurrent membership writes for the same group queue up behind this
    /// lock, so the existence checks that follow stay valid until commit.
    async fn lock_group(txn: &DatabaseTransaction, group_id: &str) -> Result<bool, DbErr> {
        let locked = Group::find_by_id(group_id)
            .lock_exclusive()
            .one(txn)
            .await?;
        Ok(locked.is_some())
    }

    /// Report which admission precondition fails, if any.
    async fn admission_conflict(
        txn: &DatabaseTransaction,
        group_id: &str,
        user_id: &str,
    ) -> Result<Option<JoinOutcome>, DbErr> {
        if !Self::lock_group(txn, group_id).await? {
            return Ok(Some(JoinOutcome::GroupMissing));
        }

        let member = GroupMember::find()
            .filter(group_member::Column::GroupId.eq(group_id))
            .filter(group_member::Column::UserId.eq(user_id))
            .one(txn)
            .await?;
        if member.is_some() {
            return Ok(Some(JoinOutcome::AlreadyMember));
        }

        let pending = GroupJoinRequest::find()
            .filter(group_join_request::Column::GroupId.eq(group_id))
            .filter(group_join_request::Column::UserId.eq(user_id))
            .one(txn)
            .await?;
        if pending.is_some() {
            return Ok(Some(JoinOutcome::AlreadyPending));
        }

        Ok(None)
    }

    async fn insert_member<C: ConnectionTrait>(
        conn: &C,
        member: group_member::Model,
    ) -> Result<u64, DbErr> {
        GroupMember::insert(member_active_model(member))
            .on_conflict(
                OnConflict::columns([group_member::Column::GroupId, group_member::Column::UserId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await
    }

    /// Load members and pending requests for a batch of groups.
    async fn attach_memberships(&self, groups: Vec<group::Model>) -> AppResult<Vec<GroupSnapshot>> {
        if groups.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<String> = groups.iter().map(|g| g.id.clone()).collect();

        let members = GroupMember::find()
            .filter(group_member::Column::GroupId.is_in(ids.clone()))
            .order_by_asc(group_member::Column::JoinedAt)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        let pending = GroupJoinRequest::find()
            .filter(group_join_request::Column::GroupId.is_in(ids))
            .order_by_asc(group_join_request::Column::RequestedAt)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        let mut members_by_group: HashMap<String, Vec<group_member::Model>> = HashMap::new();
        for member in members {
            members_by_group
                .entry(member.group_id.clone())
                .or_default()
                .push(member);
        }

        let mut pending_by_group: HashMap<String, Vec<group_join_request::Model>> =
            HashMap::new();
        for request in pending {
            pending_by_group
                .entry(request.group_id.clone())
                .or_default()
                .push(request);
        }

        Ok(groups
            .into_iter()
            .map(|group| GroupSnapshot {
                members: members_by_group.remove(&group.id).unwrap_or_default(),
                pending: pending_by_group.remove(&group.id).unwrap_or_default(),
                group,
            })
            .collect())
    }
}

#[async_trait]
impl GroupStore for GroupRepository {
    async fn ping(&self) -> AppResult<()> {
        self.db.ping().await.map_err(map_db_err)
    }

    async fn find_group(&self, group_id: &str) -> AppResult<Option<GroupSnapshot>> {
        let Some(group) = Group::find_by_id(group_id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?
        else {
            return Ok(None);
        };

        let mut snapshots = self.attach_memberships(vec![group]).await?;
        Ok(snapshots.pop())
    }

    async fn list_groups(&self, query: GroupQuery) -> AppResult<Vec<GroupSnapshot>> {
        let mut select = Group::find();

        if !query.include_private {
            let mut visible = Condition::any().add(group::Column::IsPrivate.eq(false));
            if let Some(viewer) = &query.viewer {
                visible = visible.add(
                    group::Column::Id.in_subquery(
                        Query::select()
                            .column(group_member::Column::GroupId)
                            .from(GroupMember)
                            .and_where(group_member::Column::UserId.eq(viewer.as_str()))
                            .to_owned(),
                    ),
                );
            }
            select = select.filter(visible);
        }

        if let Some(text) = &query.text {
            let pattern = format!("%{}%", escape_like(text));
            select = select.filter(
                Condition::any()
                    .add(Expr::col((Group, group::Column::Name)).ilike(pattern.as_str()))
                    .add(Expr::col((Group, group::Column::Description)).ilike(pattern.as_str()))
                    .add(Expr::col((Group, group::Column::Category)).ilike(pattern.as_str())),
            );
        }

        select = select
            .order_by_desc(group::Column::CreatedAt)
            .order_by_desc(group::Column::Id);
        if let Some(limit) = query.limit {
            select = select.limit(limit);
        }

        let groups = select.all(self.db.as_ref()).await.map_err(map_db_err)?;
        debug!(count = groups.len(), "Listed groups");

        self.attach_memberships(groups).await
    }

    async fn insert_group(&self, snapshot: &GroupSnapshot) -> AppResult<()> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        Group::insert(group_active_model(snapshot.group.clone()))
            .exec_without_returning(&txn)
            .await
            .map_err(map_db_err)?;

        for member in &snapshot.members {
            Self::insert_member(&txn, member.clone())
                .await
                .map_err(map_db_err)?;
        }

        for request in &snapshot.pending {
            GroupJoinRequest::insert(request_active_model(request.clone()))
                .exec_without_returning(&txn)
                .await
                .map_err(map_db_err)?;
        }

        txn.commit().await.map_err(map_db_err)
    }

    async fn add_join_request(
        &self,
        request: group_join_request::Model,
    ) -> AppResult<JoinOutcome> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        if let Some(conflict) =
            Self::admission_conflict(&txn, &request.group_id, &request.user_id)
                .await
                .map_err(map_db_err)?
        {
            txn.rollback().await.map_err(map_db_err)?;
            return Ok(conflict);
        }

        GroupJoinRequest::insert(request_active_model(request))
            .exec_without_returning(&txn)
            .await
            .map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;
        Ok(JoinOutcome::Added)
    }

    async fn add_member(&self, member: group_member::Model) -> AppResult<JoinOutcome> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        if let Some(conflict) = Self::admission_conflict(&txn, &member.group_id, &member.user_id)
            .await
            .map_err(map_db_err)?
        {
            txn.rollback().await.map_err(map_db_err)?;
            return Ok(conflict);
        }

        Self::insert_member(&txn, member)
            .await
            .map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;
        Ok(JoinOutcome::Added)
    }

    async fn approve_join_request(&self, member: group_member::Model) -> AppResult<bool> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        if !Self::lock_group(&txn, &member.group_id)
            .await
            .map_err(map_db_err)?
        {
            txn.rollback().await.map_err(map_db_err)?;
            return Ok(false);
        }

        let removed = GroupJoinRequest::delete_many()
            .filter(group_join_request::Column::GroupId.eq(member.group_id.as_str()))
            .filter(group_join_request::Column::UserId.eq(member.user_id.as_str()))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        if removed.rows_affected == 0 {
            txn.rollback().await.map_err(map_db_err)?;
            return Ok(false);
        }

        Self::insert_member(&txn, member)
            .await
            .map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;
        Ok(true)
    }

    async fn remove_join_request(&self, group_id: &str, user_id: &str) -> AppResult<bool> {
        let result = GroupJoinRequest::delete_many()
            .filter(group_join_request::Column::GroupId.eq(group_id))
            .filter(group_join_request::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn remove_member(&self, group_id: &str, user_id: &str) -> AppResult<bool> {
        let result = GroupMember::delete_many()
            .filter(group_member::Column::GroupId.eq(group_id))
            .filter(group_member::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn delete_group_cascade(&self, group_id: &str) -> AppResult<bool> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        // Likes and comments go with their posts via ON DELETE CASCADE
        let posts = GroupPost::delete_many()
            .filter(group_post::Column::GroupId.eq(group_id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        let deleted = Group::delete_by_id(group_id)
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;

        debug!(
            group_id = %group_id,
            posts = posts.rows_affected,
            "Deleted group with its posts"
        );
        Ok(deleted.rows_affected > 0)
    }
}

/// Escape `LIKE` wildcards so user input only matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn group_active_model(model: group::Model) -> group::ActiveModel {
    group::ActiveModel {
        id: Set(model.id),
        creator_id: Set(model.creator_id),
        name: Set(model.name),
        description: Set(model.description),
        category: Set(model.category),
        rules: Set(model.rules),
        image: Set(model.image),
        is_private: Set(model.is_private),
        settings: Set(model.settings),
        allow_member_posts: Set(model.allow_member_posts),
        require_approval: Set(model.require_approval),
        allow_invites: Set(model.allow_invites),
        created_at: Set(model.created_at),
        updated_at: Set(model.updated_at),
    }
}

fn member_active_model(model: group_member::Model) -> group_member::ActiveModel {
    group_member::ActiveModel {
        id: Set(model.id),
        group_id: Set(model.group_id),
        user_id: Set(model.user_id),
        role: Set(model.role),
        joined_at: Set(model.joined_at),
    }
}

fn request_active_model(model: group_join_request::Model) -> group_join_request::ActiveModel {
    group_join_request::ActiveModel {
        id: Set(model.id),
        group_id: Set(model.group_id),
        user_id: Set(model.user_id),
        requested_at: Set(model.requested_at),
    }
}

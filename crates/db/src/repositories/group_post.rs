//! Group post repository.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use potluck_common::AppResult;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::entities::{
    GroupPost, GroupPostComment, GroupPostLike, group_post, group_post_comment, group_post_like,
};
use crate::map_db_err;
use crate::store::{GroupPostStore, PostSnapshot};

/// Repository for group post operations.
#[derive(Clone)]
pub struct GroupPostRepository {
    db: Arc<DatabaseConnection>,
}

impl GroupPostRepository {
    /// Create a new group post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Load likes and comments for a batch of posts, keeping the post order.
    async fn attach_reactions(&self, posts: Vec<group_post::Model>) -> AppResult<Vec<PostSnapshot>> {
        if posts.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();

        let likes = GroupPostLike::find()
            .filter(group_post_like::Column::PostId.is_in(ids.clone()))
            .order_by_asc(group_post_like::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        let comments = GroupPostComment::find()
            .filter(group_post_comment::Column::PostId.is_in(ids))
            .order_by_asc(group_post_comment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        let mut likes_by_post: HashMap<String, Vec<group_post_like::Model>> = HashMap::new();
        for like in likes {
            likes_by_post
                .entry(like.post_id.clone())
                .or_default()
                .push(like);
        }

        let mut comments_by_post: HashMap<String, Vec<group_post_comment::Model>> =
            HashMap::new();
        for comment in comments {
            comments_by_post
                .entry(comment.post_id.clone())
                .or_default()
                .push(comment);
        }

        Ok(posts
            .into_iter()
            .map(|post| PostSnapshot {
                likes: likes_by_post.remove(&post.id).unwrap_or_default(),
                comments: comments_by_post.remove(&post.id).unwrap_or_default(),
                post,
            })
            .collect())
    }
}

#[async_trait]
impl GroupPostStore for GroupPostRepository {
    async fn find_post(&self, post_id: &str) -> AppResult<Option<PostSnapshot>> {
        let Some(post) = GroupPost::find_by_id(post_id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?
        else {
            return Ok(None);
        };

        let mut snapshots = self.attach_reactions(vec![post]).await?;
        Ok(snapshots.pop())
    }

    async fn list_posts(
        &self,
        group_id: &str,
        approved_only: bool,
    ) -> AppResult<Vec<PostSnapshot>> {
        let mut select = GroupPost::find().filter(group_post::Column::GroupId.eq(group_id));
        if approved_only {
            select = select.filter(group_post::Column::IsApproved.eq(true));
        }

        let posts = select
            .order_by_desc(group_post::Column::CreatedAt)
            .order_by_desc(group_post::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        self.attach_reactions(posts).await
    }

    async fn count_posts(&self, group_id: &str, approved_only: bool) -> AppResult<u64> {
        let mut select = GroupPost::find().filter(group_post::Column::GroupId.eq(group_id));
        if approved_only {
            select = select.filter(group_post::Column::IsApproved.eq(true));
        }

        select.count(self.db.as_ref()).await.map_err(map_db_err)
    }

    async fn insert_post(&self, post: group_post::Model) -> AppResult<()> {
        let model = group_post::ActiveModel {
            id: Set(post.id),
            group_id: Set(post.group_id),
            user_id: Set(post.user_id),
            title: Set(post.title),
            description: Set(post.description),
            ingredients: Set(post.ingredients),
            instructions: Set(post.instructions),
            category: Set(post.category),
            meat_type: Set(post.meat_type),
            prep_time: Set(post.prep_time),
            servings: Set(post.servings),
            image: Set(post.image),
            is_approved: Set(post.is_approved),
            created_at: Set(post.created_at),
            updated_at: Set(post.updated_at),
        };

        GroupPost::insert(model)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(())
    }

    async fn update_post(&self, post: &group_post::Model) -> AppResult<bool> {
        let changes = group_post::ActiveModel {
            id: NotSet,
            group_id: NotSet,
            user_id: NotSet,
            title: Set(post.title.clone()),
            description: Set(post.description.clone()),
            ingredients: Set(post.ingredients.clone()),
            instructions: Set(post.instructions.clone()),
            category: Set(post.category.clone()),
            meat_type: Set(post.meat_type.clone()),
            prep_time: Set(post.prep_time),
            servings: Set(post.servings),
            image: Set(post.image.clone()),
            is_approved: NotSet,
            created_at: NotSet,
            updated_at: Set(post.updated_at),
        };

        let result = GroupPost::update_many()
            .set(changes)
            .filter(group_post::Column::Id.eq(post.id.as_str()))
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn delete_post(&self, post_id: &str) -> AppResult<bool> {
        let result = GroupPost::delete_by_id(post_id)
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn add_like(&self, like: group_post_like::Model) -> AppResult<bool> {
        let model = group_post_like::ActiveModel {
            id: Set(like.id),
            post_id: Set(like.post_id),
            user_id: Set(like.user_id),
            created_at: Set(like.created_at),
        };

        let inserted = GroupPostLike::insert(model)
            .on_conflict(
                OnConflict::columns([
                    group_post_like::Column::PostId,
                    group_post_like::Column::UserId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(inserted > 0)
    }

    async fn remove_like(&self, post_id: &str, user_id: &str) -> AppResult<bool> {
        let result = GroupPostLike::delete_many()
            .filter(group_post_like::Column::PostId.eq(post_id))
            .filter(group_post_like::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn add_comment(&self, comment: group_post_comment::Model) -> AppResult<()> {
        let model = group_post_comment::ActiveModel {
            id: Set(comment.id),
            post_id: Set(comment.post_id),
            user_id: Set(comment.user_id),
            user_name: Set(comment.user_name),
            text: Set(comment.text),
            created_at: Set(comment.created_at),
        };

        GroupPostComment::insert(model)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(())
    }

    async fn remove_comment(&self, post_id: &str, comment_id: &str) -> AppResult<bool> {
        let result = GroupPostComment::delete_many()
            .filter(group_post_comment::Column::Id.eq(comment_id))
            .filter(group_post_comment::Column::PostId.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }
}

//! User repository.

use std::sync::Arc;

use async_trait::async_trait;
use potluck_common::AppResult;
use sea_orm::{DatabaseConnection, EntityTrait};

use crate::entities::{User, user};
use crate::map_db_err;
use crate::store::{UserDirectory, UserSummary};

/// Read-only access to user display data.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn find_user(&self, user_id: &str) -> AppResult<Option<UserSummary>> {
        Ok(self.find_by_id(user_id).await?.map(|u| UserSummary {
            id: u.id,
            full_name: u.full_name,
            avatar: u.avatar,
            bio: u.bio,
        }))
    }
}

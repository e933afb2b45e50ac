//! Database entities.

#![allow(missing_docs)]

pub mod group;
pub mod group_join_request;
pub mod group_member;
pub mod group_post;
pub mod group_post_comment;
pub mod group_post_like;
pub mod user;

pub use group::Entity as Group;
pub use group_join_request::Entity as GroupJoinRequest;
pub use group_member::Entity as GroupMember;
pub use group_post::Entity as GroupPost;
pub use group_post_comment::Entity as GroupPostComment;
pub use group_post_like::Entity as GroupPostLike;
pub use user::Entity as User;

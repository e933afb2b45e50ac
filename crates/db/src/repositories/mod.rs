//! Database repositories.

mod group;
mod group_post;
mod user;

pub use group::GroupRepository;
pub use group_post::GroupPostRepository;
pub use user::UserRepository;

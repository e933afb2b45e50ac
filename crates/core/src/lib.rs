//! Core business logic for potluck.
//!
//! [`authz`] holds the pure membership and visibility rules; the services in
//! [`services`] load state from the stores, ask those rules, and write back.

pub mod authz;
pub mod error;
pub mod services;

pub use error::{GroupError, GroupResult, MemberAction};
pub use services::*;

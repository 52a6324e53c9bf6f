//! Ownership checks for update and delete operations.
//!
//! Every mutating operation on a post, comment or like goes through
//! [`authorize`]. The record must already be known to exist: callers return
//! 404 for missing records before asking this module.

use crate::db::{Comment, Like, Post, User};

/// The actor does not own the record it tried to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("not the owner of this resource")]
pub struct Forbidden;

/// A stored record with a single owning user.
pub trait Owned {
    fn owner_id(&self) -> &str;
}

impl Owned for Post {
    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

impl Owned for Like {
    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

/// Allow only when the acting identity is the recorded owner.
pub fn authorize(actor_id: &str, owner_id: &str) -> Result<(), Forbidden> {
    if actor_id == owner_id {
        Ok(())
    } else {
        Err(Forbidden)
    }
}

pub fn ensure_owner<R: Owned>(actor: &User, record: &R) -> Result<(), Forbidden> {
    authorize(&actor.id, record.owner_id())
}

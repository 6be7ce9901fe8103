//! # Ownership Guard
//!
//! Row-level authorization is expressed as an extra predicate on the
//! mutating statement itself, never as a read followed by a write.

use crate::models::Actor;

/// Which rows a mutation may touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerScope {
    /// Privileged caller: no author predicate.
    Unrestricted,
    /// Only rows whose owner column equals this id.
    Author(String),
}

impl OwnerScope {
    pub fn for_actor(actor: &Actor) -> Self {
        if actor.privileged {
            OwnerScope::Unrestricted
        } else {
            OwnerScope::Author(actor.id.clone())
        }
    }

    pub fn owner(id: impl Into<String>) -> Self {
        OwnerScope::Author(id.into())
    }
}

/// Caller-side reading of a guarded mutation's row count.
///
/// A privileged caller's miss can only mean the row is absent; an
/// unprivileged caller's miss may also mean it belongs to someone else,
/// and the two are deliberately indistinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    NotFound,
    Forbidden,
}

impl Outcome {
    pub fn classify(rows: u64, actor: &Actor) -> Self {
        match (rows, actor.privileged) {
            (0, true) => Outcome::NotFound,
            (0, false) => Outcome::Forbidden,
            _ => Outcome::Done,
        }
    }
}

//! # Domain Models
//!
//! These structs represent the entities the persistence core hands back to
//! its caller. Timestamps are naive because the live schemas store them
//! without a zone.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Initial status of every comment written by the tree engine.
pub const COMMENT_STATUS_PUBLISHED: &str = "published";

/// Identifier of a post. Older schemas use an auto-increment integer,
/// newer ones a UUID string; a post never carries both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostKey {
    Numeric(i64),
    Text(String),
}

impl PostKey {
    /// Purely ASCII-digit input becomes `Numeric`, anything else `Text`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = raw.parse::<i64>() {
                return PostKey::Numeric(n);
            }
        }
        PostKey::Text(raw.to_string())
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, PostKey::Numeric(_))
    }
}

impl fmt::Display for PostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostKey::Numeric(n) => write!(f, "{n}"),
            PostKey::Text(s) => f.write_str(s),
        }
    }
}

impl FromStr for PostKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PostKey::parse(s))
    }
}

impl From<i64> for PostKey {
    fn from(n: i64) -> Self {
        PostKey::Numeric(n)
    }
}

/// A post as read back from whichever post table the schema probe found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// `None` only when the table has no usable key column.
    pub key: Option<PostKey>,
    /// Stored board reference: the board code or the board's UUID,
    /// depending on the schema generation.
    pub board: String,
    pub title: String,
    pub content: String,
    pub writer_id: Option<String>,
    pub writer_name: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// Payload for creating a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPost {
    /// Human-facing board code (e.g. "NORM"), translated before storage.
    pub board_code: String,
    pub title: String,
    pub content: String,
    pub writer_id: Option<String>,
    pub writer_name: Option<String>,
}

/// Mutable fields of a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostUpdate {
    pub title: String,
    pub content: String,
}

/// A comment in the UUID-keyed comment schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub uuid: String,
    /// Stored post reference (post UUID, or the numeric id as text).
    pub post_ref: String,
    /// `None` for top-level comments.
    pub parent_uuid: Option<String>,
    pub depth: u32,
    pub author_id: String,
    pub content: String,
    pub status: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// Payload for creating a comment or a reply.
///
/// A reply may omit `post`; it is then taken from the parent comment.
/// `depth` is never accepted from the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewComment {
    pub uuid: Option<String>,
    pub post: Option<PostKey>,
    pub parent_uuid: Option<String>,
    pub author_id: String,
    pub content: String,
}

/// The authenticated caller of a mutating operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    /// Privileged actors (admins) bypass author checks.
    pub privileged: bool,
}

impl Actor {
    pub fn member(id: impl Into<String>) -> Self {
        Self { id: id.into(), privileged: false }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self { id: id.into(), privileged: true }
    }
}

/// One page of a board listing. Pages are zero-based.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, size: u32) -> Self {
        let per_page = u64::from(size.max(1));
        let total_pages = u32::try_from(total.div_ceil(per_page)).unwrap_or(u32::MAX);
        Self { items, total, page, size, total_pages }
    }

    pub fn empty(page: u32, size: u32) -> Self {
        Self::new(Vec::new(), 0, page, size)
    }
}

/// What happened to a post's comments during post deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CascadeOutcome {
    /// Nothing to delete against: no comment table, or no matching FK column.
    Skipped(String),
    /// The comment delete ran and removed this many rows.
    Deleted(u64),
    /// The comment delete ran and failed; the post delete still proceeded.
    Failed(String),
}

/// Result of a post deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDeletion {
    /// Post rows removed (0 or 1).
    pub rows: u64,
    pub comments: CascadeOutcome,
}

impl PostDeletion {
    pub fn untouched(reason: impl Into<String>) -> Self {
        Self { rows: 0, comments: CascadeOutcome::Skipped(reason.into()) }
    }
}

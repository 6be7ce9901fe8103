//! # Core Traits (Ports)
//!
//! Any database plugin must implement these traits to be used by the binary.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Actor, Comment, NewComment, NewPost, Page, Post, PostDeletion, PostKey, PostUpdate};
use crate::schema::ColumnInfo;

/// Read-only view of the database catalog, consulted once at startup.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SchemaProbe: Send + Sync {
    /// Physical names of all user tables.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Columns of `table`, in declaration order.
    async fn list_columns(&self, table: &str) -> Result<Vec<ColumnInfo>>;
}

/// Persistence contract for posts, keyed by board code.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepo: Send + Sync {
    /// All posts of a board, newest first. An unknown board yields no rows.
    async fn list_by_board(&self, board_code: &str) -> Result<Vec<Post>>;
    async fn count_by_board(&self, board_code: &str) -> Result<u64>;
    async fn list_by_board_paged(&self, board_code: &str, page: u32, size: u32) -> Result<Page<Post>>;
    async fn find(&self, key: &PostKey) -> Result<Option<Post>>;

    /// Returns the assigned key; `None` when the table has no key column.
    async fn insert(&self, post: NewPost) -> Result<Option<PostKey>>;

    /// Unconditional update (privileged path).
    async fn update(&self, key: &PostKey, changes: &PostUpdate) -> Result<u64>;
    /// Update restricted to `owner_id`. 0 rows for both "absent" and "not owned".
    async fn update_if_owner(&self, key: &PostKey, changes: &PostUpdate, owner_id: &str) -> Result<u64>;

    /// Unconditional delete; dependent comments are removed first, best-effort.
    async fn delete_any(&self, key: &PostKey) -> Result<PostDeletion>;
    async fn delete_if_owner(&self, key: &PostKey, owner_id: &str) -> Result<PostDeletion>;

    async fn update_as(&self, key: &PostKey, changes: &PostUpdate, actor: &Actor) -> Result<u64> {
        if actor.privileged {
            self.update(key, changes).await
        } else {
            self.update_if_owner(key, changes, &actor.id).await
        }
    }

    async fn delete_as(&self, key: &PostKey, actor: &Actor) -> Result<PostDeletion> {
        if actor.privileged {
            self.delete_any(key).await
        } else {
            self.delete_if_owner(key, &actor.id).await
        }
    }
}

/// Persistence contract for threaded comments.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepo: Send + Sync {
    /// Flat list in display order; see [`crate::thread::arrange`].
    async fn find_by_post(&self, post: &PostKey) -> Result<Vec<Comment>>;
    async fn find(&self, uuid: &str) -> Result<Option<Comment>>;
    /// Stored post reference of a comment, used to attach replies.
    async fn post_ref_of(&self, uuid: &str) -> Result<Option<String>>;

    /// Validates, computes depth, assigns a UUID and persists.
    async fn insert(&self, comment: NewComment) -> Result<Comment>;

    async fn update_content(&self, uuid: &str, content: &str, actor: &Actor) -> Result<u64>;
    async fn delete(&self, uuid: &str, actor: &Actor) -> Result<u64>;
}

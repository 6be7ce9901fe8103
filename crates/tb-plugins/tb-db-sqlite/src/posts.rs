//! # Post Repository
//!
//! [`PostRepo`] over whichever post table the probe resolved. All SQL comes
//! from [`PostQueries`]; this module only binds, runs and maps rows.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tb_core::error::{AppError, Result};
use tb_core::guard::OwnerScope;
use tb_core::models::{CascadeOutcome, NewPost, Page, Post, PostDeletion, PostKey, PostUpdate};
use tb_core::query::{
    cascade_comments, CascadePlan, PostQueries, PostRow, Stamps, CREATED_AT, POST_BOARD, POST_CONTENT, POST_KEY,
    POST_TITLE, POST_WRITER_ID, POST_WRITER_NAME, UPDATED_AT,
};
use tb_core::schema::{KeyKind, SchemaDescriptor};
use tb_core::traits::PostRepo;
use uuid::Uuid;

use crate::boards::{BoardKeys, Purpose};
use crate::exec::{db, execute, execute_with_fallback, fetch_all, fetch_optional, text, timestamp};

/// Upper bound on a listing page.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone)]
pub struct SqlitePostRepo {
    pool: SqlitePool,
    schema: Arc<SchemaDescriptor>,
}

fn map_post(row: &SqliteRow) -> Result<Post> {
    Ok(Post {
        key: text(row, POST_KEY)?.map(|k| PostKey::parse(&k)),
        board: text(row, POST_BOARD)?.unwrap_or_default(),
        title: text(row, POST_TITLE)?.unwrap_or_default(),
        content: text(row, POST_CONTENT)?.unwrap_or_default(),
        writer_id: text(row, POST_WRITER_ID)?,
        writer_name: text(row, POST_WRITER_NAME)?,
        created_at: timestamp(row, CREATED_AT),
        updated_at: timestamp(row, UPDATED_AT),
    })
}

fn required(value: &str, what: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("post {what} is required")));
    }
    Ok(trimmed.to_string())
}

impl SqlitePostRepo {
    pub fn new(pool: SqlitePool, schema: Arc<SchemaDescriptor>) -> Self {
        Self { pool, schema }
    }

    fn queries(&self) -> PostQueries<'_> {
        PostQueries::new(&self.schema.posts)
    }

    fn boards(&self) -> BoardKeys<'_> {
        BoardKeys::new(&self.pool, &self.schema)
    }

    async fn count_stored(&self, board: &str) -> Result<u64> {
        let stmt = self.queries().count(board);
        let count: i64 = match fetch_optional(&self.pool, &stmt).await? {
            Some(row) => row.try_get(0).map_err(db)?,
            None => 0,
        };
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn list_stored(&self, board: &str, window: Option<(u32, u64)>) -> Result<Vec<Post>> {
        let stmt = self.queries().list(board, window);
        fetch_all(&self.pool, &stmt).await?.iter().map(map_post).collect()
    }

    async fn update_scoped(&self, key: &PostKey, changes: &PostUpdate, scope: OwnerScope) -> Result<u64> {
        let title = required(&changes.title, "title")?;
        let content = required(&changes.content, "content")?;
        let q = self.queries();

        let Some(primary) = q.update(key, &title, &content, &scope, Stamps::Include)? else {
            tracing::debug!(post = %key, "post table cannot prove ownership, owner-scoped update matches nothing");
            return Ok(0);
        };
        let fallback = q
            .update(key, &title, &content, &scope, Stamps::Omit)?
            .unwrap_or_else(|| primary.clone());

        let rows = execute_with_fallback(&self.pool, &primary, &fallback).await?.rows_affected();
        tracing::info!(post = %key, rows, scoped = matches!(scope, OwnerScope::Author(_)), "post updated");
        Ok(rows)
    }

    /// Comments first, best-effort: a failure here is reported in the
    /// outcome and the post delete still runs.
    async fn cascade(&self, key: &PostKey, scope: &OwnerScope) -> CascadeOutcome {
        match cascade_comments(self.schema.comments.as_ref(), &self.schema.posts, key, scope) {
            CascadePlan::Skip(reason) => {
                tracing::debug!(post = %key, %reason, "comment cascade skipped");
                CascadeOutcome::Skipped(reason)
            }
            CascadePlan::Run(stmt) => match execute(&self.pool, &stmt).await {
                Ok(done) => CascadeOutcome::Deleted(done.rows_affected()),
                Err(err) => {
                    tracing::warn!(post = %key, error = %err, "comment cascade failed, deleting post anyway");
                    CascadeOutcome::Failed(err.to_string())
                }
            },
        }
    }

    async fn delete_scoped(&self, key: &PostKey, scope: OwnerScope) -> Result<PostDeletion> {
        let Some(stmt) = self.queries().delete(key, &scope)? else {
            return Ok(PostDeletion::untouched("post table cannot prove ownership"));
        };
        let comments = self.cascade(key, &scope).await;
        let rows = execute(&self.pool, &stmt).await.map_err(db)?.rows_affected();
        tracing::info!(post = %key, rows, comments = ?comments, "post deleted");
        Ok(PostDeletion { rows, comments })
    }
}

#[async_trait]
impl PostRepo for SqlitePostRepo {
    async fn list_by_board(&self, board_code: &str) -> Result<Vec<Post>> {
        match self.boards().resolve(board_code, Purpose::Read).await? {
            Some(board) => self.list_stored(&board, None).await,
            None => Ok(Vec::new()),
        }
    }

    async fn count_by_board(&self, board_code: &str) -> Result<u64> {
        match self.boards().resolve(board_code, Purpose::Read).await? {
            Some(board) => self.count_stored(&board).await,
            None => Ok(0),
        }
    }

    async fn list_by_board_paged(&self, board_code: &str, page: u32, size: u32) -> Result<Page<Post>> {
        if size == 0 {
            return Err(AppError::validation("page size must be positive"));
        }
        let size = size.min(MAX_PAGE_SIZE);
        let Some(board) = self.boards().resolve(board_code, Purpose::Read).await? else {
            return Ok(Page::empty(page, size));
        };

        let total = self.count_stored(&board).await?;
        let offset = u64::from(page) * u64::from(size);
        let items = if offset >= total {
            Vec::new()
        } else {
            self.list_stored(&board, Some((size, offset))).await?
        };
        Ok(Page::new(items, total, page, size))
    }

    async fn find(&self, key: &PostKey) -> Result<Option<Post>> {
        let stmt = self.queries().by_key(key)?;
        fetch_optional(&self.pool, &stmt).await?.as_ref().map(map_post).transpose()
    }

    async fn insert(&self, post: NewPost) -> Result<Option<PostKey>> {
        let title = required(&post.title, "title")?;
        let content = required(&post.content, "content")?;
        let board = self
            .boards()
            .resolve(&post.board_code, Purpose::Write)
            .await?
            .ok_or_else(|| AppError::validation(format!("unknown board code: {}", post.board_code)))?;

        let key_kind = self.schema.posts.key_kind();
        let row = PostRow {
            key: (key_kind == Some(KeyKind::Uuid)).then(|| Uuid::new_v4().to_string()),
            board,
            title,
            content,
            writer_id: post.writer_id.filter(|w| !w.trim().is_empty()),
            writer_name: post.writer_name.filter(|w| !w.trim().is_empty()),
        };

        let q = self.queries();
        let done = execute_with_fallback(
            &self.pool,
            &q.insert(&row, Stamps::Include),
            &q.insert(&row, Stamps::Omit),
        )
        .await?;

        let key = match key_kind {
            Some(KeyKind::Uuid) => row.key.map(PostKey::Text),
            Some(KeyKind::Numeric) => Some(PostKey::Numeric(done.last_insert_rowid())),
            None => None,
        };
        match &key {
            Some(key) => tracing::info!(post = %key, board = %row.board, "post created"),
            None => tracing::info!(board = %row.board, "post created without a key column"),
        }
        Ok(key)
    }

    async fn update(&self, key: &PostKey, changes: &PostUpdate) -> Result<u64> {
        self.update_scoped(key, changes, OwnerScope::Unrestricted).await
    }

    async fn update_if_owner(&self, key: &PostKey, changes: &PostUpdate, owner_id: &str) -> Result<u64> {
        self.update_scoped(key, changes, OwnerScope::owner(owner_id)).await
    }

    async fn delete_any(&self, key: &PostKey) -> Result<PostDeletion> {
        self.delete_scoped(key, OwnerScope::Unrestricted).await
    }

    async fn delete_if_owner(&self, key: &PostKey, owner_id: &str) -> Result<PostDeletion> {
        self.delete_scoped(key, OwnerScope::owner(owner_id)).await
    }
}

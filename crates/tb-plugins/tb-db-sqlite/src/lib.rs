//! # tb-db-sqlite Implementation
//!
//! SQLite plugin for the `tb-core` ports. The store probes the live
//! catalog once at construction and hands the resolved descriptor to every
//! repository it builds, so table and column names are never hard-coded.

mod boards;
mod comments;
mod exec;
mod posts;
mod probe;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tb_core::error::Result;
use tb_core::schema::{SchemaCatalog, SchemaDescriptor};

pub use boards::{BoardKeys, Purpose};
pub use comments::SqliteCommentRepo;
pub use posts::{SqlitePostRepo, MAX_PAGE_SIZE};
pub use probe::SqliteProbe;

use crate::exec::db;

pub struct SqliteStore {
    pool: SqlitePool,
    schema: Arc<SchemaDescriptor>,
}

impl SqliteStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(url)
            .await
            .map_err(db)?;
        Self::from_pool(pool).await
    }

    /// Resolves the schema eagerly: a database without a usable post table
    /// fails here instead of on the first query.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let catalog = SchemaCatalog::new(SqliteProbe::new(pool.clone()));
        let schema = catalog.resolve().await?;
        tracing::info!(
            posts = %schema.posts.table,
            key = ?schema.posts.key_kind(),
            board_ref = ?schema.posts.board.kind,
            boards = schema.boards.as_ref().map(|b| b.table.as_str()),
            comments = schema.comments.as_ref().map(|c| c.table.as_str()),
            "schema resolved"
        );
        Ok(Self { pool, schema })
    }

    pub fn schema(&self) -> &Arc<SchemaDescriptor> {
        &self.schema
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn posts(&self) -> SqlitePostRepo {
        SqlitePostRepo::new(self.pool.clone(), Arc::clone(&self.schema))
    }

    pub fn comments(&self) -> SqliteCommentRepo {
        SqliteCommentRepo::new(self.pool.clone(), Arc::clone(&self.schema))
    }

    pub fn boards(&self) -> BoardKeys<'_> {
        BoardKeys::new(&self.pool, &self.schema)
    }
}

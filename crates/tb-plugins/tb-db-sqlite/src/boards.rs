//! Board code translation.
//!
//! Callers always speak board codes ("NORM"). Schemas whose post table
//! references boards by UUID need the code mapped to the stored value.

use sqlx::sqlite::SqlitePool;
use tb_core::error::{AppError, Result};
use tb_core::query::board_lookup;
use tb_core::schema::{BoardRefKind, SchemaDescriptor};

use crate::exec::{fetch_optional, text};

/// Whether an unknown board is an error (writes) or just an empty
/// result (reads).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Read,
    Write,
}

pub struct BoardKeys<'a> {
    pool: &'a SqlitePool,
    schema: &'a SchemaDescriptor,
}

impl<'a> BoardKeys<'a> {
    pub fn new(pool: &'a SqlitePool, schema: &'a SchemaDescriptor) -> Self {
        Self { pool, schema }
    }

    /// The value to store in or compare against the post table's board
    /// column. `Ok(None)` means the board does not exist and the read
    /// should come back empty.
    pub async fn resolve(&self, code: &str, purpose: Purpose) -> Result<Option<String>> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AppError::validation("board code is required"));
        }
        if self.schema.posts.board.kind == BoardRefKind::Code {
            return Ok(Some(code.to_string()));
        }

        let Some(stmt) = self.schema.boards.as_ref().and_then(|b| board_lookup(b, code)) else {
            tracing::debug!(board = code, "no board table to translate through, using code as stored value");
            return Ok(Some(code.to_string()));
        };

        let found = match fetch_optional(self.pool, &stmt).await? {
            Some(row) => text(&row, 0)?,
            None => None,
        };
        match (found, purpose) {
            (Some(uuid), _) => Ok(Some(uuid)),
            (None, Purpose::Read) => {
                tracing::debug!(board = code, "unknown or inactive board");
                Ok(None)
            }
            (None, Purpose::Write) => Err(AppError::validation(format!("unknown board code: {code}"))),
        }
    }
}

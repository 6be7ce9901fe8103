//! # Schema Descriptor
//!
//! The physical layout of the post, board and comment tables as found in
//! the live database. Several schema generations coexist in the wild
//! (numeric vs UUID keys, board code vs board UUID references, optional
//! writer and timestamp columns); every query is synthesized from this
//! descriptor instead of from fixed names.

mod candidates;
mod catalog;
mod resolve;

pub use candidates::*;
pub use catalog::SchemaCatalog;
pub use resolve::resolve_descriptor;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A column as reported by the database catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type, empty when the engine does not report one.
    pub declared_type: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self { name: name.into(), declared_type: declared_type.into() }
    }

    fn is_textual(&self) -> bool {
        let ty = self.declared_type.to_ascii_uppercase();
        ["CHAR", "TEXT", "CLOB", "UUID", "STRING"].iter().any(|t| ty.contains(t))
    }
}

/// How the primary key of the post table is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyKind {
    /// Database-assigned integer; read back from the driver after insert.
    Numeric,
    /// Application-assigned UUID string.
    Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyColumn {
    pub name: String,
    pub kind: KeyKind,
}

impl KeyColumn {
    pub(crate) fn from_column(col: &ColumnInfo) -> Self {
        let kind = if col.name.eq_ignore_ascii_case("uuid") || col.is_textual() {
            KeyKind::Uuid
        } else {
            KeyKind::Numeric
        };
        Self { name: col.name.clone(), kind }
    }
}

/// What the post table's board reference column stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardRefKind {
    /// The board code itself ("NORM").
    Code,
    /// The board's UUID; codes must be translated through the board table.
    Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardColumn {
    pub name: String,
    pub kind: BoardRefKind,
}

impl BoardColumn {
    pub(crate) fn from_name(name: &str) -> Self {
        let kind = if name.to_ascii_lowercase().contains("uuid") {
            BoardRefKind::Uuid
        } else {
            BoardRefKind::Code
        };
        Self { name: name.to_string(), kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSchema {
    pub table: String,
    pub id: Option<KeyColumn>,
    pub board: BoardColumn,
    pub title: String,
    pub content: String,
    pub writer_id: Option<String>,
    pub writer_name: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl PostSchema {
    pub fn has_timestamps(&self) -> bool {
        self.created_at.is_some() || self.updated_at.is_some()
    }

    pub fn key_kind(&self) -> Option<KeyKind> {
        self.id.as_ref().map(|k| k.kind)
    }

    /// Column used to order listings: key, then created-at, then
    /// updated-at, then title. Always sorted descending.
    pub fn order_column(&self) -> &str {
        self.id
            .as_ref()
            .map(|k| k.name.as_str())
            .or(self.created_at.as_deref())
            .or(self.updated_at.as_deref())
            .unwrap_or(&self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSchema {
    pub table: String,
    pub uuid: Option<String>,
    pub code: Option<String>,
    pub name: Option<String>,
    pub active: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentSchema {
    pub table: String,
    pub id: Option<String>,
    /// Numeric foreign key to the post table.
    pub post_id: Option<String>,
    /// String/UUID foreign key to the post table.
    pub post_uuid: Option<String>,
    pub parent_uuid: Option<String>,
    pub depth: Option<String>,
    pub author_id: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// The columns the comment tree engine cannot work without.
#[derive(Debug, Clone, Copy)]
pub struct ThreadColumns<'a> {
    pub table: &'a str,
    pub id: &'a str,
    pub post_ref: &'a str,
    pub parent: &'a str,
    pub depth: &'a str,
    pub author: &'a str,
    pub content: &'a str,
    pub status: Option<&'a str>,
    pub created_at: Option<&'a str>,
    pub updated_at: Option<&'a str>,
}

impl CommentSchema {
    pub fn thread_columns(&self) -> Result<ThreadColumns<'_>> {
        fn need<'a>(table: &str, col: &str, value: &'a Option<String>) -> Result<&'a str> {
            value
                .as_deref()
                .ok_or_else(|| AppError::config(format!("comment table {table} has no {col} column")))
        }
        let table = self.table.as_str();
        Ok(ThreadColumns {
            table: &self.table,
            id: need(table, "uuid", &self.id)?,
            post_ref: self
                .post_uuid
                .as_deref()
                .or(self.post_id.as_deref())
                .ok_or_else(|| {
                    AppError::config(format!("comment table {} has no post reference", self.table))
                })?,
            parent: need(table, "parent", &self.parent_uuid)?,
            depth: need(table, "depth", &self.depth)?,
            author: need(table, "author", &self.author_id)?,
            content: need(table, "content", &self.content)?,
            status: self.status.as_deref(),
            created_at: self.created_at.as_deref(),
            updated_at: self.updated_at.as_deref(),
        })
    }
}

impl ThreadColumns<'_> {
    pub fn has_timestamps(&self) -> bool {
        self.created_at.is_some() || self.updated_at.is_some()
    }
}

/// Everything the probe found. Built once per process and shared
/// read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub posts: PostSchema,
    /// `None` when no board table exists; UUID translation then degrades to
    /// passing the code through.
    pub boards: Option<BoardSchema>,
    /// `None` when no comment table exists; cascades are skipped and the
    /// comment engine reports a configuration error.
    pub comments: Option<CommentSchema>,
}

impl SchemaDescriptor {
    pub fn thread_columns(&self) -> Result<ThreadColumns<'_>> {
        self.comments
            .as_ref()
            .ok_or_else(|| AppError::config("no comment table (comment|comments) found"))?
            .thread_columns()
    }
}

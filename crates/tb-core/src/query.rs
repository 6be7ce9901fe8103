//! # Query Synthesis
//!
//! Every statement the plugins run is assembled here from a resolved
//! schema. Identifiers are always the physical names found by the probe,
//! quoted; values are always bound parameters.

use crate::error::{AppError, Result};
use crate::guard::OwnerScope;
use crate::models::PostKey;
use crate::schema::{BoardSchema, CommentSchema, PostSchema, ThreadColumns};

/// A bind parameter, independent of any driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Text(String),
    Bool(bool),
}

impl From<&PostKey> for SqlValue {
    fn from(key: &PostKey) -> Self {
        match key {
            PostKey::Numeric(n) => SqlValue::Int(*n),
            PostKey::Text(s) => SqlValue::Text(s.clone()),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<Option<&str>> for SqlValue {
    fn from(s: Option<&str>) -> Self {
        s.map_or(SqlValue::Null, SqlValue::from)
    }
}

/// SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Whether optional timestamp columns take part in a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stamps {
    Include,
    Omit,
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

const NOW: &str = "CURRENT_TIMESTAMP";

// Column aliases shared with the row mappers in the plugins.
pub const POST_KEY: &str = "post_key";
pub const POST_BOARD: &str = "board_ref";
pub const POST_TITLE: &str = "title";
pub const POST_CONTENT: &str = "content";
pub const POST_WRITER_ID: &str = "writer_id";
pub const POST_WRITER_NAME: &str = "writer_name";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";
pub const COMMENT_UUID: &str = "uuid";
pub const COMMENT_POST_REF: &str = "post_ref";
pub const COMMENT_PARENT: &str = "parent_uuid";
pub const COMMENT_DEPTH: &str = "depth";
pub const COMMENT_AUTHOR: &str = "author_id";
pub const COMMENT_CONTENT: &str = "content";
pub const COMMENT_STATUS: &str = "status";

struct SqlBuf {
    sql: String,
    params: Vec<SqlValue>,
}

impl SqlBuf {
    fn new(head: impl Into<String>) -> Self {
        Self { sql: head.into(), params: Vec::new() }
    }

    fn push(&mut self, text: &str) -> &mut Self {
        self.sql.push_str(text);
        self
    }

    fn ident(&mut self, name: &str) -> &mut Self {
        self.sql.push_str(&quote_ident(name));
        self
    }

    fn bind(&mut self, value: SqlValue) -> &mut Self {
        self.sql.push('?');
        self.params.push(value);
        self
    }

    fn cond(&mut self, keyword: &str, column: &str, value: SqlValue) -> &mut Self {
        self.push(keyword).ident(column).push(" = ").bind(value)
    }

    /// Appends the ownership predicate. Returns `false` when the scope is
    /// author-restricted but the table has no owner column; such a
    /// statement must not run.
    fn restrict(&mut self, owner_column: Option<&str>, scope: &OwnerScope) -> bool {
        match (scope, owner_column) {
            (OwnerScope::Unrestricted, _) => true,
            (OwnerScope::Author(id), Some(col)) => {
                self.cond(" AND ", col, SqlValue::Text(id.clone()));
                true
            }
            (OwnerScope::Author(_), None) => false,
        }
    }

    fn build(self) -> Statement {
        Statement { sql: self.sql, params: self.params }
    }
}

enum Value {
    Param(SqlValue),
    Now,
}

/// `INSERT INTO t (...) VALUES (...)` assembled column by column.
struct Insert {
    table: String,
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Insert {
    fn new(table: &str) -> Self {
        Self { table: table.to_string(), columns: Vec::new(), values: Vec::new() }
    }

    fn value(&mut self, column: &str, value: SqlValue) -> &mut Self {
        self.columns.push(column.to_string());
        self.values.push(Value::Param(value));
        self
    }

    fn now(&mut self, column: Option<&str>, stamps: Stamps) -> &mut Self {
        if let (Some(col), Stamps::Include) = (column, stamps) {
            self.columns.push(col.to_string());
            self.values.push(Value::Now);
        }
        self
    }

    fn build(self) -> Statement {
        let columns: Vec<String> = self.columns.iter().map(|c| quote_ident(c)).collect();
        let mut params = Vec::new();
        let placeholders: Vec<&str> = self
            .values
            .into_iter()
            .map(|v| match v {
                Value::Param(p) => {
                    params.push(p);
                    "?"
                }
                Value::Now => NOW,
            })
            .collect();
        Statement {
            sql: format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote_ident(&self.table),
                columns.join(", "),
                placeholders.join(", ")
            ),
            params,
        }
    }
}

fn project(expr: Option<&str>, alias: &str, as_text: bool) -> String {
    match expr {
        Some(col) if as_text => format!("CAST({} AS TEXT) AS {alias}", quote_ident(col)),
        Some(col) => format!("{} AS {alias}", quote_ident(col)),
        None => format!("NULL AS {alias}"),
    }
}

/// A post row about to be inserted, board reference already translated.
#[derive(Debug, Clone)]
pub struct PostRow {
    /// Application-assigned key for UUID-keyed tables.
    pub key: Option<String>,
    pub board: String,
    pub title: String,
    pub content: String,
    pub writer_id: Option<String>,
    pub writer_name: Option<String>,
}

/// Statement factory for the post table.
pub struct PostQueries<'a> {
    schema: &'a PostSchema,
}

impl<'a> PostQueries<'a> {
    pub fn new(schema: &'a PostSchema) -> Self {
        Self { schema }
    }

    fn key_column(&self) -> Result<&'a str> {
        self.schema
            .id
            .as_ref()
            .map(|k| k.name.as_str())
            .ok_or_else(|| AppError::config(format!("post table {} has no key column", self.schema.table)))
    }

    /// Key column for a keyed mutation. An author-scoped mutation on a
    /// table that lacks either the key or the writer column cannot prove
    /// ownership and yields `Ok(None)`; an unrestricted one without a key
    /// column is a configuration error.
    fn mutation_key(&self, scope: &OwnerScope) -> Result<Option<&'a str>> {
        let s = self.schema;
        if matches!(scope, OwnerScope::Author(_)) && (s.id.is_none() || s.writer_id.is_none()) {
            return Ok(None);
        }
        self.key_column().map(Some)
    }

    fn projection(&self) -> String {
        let s = self.schema;
        [
            project(s.id.as_ref().map(|k| k.name.as_str()), POST_KEY, true),
            project(Some(s.board.name.as_str()), POST_BOARD, true),
            project(Some(s.title.as_str()), POST_TITLE, false),
            project(Some(s.content.as_str()), POST_CONTENT, false),
            project(s.writer_id.as_deref(), POST_WRITER_ID, true),
            project(s.writer_name.as_deref(), POST_WRITER_NAME, false),
            project(s.created_at.as_deref(), CREATED_AT, false),
            project(s.updated_at.as_deref(), UPDATED_AT, false),
        ]
        .join(", ")
    }

    fn select(&self) -> SqlBuf {
        let mut buf = SqlBuf::new(format!("SELECT {} FROM ", self.projection()));
        buf.ident(&self.schema.table);
        buf
    }

    /// Board listing, newest first. `window` is `(limit, offset)`.
    pub fn list(&self, board: &str, window: Option<(u32, u64)>) -> Statement {
        let mut buf = self.select();
        buf.cond(" WHERE ", &self.schema.board.name, board.into())
            .push(" ORDER BY ")
            .ident(self.schema.order_column())
            .push(" DESC");
        if let Some((limit, offset)) = window {
            buf.push(" LIMIT ")
                .bind(SqlValue::Int(i64::from(limit)))
                .push(" OFFSET ")
                .bind(SqlValue::Int(i64::try_from(offset).unwrap_or(i64::MAX)));
        }
        buf.build()
    }

    pub fn count(&self, board: &str) -> Statement {
        let mut buf = SqlBuf::new("SELECT COUNT(*) FROM ");
        buf.ident(&self.schema.table).cond(" WHERE ", &self.schema.board.name, board.into());
        buf.build()
    }

    pub fn by_key(&self, key: &PostKey) -> Result<Statement> {
        let id = self.key_column()?;
        let mut buf = self.select();
        buf.cond(" WHERE ", id, key.into());
        Ok(buf.build())
    }

    pub fn insert(&self, row: &PostRow, stamps: Stamps) -> Statement {
        let s = self.schema;
        let mut insert = Insert::new(&s.table);
        if let (Some(id), Some(key)) = (&s.id, &row.key) {
            insert.value(&id.name, key.as_str().into());
        }
        insert
            .value(&s.board.name, row.board.as_str().into())
            .value(&s.title, row.title.as_str().into())
            .value(&s.content, row.content.as_str().into());
        if let Some(col) = &s.writer_id {
            insert.value(col, row.writer_id.as_deref().into());
        }
        if let Some(col) = &s.writer_name {
            insert.value(col, row.writer_name.as_deref().into());
        }
        insert
            .now(s.created_at.as_deref(), stamps)
            .now(s.updated_at.as_deref(), stamps);
        insert.build()
    }

    /// `Ok(None)` when the scope needs a key or writer column the table lacks.
    pub fn update(
        &self,
        key: &PostKey,
        title: &str,
        content: &str,
        scope: &OwnerScope,
        stamps: Stamps,
    ) -> Result<Option<Statement>> {
        let s = self.schema;
        let Some(id) = self.mutation_key(scope)? else {
            return Ok(None);
        };
        let mut buf = SqlBuf::new("UPDATE ");
        buf.ident(&s.table)
            .push(" SET ")
            .ident(&s.title)
            .push(" = ")
            .bind(title.into())
            .push(", ")
            .ident(&s.content)
            .push(" = ")
            .bind(content.into());
        if let (Some(col), Stamps::Include) = (&s.updated_at, stamps) {
            buf.push(", ").ident(col).push(" = ").push(NOW);
        }
        buf.cond(" WHERE ", id, key.into());
        Ok(buf.restrict(s.writer_id.as_deref(), scope).then(|| buf.build()))
    }

    pub fn delete(&self, key: &PostKey, scope: &OwnerScope) -> Result<Option<Statement>> {
        let s = self.schema;
        let Some(id) = self.mutation_key(scope)? else {
            return Ok(None);
        };
        let mut buf = SqlBuf::new("DELETE FROM ");
        buf.ident(&s.table).cond(" WHERE ", id, key.into());
        Ok(buf.restrict(s.writer_id.as_deref(), scope).then(|| buf.build()))
    }
}

/// What to do about a post's comments before the post row goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadePlan {
    Run(Statement),
    Skip(String),
}

/// Picks the comment FK column matching the key's shape: numeric keys go
/// to the numeric FK (or, failing that, the string FK as text), string
/// keys to the string FK (or, failing that, the numeric FK column, which
/// is where the comment engine writes them on such schemas).
///
/// Under an author scope the delete only matches while the post still
/// belongs to that author, so a caller who does not own the post cannot
/// remove its comments.
pub fn cascade_comments(
    comments: Option<&CommentSchema>,
    posts: &PostSchema,
    key: &PostKey,
    scope: &OwnerScope,
) -> CascadePlan {
    let Some(c) = comments else {
        return CascadePlan::Skip("no comment table".into());
    };
    let target = match key {
        PostKey::Numeric(n) => c
            .post_id
            .as_deref()
            .map(|col| (col, SqlValue::Int(*n)))
            .or_else(|| c.post_uuid.as_deref().map(|col| (col, SqlValue::Text(n.to_string())))),
        PostKey::Text(s) => c
            .post_uuid
            .as_deref()
            .or(c.post_id.as_deref())
            .map(|col| (col, SqlValue::Text(s.clone()))),
    };
    let Some((col, value)) = target else {
        return CascadePlan::Skip(format!("comment table {} has no post reference for key {key}", c.table));
    };

    let mut buf = SqlBuf::new("DELETE FROM ");
    buf.ident(&c.table).cond(" WHERE ", col, value);
    if let OwnerScope::Author(owner) = scope {
        let (Some(id), Some(writer)) = (&posts.id, &posts.writer_id) else {
            return CascadePlan::Skip("post table cannot prove ownership".into());
        };
        buf.push(" AND EXISTS (SELECT 1 FROM ")
            .ident(&posts.table)
            .cond(" WHERE ", &id.name, key.into())
            .cond(" AND ", writer, SqlValue::Text(owner.clone()))
            .push(")");
    }
    CascadePlan::Run(buf.build())
}

/// Board code to board UUID. `None` when the board table lacks either
/// column. Inactive boards never match.
pub fn board_lookup(boards: &BoardSchema, code: &str) -> Option<Statement> {
    let uuid = boards.uuid.as_deref()?;
    let code_col = boards.code.as_deref()?;
    let mut buf = SqlBuf::new("SELECT CAST(");
    buf.ident(uuid)
        .push(" AS TEXT) FROM ")
        .ident(&boards.table)
        .cond(" WHERE ", code_col, code.into());
    if let Some(active) = &boards.active {
        buf.cond(" AND ", active, SqlValue::Bool(true));
    }
    buf.push(" LIMIT 1");
    Some(buf.build())
}

/// A comment row about to be inserted, already validated and placed.
#[derive(Debug, Clone)]
pub struct CommentRow {
    pub uuid: String,
    pub post: PostKey,
    pub parent_uuid: Option<String>,
    pub depth: u32,
    pub author_id: String,
    pub content: String,
    pub status: String,
}

/// Statement factory for the comment table.
pub struct CommentQueries<'a> {
    cols: ThreadColumns<'a>,
}

impl<'a> CommentQueries<'a> {
    pub fn new(cols: ThreadColumns<'a>) -> Self {
        Self { cols }
    }

    fn select(&self) -> SqlBuf {
        let c = &self.cols;
        let projection = [
            project(Some(c.id), COMMENT_UUID, true),
            project(Some(c.post_ref), COMMENT_POST_REF, true),
            project(Some(c.parent), COMMENT_PARENT, true),
            project(Some(c.depth), COMMENT_DEPTH, false),
            project(Some(c.author), COMMENT_AUTHOR, true),
            project(Some(c.content), COMMENT_CONTENT, false),
            project(c.status, COMMENT_STATUS, false),
            project(c.created_at, CREATED_AT, false),
            project(c.updated_at, UPDATED_AT, false),
        ]
        .join(", ");
        let mut buf = SqlBuf::new(format!("SELECT {projection} FROM "));
        buf.ident(c.table);
        buf
    }

    /// Comments of one post. The order is only a pre-sort; display order
    /// comes from [`crate::thread::arrange`].
    pub fn by_post(&self, post: &PostKey) -> Statement {
        let c = &self.cols;
        let mut buf = self.select();
        buf.cond(" WHERE ", c.post_ref, post.into())
            .push(" ORDER BY COALESCE(")
            .ident(c.parent)
            .push(", ")
            .ident(c.id)
            .push(") ASC, ")
            .ident(c.depth)
            .push(" ASC, ");
        if let Some(created) = c.created_at {
            buf.ident(created).push(" ASC, ");
        }
        buf.ident(c.id).push(" ASC");
        buf.build()
    }

    pub fn by_uuid(&self, uuid: &str) -> Statement {
        let mut buf = self.select();
        buf.cond(" WHERE ", self.cols.id, uuid.into());
        buf.build()
    }

    pub fn insert(&self, row: &CommentRow, stamps: Stamps) -> Statement {
        let c = &self.cols;
        let mut insert = Insert::new(c.table);
        insert
            .value(c.id, row.uuid.as_str().into())
            .value(c.post_ref, (&row.post).into())
            .value(c.parent, row.parent_uuid.as_deref().into())
            .value(c.depth, SqlValue::Int(i64::from(row.depth)))
            .value(c.author, row.author_id.as_str().into())
            .value(c.content, row.content.as_str().into());
        if let Some(status) = c.status {
            insert.value(status, row.status.as_str().into());
        }
        insert.now(c.created_at, stamps).now(c.updated_at, stamps);
        insert.build()
    }

    pub fn update_content(&self, uuid: &str, content: &str, scope: &OwnerScope, stamps: Stamps) -> Statement {
        let c = &self.cols;
        let mut buf = SqlBuf::new("UPDATE ");
        buf.ident(c.table).push(" SET ").ident(c.content).push(" = ").bind(content.into());
        if let (Some(col), Stamps::Include) = (c.updated_at, stamps) {
            buf.push(", ").ident(col).push(" = ").push(NOW);
        }
        buf.cond(" WHERE ", c.id, uuid.into());
        buf.restrict(Some(c.author), scope);
        buf.build()
    }

    pub fn delete(&self, uuid: &str, scope: &OwnerScope) -> Statement {
        let c = &self.cols;
        let mut buf = SqlBuf::new("DELETE FROM ");
        buf.ident(c.table).cond(" WHERE ", c.id, uuid.into());
        buf.restrict(Some(c.author), scope);
        buf.build()
    }
}

//! In-memory fixtures for the SQLite tests. Each constant is one schema
//! generation seen in deployed databases.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tb_core::schema::{resolve_descriptor, SchemaDescriptor};

use crate::probe::SqliteProbe;

/// Integer keys, board codes stored inline, comments keyed by `post_id`.
pub(crate) const LEGACY_SCHEMA: &str = r#"
CREATE TABLE post (
    post_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    board_code  TEXT NOT NULL,
    title       TEXT NOT NULL,
    content     TEXT NOT NULL,
    writer_id   TEXT,
    writer_name TEXT,
    created_at  DATETIME,
    updated_at  DATETIME
);
CREATE TABLE comment (
    uuid        TEXT PRIMARY KEY,
    post_id     INTEGER NOT NULL REFERENCES post(post_id),
    parent_uuid TEXT,
    depth       INTEGER NOT NULL DEFAULT 0,
    author_id   TEXT NOT NULL,
    content     TEXT NOT NULL,
    status      TEXT,
    created_at  DATETIME,
    updated_at  DATETIME
);
"#;

/// UUID keys everywhere, posts reference boards by UUID.
pub(crate) const MODERN_SCHEMA: &str = r#"
CREATE TABLE boards (
    uuid   TEXT PRIMARY KEY,
    code   TEXT NOT NULL UNIQUE,
    name   TEXT,
    active INTEGER NOT NULL DEFAULT 1
);
INSERT INTO boards (uuid, code, name, active) VALUES
    ('b-1', 'NORM', 'Normal', 1),
    ('b-2', 'BUS', 'Business', 1),
    ('b-3', 'OLD', 'Archive', 0);
CREATE TABLE posts (
    uuid        TEXT PRIMARY KEY,
    board_uuid  TEXT NOT NULL REFERENCES boards(uuid),
    title       TEXT NOT NULL,
    body        TEXT NOT NULL,
    author_id   TEXT,
    author_name TEXT,
    created_at  TEXT,
    updated_at  TEXT
);
CREATE TABLE comments (
    uuid        TEXT PRIMARY KEY,
    post_uuid   TEXT NOT NULL REFERENCES posts(uuid),
    parent_uuid TEXT,
    depth       INTEGER NOT NULL DEFAULT 0,
    author_id   TEXT NOT NULL,
    content     TEXT NOT NULL,
    status      TEXT NOT NULL DEFAULT 'published',
    created_at  TEXT,
    updated_at  TEXT
);
"#;

/// UUID-keyed posts whose comments still point at them through a column
/// named `post_id`.
pub(crate) const MIXED_SCHEMA: &str = r#"
CREATE TABLE posts (
    uuid       TEXT PRIMARY KEY,
    board_code TEXT NOT NULL,
    title      TEXT NOT NULL,
    content    TEXT NOT NULL,
    writer_id  TEXT
);
CREATE TABLE comment (
    uuid        TEXT PRIMARY KEY,
    post_id     TEXT NOT NULL REFERENCES posts(uuid),
    parent_uuid TEXT,
    depth       INTEGER NOT NULL DEFAULT 0,
    author_id   TEXT NOT NULL,
    content     TEXT NOT NULL
);
"#;

/// A post table without any key column.
pub(crate) const KEYLESS_SCHEMA: &str = r#"
CREATE TABLE post (
    board_code TEXT NOT NULL,
    title      TEXT NOT NULL,
    content    TEXT NOT NULL,
    writer_id  TEXT
);
"#;

/// Upper-case names, no writer, no timestamps, no comment table.
pub(crate) const BARE_SCHEMA: &str = r#"
CREATE TABLE POSTS (
    ID       INTEGER PRIMARY KEY,
    BOARD    TEXT NOT NULL,
    TITLE    TEXT NOT NULL,
    CONTENTS TEXT NOT NULL
);
"#;

/// A single long-lived connection, so the in-memory database survives
/// for the whole test.
pub(crate) async fn memory_pool(ddl: &str) -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory database");
    sqlx::raw_sql(ddl).execute(&pool).await.expect("apply fixture schema");
    pool
}

pub(crate) async fn descriptor_of(pool: &SqlitePool) -> SchemaDescriptor {
    resolve_descriptor(&SqliteProbe::new(pool.clone()))
        .await
        .expect("resolve fixture schema")
}

//! Candidate spellings for every logical table and column, in priority
//! order. Earlier entries win when a table carries more than one.

use super::ColumnInfo;

pub const POST_TABLES: &[&str] = &["post", "posts"];
pub const POST_ID: &[&str] = &["post_id", "id", "uuid"];
pub const POST_BOARD: &[&str] = &["board_code", "board_uuid", "boardCd", "board_code_id", "board"];
pub const POST_TITLE: &[&str] = &["title"];
pub const POST_CONTENT: &[&str] = &["content", "contents", "body"];
pub const POST_WRITER_ID: &[&str] = &["writer_id", "author_id", "writerId", "authorId"];
pub const POST_WRITER_NAME: &[&str] =
    &["writer_name", "author_name", "writerName", "authorName", "nickname", "name"];
pub const POST_CREATED_AT: &[&str] = &["created_at", "write_dt", "createdAt", "reg_dt"];
pub const POST_UPDATED_AT: &[&str] = &["updated_at", "update_dt", "updatedAt", "mod_dt"];

pub const BOARD_TABLES: &[&str] = &["board", "boards"];
pub const BOARD_UUID: &[&str] = &["uuid", "board_uuid", "id"];
pub const BOARD_CODE: &[&str] = &["board_code", "code"];
pub const BOARD_NAME: &[&str] = &["board_name", "name"];
pub const BOARD_ACTIVE: &[&str] = &["active", "is_active", "enabled"];

pub const COMMENT_TABLES: &[&str] = &["comment", "comments"];
pub const COMMENT_ID: &[&str] = &["uuid", "comment_uuid", "comment_id", "id"];
pub const COMMENT_POST_ID: &[&str] = &["post_id"];
pub const COMMENT_POST_UUID: &[&str] = &["post_uuid"];
pub const COMMENT_PARENT: &[&str] = &["parent_uuid", "parent_id"];
pub const COMMENT_DEPTH: &[&str] = &["depth", "level"];
pub const COMMENT_AUTHOR: &[&str] = &["author_id", "writer_id"];
pub const COMMENT_CONTENT: &[&str] = &["content", "body"];
pub const COMMENT_STATUS: &[&str] = &["status"];
pub const COMMENT_CREATED_AT: &[&str] = &["created_at"];
pub const COMMENT_UPDATED_AT: &[&str] = &["updated_at"];

/// Finds the first candidate present in `tables`, trying the exact,
/// upper-case and lower-case spelling of each (engines disagree on how
/// they fold identifiers). Returns the physical name.
pub fn find_table(tables: &[String], candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|cand| {
        [cand.to_string(), cand.to_uppercase(), cand.to_lowercase()]
            .into_iter()
            .find(|variant| tables.iter().any(|t| t == variant))
    })
}

/// Case-insensitive column pick. Returns the column with its physical
/// spelling so generated SQL matches the database exactly.
pub fn pick<'a>(columns: &'a [ColumnInfo], candidates: &[&str]) -> Option<&'a ColumnInfo> {
    candidates
        .iter()
        .find_map(|cand| columns.iter().find(|c| c.name.eq_ignore_ascii_case(cand)))
}

pub fn pick_name(columns: &[ColumnInfo], candidates: &[&str]) -> Option<String> {
    pick(columns, candidates).map(|c| c.name.clone())
}

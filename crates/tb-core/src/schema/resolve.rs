//! Builds a [`SchemaDescriptor`] from what a [`SchemaProbe`] reports.

use super::candidates::*;
use super::{BoardColumn, BoardSchema, ColumnInfo, CommentSchema, KeyColumn, PostSchema, SchemaDescriptor};
use crate::error::{AppError, Result};
use crate::traits::SchemaProbe;

/// Runs one full introspection pass: one table listing plus one column
/// listing per table found.
///
/// A missing post table or a missing board/title/content column is a
/// configuration error. Board and comment tables are optional.
pub async fn resolve_descriptor<P>(probe: &P) -> Result<SchemaDescriptor>
where
    P: SchemaProbe + ?Sized,
{
    let tables = probe.list_tables().await?;

    let post_table = find_table(&tables, POST_TABLES).ok_or_else(|| {
        AppError::config(format!("no post table ({}) found", POST_TABLES.join("|")))
    })?;
    let post_cols = probe.list_columns(&post_table).await?;
    let posts = post_schema(post_table, &post_cols)?;

    let boards = match find_table(&tables, BOARD_TABLES) {
        Some(table) => {
            let cols = probe.list_columns(&table).await?;
            board_schema(table, &cols)
        }
        None => None,
    };

    let comments = match find_table(&tables, COMMENT_TABLES) {
        Some(table) => {
            let cols = probe.list_columns(&table).await?;
            Some(comment_schema(table, &cols))
        }
        None => None,
    };

    Ok(SchemaDescriptor { posts, boards, comments })
}

fn post_schema(table: String, cols: &[ColumnInfo]) -> Result<PostSchema> {
    let board = pick_name(cols, POST_BOARD);
    let title = pick_name(cols, POST_TITLE);
    let content = pick_name(cols, POST_CONTENT);

    let (Some(board), Some(title), Some(content)) = (board, title, content) else {
        let found: Vec<&str> = cols.iter().map(|c| c.name.as_str()).collect();
        return Err(AppError::config(format!(
            "post table {table} lacks a board, title or content column (has: {})",
            found.join(", ")
        )));
    };

    Ok(PostSchema {
        id: pick(cols, POST_ID).map(KeyColumn::from_column),
        board: BoardColumn::from_name(&board),
        title,
        content,
        writer_id: pick_name(cols, POST_WRITER_ID),
        writer_name: pick_name(cols, POST_WRITER_NAME),
        created_at: pick_name(cols, POST_CREATED_AT),
        updated_at: pick_name(cols, POST_UPDATED_AT),
        table,
    })
}

fn board_schema(table: String, cols: &[ColumnInfo]) -> Option<BoardSchema> {
    let uuid = pick_name(cols, BOARD_UUID);
    let code = pick_name(cols, BOARD_CODE);
    if uuid.is_none() && code.is_none() {
        return None;
    }
    Some(BoardSchema {
        table,
        uuid,
        code,
        name: pick_name(cols, BOARD_NAME),
        active: pick_name(cols, BOARD_ACTIVE),
    })
}

fn comment_schema(table: String, cols: &[ColumnInfo]) -> CommentSchema {
    CommentSchema {
        table,
        id: pick_name(cols, COMMENT_ID),
        post_id: pick_name(cols, COMMENT_POST_ID),
        post_uuid: pick_name(cols, COMMENT_POST_UUID),
        parent_uuid: pick_name(cols, COMMENT_PARENT),
        depth: pick_name(cols, COMMENT_DEPTH),
        author_id: pick_name(cols, COMMENT_AUTHOR),
        content: pick_name(cols, COMMENT_CONTENT),
        status: pick_name(cols, COMMENT_STATUS),
        created_at: pick_name(cols, COMMENT_CREATED_AT),
        updated_at: pick_name(cols, COMMENT_UPDATED_AT),
    }
}

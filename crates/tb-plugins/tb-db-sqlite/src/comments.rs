//! # Comment Repository
//!
//! The storage half of the comment tree engine. Placement rules and
//! display order live in [`tb_core::thread`].

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tb_core::error::{AppError, Result};
use tb_core::guard::OwnerScope;
use tb_core::models::{Actor, Comment, NewComment, PostKey};
use tb_core::query::{
    CommentQueries, Stamps, COMMENT_AUTHOR, COMMENT_CONTENT, COMMENT_DEPTH, COMMENT_PARENT, COMMENT_POST_REF,
    COMMENT_STATUS, COMMENT_UUID, CREATED_AT, UPDATED_AT,
};
use tb_core::schema::SchemaDescriptor;
use tb_core::thread::{self, ParentRef};
use tb_core::traits::CommentRepo;

use crate::exec::{db, execute, execute_with_fallback, fetch_all, fetch_optional, text, timestamp};

#[derive(Clone)]
pub struct SqliteCommentRepo {
    pool: SqlitePool,
    schema: Arc<SchemaDescriptor>,
}

fn map_comment(row: &SqliteRow) -> Result<Comment> {
    let depth: Option<i64> = row.try_get(COMMENT_DEPTH).map_err(db)?;
    Ok(Comment {
        uuid: text(row, COMMENT_UUID)?.unwrap_or_default(),
        post_ref: text(row, COMMENT_POST_REF)?.unwrap_or_default(),
        parent_uuid: text(row, COMMENT_PARENT)?.filter(|p| !p.is_empty()),
        depth: u32::try_from(depth.unwrap_or(0)).unwrap_or(0),
        author_id: text(row, COMMENT_AUTHOR)?.unwrap_or_default(),
        content: text(row, COMMENT_CONTENT)?.unwrap_or_default(),
        status: text(row, COMMENT_STATUS)?,
        created_at: timestamp(row, CREATED_AT),
        updated_at: timestamp(row, UPDATED_AT),
    })
}

impl SqliteCommentRepo {
    pub fn new(pool: SqlitePool, schema: Arc<SchemaDescriptor>) -> Self {
        Self { pool, schema }
    }

    fn queries(&self) -> Result<CommentQueries<'_>> {
        Ok(CommentQueries::new(self.schema.thread_columns()?))
    }
}

#[async_trait]
impl CommentRepo for SqliteCommentRepo {
    async fn find_by_post(&self, post: &PostKey) -> Result<Vec<Comment>> {
        let stmt = self.queries()?.by_post(post);
        let flat = fetch_all(&self.pool, &stmt)
            .await?
            .iter()
            .map(map_comment)
            .collect::<Result<Vec<_>>>()?;
        Ok(thread::arrange(flat))
    }

    async fn find(&self, uuid: &str) -> Result<Option<Comment>> {
        let stmt = self.queries()?.by_uuid(uuid.trim());
        fetch_optional(&self.pool, &stmt).await?.as_ref().map(map_comment).transpose()
    }

    async fn post_ref_of(&self, uuid: &str) -> Result<Option<String>> {
        Ok(self
            .find(uuid)
            .await?
            .map(|c| c.post_ref)
            .filter(|p| !p.is_empty()))
    }

    async fn insert(&self, comment: NewComment) -> Result<Comment> {
        let q = self.queries()?;
        let draft = thread::normalize(comment)?;

        let parent = match &draft.parent_uuid {
            Some(parent_uuid) => self.find(parent_uuid).await?.map(|p| ParentRef {
                post_ref: Some(p.post_ref),
                depth: Some(i64::from(p.depth)),
            }),
            None => None,
        };
        let row = thread::place(draft, parent)?;

        execute_with_fallback(&self.pool, &q.insert(&row, Stamps::Include), &q.insert(&row, Stamps::Omit)).await?;
        tracing::info!(comment = %row.uuid, post = %row.post, depth = row.depth, "comment stored");

        self.find(&row.uuid)
            .await?
            .ok_or_else(|| AppError::Internal(format!("comment {} vanished after insert", row.uuid)))
    }

    async fn update_content(&self, uuid: &str, content: &str, actor: &Actor) -> Result<u64> {
        let uuid = uuid.trim();
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::validation("comment content is required"));
        }
        let q = self.queries()?;
        let scope = OwnerScope::for_actor(actor);
        let primary = q.update_content(uuid, content, &scope, Stamps::Include);
        let fallback = q.update_content(uuid, content, &scope, Stamps::Omit);

        let rows = execute_with_fallback(&self.pool, &primary, &fallback).await?.rows_affected();
        tracing::info!(comment = uuid, rows, actor = %actor.id, "comment updated");
        Ok(rows)
    }

    /// Replies to a deleted comment are left in place.
    async fn delete(&self, uuid: &str, actor: &Actor) -> Result<u64> {
        let uuid = uuid.trim();
        let stmt = self.queries()?.delete(uuid, &OwnerScope::for_actor(actor));
        let rows = execute(&self.pool, &stmt).await.map_err(db)?.rows_affected();
        tracing::info!(comment = uuid, rows, actor = %actor.id, "comment deleted");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{descriptor_of, memory_pool, BARE_SCHEMA, LEGACY_SCHEMA, MODERN_SCHEMA};
    use tb_core::guard::Outcome;
    use tb_core::models::COMMENT_STATUS_PUBLISHED;

    async fn repo(ddl: &str) -> SqliteCommentRepo {
        let pool = memory_pool(ddl).await;
        let schema = descriptor_of(&pool).await;
        SqliteCommentRepo::new(pool, Arc::new(schema))
    }

    async fn modern_with_post() -> SqliteCommentRepo {
        let repo = repo(MODERN_SCHEMA).await;
        sqlx::raw_sql(
            "INSERT INTO posts (uuid, board_uuid, title, body, author_id) VALUES ('p1', 'b-1', 't', 'b', 'kim');
             INSERT INTO posts (uuid, board_uuid, title, body, author_id) VALUES ('p2', 'b-1', 't', 'b', 'kim');",
        )
        .execute(&repo.pool)
        .await
        .unwrap();
        repo
    }

    fn top(post: &str, author: &str, content: &str) -> NewComment {
        NewComment {
            post: Some(PostKey::parse(post)),
            author_id: author.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    fn reply(parent: &str, author: &str, content: &str) -> NewComment {
        NewComment {
            parent_uuid: Some(parent.into()),
            author_id: author.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn replies_inherit_post_and_nest_one_deeper() {
        let repo = modern_with_post().await;
        let root = repo.insert(top("p1", "kim", "first")).await.unwrap();
        assert_eq!(root.depth, 0);
        assert_eq!(root.parent_uuid, None);
        assert_eq!(root.status.as_deref(), Some(COMMENT_STATUS_PUBLISHED));
        assert!(root.created_at.is_some());

        let child = repo.insert(reply(&root.uuid, "lee", "second")).await.unwrap();
        assert_eq!(child.post_ref, "p1");
        assert_eq!(child.depth, 1);
        let grandchild = repo.insert(reply(&child.uuid, "kim", "third")).await.unwrap();
        assert_eq!(grandchild.depth, 2);

        assert_eq!(repo.post_ref_of(&grandchild.uuid).await.unwrap().as_deref(), Some("p1"));
        assert_eq!(repo.post_ref_of("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn reply_across_posts_is_rejected() {
        let repo = modern_with_post().await;
        let root = repo.insert(top("p1", "kim", "first")).await.unwrap();

        let mut cross = reply(&root.uuid, "lee", "wrong thread");
        cross.post = Some(PostKey::parse("p2"));
        let err = repo.insert(cross).await.unwrap_err();
        assert!(err.is_rejected_input());

        let err = repo.insert(reply("no-such-comment", "lee", "orphan")).await.unwrap_err();
        assert!(err.is_rejected_input());
        assert!(repo.find_by_post(&PostKey::parse("p2")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listing_groups_replies_under_their_root() {
        let repo = modern_with_post().await;
        sqlx::raw_sql(
            "INSERT INTO comments (uuid, post_uuid, parent_uuid, depth, author_id, content, created_at) VALUES
                ('c1', 'p1', NULL, 0, 'kim', 'a', '2025-01-01 00:00:10'),
                ('c2', 'p1', 'c1', 1, 'lee', 'b', '2025-01-01 00:00:20'),
                ('c3', 'p1', NULL, 0, 'lee', 'c', '2025-01-01 00:00:05'),
                ('x9', 'p2', NULL, 0, 'lee', 'elsewhere', '2025-01-01 00:00:01');",
        )
        .execute(&repo.pool)
        .await
        .unwrap();

        let listed = repo.find_by_post(&PostKey::parse("p1")).await.unwrap();
        let uuids: Vec<&str> = listed.iter().map(|c| c.uuid.as_str()).collect();
        assert_eq!(uuids, vec!["c3", "c1", "c2"]);
    }

    #[tokio::test]
    async fn numeric_post_keys_round_trip_through_comments() {
        let repo = repo(LEGACY_SCHEMA).await;
        sqlx::query("INSERT INTO post (board_code, title, content) VALUES ('NORM', 't', 'c')")
            .execute(&repo.pool)
            .await
            .unwrap();

        let root = repo.insert(top("1", "kim", "hi")).await.unwrap();
        assert_eq!(root.post_ref, "1");
        let child = repo.insert(reply(&root.uuid, "lee", "hello")).await.unwrap();
        assert_eq!(child.depth, 1);
        assert_eq!(repo.find_by_post(&PostKey::Numeric(1)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn only_authors_or_admins_edit_and_delete() {
        let repo = modern_with_post().await;
        let c = repo.insert(top("p1", "kim", "draft")).await.unwrap();

        let stranger = Actor::member("lee");
        let rows = repo.update_content(&c.uuid, "defaced", &stranger).await.unwrap();
        assert_eq!(Outcome::classify(rows, &stranger), Outcome::Forbidden);

        assert_eq!(repo.update_content(&c.uuid, "final", &Actor::member("kim")).await.unwrap(), 1);
        let stored = repo.find(&c.uuid).await.unwrap().unwrap();
        assert_eq!(stored.content, "final");
        assert!(stored.updated_at.is_some());

        assert!(repo.update_content(&c.uuid, "  ", &Actor::member("kim")).await.unwrap_err().is_rejected_input());

        assert_eq!(repo.delete(&c.uuid, &stranger).await.unwrap(), 0);
        assert_eq!(repo.delete(&c.uuid, &Actor::admin("root")).await.unwrap(), 1);
        assert!(repo.find(&c.uuid).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn padded_uuids_match_on_every_lookup() {
        let repo = modern_with_post().await;
        let c = repo.insert(top("p1", "kim", "draft")).await.unwrap();
        let padded = format!("  {} ", c.uuid);
        let kim = Actor::member("kim");

        assert!(repo.find(&padded).await.unwrap().is_some());
        assert_eq!(repo.update_content(&padded, "edited", &kim).await.unwrap(), 1);
        assert_eq!(repo.delete(&padded, &kim).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn deleting_a_parent_leaves_replies_listed() {
        let repo = modern_with_post().await;
        let root = repo.insert(top("p1", "kim", "root")).await.unwrap();
        let child = repo.insert(reply(&root.uuid, "lee", "child")).await.unwrap();

        assert_eq!(repo.delete(&root.uuid, &Actor::member("kim")).await.unwrap(), 1);
        let listed = repo.find_by_post(&PostKey::parse("p1")).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].uuid, child.uuid);
    }

    #[tokio::test]
    async fn missing_comment_table_is_a_config_error() {
        let repo = repo(BARE_SCHEMA).await;
        let err = repo.find_by_post(&PostKey::Numeric(1)).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}

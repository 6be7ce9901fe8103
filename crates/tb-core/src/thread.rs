//! # Comment Threads
//!
//! Driver-independent half of the comment tree engine: input
//! normalization, reply placement (same-post check and depth), and the
//! display order of a post's flat comment list.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Comment, NewComment, PostKey, COMMENT_STATUS_PUBLISHED};
use crate::query::CommentRow;

/// A comment payload with blanks stripped and required fields checked.
#[derive(Debug, Clone)]
pub struct Draft {
    pub uuid: Option<String>,
    pub post: Option<PostKey>,
    pub parent_uuid: Option<String>,
    pub author_id: String,
    pub content: String,
}

/// What the store knows about a parent comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub post_ref: Option<String>,
    pub depth: Option<i64>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Trims every field and rejects missing author, content, or a comment
/// that names neither a post nor a parent.
pub fn normalize(new: NewComment) -> Result<Draft> {
    let post = match new.post {
        Some(PostKey::Text(s)) => non_blank(Some(s.as_str())).map(|s| PostKey::parse(&s)),
        other => other,
    };
    let parent_uuid = non_blank(new.parent_uuid.as_deref());

    let author_id = non_blank(Some(new.author_id.as_str()))
        .ok_or_else(|| AppError::validation("comment author is required"))?;
    let content = non_blank(Some(new.content.as_str()))
        .ok_or_else(|| AppError::validation("comment content is required"))?;
    if post.is_none() && parent_uuid.is_none() {
        return Err(AppError::validation("comment post reference is required"));
    }

    Ok(Draft {
        uuid: non_blank(new.uuid.as_deref()),
        post,
        parent_uuid,
        author_id,
        content,
    })
}

/// Places a draft in its thread.
///
/// `parent` is the stored parent when the draft names one, `None` when
/// the lookup found nothing. A reply must land on its parent's post;
/// a mismatch is rejected, never corrected.
pub fn place(draft: Draft, parent: Option<ParentRef>) -> Result<CommentRow> {
    let (post, depth) = match &draft.parent_uuid {
        None => {
            let post = draft
                .post
                .clone()
                .ok_or_else(|| AppError::validation("comment post reference is required"))?;
            (post, 0)
        }
        Some(parent_uuid) => {
            let parent =
                parent.ok_or_else(|| AppError::validation(format!("parent comment {parent_uuid} not found")))?;
            let parent_post = non_blank(parent.post_ref.as_deref())
                .ok_or_else(|| AppError::validation("parent must belong to the same post"))?;
            let post = match &draft.post {
                Some(post) if post.to_string() != parent_post => {
                    return Err(AppError::validation("parent must belong to the same post"));
                }
                Some(post) => post.clone(),
                None => PostKey::parse(&parent_post),
            };
            let parent_depth = u32::try_from(parent.depth.unwrap_or(0).max(0)).unwrap_or(u32::MAX);
            (post, parent_depth.saturating_add(1))
        }
    };

    Ok(CommentRow {
        uuid: draft.uuid.unwrap_or_else(|| Uuid::new_v4().to_string()),
        post,
        parent_uuid: draft.parent_uuid,
        depth,
        author_id: draft.author_id,
        content: draft.content,
        status: COMMENT_STATUS_PUBLISHED.to_string(),
    })
}

/// Root creation time, root uuid, depth, creation time, uuid.
type SortKey = (Option<NaiveDateTime>, String, u32, Option<NaiveDateTime>, String);

/// Orders a post's comments for rendering from a flat list.
///
/// Comments are grouped under their thread root (the topmost ancestor
/// present in the list; a reply whose parent is gone roots its own
/// group). Groups follow the root's creation time, then root uuid; inside
/// a group the order is depth, creation time, uuid.
pub fn arrange(comments: Vec<Comment>) -> Vec<Comment> {
    let order: Vec<usize> = {
        let index: HashMap<&str, usize> = comments
            .iter()
            .enumerate()
            .map(|(i, c)| (c.uuid.as_str(), i))
            .collect();

        let root_of = |start: usize| -> usize {
            let mut at = start;
            // bounded walk; a parent cycle cannot loop forever
            for _ in 0..comments.len() {
                match comments[at].parent_uuid.as_deref().and_then(|p| index.get(p)) {
                    Some(&parent) if parent != at => at = parent,
                    _ => break,
                }
            }
            at
        };

        let mut keyed: Vec<(SortKey, usize)> = (0..comments.len())
            .map(|i| {
                let root = &comments[root_of(i)];
                let c = &comments[i];
                ((root.created_at, root.uuid.clone(), c.depth, c.created_at, c.uuid.clone()), i)
            })
            .collect();
        keyed.sort();
        keyed.into_iter().map(|(_, i)| i).collect()
    };

    let mut slots: Vec<Option<Comment>> = comments.into_iter().map(Some).collect();
    order.into_iter().filter_map(|i| slots[i].take()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(secs: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2025, 1, 1).and_then(|d| d.and_hms_opt(0, 0, secs))
    }

    fn comment(uuid: &str, parent: Option<&str>, depth: u32, t: u32) -> Comment {
        Comment {
            uuid: uuid.into(),
            post_ref: "p1".into(),
            parent_uuid: parent.map(Into::into),
            depth,
            author_id: "kim".into(),
            content: uuid.into(),
            status: Some(COMMENT_STATUS_PUBLISHED.into()),
            created_at: at(t),
            updated_at: None,
        }
    }

    fn uuids(list: &[Comment]) -> Vec<&str> {
        list.iter().map(|c| c.uuid.as_str()).collect()
    }

    fn draft(post: Option<&str>, parent: Option<&str>) -> Draft {
        normalize(NewComment {
            uuid: None,
            post: post.map(PostKey::parse),
            parent_uuid: parent.map(Into::into),
            author_id: "kim".into(),
            content: "hello".into(),
        })
        .unwrap()
    }

    #[test]
    fn groups_by_root_then_depth_then_time() {
        let flat = vec![
            comment("c1", None, 0, 10),
            comment("c2", Some("c1"), 1, 20),
            comment("c3", None, 0, 5),
        ];
        assert_eq!(uuids(&arrange(flat)), vec!["c3", "c1", "c2"]);
    }

    #[test]
    fn deep_replies_stay_with_their_root() {
        let flat = vec![
            comment("a", None, 0, 1),
            comment("b", None, 0, 2),
            comment("a2", Some("a1"), 2, 9),
            comment("a1", Some("a"), 1, 3),
            comment("b1", Some("b"), 1, 4),
        ];
        assert_eq!(uuids(&arrange(flat)), vec!["a", "a1", "a2", "b", "b1"]);
    }

    #[test]
    fn orphaned_reply_roots_its_own_group() {
        let flat = vec![comment("r", None, 0, 5), comment("x", Some("gone"), 1, 1)];
        assert_eq!(uuids(&arrange(flat)), vec!["x", "r"]);
    }

    #[test]
    fn equal_timestamps_fall_back_to_uuid() {
        let flat = vec![comment("b", None, 0, 1), comment("a", None, 0, 1)];
        assert_eq!(uuids(&arrange(flat)), vec!["a", "b"]);
    }

    #[test]
    fn blank_content_is_rejected() {
        let err = normalize(NewComment {
            post: Some(PostKey::Numeric(1)),
            author_id: "kim".into(),
            content: "   ".into(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.is_rejected_input());
    }

    #[test]
    fn comment_needs_a_post_or_parent() {
        let err = normalize(NewComment {
            post: Some(PostKey::Text("  ".into())),
            author_id: "kim".into(),
            content: "hi".into(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn top_level_comment_has_depth_zero_and_fresh_uuid() {
        let row = place(draft(Some("p1"), None), None).unwrap();
        assert_eq!(row.depth, 0);
        assert!(row.parent_uuid.is_none());
        assert!(Uuid::parse_str(&row.uuid).is_ok());
        assert_eq!(row.status, COMMENT_STATUS_PUBLISHED);
    }

    #[test]
    fn reply_depth_is_parent_plus_one() {
        let parent = ParentRef { post_ref: Some("p1".into()), depth: Some(2) };
        let row = place(draft(Some("p1"), Some("c1")), Some(parent)).unwrap();
        assert_eq!(row.depth, 3);
        assert_eq!(row.parent_uuid.as_deref(), Some("c1"));
    }

    #[test]
    fn reply_without_post_inherits_parent_post() {
        let parent = ParentRef { post_ref: Some("42".into()), depth: None };
        let row = place(draft(None, Some("c1")), Some(parent)).unwrap();
        assert_eq!(row.post, PostKey::Numeric(42));
        assert_eq!(row.depth, 1);
    }

    #[test]
    fn reply_on_another_post_is_rejected() {
        let parent = ParentRef { post_ref: Some("p2".into()), depth: Some(0) };
        let err = place(draft(Some("p1"), Some("c1")), Some(parent)).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("same post")));
    }

    #[test]
    fn reply_to_missing_parent_is_rejected() {
        let err = place(draft(Some("p1"), Some("nope")), None).unwrap_err();
        assert!(err.is_rejected_input());
    }
}

//! threadboard/crates/tb-core/src/lib.rs
//!
//! The schema-adaptive persistence core for posts and threaded comments:
//! domain models, the schema descriptor and its resolver, SQL synthesis,
//! and the ports a database plugin implements.

pub mod error;
pub mod guard;
pub mod models;
pub mod query;
pub mod schema;
pub mod thread;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use guard::*;
pub use models::*;
pub use schema::{SchemaCatalog, SchemaDescriptor};
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::models::*;

    #[test]
    fn post_key_parses_digits_as_numeric() {
        assert_eq!(PostKey::parse("42"), PostKey::Numeric(42));
        assert_eq!(PostKey::parse(" 7 "), PostKey::Numeric(7));
        assert_eq!(PostKey::parse("4a2"), PostKey::Text("4a2".into()));
        assert_eq!(PostKey::parse("-1"), PostKey::Text("-1".into()));
        // too large for i64 stays textual
        assert_eq!(
            PostKey::parse("99999999999999999999"),
            PostKey::Text("99999999999999999999".into())
        );
    }

    #[test]
    fn post_key_serializes_untagged() {
        assert_eq!(serde_json::to_string(&PostKey::Numeric(3)).unwrap(), "3");
        assert_eq!(
            serde_json::to_string(&PostKey::Text("a-b".into())).unwrap(),
            "\"a-b\""
        );
        let back: PostKey = serde_json::from_str("\"a-b\"").unwrap();
        assert_eq!(back, PostKey::Text("a-b".into()));
    }

    #[test]
    fn page_counts_partial_last_page() {
        let page = Page::new(vec![1, 2], 21, 2, 10);
        assert_eq!(page.total_pages, 3);
        assert_eq!(Page::<u8>::empty(0, 0).total_pages, 0);
    }
}

//! One-time schema resolution.

use std::sync::Arc;

use tokio::sync::OnceCell;

use super::{resolve_descriptor, SchemaDescriptor};
use crate::error::Result;
use crate::traits::SchemaProbe;

/// Holds a probe and the descriptor it produced.
///
/// The first successful [`resolve`](Self::resolve) stores the descriptor;
/// concurrent first callers wait on the same initialization instead of
/// probing again, and every later call is a plain read. A failed probe
/// stores nothing, so the next call tries again.
pub struct SchemaCatalog<P> {
    probe: P,
    resolved: OnceCell<Arc<SchemaDescriptor>>,
}

impl<P: SchemaProbe> SchemaCatalog<P> {
    pub fn new(probe: P) -> Self {
        Self { probe, resolved: OnceCell::new() }
    }

    pub async fn resolve(&self) -> Result<Arc<SchemaDescriptor>> {
        let schema = self
            .resolved
            .get_or_try_init(|| async { resolve_descriptor(&self.probe).await.map(Arc::new) })
            .await?;
        Ok(Arc::clone(schema))
    }

    /// The descriptor, if a previous [`resolve`](Self::resolve) succeeded.
    pub fn get(&self) -> Option<Arc<SchemaDescriptor>> {
        self.resolved.get().cloned()
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::schema::ColumnInfo;
    use crate::traits::MockSchemaProbe;

    fn post_columns() -> Vec<ColumnInfo> {
        ["post_id", "board_code", "title", "content"]
            .into_iter()
            .map(|n| ColumnInfo::new(n, ""))
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_resolution_probes_once() {
        let mut probe = MockSchemaProbe::new();
        probe
            .expect_list_tables()
            .times(1)
            .returning(|| Ok(vec!["post".to_string()]));
        probe
            .expect_list_columns()
            .times(1)
            .returning(|_| Ok(post_columns()));

        let catalog = Arc::new(SchemaCatalog::new(probe));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let catalog = Arc::clone(&catalog);
                tokio::spawn(async move { catalog.resolve().await.unwrap() })
            })
            .collect();

        let mut seen = Vec::new();
        for handle in handles {
            seen.push(handle.await.unwrap());
        }
        let first = &seen[0];
        assert!(seen.iter().all(|s| Arc::ptr_eq(s, first)));
        assert!(Arc::ptr_eq(&catalog.get().unwrap(), first));
    }

    #[tokio::test]
    async fn failed_probe_is_not_cached() {
        let mut probe = MockSchemaProbe::new();
        let mut seq = mockall::Sequence::new();
        probe
            .expect_list_tables()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(AppError::Database("locked".into())));
        probe
            .expect_list_tables()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec!["posts".to_string()]));
        probe.expect_list_columns().returning(|_| Ok(post_columns()));

        let catalog = SchemaCatalog::new(probe);
        assert!(catalog.resolve().await.is_err());
        assert!(catalog.get().is_none());

        let schema = catalog.resolve().await.unwrap();
        assert_eq!(schema.posts.table, "posts");
    }
}

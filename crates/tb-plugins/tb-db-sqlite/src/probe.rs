//! Catalog introspection through `sqlite_master` and `pragma_table_info`.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tb_core::error::Result;
use tb_core::schema::ColumnInfo;
use tb_core::traits::SchemaProbe;

use crate::exec::db;

#[derive(Clone)]
pub struct SqliteProbe {
    pool: SqlitePool,
}

impl SqliteProbe {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SchemaProbe for SqliteProbe {
    async fn list_tables(&self) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master \
             WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db)
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let rows = sqlx::query("SELECT name, type FROM pragma_table_info(?) ORDER BY cid")
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;

        rows.iter()
            .map(|row| {
                let name: String = row.try_get("name").map_err(db)?;
                let declared: Option<String> = row.try_get("type").map_err(db)?;
                Ok(ColumnInfo::new(name, declared.unwrap_or_default()))
            })
            .collect()
    }
}

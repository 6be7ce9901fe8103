//! # Threadboard Binary
//!
//! Assembles the persistence core from compile-time features, probes the
//! configured database and reports what it found.

mod settings;

use anyhow::Context;
use secrecy::ExposeSecret;
use tb_core::traits::PostRepo;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "db-sqlite")]
use tb_db_sqlite::SqliteStore;

#[cfg(not(feature = "db-sqlite"))]
compile_error!("threadboard needs a database plugin; enable the `db-sqlite` feature");

use crate::settings::Settings;

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("threadboard=info,tb_db_sqlite=info"));
    let fmt = tracing_subscriber::fmt().with_env_filter(filter);
    if settings.json_logs() {
        fmt.json().init();
    } else {
        fmt.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings);

    let store = SqliteStore::connect(settings.database_url.expose_secret(), settings.max_connections)
        .await
        .context("opening database and probing schema")?;

    println!("{}", serde_json::to_string_pretty(store.schema().as_ref())?);

    if let Some(board) = settings.list_board.as_deref() {
        let page = store.posts().list_by_board_paged(board, 0, 10).await?;
        tracing::info!(board, total = page.total, pages = page.total_pages, "board listing");
        println!("{}", serde_json::to_string_pretty(&page)?);
    }
    Ok(())
}

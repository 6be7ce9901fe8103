//! Runtime settings: defaults, then `threadboard.toml`, then
//! `THREADBOARD__*` environment variables (a `.env` file is loaded first).

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;

const DEFAULT_DATABASE_URL: &str = "sqlite:threadboard.db";

#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Connection string; may carry credentials, so it never reaches the logs.
    pub database_url: SecretString,
    pub max_connections: u32,
    /// `pretty` or `json`.
    pub log_format: String,
    /// Board code whose first page is printed after startup.
    pub list_board: Option<String>,
}

impl Settings {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::build(
            Config::builder()
                .add_source(File::with_name("threadboard").required(false))
                .add_source(Environment::with_prefix("THREADBOARD").separator("__")),
        )
    }

    fn build(sources: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
        let cfg = sources
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("max_connections", 5)?
            .set_default("log_format", "pretty")?
            .build()?;
        Ok(cfg.try_deserialize()?)
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

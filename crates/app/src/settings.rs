//! Handles settings for the application. Configuration is written in
//! `settings.toml`.

use config::{Config, ConfigError, File};
use serde::Deserialize;

/// Database backing the server.
///
/// In TOML either `database = "memory"` or `database = { sqlite = "path" }`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log level for the env filter (`error`..`trace`).
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub jwt_secret: String,
    /// Bearer token lifetime; defaults to one hour.
    pub token_ttl_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    pub auth: Auth,
    /// Base URL of the upstream rate source; defaults to the public NBP API.
    pub nbp_base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings"))
            .build()?;

        settings.try_deserialize()
    }
}

use std::path::Path;

use anyhow::{Context as _, Result};
use rollcall_core::source::HttpClient;
use rollcall_core::{Config, SqliteStore};

use super::Cli;

/// Config file and environment, then command-line store overrides.
pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(primary) = &cli.primary {
        config.stores.primary.clone_from(primary);
    }
    if let Some(secondary) = &cli.secondary {
        config.stores.secondary.clone_from(secondary);
    }

    Ok(config)
}

pub async fn open_store(path: &Path) -> Result<SqliteStore> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    SqliteStore::open(&path.to_string_lossy())
        .await
        .with_context(|| format!("Failed to open store {}", path.display()))
}

pub fn http_client(config: &Config) -> Result<HttpClient> {
    HttpClient::new(&config.source).context("Failed to build HTTP client")
}

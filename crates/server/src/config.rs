use std::fs;

use serde::Deserialize;
use shared::domain::PageIndexing;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub page_indexing: PageIndexing,
    pub max_page_size: u32,
    pub seed_users: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8443".into(),
            page_indexing: PageIndexing::ZeroBased,
            max_page_size: 100,
            seed_users: 42,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    page_indexing: Option<PageIndexing>,
    max_page_size: Option<u32>,
    seed_users: Option<usize>,
}

pub fn load_settings() -> Settings {
    let file = fs::read_to_string("server.toml").ok();
    resolve_settings(file.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then `server.toml`, then environment. Values that fail to parse
/// are logged and skipped.
pub(crate) fn resolve_settings(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        match toml::from_str::<FileSettings>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.bind_addr {
                    settings.server_bind = v;
                }
                if let Some(v) = file_cfg.page_indexing {
                    settings.page_indexing = v;
                }
                if let Some(v) = file_cfg.max_page_size.filter(|size| *size > 0) {
                    settings.max_page_size = v;
                }
                if let Some(v) = file_cfg.seed_users {
                    settings.seed_users = v;
                }
            }
            Err(error) => warn!(%error, "ignoring malformed server.toml"),
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("APP__PAGE_INDEXING") {
        match v.parse() {
            Ok(indexing) => settings.page_indexing = indexing,
            Err(error) => warn!(%error, "ignoring APP__PAGE_INDEXING"),
        }
    }

    if let Some(v) = env("APP__MAX_PAGE_SIZE") {
        match v.parse::<u32>() {
            Ok(size) if size > 0 => settings.max_page_size = size,
            _ => warn!(value = %v, "ignoring APP__MAX_PAGE_SIZE"),
        }
    }

    if let Some(v) = env("APP__SEED_USERS") {
        match v.parse::<usize>() {
            Ok(count) => settings.seed_users = count,
            Err(error) => warn!(%error, "ignoring APP__SEED_USERS"),
        }
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

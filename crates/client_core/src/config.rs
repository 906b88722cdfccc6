//! Controller settings: defaults, overlaid by `collection.toml`, overlaid by `APP__*` env vars.

use std::{env, fs, path::Path, time::Duration};

use serde::Deserialize;
use shared::domain::{PageIndexing, Sorting, UnknownSortDirection};
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_SETTINGS_FILE: &str = "collection.toml";

/// User-facing strings surfaced through outcomes and the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Messages {
    pub loaded: String,
    pub load_failed: String,
    pub unexpected_error: String,
    pub cancelled: String,
    pub saved: String,
    pub deleted: String,
    pub delete_failed: String,
    pub delete_unexpected_error: String,
    pub nothing_selected: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            loaded: "Users loaded successfully.".into(),
            load_failed: "Could not load users.".into(),
            unexpected_error: "Unexpected error while loading users.".into(),
            cancelled: "Operation cancelled.".into(),
            saved: "Operation completed successfully!".into(),
            deleted: "User deleted successfully.".into(),
            delete_failed: "Could not delete the user.".into(),
            delete_unexpected_error: "Unexpected error while deleting the user.".into(),
            nothing_selected: "No user selected.".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    pub search_debounce: Duration,
    pub page_indexing: PageIndexing,
    pub default_page_size: u32,
    pub default_sorting: Sorting,
    pub messages: Messages,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            search_debounce: Duration::from_millis(250),
            page_indexing: PageIndexing::ZeroBased,
            default_page_size: 10,
            default_sorting: Sorting::default(),
            messages: Messages::default(),
        }
    }
}

impl ControllerSettings {
    pub fn first_page(&self) -> u32 {
        self.page_indexing.first_page()
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid settings file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid default sort: {0}")]
    Sort(#[from] UnknownSortDirection),
    #[error("page size must be positive")]
    ZeroPageSize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    search_debounce_ms: Option<u64>,
    page_indexing: Option<PageIndexing>,
    page_size: Option<u32>,
    default_sort: Option<String>,
    messages: FileMessages,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileMessages {
    loaded: Option<String>,
    load_failed: Option<String>,
    unexpected_error: Option<String>,
    cancelled: Option<String>,
    saved: Option<String>,
    deleted: Option<String>,
    delete_failed: Option<String>,
    delete_unexpected_error: Option<String>,
    nothing_selected: Option<String>,
}

/// Parses a settings document on top of the defaults.
pub fn parse_settings(raw: &str) -> Result<ControllerSettings, SettingsError> {
    let file: FileSettings = toml::from_str(raw)?;
    let mut settings = ControllerSettings::default();

    if let Some(ms) = file.search_debounce_ms {
        settings.search_debounce = Duration::from_millis(ms);
    }
    if let Some(indexing) = file.page_indexing {
        settings.page_indexing = indexing;
    }
    if let Some(size) = file.page_size {
        if size == 0 {
            return Err(SettingsError::ZeroPageSize);
        }
        settings.default_page_size = size;
    }
    if let Some(sort) = file.default_sort {
        settings.default_sorting = Sorting::from_param(&sort)?;
    }

    let messages = &mut settings.messages;
    let overrides = file.messages;
    for (slot, value) in [
        (&mut messages.loaded, overrides.loaded),
        (&mut messages.load_failed, overrides.load_failed),
        (&mut messages.unexpected_error, overrides.unexpected_error),
        (&mut messages.cancelled, overrides.cancelled),
        (&mut messages.saved, overrides.saved),
        (&mut messages.deleted, overrides.deleted),
        (&mut messages.delete_failed, overrides.delete_failed),
        (
            &mut messages.delete_unexpected_error,
            overrides.delete_unexpected_error,
        ),
        (&mut messages.nothing_selected, overrides.nothing_selected),
    ] {
        if let Some(value) = value {
            *slot = value;
        }
    }

    Ok(settings)
}

pub fn load_settings() -> ControllerSettings {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE))
}

pub fn load_settings_from(path: &Path) -> ControllerSettings {
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => parse_settings(&raw).unwrap_or_else(|error| {
            warn!(path = %path.display(), %error, "ignoring invalid controller settings file");
            ControllerSettings::default()
        }),
        Err(_) => ControllerSettings::default(),
    };
    apply_env_overrides(&mut settings, |key| env::var(key).ok());
    settings
}

pub fn apply_env_overrides(
    settings: &mut ControllerSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("APP__SEARCH_DEBOUNCE_MS") {
        match v.parse::<u64>() {
            Ok(ms) => settings.search_debounce = Duration::from_millis(ms),
            Err(_) => warn!(value = %v, "ignoring invalid APP__SEARCH_DEBOUNCE_MS"),
        }
    }
    if let Some(v) = lookup("APP__PAGE_SIZE") {
        match v.parse::<u32>() {
            Ok(size) if size > 0 => settings.default_page_size = size,
            _ => warn!(value = %v, "ignoring invalid APP__PAGE_SIZE"),
        }
    }
    if let Some(v) = lookup("APP__PAGE_INDEXING") {
        match v.parse::<PageIndexing>() {
            Ok(indexing) => settings.page_indexing = indexing,
            Err(error) => warn!(%error, "ignoring invalid APP__PAGE_INDEXING"),
        }
    }
    if let Some(v) = lookup("APP__DEFAULT_SORT") {
        match Sorting::from_param(&v) {
            Ok(sorting) => settings.default_sorting = sorting,
            Err(error) => warn!(%error, "ignoring invalid APP__DEFAULT_SORT"),
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

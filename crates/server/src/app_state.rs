use std::sync::Arc;

use crate::{api::ApiContext, config::Settings, directory::UserDirectory};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
}

impl AppState {
    pub(crate) fn from_settings(settings: &Settings) -> Self {
        Self {
            api: ApiContext {
                directory: Arc::new(UserDirectory::with_sample_users(settings.seed_users)),
                page_indexing: settings.page_indexing,
                max_page_size: settings.max_page_size,
            },
        }
    }
}

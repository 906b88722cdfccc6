//! Observable snapshot of a paginated, sortable, searchable collection view.

use shared::{
    domain::{PageIndexing, Sorting},
    protocol::{Pagination, SearchRequest},
};

use crate::config::ControllerSettings;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState<R> {
    pub items: Vec<R>,
    pub total_items: u64,
    pub current_page: u32,
    pub page_size: u32,
    /// Trimmed search text; empty means no filter.
    pub search: String,
    pub sorting: Sorting,
    pub is_loading: bool,
    pub initialized: bool,
    pub page_indexing: PageIndexing,
}

/// Server-rendered data handed to a view at construction so the first
/// round-trip can be skipped. Missing fields fall back to the settings.
#[derive(Debug, Clone)]
pub struct Seed<R> {
    pub users: Vec<R>,
    pub total_items: u64,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub search: Option<String>,
    pub sorting: Option<Sorting>,
}

impl<R> Seed<R> {
    pub fn new(users: Vec<R>, total_items: u64) -> Self {
        Self {
            users,
            total_items,
            page: None,
            size: None,
            search: None,
            sorting: None,
        }
    }
}

impl<R> ViewState<R> {
    pub fn new(settings: &ControllerSettings) -> Self {
        Self {
            items: Vec::new(),
            total_items: 0,
            current_page: settings.first_page(),
            page_size: settings.default_page_size.max(1),
            search: String::new(),
            sorting: settings.default_sorting.clone(),
            is_loading: false,
            initialized: false,
            page_indexing: settings.page_indexing,
        }
    }

    pub fn seeded(settings: &ControllerSettings, seed: Seed<R>) -> Self {
        let mut state = Self::new(settings);
        state.items = seed.users;
        state.total_items = seed.total_items;
        if let Some(page) = seed.page {
            state.current_page = page.max(state.first_page());
        }
        if let Some(size) = seed.size.filter(|size| *size > 0) {
            state.page_size = size;
        }
        if let Some(search) = seed.search {
            state.search = search.trim().to_string();
        }
        if let Some(sorting) = seed.sorting {
            state.sorting = sorting;
        }
        state.initialized = true;
        state
    }

    pub fn first_page(&self) -> u32 {
        self.page_indexing.first_page()
    }

    pub fn last_page(&self) -> u32 {
        self.first_page() + self.page_count().saturating_sub(1)
    }

    pub fn page_count(&self) -> u32 {
        let size = u64::from(self.page_size.max(1));
        u32::try_from(self.total_items.div_ceil(size)).unwrap_or(u32::MAX)
    }

    pub fn has_previous_page(&self) -> bool {
        self.current_page > self.first_page()
    }

    pub fn has_next_page(&self) -> bool {
        self.current_page < self.last_page()
    }

    pub fn request(&self) -> SearchRequest {
        SearchRequest::new(
            self.current_page,
            self.page_size,
            self.search.clone(),
            &self.sorting,
        )
    }

    pub(crate) fn commit_page(&mut self, users: Vec<R>, pagination: Pagination) {
        self.items = users;
        self.total_items = pagination.total_items;
        if let Some(page) = pagination.current_page {
            self.current_page = page;
        }
        if let Some(size) = pagination.items_per_page.filter(|size| *size > 0) {
            self.page_size = size;
        }
    }
}

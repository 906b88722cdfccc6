use std::sync::Arc;

use shared::{
    domain::{PageIndexing, Sorting, UserId, UserRecord},
    error::ApiError,
    protocol::{Pagination, SearchRequest},
};

use crate::directory::UserDirectory;

#[derive(Clone)]
pub struct ApiContext {
    pub directory: Arc<UserDirectory>,
    pub page_indexing: PageIndexing,
    pub max_page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPage {
    pub users: Vec<UserRecord>,
    pub pagination: Pagination,
}

/// Runs a search form against the directory. Page numbers below the first
/// page and sizes outside `1..=max_page_size` are clamped; the values used
/// are echoed in the pagination block.
pub fn search_users(ctx: &ApiContext, request: &SearchRequest) -> Result<UserPage, ApiError> {
    let sorting = if request.sort.trim().is_empty() {
        Sorting::default()
    } else {
        Sorting::from_param(&request.sort).map_err(|e| ApiError::validation(e.to_string()))?
    };
    let size = request.size.clamp(1, ctx.max_page_size.max(1));
    let page = request.page.max(ctx.page_indexing.first_page());
    let offset = ctx.page_indexing.offset_of(page) as usize * size as usize;

    let slice = ctx
        .directory
        .search(&request.search, &sorting, offset, size as usize)?;
    Ok(UserPage {
        users: slice.users,
        pagination: Pagination {
            total_items: slice.total_items,
            current_page: Some(page),
            items_per_page: Some(size),
        },
    })
}

pub fn delete_user(ctx: &ApiContext, id: UserId) -> Result<UserRecord, ApiError> {
    ctx.directory.delete(id)
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;

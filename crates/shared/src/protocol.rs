use serde::{Deserialize, Serialize};

use crate::domain::{Sorting, UserId};

/// Form payload of the search action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub page: u32,
    pub size: u32,
    #[serde(default)]
    pub search: String,
    /// `"<field>,<direction>"`, see [`Sorting::to_param`].
    pub sort: String,
}

impl SearchRequest {
    pub fn new(page: u32, size: u32, search: impl Into<String>, sorting: &Sorting) -> Self {
        Self {
            page,
            size,
            search: search.into(),
            sort: sorting.to_param(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total_items: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_per_page: Option<u32>,
}

/// Decoded response of the search action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchResult<R> {
    Success {
        users: Vec<R>,
        pagination: Pagination,
    },
    Failure {
        #[serde(default)]
        error: Option<String>,
    },
}

impl<R> SearchResult<R> {
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub id: UserId,
}

/// Response of actions that carry no data besides their status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionResult {
    Success,
    Failure {
        #[serde(default)]
        error: Option<String>,
    },
}

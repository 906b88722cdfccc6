use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use shared::{
    domain::UserRecord,
    error::{ApiError, ErrorCode},
    protocol::{ActionResult, DeleteRequest, SearchRequest, SearchResult},
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;
mod directory;

use api::{delete_user, search_users, UserPage};
use app_state::AppState;
use config::load_settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = load_settings();
    let state = AppState::from_settings(&settings);
    info!(
        users = state.api.directory.user_count(),
        page_indexing = ?settings.page_indexing,
        max_page_size = settings.max_page_size,
        "user directory seeded"
    );
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/users/search", post(http_search_users))
        .route("/users/delete", post(http_delete_user))
        .with_state(state)
}

fn status_for(error: &ApiError) -> StatusCode {
    match error.code {
        ErrorCode::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_search_users(
    State(state): State<Arc<AppState>>,
    Form(req): Form<SearchRequest>,
) -> (StatusCode, Json<SearchResult<UserRecord>>) {
    match search_users(&state.api, &req) {
        Ok(UserPage { users, pagination }) => {
            debug!(
                page = req.page,
                size = req.size,
                search = %req.search,
                sort = %req.sort,
                total_items = pagination.total_items,
                "served user search"
            );
            (StatusCode::OK, Json(SearchResult::Success { users, pagination }))
        }
        Err(error) => {
            warn!(sort = %req.sort, %error, "rejected user search");
            (status_for(&error), Json(SearchResult::failure(error.message)))
        }
    }
}

async fn http_delete_user(
    State(state): State<Arc<AppState>>,
    Form(req): Form<DeleteRequest>,
) -> (StatusCode, Json<ActionResult>) {
    match delete_user(&state.api, req.id) {
        Ok(user) => {
            info!(id = %user.id, "deleted user");
            (StatusCode::OK, Json(ActionResult::Success))
        }
        Err(error) => (
            status_for(&error),
            Json(ActionResult::Failure {
                error: Some(error.message),
            }),
        ),
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

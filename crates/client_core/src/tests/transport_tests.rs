use std::{sync::Arc, time::Duration};

use axum::{extract::State, http::StatusCode, routing::post, Form, Json, Router};
use shared::{
    domain::{UserId, UserRecord},
    protocol::{ActionResult, DeleteRequest, Pagination, SearchRequest, SearchResult},
};
use tokio::{net::TcpListener, sync::mpsc};
use tokio_util::sync::CancellationToken;

use crate::{
    transport::{CollectionTransport, DeleteTransport, HttpCollectionTransport},
    ControllerSettings, FetchOutcome, LogNotifier, UsersTable,
};

#[derive(Clone)]
struct ServerState {
    searches: mpsc::UnboundedSender<SearchRequest>,
    stall: bool,
}

fn sample_user(id: i64) -> UserRecord {
    UserRecord {
        id: UserId(id),
        name: format!("User {id}"),
        document: format!("{id:011}"),
        email: format!("user{id}@example.com"),
        phone: "+55 11 5555-0000".to_string(),
    }
}

async fn handle_search(
    State(state): State<ServerState>,
    Form(request): Form<SearchRequest>,
) -> (StatusCode, Json<SearchResult<UserRecord>>) {
    let _ = state.searches.send(request.clone());
    if state.stall {
        tokio::time::sleep(Duration::from_secs(30)).await;
    }
    if request.sort.starts_with("nope") {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(SearchResult::failure("invalid sort field: nope")),
        );
    }
    (
        StatusCode::OK,
        Json(SearchResult::Success {
            users: vec![sample_user(i64::from(request.page) + 1)],
            pagination: Pagination {
                total_items: 12,
                current_page: Some(request.page),
                items_per_page: Some(request.size),
            },
        }),
    )
}

async fn handle_delete(Form(request): Form<DeleteRequest>) -> Json<ActionResult> {
    if request.id == UserId(1) {
        return Json(ActionResult::Failure {
            error: Some("cannot delete the administrator".into()),
        });
    }
    Json(ActionResult::Success)
}

async fn handle_garbage() -> &'static str {
    "<html>maintenance</html>"
}

async fn spawn_directory_server(
    stall: bool,
) -> anyhow::Result<(String, mpsc::UnboundedReceiver<SearchRequest>)> {
    spawn_directory_server_at(None, stall).await
}

/// Serves the directory routes, nested under `prefix` when one is given.
async fn spawn_directory_server_at(
    prefix: Option<&str>,
    stall: bool,
) -> anyhow::Result<(String, mpsc::UnboundedReceiver<SearchRequest>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (searches, rx) = mpsc::unbounded_channel();
    let state = ServerState { searches, stall };
    let routes = Router::new()
        .route("/users/search", post(handle_search))
        .route("/users/delete", post(handle_delete))
        .route("/broken/search", post(handle_garbage))
        .with_state(state);
    let app = match prefix {
        Some(prefix) => Router::new().nest(prefix, routes),
        None => routes,
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), rx))
}

#[tokio::test]
async fn posts_form_payload_and_decodes_success() {
    let (server_url, mut searches) = spawn_directory_server(false).await.expect("server");
    let transport = HttpCollectionTransport::new(&server_url).expect("transport");

    let request = SearchRequest {
        page: 2,
        size: 5,
        search: "maria".into(),
        sort: "name,desc".into(),
    };
    let result: SearchResult<UserRecord> = transport
        .submit(request.clone(), CancellationToken::new())
        .await
        .expect("search");

    assert_eq!(searches.recv().await.expect("request"), request);
    match result {
        SearchResult::Success { users, pagination } => {
            assert_eq!(users, vec![sample_user(3)]);
            assert_eq!(pagination.current_page, Some(2));
            assert_eq!(pagination.items_per_page, Some(5));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn failure_body_is_decoded_despite_error_status() {
    let (server_url, _searches) = spawn_directory_server(false).await.expect("server");
    let transport = HttpCollectionTransport::new(&server_url).expect("transport");

    let result: SearchResult<UserRecord> = transport
        .submit(
            SearchRequest {
                page: 0,
                size: 10,
                search: String::new(),
                sort: "nope,asc".into(),
            },
            CancellationToken::new(),
        )
        .await
        .expect("failure is not a transport error");
    assert_eq!(result, SearchResult::failure("invalid sort field: nope"));
}

#[tokio::test]
async fn undecodable_body_is_a_transport_failure() {
    let (server_url, _searches) = spawn_directory_server(false).await.expect("server");
    let base = url::Url::parse(&server_url).expect("url");
    let transport = HttpCollectionTransport::with_endpoints(
        reqwest::Client::new(),
        base.join("/broken/search").expect("join"),
        base.join("/users/delete").expect("join"),
    );

    let err = CollectionTransport::<UserRecord>::submit(
        &transport,
        SearchRequest {
            page: 0,
            size: 10,
            search: String::new(),
            sort: "id,asc".into(),
        },
        CancellationToken::new(),
    )
    .await
    .expect_err("garbage body");
    assert!(!err.is_cancelled());
    assert!(err.to_string().contains("unexpected response"), "{err}");
}

#[tokio::test]
async fn fired_token_maps_to_cancelled() {
    let (server_url, mut searches) = spawn_directory_server(true).await.expect("server");
    let transport = HttpCollectionTransport::new(&server_url).expect("transport");
    let cancel = CancellationToken::new();

    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });
    let err = CollectionTransport::<UserRecord>::submit(
        &transport,
        SearchRequest {
            page: 0,
            size: 10,
            search: String::new(),
            sort: "id,asc".into(),
        },
        cancel,
    )
    .await
    .expect_err("cancelled");
    assert!(err.is_cancelled());
    assert!(searches.recv().await.is_some());
}

#[tokio::test]
async fn delete_action_round_trips_statuses() {
    let (server_url, _searches) = spawn_directory_server(false).await.expect("server");
    let transport = HttpCollectionTransport::new(&server_url).expect("transport");

    let ok = transport
        .delete(DeleteRequest { id: UserId(4) }, CancellationToken::new())
        .await
        .expect("delete");
    assert_eq!(ok, ActionResult::Success);

    let refused = transport
        .delete(DeleteRequest { id: UserId(1) }, CancellationToken::new())
        .await
        .expect("delete");
    assert_eq!(
        refused,
        ActionResult::Failure {
            error: Some("cannot delete the administrator".into())
        }
    );
}

#[tokio::test]
async fn users_table_commits_page_from_http_backend() {
    let (server_url, _searches) = spawn_directory_server(false).await.expect("server");
    let transport = Arc::new(HttpCollectionTransport::new(&server_url).expect("transport"));
    let table = UsersTable::new(transport, Arc::new(LogNotifier), ControllerSettings::default());

    let outcome = table.set_page(1).await;
    assert!(matches!(outcome, FetchOutcome::Loaded { total_items: 12, .. }));

    let state = table.snapshot();
    assert_eq!(state.items, vec![sample_user(2)]);
    assert_eq!(state.current_page, 1);
    assert!(!state.is_loading);
    assert!(matches!(
        table.set_sort("nope", shared::domain::SortDirection::Asc).await,
        FetchOutcome::Failed(_)
    ));
    assert_eq!(table.snapshot().items, vec![sample_user(2)]);
}

#[tokio::test]
async fn server_url_path_prefix_is_kept() {
    let (server_url, mut searches) = spawn_directory_server_at(Some("/app"), false)
        .await
        .expect("server");

    for prefixed in [format!("{server_url}/app"), format!("{server_url}/app/")] {
        let transport = HttpCollectionTransport::new(&prefixed).expect("transport");
        let result: SearchResult<UserRecord> = transport
            .submit(
                SearchRequest {
                    page: 0,
                    size: 10,
                    search: String::new(),
                    sort: "id,asc".into(),
                },
                CancellationToken::new(),
            )
            .await
            .expect("search under prefix");
        assert!(matches!(result, SearchResult::Success { .. }), "{prefixed}");
        assert!(searches.recv().await.is_some());

        let deleted = transport
            .delete(DeleteRequest { id: UserId(5) }, CancellationToken::new())
            .await
            .expect("delete under prefix");
        assert_eq!(deleted, ActionResult::Success);
    }
}

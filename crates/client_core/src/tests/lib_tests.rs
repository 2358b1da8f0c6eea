use super::*;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use shared::error::SyncFailure;
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ItemServerState {
    items: Arc<Mutex<Vec<Item>>>,
    next_id: Arc<Mutex<u64>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ItemServerState {
    async fn record(&self, line: impl Into<String>) {
        self.requests.lock().await.push(line.into());
    }
}

async fn handle_list(State(state): State<ItemServerState>) -> Json<serde_json::Value> {
    state.record("GET /items").await;
    let items = state.items.lock().await;
    // Document-store style `_id` keys.
    Json(serde_json::Value::Array(
        items
            .iter()
            .map(|item| {
                serde_json::json!({
                    "_id": item.id.as_str(),
                    "name": item.name,
                    "description": item.description,
                    "price": item.price,
                })
            })
            .collect(),
    ))
}

async fn handle_create(
    State(state): State<ItemServerState>,
    Json(payload): Json<ItemPayload>,
) -> (StatusCode, Json<Item>) {
    state.record("POST /items").await;
    let mut next_id = state.next_id.lock().await;
    *next_id += 1;
    let item = Item {
        id: ItemId::new(format!("id-{}", *next_id)),
        name: payload.name,
        description: payload.description,
        price: payload.price,
    };
    state.items.lock().await.push(item.clone());
    (StatusCode::CREATED, Json(item))
}

async fn handle_update(
    State(state): State<ItemServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ItemPayload>,
) -> Result<Json<Item>, StatusCode> {
    state.record(format!("PUT /items/{id}")).await;
    let mut items = state.items.lock().await;
    let item = items
        .iter_mut()
        .find(|item| item.id.as_str() == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    item.name = payload.name;
    item.description = payload.description;
    item.price = payload.price;
    Ok(Json(item.clone()))
}

async fn handle_delete(State(state): State<ItemServerState>, Path(id): Path<String>) -> StatusCode {
    state.record(format!("DELETE /items/{id}")).await;
    let mut items = state.items.lock().await;
    let before = items.len();
    items.retain(|item| item.id.as_str() != id);
    if items.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

async fn spawn_item_server() -> anyhow::Result<(String, ItemServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ItemServerState::default();
    let app = Router::new()
        .route("/api/items", get(handle_list).post(handle_create))
        .route("/api/items/:id", put(handle_update).delete(handle_delete))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/api"), state))
}

#[test]
fn builds_collection_and_item_urls_under_base_path() {
    let api = HttpItemsApi::new("http://localhost:5000/api/").expect("api");
    assert_eq!(
        api.collection_url().expect("url").as_str(),
        "http://localhost:5000/api/items"
    );
    assert_eq!(
        api.item_url(&ItemId::new("65f0c1")).expect("url").as_str(),
        "http://localhost:5000/api/items/65f0c1"
    );

    let bare = HttpItemsApi::new("http://localhost:5000").expect("api");
    assert_eq!(
        bare.collection_url().expect("url").as_str(),
        "http://localhost:5000/items"
    );
}

#[test]
fn item_ids_are_encoded_as_one_path_segment() {
    let api = HttpItemsApi::new("http://localhost:5000/api").expect("api");
    assert_eq!(
        api.item_url(&ItemId::new("a b/c")).expect("url").as_str(),
        "http://localhost:5000/api/items/a%20b%2Fc"
    );
}

#[test]
fn rejects_unusable_base_urls() {
    assert!(matches!(
        HttpItemsApi::new("not a url"),
        Err(ItemsApiError::InvalidBaseUrl { .. })
    ));
    assert!(matches!(
        HttpItemsApi::new("mailto:items@example.com"),
        Err(ItemsApiError::CannotBeBase(_))
    ));
}

#[tokio::test]
async fn controller_round_trips_against_http_backend() {
    let (api_url, server) = spawn_item_server().await.expect("spawn server");
    let api = HttpItemsApi::new(&api_url).expect("api");
    let controller = SyncController::new(Arc::new(api));

    controller.refresh().await.expect("initial refresh");
    assert!(controller.snapshot().await.items.is_empty());

    controller.set_draft_name("Pen").await;
    controller.set_draft_description("Blue pen").await;
    controller.set_draft_price(Some(2.0)).await;
    controller.submit().await.expect("create via submit");

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.items[0].name, "Pen");
    assert_eq!(snapshot.items[0].id, ItemId::new("id-1"));

    assert!(controller.begin_edit_by_id(&ItemId::new("id-1")).await);
    controller.set_draft_price(Some(3.0)).await;
    controller.submit().await.expect("update via submit");
    assert_eq!(controller.snapshot().await.items[0].price, 3.0);

    controller
        .delete(&ItemId::new("id-1"))
        .await
        .expect("delete");
    assert!(controller.snapshot().await.items.is_empty());

    assert_eq!(
        *server.requests.lock().await,
        vec![
            "GET /items".to_string(),
            "POST /items".to_string(),
            "GET /items".to_string(),
            "PUT /items/id-1".to_string(),
            "GET /items".to_string(),
            "DELETE /items/id-1".to_string(),
            "GET /items".to_string(),
        ]
    );
}

#[tokio::test]
async fn non_success_status_becomes_operation_failure() {
    let (api_url, server) = spawn_item_server().await.expect("spawn server");
    let controller = SyncController::new(Arc::new(HttpItemsApi::new(&api_url).expect("api")));

    let err = controller
        .delete(&ItemId::new("abc"))
        .await
        .expect_err("unknown id should fail");
    assert_eq!(err, SyncFailure::Delete);
    assert_eq!(
        controller.snapshot().await.error_message(),
        Some("Failed to delete item")
    );
    assert_eq!(
        *server.requests.lock().await,
        vec!["DELETE /items/abc".to_string()]
    );
}

#[tokio::test]
async fn unreachable_server_reports_fetch_failure() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let api = HttpItemsApi::new(&format!("http://{addr}/api")).expect("api");
    assert!(api.list_items().await.is_err());

    let controller = SyncController::new(Arc::new(api));
    assert_eq!(controller.refresh().await, Err(SyncFailure::Fetch));
    let snapshot = controller.snapshot().await;
    assert!(snapshot.items.is_empty());
    assert!(!snapshot.sync_state.is_loading());
}
